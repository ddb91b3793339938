use chrono::NaiveDate;
use hbg_common::Vnd;
use thiserror::Error;

use crate::{
    db_types::{Booking, BookingStatus, NewBooking, OrderId},
    flow_api::booking_objects::PaymentVerdict,
    traits::{BookingApiError, BookingManagement, SettlementUpdate},
};

/// This trait defines the highest level of behaviour for backends supporting the booking engine.
///
/// This behaviour includes:
/// * Creating bookings under the availability guard (check and insert are one atomic operation, so two
///   concurrent attempts for overlapping ranges cannot both succeed).
/// * Attaching the gateway correlation id at payment-initiation time.
/// * The conditional settlement update the reconciliation engine relies on: a compare-and-swap on
///   `status = pending` keyed by correlation id, so the two callback channels serialize per order id
///   and the settlement side effects run at most once.
#[allow(async_fn_in_trait)]
pub trait BookingGatewayDatabase: Clone + BookingManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Inserts a `pending` booking with the given computed price, provided no blocking booking overlaps
    /// its range. The availability check and the insert execute as one atomic operation.
    ///
    /// Returns [`BookingGatewayError::RoomUnavailable`] when a blocking overlap exists; no partial state
    /// is left behind in that case.
    async fn insert_booking_if_available(
        &self,
        booking: NewBooking,
        total_price: Vnd,
    ) -> Result<Booking, BookingGatewayError>;

    /// Records the correlation id, the charged amount, and the discount code quoted at initiation time
    /// on the booking, in a single update.
    ///
    /// Only `pending` bookings accept a payment reference. A pending booking that already carries one
    /// (e.g. the guest abandoned a payment page and started over) has its reference replaced; the old
    /// correlation id is never reused, so stale callbacks fall through to `Unmatched`.
    async fn attach_payment_reference(
        &self,
        booking_id: i64,
        order_id: &OrderId,
        amount: Vnd,
        discount_code: Option<&str>,
    ) -> Result<Booking, BookingGatewayError>;

    /// Applies a gateway verdict to the booking carrying `order_id`, if it is still `pending`.
    ///
    /// In a single atomic transaction:
    /// * the booking status is compare-and-swapped from `pending` to `paid` (success) or `cancelled`
    ///   (failure);
    /// * on success, exactly one `paid` Payment record is created with the gateway-reported amount and
    ///   `paid_at` set to now, and the room's advisory occupancy flag is raised.
    ///
    /// If the swap finds the booking already out of `pending`, nothing is written and
    /// [`SettlementUpdate::AlreadySettled`] is returned. An unknown correlation id returns
    /// [`SettlementUpdate::Unmatched`].
    async fn try_settle_booking(
        &self,
        order_id: &OrderId,
        verdict: &PaymentVerdict,
        amount: Vnd,
    ) -> Result<SettlementUpdate, BookingGatewayError>;

    /// Unconditionally writes a new status for the booking. The admin transition table is enforced by
    /// the caller ([`crate::BookingFlowApi::set_status_for_booking`]); backends only persist.
    async fn update_booking_status(&self, booking_id: i64, status: BookingStatus) -> Result<Booking, BookingGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), BookingGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum BookingGatewayError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested room {0} does not exist")]
    RoomNotFound(i64),
    #[error("Room {0} is not available for the requested dates")]
    RoomUnavailable(i64),
    #[error("Invalid date range: check-in {check_in} must fall before check-out {check_out}")]
    InvalidDateRange { check_in: NaiveDate, check_out: NaiveDate },
    #[error("The requested booking (internal id {0}) does not exist")]
    BookingIdNotFound(i64),
    #[error("Booking {0} cannot accept a payment in its current status")]
    BookingNotPayable(i64),
    #[error("The requested status change would result in a no-op.")]
    StatusChangeNoOp,
    #[error("The requested status change is forbidden.")]
    StatusChangeForbidden,
    #[error("{0}")]
    QueryError(#[from] BookingApiError),
}

impl From<sqlx::Error> for BookingGatewayError {
    fn from(e: sqlx::Error) -> Self {
        BookingGatewayError::DatabaseError(e.to_string())
    }
}

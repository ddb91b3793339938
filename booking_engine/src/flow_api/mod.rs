//! The booking engine public API.
//!
//! [`BookingFlowApi`] is the write side: booking creation, admin status transitions, and the settlement
//! of gateway verdicts. [`bookings_api::BookingApi`] is the read side used by listing and lookup routes.

pub mod booking_objects;
pub mod bookings_api;

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use hbg_common::Vnd;
use log::*;

use crate::{
    availability::AvailabilityFailMode,
    db_types::{Booking, BookingStatus, NewBooking, OrderId, Payment},
    flow_api::booking_objects::{PaymentVerdict, ReconciliationOutcome},
    events::{BookingPaidEvent, EventProducers},
    helpers::quote_price,
    traits::{BookingGatewayDatabase, BookingGatewayError, SettlementUpdate},
};

/// `BookingFlowApi` is the primary API for handling the booking lifecycle and for reconciling payment
/// verdicts delivered by the gateway's callback channels.
pub struct BookingFlowApi<B> {
    db: B,
    producers: EventProducers,
    fail_mode: AvailabilityFailMode,
}

impl<B> Debug for BookingFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BookingFlowApi")
    }
}

impl<B> BookingFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, fail_mode: AvailabilityFailMode::default() }
    }

    pub fn with_fail_mode(mut self, fail_mode: AvailabilityFailMode) -> Self {
        self.fail_mode = fail_mode;
        self
    }
}

impl<B> BookingFlowApi<B>
where B: BookingGatewayDatabase
{
    /// Creates a new `pending` booking.
    ///
    /// The price is deterministic given the same inputs and discount state: nightly price times nights
    /// (at least one), minus the discount when its code is valid right now, clamped at zero. The
    /// availability check and the insert are a single atomic operation in the backend, so two concurrent
    /// attempts for overlapping ranges cannot both succeed.
    pub async fn create_booking(&self, booking: NewBooking) -> Result<Booking, BookingGatewayError> {
        if booking.check_in >= booking.check_out {
            return Err(BookingGatewayError::InvalidDateRange {
                check_in: booking.check_in,
                check_out: booking.check_out,
            });
        }
        let room = self
            .db
            .fetch_room(booking.room_id)
            .await?
            .ok_or(BookingGatewayError::RoomNotFound(booking.room_id))?;
        let discount = match booking.discount_code.as_deref() {
            Some(code) => self.db.fetch_discount_by_code(code).await?,
            None => None,
        };
        let price = quote_price(room.price, booking.check_in, booking.check_out, discount.as_ref(), Utc::now());
        let created = self.db.insert_booking_if_available(booking, price).await?;
        debug!(
            "🛎️📦️ Booking #{} created for room {} [{} → {}] at {price}",
            created.id, room.room_number, created.check_in, created.check_out
        );
        Ok(created)
    }

    /// Whether the room is free for `[check_in, check_out)`. Empty and inverted ranges are unavailable
    /// (fail-safe). What a storage fault reports is governed by the configured
    /// [`AvailabilityFailMode`].
    pub async fn check_availability(
        &self,
        room_id: i64,
        check_in: chrono::NaiveDate,
        check_out: chrono::NaiveDate,
    ) -> Result<bool, BookingGatewayError> {
        if check_in >= check_out {
            return Ok(false);
        }
        match self.db.room_is_available(room_id, check_in, check_out).await {
            Ok(available) => Ok(available),
            Err(e) => match self.fail_mode {
                AvailabilityFailMode::FailOpen => {
                    warn!("🛎️🚪️ Availability lookup for room #{room_id} failed ({e}). Reporting available per fail-open policy.");
                    Ok(true)
                },
                AvailabilityFailMode::FailClosed => {
                    warn!("🛎️🚪️ Availability lookup for room #{room_id} failed ({e}). Reporting unavailable per fail-closed policy.");
                    Err(e.into())
                },
            },
        }
    }

    /// The amount to charge for a booking if paid at `at` with the given coupon code. Starts from the
    /// booking's stored total and applies the discount only when the code resolves and is valid at `at`.
    pub async fn charge_for_booking(
        &self,
        booking: &Booking,
        discount_code: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Vnd, BookingGatewayError> {
        let mut amount = booking.total_price;
        if let Some(code) = discount_code {
            if let Some(discount) = self.db.fetch_discount_by_code(code).await? {
                if discount.is_valid_at(at) {
                    amount = discount.apply_to(amount);
                    debug!("🛎️🏷️ Applied code {} to booking #{}: now {amount}", discount.code, booking.id);
                }
            }
        }
        Ok(amount)
    }

    /// Records a payment attempt against a booking: the fresh correlation id, the amount quoted to the
    /// gateway and the coupon code used. Persisted before the gateway is contacted, so a callback can
    /// never arrive for an id we have not stored yet.
    pub async fn register_payment_attempt(
        &self,
        booking_id: i64,
        order_id: &OrderId,
        amount: Vnd,
        discount_code: Option<&str>,
    ) -> Result<Booking, BookingGatewayError> {
        let booking = self.db.attach_payment_reference(booking_id, order_id, amount, discount_code).await?;
        debug!("🛎️💳️ Booking #{booking_id} awaiting verdict for order [{order_id}] ({amount})");
        Ok(booking)
    }

    /// Settles a gateway verdict against the booking carrying `order_id`.
    ///
    /// This is the single entry point for both the notify (server-to-server) and return (browser
    /// redirect) channels, in any order, any number of times. The backend performs a conditional atomic
    /// transition out of `pending`, so the settlement side effects — the status change, the single
    /// Payment record, and the paid-event emission — happen exactly once no matter how often or how
    /// concurrently the channels deliver.
    pub async fn settle(
        &self,
        order_id: &OrderId,
        result_code: i64,
        amount: Vnd,
    ) -> Result<ReconciliationOutcome, BookingGatewayError> {
        let verdict = PaymentVerdict::from_result_code(result_code);
        let update = self.db.try_settle_booking(order_id, &verdict, amount).await?;
        let outcome = match update {
            SettlementUpdate::Applied { booking, payment } => {
                match &payment {
                    Some(p) => {
                        info!("🛎️✅️ Booking #{} settled as paid ({}) for order [{order_id}]", booking.id, p.amount);
                        self.call_booking_paid_hook(&booking, p).await;
                    },
                    None => {
                        info!(
                            "🛎️❌️ Booking #{} cancelled after failed payment (resultCode {result_code}) for order [{order_id}]",
                            booking.id
                        );
                    },
                }
                ReconciliationOutcome::Settled { booking, payment }
            },
            SettlementUpdate::AlreadySettled(booking) => {
                debug!(
                    "🛎️🔁️ Verdict for order [{order_id}] ignored: booking #{} is already {}",
                    booking.id, booking.status
                );
                ReconciliationOutcome::AlreadySettled(booking)
            },
            SettlementUpdate::Unmatched => {
                warn!("🛎️❓️ No booking matches order [{order_id}]. Acknowledging without touching state.");
                ReconciliationOutcome::Unmatched
            },
        };
        Ok(outcome)
    }

    /// Changes the status of a booking on admin instruction.
    ///
    /// The permitted transitions:
    ///
    /// | From \ To  | pending | paid | confirmed | checked_in | checked_out | cancelled |
    /// |------------|---------|------|-----------|------------|-------------|-----------|
    /// | pending    | NoOp    | Ok   | Ok        | Ok         | Ok          | Ok        |
    /// | paid       | Err     | NoOp | Err       | Ok         | Ok          | Ok        |
    /// | confirmed  | Err     | Err  | NoOp      | Ok         | Ok          | Ok        |
    /// | checked_in | Err     | Err  | Err       | NoOp       | Ok          | Ok        |
    /// | checked_out| Err     | Err  | Err       | Err        | NoOp        | Err       |
    /// | cancelled  | Err     | Err  | Err       | Err        | Err         | NoOp      |
    ///
    /// `cancelled` and `checked_out` are terminal. A transition to `paid` here is the manual admin
    /// override; the normal path to `paid` is [`Self::settle`]. "Is paid" is derived from the status, so
    /// no extra flag is written for paid-equivalent targets.
    pub async fn set_status_for_booking(
        &self,
        booking_id: i64,
        new_status: BookingStatus,
    ) -> Result<Booking, BookingGatewayError> {
        let booking = self
            .db
            .fetch_booking(booking_id)
            .await?
            .ok_or(BookingGatewayError::BookingIdNotFound(booking_id))?;
        use BookingStatus::*;
        match (booking.status, new_status) {
            (old, new) if old == new => return Err(BookingGatewayError::StatusChangeNoOp),
            (old, _) if old.is_terminal() => return Err(BookingGatewayError::StatusChangeForbidden),
            (Pending, Paid | Confirmed | CheckedIn | CheckedOut | Cancelled) => {},
            (Paid | Confirmed, CheckedIn | CheckedOut | Cancelled) => {},
            (CheckedIn, CheckedOut | Cancelled) => {},
            (_, _) => return Err(BookingGatewayError::StatusChangeForbidden),
        }
        let updated = self.db.update_booking_status(booking_id, new_status).await?;
        info!("🛎️🔧️ Booking #{booking_id} moved from {} to {} by admin", booking.status, updated.status);
        Ok(updated)
    }

    async fn call_booking_paid_hook(&self, booking: &Booking, payment: &Payment) {
        for emitter in &self.producers.booking_paid_producer {
            debug!("🛎️📬️ Notifying booking-paid hook subscribers");
            let event = BookingPaidEvent { booking: booking.clone(), payment: payment.clone() };
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

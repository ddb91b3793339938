use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    db_types::{Booking, Discount, OrderId, Payment, Room},
    flow_api::booking_objects::BookingQueryFilter,
};

/// Read-only queries over rooms, bookings, payments and the discount catalog.
#[allow(async_fn_in_trait)]
pub trait BookingManagement {
    /// Fetches the booking with the given internal id, if it exists.
    async fn fetch_booking(&self, booking_id: i64) -> Result<Option<Booking>, BookingApiError>;

    /// Fetches the booking carrying the given gateway correlation id, if any.
    async fn fetch_booking_by_order_id(&self, order_id: &OrderId) -> Result<Option<Booking>, BookingApiError>;

    async fn fetch_bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, BookingApiError>;

    async fn fetch_payments_for_booking(&self, booking_id: i64) -> Result<Vec<Payment>, BookingApiError>;

    async fn fetch_room(&self, room_id: i64) -> Result<Option<Room>, BookingApiError>;

    async fn fetch_rooms(&self) -> Result<Vec<Room>, BookingApiError>;

    /// Looks up a discount by its (case-insensitive) code. The stored codes are uppercase.
    async fn fetch_discount_by_code(&self, code: &str) -> Result<Option<Discount>, BookingApiError>;

    /// Whether no blocking booking overlaps `[check_in, check_out)` for the room. Callers are expected
    /// to reject empty or inverted ranges before asking.
    async fn room_is_available(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool, BookingApiError>;

    /// Fetches bookings according to criteria specified in the `BookingQueryFilter`.
    async fn search_bookings(&self, query: BookingQueryFilter) -> Result<Vec<Booking>, BookingApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum BookingApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for BookingApiError {
    fn from(e: sqlx::Error) -> Self {
        BookingApiError::DatabaseError(e.to_string())
    }
}

//! Unified read API for rooms, bookings and payments.

use std::fmt::Debug;

use chrono::NaiveDate;
use log::trace;

use crate::{
    db_types::{Booking, OrderId, Payment, Room},
    flow_api::booking_objects::{BookingQueryFilter, RoomAvailability},
    traits::{BookingApiError, BookingManagement},
};

/// The `BookingApi` provides a unified API for querying rooms, bookings and their payments.
pub struct BookingApi<B> {
    db: B,
}

impl<B: Debug> Debug for BookingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BookingApi ({:?})", self.db)
    }
}

impl<B> BookingApi<B>
where B: BookingManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches the booking with the given id. If no booking exists, `None` is returned.
    pub async fn booking_by_id(&self, booking_id: i64) -> Result<Option<Booking>, BookingApiError> {
        self.db.fetch_booking(booking_id).await
    }

    /// Fetches the booking carrying the given gateway correlation id.
    pub async fn booking_by_order_id(&self, order_id: &OrderId) -> Result<Option<Booking>, BookingApiError> {
        self.db.fetch_booking_by_order_id(order_id).await
    }

    pub async fn bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, BookingApiError> {
        self.db.fetch_bookings_for_user(user_id).await
    }

    pub async fn payments_for_booking(&self, booking_id: i64) -> Result<Vec<Payment>, BookingApiError> {
        let payments = self.db.fetch_payments_for_booking(booking_id).await?;
        trace!("Payments for booking #{booking_id}: {:?}", payments);
        Ok(payments)
    }

    pub async fn room_by_id(&self, room_id: i64) -> Result<Option<Room>, BookingApiError> {
        self.db.fetch_room(room_id).await
    }

    /// All rooms, each annotated with availability for `[check_in, check_out)`. Used by the search
    /// screen; a degenerate range marks every room unavailable.
    pub async fn rooms_with_availability(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Vec<RoomAvailability>, BookingApiError> {
        let rooms = self.db.fetch_rooms().await?;
        let mut result = Vec::with_capacity(rooms.len());
        for room in rooms {
            let available =
                check_in < check_out && self.db.room_is_available(room.id, check_in, check_out).await?;
            result.push(RoomAvailability { room, available });
        }
        Ok(result)
    }

    pub async fn search_bookings(&self, query: BookingQueryFilter) -> Result<Vec<Booking>, BookingApiError> {
        self.db.search_bookings(query).await
    }
}

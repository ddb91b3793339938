//! `SqliteDatabase` is a concrete implementation of a booking engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module.

use std::fmt::Debug;

use chrono::NaiveDate;
use hbg_common::Vnd;
use log::*;
use sqlx::SqlitePool;

use super::db::{bookings, discounts, new_pool, payments, rooms};
use crate::{
    db_types::{Booking, BookingStatus, Discount, NewBooking, OrderId, Payment, Room},
    flow_api::booking_objects::{BookingQueryFilter, PaymentVerdict},
    traits::{BookingApiError, BookingGatewayDatabase, BookingGatewayError, BookingManagement, SettlementUpdate},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl BookingManagement for SqliteDatabase {
    async fn fetch_booking(&self, booking_id: i64) -> Result<Option<Booking>, BookingApiError> {
        let mut conn = self.pool.acquire().await.map_err(BookingApiError::from)?;
        Ok(bookings::fetch_booking_by_id(booking_id, &mut conn).await?)
    }

    async fn fetch_booking_by_order_id(&self, order_id: &OrderId) -> Result<Option<Booking>, BookingApiError> {
        let mut conn = self.pool.acquire().await.map_err(BookingApiError::from)?;
        Ok(bookings::fetch_booking_by_order_id(order_id, &mut conn).await?)
    }

    async fn fetch_bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, BookingApiError> {
        let mut conn = self.pool.acquire().await.map_err(BookingApiError::from)?;
        Ok(bookings::fetch_bookings_for_user(user_id, &mut conn).await?)
    }

    async fn fetch_payments_for_booking(&self, booking_id: i64) -> Result<Vec<Payment>, BookingApiError> {
        let mut conn = self.pool.acquire().await.map_err(BookingApiError::from)?;
        Ok(payments::fetch_payments_for_booking(booking_id, &mut conn).await?)
    }

    async fn fetch_room(&self, room_id: i64) -> Result<Option<Room>, BookingApiError> {
        let mut conn = self.pool.acquire().await.map_err(BookingApiError::from)?;
        Ok(rooms::fetch_room(room_id, &mut conn).await?)
    }

    async fn fetch_rooms(&self) -> Result<Vec<Room>, BookingApiError> {
        let mut conn = self.pool.acquire().await.map_err(BookingApiError::from)?;
        Ok(rooms::fetch_rooms(&mut conn).await?)
    }

    async fn fetch_discount_by_code(&self, code: &str) -> Result<Option<Discount>, BookingApiError> {
        let mut conn = self.pool.acquire().await.map_err(BookingApiError::from)?;
        Ok(discounts::fetch_discount_by_code(code, &mut conn).await?)
    }

    async fn room_is_available(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool, BookingApiError> {
        let mut conn = self.pool.acquire().await.map_err(BookingApiError::from)?;
        let blocked = bookings::blocking_overlap_exists(room_id, check_in, check_out, &mut conn).await?;
        Ok(!blocked)
    }

    async fn search_bookings(&self, query: BookingQueryFilter) -> Result<Vec<Booking>, BookingApiError> {
        let mut conn = self.pool.acquire().await.map_err(BookingApiError::from)?;
        Ok(bookings::search_bookings(query, &mut conn).await?)
    }
}

impl BookingGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_booking_if_available(
        &self,
        booking: NewBooking,
        total_price: Vnd,
    ) -> Result<Booking, BookingGatewayError> {
        let room_id = booking.room_id;
        let mut conn = self.pool.acquire().await?;
        // Guard and insert are one statement, so no transaction is needed to make them atomic
        let inserted = bookings::insert_if_available(booking, total_price, &mut conn).await?;
        inserted.ok_or(BookingGatewayError::RoomUnavailable(room_id))
    }

    async fn attach_payment_reference(
        &self,
        booking_id: i64,
        order_id: &OrderId,
        amount: Vnd,
        discount_code: Option<&str>,
    ) -> Result<Booking, BookingGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let booking =
            bookings::attach_payment_reference(booking_id, order_id, amount, discount_code, &mut conn).await?;
        debug!("🗃️ Booking #{booking_id} now references order [{order_id}]");
        booking.ok_or(BookingGatewayError::BookingNotPayable(booking_id))
    }

    async fn try_settle_booking(
        &self,
        order_id: &OrderId,
        verdict: &PaymentVerdict,
        amount: Vnd,
    ) -> Result<SettlementUpdate, BookingGatewayError> {
        let mut tx = self.pool.begin().await?;
        let swapped = bookings::try_settle(order_id, verdict.target_status(), &mut tx).await?;
        let update = match swapped {
            Some(booking) => {
                let payment = if verdict.is_success() {
                    let payment = payments::insert_paid_payment(booking.id, amount, &mut tx).await?;
                    rooms::mark_room_booked(booking.room_id, &mut tx).await?;
                    Some(payment)
                } else {
                    None
                };
                debug!("🗃️ Order [{order_id}] settled booking #{} as {}", booking.id, booking.status);
                SettlementUpdate::Applied { booking, payment }
            },
            None => match bookings::fetch_booking_by_order_id(order_id, &mut tx).await? {
                Some(booking) => {
                    trace!("🗃️ Order [{order_id}] already settled; booking #{} is {}", booking.id, booking.status);
                    SettlementUpdate::AlreadySettled(booking)
                },
                None => SettlementUpdate::Unmatched,
            },
        };
        tx.commit().await?;
        Ok(update)
    }

    async fn update_booking_status(
        &self,
        booking_id: i64,
        status: BookingStatus,
    ) -> Result<Booking, BookingGatewayError> {
        let mut conn = self.pool.acquire().await?;
        bookings::update_booking_status(booking_id, status, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), BookingGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

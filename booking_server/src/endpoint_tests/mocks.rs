use std::sync::{Arc, Mutex};

use booking_engine::{
    availability::booking_blocks,
    db_types::{Booking, BookingStatus, Discount, NewBooking, OrderId, Payment, PaymentStatus, Room, MOMO_PAYMENT_METHOD},
    flow_api::booking_objects::{BookingQueryFilter, PaymentVerdict},
    traits::{BookingApiError, BookingGatewayDatabase, BookingGatewayError, BookingManagement, SettlementUpdate},
};
use chrono::{NaiveDate, Utc};
use hbg_common::Vnd;
use mockall::mock;

mock! {
    pub BookingManager {}
    impl BookingManagement for BookingManager {
        async fn fetch_booking(&self, booking_id: i64) -> Result<Option<Booking>, BookingApiError>;
        async fn fetch_booking_by_order_id(&self, order_id: &OrderId) -> Result<Option<Booking>, BookingApiError>;
        async fn fetch_bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, BookingApiError>;
        async fn fetch_payments_for_booking(&self, booking_id: i64) -> Result<Vec<Payment>, BookingApiError>;
        async fn fetch_room(&self, room_id: i64) -> Result<Option<Room>, BookingApiError>;
        async fn fetch_rooms(&self) -> Result<Vec<Room>, BookingApiError>;
        async fn fetch_discount_by_code(&self, code: &str) -> Result<Option<Discount>, BookingApiError>;
        async fn room_is_available(&self, room_id: i64, check_in: NaiveDate, check_out: NaiveDate) -> Result<bool, BookingApiError>;
        async fn search_bookings(&self, query: BookingQueryFilter) -> Result<Vec<Booking>, BookingApiError>;
    }
}

/// An in-memory backend for exercising the write routes. The settle path mirrors the SQLite backend's
/// conditional transition under a single lock, and `fail_storage` simulates a transient storage outage
/// so the retryable-500 contract of the notify channel can be tested.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    inner: Arc<Mutex<MemoryState>>,
    fail_storage: bool,
}

#[derive(Default)]
struct MemoryState {
    rooms: Vec<Room>,
    bookings: Vec<Booking>,
    payments: Vec<Payment>,
}

impl MemoryDatabase {
    pub fn failing_storage() -> Self {
        Self { inner: Arc::default(), fail_storage: true }
    }

    pub fn with_room(self, room: Room) -> Self {
        self.inner.lock().unwrap().rooms.push(room);
        self
    }

    pub fn with_booking(self, booking: Booking) -> Self {
        self.inner.lock().unwrap().bookings.push(booking);
        self
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.inner.lock().unwrap().payments.clone()
    }

    pub fn booking(&self, id: i64) -> Option<Booking> {
        self.inner.lock().unwrap().bookings.iter().find(|b| b.id == id).cloned()
    }

    fn guard(&self) -> Result<(), BookingApiError> {
        if self.fail_storage {
            Err(BookingApiError::DatabaseError("storage is down".to_string()))
        } else {
            Ok(())
        }
    }
}

pub fn test_room(id: i64, room_number: &str, price: Vnd) -> Room {
    Room {
        id,
        room_number: room_number.to_string(),
        room_type: "standard".to_string(),
        price,
        description: String::new(),
        image: None,
        is_booked: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_booking(id: i64, room_id: i64, status: BookingStatus, order_id: Option<&str>) -> Booking {
    Booking {
        id,
        user_id: 1,
        room_id,
        check_in: "2024-03-01".parse().unwrap(),
        check_out: "2024-03-04".parse().unwrap(),
        guests: 2,
        total_price: Vnd::from(1_500_000),
        discount_code: None,
        amount_after_discount: None,
        momo_order_id: order_id.map(|o| OrderId::from(o.to_string())),
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

impl BookingManagement for MemoryDatabase {
    async fn fetch_booking(&self, booking_id: i64) -> Result<Option<Booking>, BookingApiError> {
        self.guard()?;
        Ok(self.booking(booking_id))
    }

    async fn fetch_booking_by_order_id(&self, order_id: &OrderId) -> Result<Option<Booking>, BookingApiError> {
        self.guard()?;
        let state = self.inner.lock().unwrap();
        Ok(state.bookings.iter().find(|b| b.momo_order_id.as_ref() == Some(order_id)).cloned())
    }

    async fn fetch_bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, BookingApiError> {
        self.guard()?;
        let state = self.inner.lock().unwrap();
        Ok(state.bookings.iter().filter(|b| b.user_id == user_id).cloned().collect())
    }

    async fn fetch_payments_for_booking(&self, booking_id: i64) -> Result<Vec<Payment>, BookingApiError> {
        self.guard()?;
        Ok(self.payments().into_iter().filter(|p| p.booking_id == booking_id).collect())
    }

    async fn fetch_room(&self, room_id: i64) -> Result<Option<Room>, BookingApiError> {
        self.guard()?;
        let state = self.inner.lock().unwrap();
        Ok(state.rooms.iter().find(|r| r.id == room_id).cloned())
    }

    async fn fetch_rooms(&self) -> Result<Vec<Room>, BookingApiError> {
        self.guard()?;
        Ok(self.inner.lock().unwrap().rooms.clone())
    }

    async fn fetch_discount_by_code(&self, _code: &str) -> Result<Option<Discount>, BookingApiError> {
        self.guard()?;
        Ok(None)
    }

    async fn room_is_available(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool, BookingApiError> {
        self.guard()?;
        let state = self.inner.lock().unwrap();
        let blocked = state
            .bookings
            .iter()
            .any(|b| b.room_id == room_id && booking_blocks(b.status, b.check_in, b.check_out, check_in, check_out));
        Ok(!blocked)
    }

    async fn search_bookings(&self, _query: BookingQueryFilter) -> Result<Vec<Booking>, BookingApiError> {
        self.guard()?;
        Ok(self.inner.lock().unwrap().bookings.clone())
    }
}

impl BookingGatewayDatabase for MemoryDatabase {
    fn url(&self) -> &str {
        "memory://test"
    }

    async fn insert_booking_if_available(
        &self,
        booking: NewBooking,
        total_price: Vnd,
    ) -> Result<Booking, BookingGatewayError> {
        if self.fail_storage {
            return Err(BookingGatewayError::DatabaseError("storage is down".to_string()));
        }
        let mut state = self.inner.lock().unwrap();
        let blocked = state.bookings.iter().any(|b| {
            b.room_id == booking.room_id
                && booking_blocks(b.status, b.check_in, b.check_out, booking.check_in, booking.check_out)
        });
        if blocked {
            return Err(BookingGatewayError::RoomUnavailable(booking.room_id));
        }
        let id = state.bookings.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let created = Booking {
            id,
            user_id: booking.user_id,
            room_id: booking.room_id,
            check_in: booking.check_in,
            check_out: booking.check_out,
            guests: booking.guests,
            total_price,
            discount_code: booking.discount_code,
            amount_after_discount: None,
            momo_order_id: None,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.bookings.push(created.clone());
        Ok(created)
    }

    async fn attach_payment_reference(
        &self,
        booking_id: i64,
        order_id: &OrderId,
        amount: Vnd,
        discount_code: Option<&str>,
    ) -> Result<Booking, BookingGatewayError> {
        let mut state = self.inner.lock().unwrap();
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id && b.status == BookingStatus::Pending)
            .ok_or(BookingGatewayError::BookingNotPayable(booking_id))?;
        booking.momo_order_id = Some(order_id.clone());
        booking.amount_after_discount = Some(amount);
        booking.discount_code = discount_code.map(|s| s.to_string());
        Ok(booking.clone())
    }

    async fn try_settle_booking(
        &self,
        order_id: &OrderId,
        verdict: &PaymentVerdict,
        amount: Vnd,
    ) -> Result<SettlementUpdate, BookingGatewayError> {
        if self.fail_storage {
            return Err(BookingGatewayError::DatabaseError("storage is down".to_string()));
        }
        let mut state = self.inner.lock().unwrap();
        let next_payment_id = state.payments.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let Some(booking) =
            state.bookings.iter_mut().find(|b| b.momo_order_id.as_ref() == Some(order_id))
        else {
            return Ok(SettlementUpdate::Unmatched);
        };
        if booking.status != BookingStatus::Pending {
            return Ok(SettlementUpdate::AlreadySettled(booking.clone()));
        }
        booking.status = verdict.target_status();
        booking.updated_at = Utc::now();
        let booking = booking.clone();
        let payment = verdict.is_success().then(|| {
            let payment = Payment {
                id: next_payment_id,
                booking_id: booking.id,
                amount,
                method: MOMO_PAYMENT_METHOD.to_string(),
                status: PaymentStatus::Paid,
                paid_at: Some(Utc::now()),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            state.payments.push(payment.clone());
            payment
        });
        Ok(SettlementUpdate::Applied { booking, payment })
    }

    async fn update_booking_status(
        &self,
        booking_id: i64,
        status: BookingStatus,
    ) -> Result<Booking, BookingGatewayError> {
        let mut state = self.inner.lock().unwrap();
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or(BookingGatewayError::BookingIdNotFound(booking_id))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }
}

//! The availability guard under contention: check-then-create must not let two overlapping bookings
//! through, sequentially or concurrently.

use chrono::NaiveDate;
use hbg_common::Vnd;
use booking_engine::{
    db_types::{BookingStatus, NewBooking},
    events::EventProducers,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seed::{seed_percent_discount, seed_room},
    },
    BookingFlowApi,
    BookingGatewayError,
    SqliteDatabase,
};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

#[tokio::test]
async fn overlapping_booking_is_rejected() {
    let db = new_db().await;
    let api = BookingFlowApi::new(db.clone(), EventProducers::default());
    let room = seed_room(db.pool(), "201", Vnd::from(400_000)).await;

    api.create_booking(NewBooking::new(1, room.id, d("2024-01-10"), d("2024-01-12"))).await.expect("First booking failed");
    let clash = api.create_booking(NewBooking::new(2, room.id, d("2024-01-11"), d("2024-01-13"))).await;
    assert!(matches!(clash, Err(BookingGatewayError::RoomUnavailable(_))));
}

#[tokio::test]
async fn adjacent_bookings_share_a_turnover_day() {
    let db = new_db().await;
    let api = BookingFlowApi::new(db.clone(), EventProducers::default());
    let room = seed_room(db.pool(), "202", Vnd::from(400_000)).await;

    api.create_booking(NewBooking::new(1, room.id, d("2024-01-10"), d("2024-01-12"))).await.expect("First booking failed");
    // Half-open ranges: a check-in on the day of the other guest's check-out is fine
    let adjacent = api.create_booking(NewBooking::new(2, room.id, d("2024-01-12"), d("2024-01-14"))).await;
    assert!(adjacent.is_ok());
}

#[tokio::test]
async fn degenerate_ranges_are_rejected_outright() {
    let db = new_db().await;
    let api = BookingFlowApi::new(db.clone(), EventProducers::default());
    let room = seed_room(db.pool(), "203", Vnd::from(400_000)).await;

    let same_day = api.create_booking(NewBooking::new(1, room.id, d("2024-01-10"), d("2024-01-10"))).await;
    assert!(matches!(same_day, Err(BookingGatewayError::InvalidDateRange { .. })));
    let inverted = api.create_booking(NewBooking::new(1, room.id, d("2024-01-12"), d("2024-01-10"))).await;
    assert!(matches!(inverted, Err(BookingGatewayError::InvalidDateRange { .. })));
    // And the availability probe reports them as unavailable rather than erroring
    assert!(!api.check_availability(room.id, d("2024-01-10"), d("2024-01-10")).await.unwrap());
}

#[tokio::test]
async fn concurrent_overlapping_attempts_produce_exactly_one_booking() {
    let db = new_db().await;
    let room = seed_room(db.pool(), "204", Vnd::from(400_000)).await;

    let api_a = BookingFlowApi::new(db.clone(), EventProducers::default());
    let api_b = BookingFlowApi::new(db.clone(), EventProducers::default());
    let room_id = room.id;
    let a = tokio::spawn(async move {
        api_a.create_booking(NewBooking::new(1, room_id, d("2024-02-01"), d("2024-02-05"))).await
    });
    let b = tokio::spawn(async move {
        api_b.create_booking(NewBooking::new(2, room_id, d("2024-02-03"), d("2024-02-07"))).await
    });
    let (ra, rb) = (a.await.expect("join failed"), b.await.expect("join failed"));

    let winners = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one of two overlapping attempts may win: {ra:?} / {rb:?}");
    let loser = if ra.is_ok() { rb } else { ra };
    assert!(matches!(loser, Err(BookingGatewayError::RoomUnavailable(_))));
}

#[tokio::test]
async fn discount_code_is_applied_at_creation_time() {
    let db = new_db().await;
    let api = BookingFlowApi::new(db.clone(), EventProducers::default());
    let room = seed_room(db.pool(), "205", Vnd::from(500_000)).await;
    seed_percent_discount(db.pool(), "SALE10", 10, None).await;

    let booking = api
        .create_booking(NewBooking::new(1, room.id, d("2024-03-01"), d("2024-03-04")).with_discount_code("sale10"))
        .await
        .expect("Booking failed");
    assert_eq!(booking.total_price, Vnd::from(1_350_000));
    assert_eq!(booking.status, BookingStatus::Pending);

    // An unknown code quietly charges full price
    let room2 = seed_room(db.pool(), "206", Vnd::from(500_000)).await;
    let full = api
        .create_booking(NewBooking::new(1, room2.id, d("2024-03-01"), d("2024-03-04")).with_discount_code("NOSUCH"))
        .await
        .expect("Booking failed");
    assert_eq!(full.total_price, Vnd::from(1_500_000));
}

//! End-to-end reconciliation flows against a real SQLite store: idempotence, channel
//! order-independence, failure policy and the unmatched path.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::NaiveDate;
use hbg_common::Vnd;
use booking_engine::{
    db_types::{BookingStatus, NewBooking, OrderId, PaymentStatus},
    events::{EventHandlers, EventHooks, EventProducers},
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seed::seed_room,
    },
    BookingFlowApi,
    BookingManagement,
    ReconciliationOutcome,
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

async fn pending_booking_with_order(
    api: &BookingFlowApi<SqliteDatabase>,
    db: &SqliteDatabase,
    order_id: &OrderId,
) -> i64 {
    let room = seed_room(db.pool(), "101", Vnd::from(500_000)).await;
    let booking = api
        .create_booking(NewBooking::new(1, room.id, d("2024-03-01"), d("2024-03-04")))
        .await
        .expect("Error creating booking");
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.total_price, Vnd::from(1_500_000));
    api.register_payment_attempt(booking.id, order_id, booking.total_price, None)
        .await
        .expect("Error attaching payment reference");
    booking.id
}

#[tokio::test]
async fn successful_settlement_is_idempotent() {
    let db = new_db().await;
    let api = BookingFlowApi::new(db.clone(), EventProducers::default());
    let oid = OrderId::from("MOMO17000000000001".to_string());
    let booking_id = pending_booking_with_order(&api, &db, &oid).await;

    let first = api.settle(&oid, 0, Vnd::from(1_500_000)).await.expect("First settle failed");
    assert!(matches!(first, ReconciliationOutcome::Settled { payment: Some(_), .. }));

    // The duplicate delivery must not create a second payment or dispatch anything
    let second = api.settle(&oid, 0, Vnd::from(1_500_000)).await.expect("Second settle failed");
    assert!(matches!(second, ReconciliationOutcome::AlreadySettled(_)));

    let booking = db.fetch_booking(booking_id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Paid);
    assert!(booking.is_paid());
    let payments = db.fetch_payments_for_booking(booking_id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Paid);
    assert_eq!(payments[0].amount, Vnd::from(1_500_000));
    assert!(payments[0].paid_at.is_some());
}

#[tokio::test]
async fn late_failure_does_not_unsettle_a_paid_booking() {
    let db = new_db().await;
    let api = BookingFlowApi::new(db.clone(), EventProducers::default());
    let oid = OrderId::from("MOMO17000000000002".to_string());
    let booking_id = pending_booking_with_order(&api, &db, &oid).await;

    api.settle(&oid, 0, Vnd::from(1_500_000)).await.expect("Settle failed");
    // A contradictory verdict arriving on the other channel is a no-op
    let late = api.settle(&oid, 1006, Vnd::from(0)).await.expect("Late settle failed");
    assert!(matches!(late, ReconciliationOutcome::AlreadySettled(_)));

    let booking = db.fetch_booking(booking_id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Paid);
}

#[tokio::test]
async fn first_writer_wins_regardless_of_channel_order() {
    // Failure first: the success arriving second must not resurrect the booking
    let db = new_db().await;
    let api = BookingFlowApi::new(db.clone(), EventProducers::default());
    let oid = OrderId::from("MOMO17000000000003".to_string());
    let booking_id = pending_booking_with_order(&api, &db, &oid).await;

    let first = api.settle(&oid, 1006, Vnd::from(0)).await.expect("Settle failed");
    assert!(matches!(first, ReconciliationOutcome::Settled { payment: None, .. }));
    let second = api.settle(&oid, 0, Vnd::from(1_500_000)).await.expect("Settle failed");
    assert!(matches!(second, ReconciliationOutcome::AlreadySettled(_)));

    let booking = db.fetch_booking(booking_id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert!(db.fetch_payments_for_booking(booking_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_payment_cancels_the_hold_and_frees_the_room() {
    let db = new_db().await;
    let api = BookingFlowApi::new(db.clone(), EventProducers::default());
    let oid = OrderId::from("MOMO17000000000004".to_string());
    pending_booking_with_order(&api, &db, &oid).await;

    api.settle(&oid, 1006, Vnd::from(0)).await.expect("Settle failed");

    // The cancelled booking no longer blocks the range, so another guest can take it
    let available = api.check_availability(1, d("2024-03-01"), d("2024-03-04")).await.unwrap();
    assert!(available);
    let retry = api.create_booking(NewBooking::new(2, 1, d("2024-03-01"), d("2024-03-04"))).await;
    assert!(retry.is_ok());
}

#[tokio::test]
async fn unmatched_order_id_changes_nothing() {
    let db = new_db().await;
    let api = BookingFlowApi::new(db.clone(), EventProducers::default());
    let oid = OrderId::from("MOMO17000000000005".to_string());
    let booking_id = pending_booking_with_order(&api, &db, &oid).await;

    let ghost = OrderId::from("MOMO99999999999999".to_string());
    let outcome = api.settle(&ghost, 0, Vnd::from(1_500_000)).await.expect("Settle must not error");
    assert!(matches!(outcome, ReconciliationOutcome::Unmatched));

    let booking = db.fetch_booking(booking_id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert!(db.fetch_payments_for_booking(booking_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn paid_hook_fires_exactly_once_per_settlement() {
    let db = new_db().await;
    let fired = Arc::new(AtomicU64::new(0));
    let counter = fired.clone();
    let mut hooks = EventHooks::default();
    hooks.on_booking_paid(move |_event| {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(8, hooks);
    let api = BookingFlowApi::new(db.clone(), handlers.producers());
    handlers.start_handlers().await;

    let oid = OrderId::from("MOMO17000000000006".to_string());
    pending_booking_with_order(&api, &db, &oid).await;
    api.settle(&oid, 0, Vnd::from(1_500_000)).await.expect("Settle failed");
    api.settle(&oid, 0, Vnd::from(1_500_000)).await.expect("Settle failed");
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

//! The two callback channels, exercised over the real routes: ack semantics for notify, redirect
//! semantics for return, and the retryable-500 contract on storage failure.

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use booking_engine::{db_types::BookingStatus, events::EventProducers, BookingFlowApi};
use hbg_common::Vnd;
use momo_gateway::{MomoApi, MomoConfig};
use serde_json::json;

use super::{
    helpers::{get_redirect, get_request, post_request},
    mocks::{test_booking, test_room, MemoryDatabase},
};
use crate::routes::{MomoCreateRoute, MomoNotifyRoute, MomoReturnRoute};

const ORDER_ID: &str = "MOMO17000000000042";

fn configure(db: MemoryDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = BookingFlowApi::new(db, EventProducers::default());
        let momo = MomoApi::new(MomoConfig::default()).expect("Error building gateway client");
        cfg.service(MomoNotifyRoute::<MemoryDatabase>::new())
            .service(MomoReturnRoute::<MemoryDatabase>::new())
            .service(MomoCreateRoute::<MemoryDatabase>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(momo));
    }
}

fn db_with_pending_order() -> MemoryDatabase {
    MemoryDatabase::default()
        .with_room(test_room(1, "101", Vnd::from(500_000)))
        .with_booking(test_booking(1, 1, BookingStatus::Pending, Some(ORDER_ID)))
}

#[actix_web::test]
async fn notify_success_settles_and_acknowledges() {
    let _ = env_logger::try_init().ok();
    let db = db_with_pending_order();
    let payload = json!({"orderId": ORDER_ID, "resultCode": 0, "amount": 1_500_000});

    let (status, body) = post_request("/payment/momo/notify", payload.clone(), configure(db.clone()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("acknowledged"), "{body}");
    assert_eq!(db.booking(1).unwrap().status, BookingStatus::Paid);
    assert_eq!(db.payments().len(), 1);

    // Redelivery acks again without a second payment
    let (status, _) = post_request("/payment/momo/notify", payload, configure(db.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(db.payments().len(), 1);
}

#[actix_web::test]
async fn notify_failure_cancels_without_a_payment() {
    let _ = env_logger::try_init().ok();
    let db = db_with_pending_order();
    let payload = json!({"orderId": ORDER_ID, "resultCode": 1006, "amount": 0, "message": "User denied"});

    let (status, _) = post_request("/payment/momo/notify", payload, configure(db.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(db.booking(1).unwrap().status, BookingStatus::Cancelled);
    assert!(db.payments().is_empty());
}

#[actix_web::test]
async fn notify_with_unknown_order_still_acknowledges() {
    let _ = env_logger::try_init().ok();
    let db = db_with_pending_order();
    let payload = json!({"orderId": "MOMO000NOSUCH", "resultCode": 0, "amount": 1_500_000});

    let (status, body) = post_request("/payment/momo/notify", payload, configure(db.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK, "unmatched must ack to stop redelivery: {body}");
    assert_eq!(db.booking(1).unwrap().status, BookingStatus::Pending);
    assert!(db.payments().is_empty());
}

#[actix_web::test]
async fn notify_storage_failure_is_retryable() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::failing_storage();
    let payload = json!({"orderId": ORDER_ID, "resultCode": 0, "amount": 1_500_000});

    let (status, _) = post_request("/payment/momo/notify", payload, configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "a transient fault must trigger gateway redelivery");
}

#[actix_web::test]
async fn return_redirects_to_the_confirmation_view() {
    let _ = env_logger::try_init().ok();
    let db = db_with_pending_order();
    let path = format!("/payment/momo/return?orderId={ORDER_ID}&resultCode=0&amount=1500000");

    let (status, location) = get_redirect(&path, configure(db.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, "/payment/result?bookingId=1&status=paid");
    assert_eq!(db.booking(1).unwrap().status, BookingStatus::Paid);
    assert_eq!(db.payments().len(), 1);

    // A refresh of the return page must not settle twice; it lands on the same confirmation view
    let (status, location) = get_redirect(&path, configure(db.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, "/payment/result?bookingId=1&status=paid");
    assert_eq!(db.payments().len(), 1);
}

#[actix_web::test]
async fn return_before_notify_matches_notify_before_return() {
    let _ = env_logger::try_init().ok();
    // Return first, then notify
    let db_a = db_with_pending_order();
    let path = format!("/payment/momo/return?orderId={ORDER_ID}&resultCode=0&amount=1500000");
    let notify = json!({"orderId": ORDER_ID, "resultCode": 0, "amount": 1_500_000});
    get_request(&path, configure(db_a.clone())).await.expect("Request failed");
    post_request("/payment/momo/notify", notify.clone(), configure(db_a.clone())).await.expect("Request failed");

    // Notify first, then return
    let db_b = db_with_pending_order();
    post_request("/payment/momo/notify", notify, configure(db_b.clone())).await.expect("Request failed");
    get_request(&path, configure(db_b.clone())).await.expect("Request failed");

    let (a, b) = (db_a.booking(1).unwrap(), db_b.booking(1).unwrap());
    assert_eq!(a.status, BookingStatus::Paid);
    assert_eq!(b.status, BookingStatus::Paid);
    assert_eq!(db_a.payments().len(), 1);
    assert_eq!(db_b.payments().len(), 1);
}

#[actix_web::test]
async fn return_with_unknown_order_shows_the_error_page() {
    let _ = env_logger::try_init().ok();
    let db = db_with_pending_order();
    let path = "/payment/momo/return?orderId=MOMO000NOSUCH&resultCode=0";

    let (status, location) = get_redirect(path, configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, "/payment/result?status=error");
}

#[actix_web::test]
async fn return_on_storage_failure_points_at_support() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::failing_storage();
    let path = format!("/payment/momo/return?orderId={ORDER_ID}&resultCode=0");

    // The gateway never replays this channel, so the user gets a support pointer instead of a 500
    let (status, location) = get_redirect(&path, configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, format!("/payment/result?status=support&orderId={ORDER_ID}"));
}

#[actix_web::test]
async fn initiation_rejects_unknown_and_settled_bookings() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::default()
        .with_room(test_room(1, "101", Vnd::from(500_000)))
        .with_booking(test_booking(1, 1, BookingStatus::Paid, Some(ORDER_ID)));

    let (status, _) = post_request("/payment/momo/create", json!({"booking_id": 99}), configure(db.clone()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post_request("/payment/momo/create", json!({"booking_id": 1}), configure(db))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

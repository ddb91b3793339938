use actix_web::{http::StatusCode, web, web::ServiceConfig};
use booking_engine::{
    db_types::BookingStatus,
    events::EventProducers,
    BookingApi,
    BookingFlowApi,
};
use hbg_common::Vnd;
use serde_json::json;

use super::{
    helpers::{get_request, post_request},
    mocks::{test_booking, test_room, MemoryDatabase, MockBookingManager},
};
use crate::routes::{
    BookingByIdRoute,
    BookingByOrderIdRoute,
    BookingPaymentsRoute,
    CreateBookingRoute,
    SearchRoomsRoute,
    UpdateBookingStatusRoute,
};

fn configure_reads(db: MockBookingManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = BookingApi::new(db);
        cfg.service(BookingByIdRoute::<MockBookingManager>::new())
            .service(BookingByOrderIdRoute::<MockBookingManager>::new())
            .service(BookingPaymentsRoute::<MockBookingManager>::new())
            .service(SearchRoomsRoute::<MockBookingManager>::new())
            .app_data(web::Data::new(api));
    }
}

fn configure_writes(db: MemoryDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = BookingFlowApi::new(db, EventProducers::default());
        cfg.service(CreateBookingRoute::<MemoryDatabase>::new())
            .service(UpdateBookingStatusRoute::<MemoryDatabase>::new())
            .app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn fetch_unknown_booking_is_a_404() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBookingManager::new();
    db.expect_fetch_booking().returning(|_| Ok(None));
    let (status, body) = get_request("/bookings/42", configure_reads(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Booking 42 does not exist"), "{body}");
}

#[actix_web::test]
async fn fetch_booking_returns_the_record() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBookingManager::new();
    db.expect_fetch_booking()
        .returning(|id| Ok(Some(test_booking(id, 7, BookingStatus::Pending, None))));
    let (status, body) = get_request("/bookings/42", configure_reads(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let booking: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(booking["id"], 42);
    assert_eq!(booking["room_id"], 7);
    assert_eq!(booking["status"], "pending");
}

#[actix_web::test]
async fn lookup_by_order_id_finds_the_referencing_booking() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBookingManager::new();
    db.expect_fetch_booking_by_order_id().returning(|order_id| {
        if order_id.as_str() == "MOMO17000000000042" {
            Ok(Some(test_booking(7, 1, BookingStatus::Paid, Some("MOMO17000000000042"))))
        } else {
            Ok(None)
        }
    });
    let (status, body) =
        get_request("/payment/momo/orders/MOMO17000000000042", configure_reads(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let booking: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(booking["id"], 7);
    assert_eq!(booking["momo_order_id"], "MOMO17000000000042");

    let mut db = MockBookingManager::new();
    db.expect_fetch_booking_by_order_id().returning(|_| Ok(None));
    let (status, _) =
        get_request("/payment/momo/orders/MOMO000NOSUCH", configure_reads(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn room_search_annotates_availability() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBookingManager::new();
    db.expect_fetch_rooms()
        .returning(|| Ok(vec![test_room(1, "101", Vnd::from(500_000)), test_room(2, "102", Vnd::from(700_000))]));
    db.expect_room_is_available().returning(|room_id, _, _| Ok(room_id == 1));
    let (status, body) = get_request("/rooms/search?check_in=2024-03-01&check_out=2024-03-04", configure_reads(db))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let rooms: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(rooms[0]["room"]["room_number"], "101");
    assert_eq!(rooms[0]["available"], true);
    assert_eq!(rooms[1]["available"], false);
}

#[actix_web::test]
async fn create_booking_round_trip() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::default().with_room(test_room(1, "101", Vnd::from(500_000)));
    let (status, body) = post_request(
        "/bookings",
        json!({"user_id": 1, "room_id": 1, "check_in": "2024-03-01", "check_out": "2024-03-04", "guests": 2}),
        configure_writes(db.clone()),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let booking: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["total_price"], 1_500_000);
    assert!(db.booking(1).is_some());
}

#[actix_web::test]
async fn create_booking_rejects_bad_ranges_and_unknown_rooms() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::default().with_room(test_room(1, "101", Vnd::from(500_000)));

    let (status, _) = post_request(
        "/bookings",
        json!({"user_id": 1, "room_id": 1, "check_in": "2024-03-04", "check_out": "2024-03-01"}),
        configure_writes(db.clone()),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_request(
        "/bookings",
        json!({"user_id": 1, "room_id": 99, "check_in": "2024-03-01", "check_out": "2024-03-04"}),
        configure_writes(db),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn create_booking_conflict_is_a_409() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::default()
        .with_room(test_room(1, "101", Vnd::from(500_000)))
        .with_booking(test_booking(1, 1, BookingStatus::Paid, None));
    let (status, body) = post_request(
        "/bookings",
        json!({"user_id": 2, "room_id": 1, "check_in": "2024-03-02", "check_out": "2024-03-05"}),
        configure_writes(db),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[actix_web::test]
async fn admin_can_cancel_a_pending_booking() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::default().with_booking(test_booking(1, 1, BookingStatus::Pending, None));
    let (status, body) =
        post_request("/bookings/1/status", json!({"status": "cancelled"}), configure_writes(db.clone()))
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(db.booking(1).unwrap().status, BookingStatus::Cancelled);
}

#[actix_web::test]
async fn terminal_statuses_reject_transitions() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::default().with_booking(test_booking(1, 1, BookingStatus::Cancelled, None));
    let (status, _) = post_request("/bookings/1/status", json!({"status": "paid"}), configure_writes(db.clone()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(db.booking(1).unwrap().status, BookingStatus::Cancelled);
}

#[actix_web::test]
async fn garbage_status_is_a_400() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::default().with_booking(test_booking(1, 1, BookingStatus::Pending, None));
    let (status, _) = post_request("/bookings/1/status", json!({"status": "teleported"}), configure_writes(db))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

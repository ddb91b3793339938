//! Row seeding for integration tests. Rooms and discounts are admin-CRUD territory in production, so
//! tests insert them directly.

use chrono::{DateTime, Utc};
use hbg_common::Vnd;
use sqlx::SqlitePool;

use crate::db_types::{Discount, Room};

pub async fn seed_room(pool: &SqlitePool, room_number: &str, nightly_price: Vnd) -> Room {
    sqlx::query_as(
        r#"
            INSERT INTO rooms (room_number, room_type, price, description)
            VALUES ($1, 'standard', $2, 'seeded test room')
            RETURNING *;
        "#,
    )
    .bind(room_number)
    .bind(nightly_price)
    .fetch_one(pool)
    .await
    .expect("Error seeding room")
}

pub async fn seed_percent_discount(
    pool: &SqlitePool,
    code: &str,
    percent: i64,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Discount {
    let (start, end) = match window {
        Some((s, e)) => (Some(s), Some(e)),
        None => (None, None),
    };
    sqlx::query_as(
        r#"
            INSERT INTO discounts (code, percent, start_date, end_date, active)
            VALUES ($1, $2, $3, $4, 1)
            RETURNING *;
        "#,
    )
    .bind(code.to_uppercase())
    .bind(percent)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
    .expect("Error seeding discount")
}

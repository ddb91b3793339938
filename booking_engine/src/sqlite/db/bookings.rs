use chrono::NaiveDate;
use hbg_common::Vnd;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Booking, BookingStatus, NewBooking, OrderId},
    flow_api::booking_objects::BookingQueryFilter,
    traits::BookingGatewayError,
};

/// The SQL form of [`BookingStatus::BLOCKING`], used by the availability guard.
const BLOCKING_STATUSES_SQL: &str = "('pending', 'paid', 'checked_in')";

/// Inserts a `pending` booking, provided no blocking booking overlaps `[check_in, check_out)` for the
/// room. The guard and the insert are one statement, so two concurrent attempts for overlapping ranges
/// serialize on the database and only one can succeed.
///
/// Returns `None` if a blocking overlap exists.
pub async fn insert_if_available(
    booking: NewBooking,
    total_price: Vnd,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, BookingGatewayError> {
    let sql = format!(
        r#"
            INSERT INTO bookings (user_id, room_id, check_in, check_out, guests, total_price, discount_code)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE NOT EXISTS (
                SELECT 1 FROM bookings
                WHERE room_id = $2
                  AND status IN {BLOCKING_STATUSES_SQL}
                  AND check_in < $4
                  AND check_out > $3
            )
            RETURNING *;
        "#
    );
    let inserted: Option<Booking> = sqlx::query_as(&sql)
    .bind(booking.user_id)
    .bind(booking.room_id)
    .bind(booking.check_in)
    .bind(booking.check_out)
    .bind(booking.guests)
    .bind(total_price)
    .bind(booking.discount_code)
    .fetch_optional(conn)
    .await?;
    if let Some(booking) = &inserted {
        debug!("📝️ Booking inserted with id {}", booking.id);
    }
    Ok(inserted)
}

pub async fn fetch_booking_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Booking>, sqlx::Error> {
    let booking = sqlx::query_as("SELECT * FROM bookings WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(booking)
}

/// Returns the booking carrying the given correlation id, if any. The column is unique, so at most one
/// booking can match.
pub async fn fetch_booking_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, sqlx::Error> {
    let booking = sqlx::query_as("SELECT * FROM bookings WHERE momo_order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(booking)
}

pub async fn fetch_bookings_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Booking>, sqlx::Error> {
    let bookings = sqlx::query_as("SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(bookings)
}

/// Whether a blocking booking overlaps `[check_in, check_out)` for the room, using half-open semantics.
pub async fn blocking_overlap_exists(
    room_id: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        &format!(
            "SELECT COUNT(*) FROM bookings WHERE room_id = $1 AND status IN {BLOCKING_STATUSES_SQL} AND check_in < $3 AND check_out > $2"
        ),
    )
    .bind(room_id)
    .bind(check_in)
    .bind(check_out)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Attaches a payment reference to a booking at initiation time: the fresh correlation id, the amount
/// sent to the gateway, and the coupon code used. Only `pending` bookings qualify; a second initiation
/// for the same pending booking replaces the reference.
///
/// Returns `None` if the booking does not exist or is no longer pending.
pub async fn attach_payment_reference(
    booking_id: i64,
    order_id: &OrderId,
    amount: Vnd,
    discount_code: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, BookingGatewayError> {
    let booking = sqlx::query_as(
        r#"
            UPDATE bookings
            SET momo_order_id = $2, amount_after_discount = $3, discount_code = $4, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(booking_id)
    .bind(order_id.as_str())
    .bind(amount)
    .bind(discount_code)
    .fetch_optional(conn)
    .await?;
    Ok(booking)
}

/// The compare-and-swap at the heart of reconciliation: transitions the booking carrying `order_id` out
/// of `pending` into `new_status`. Returns the updated booking iff this call performed the transition;
/// `None` means there was nothing in `pending` to transition (already settled, or unknown id).
pub async fn try_settle(
    order_id: &OrderId,
    new_status: BookingStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, BookingGatewayError> {
    let booking = sqlx::query_as(
        r#"
            UPDATE bookings
            SET status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE momo_order_id = $1 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(new_status)
    .fetch_optional(conn)
    .await?;
    Ok(booking)
}

pub(crate) async fn update_booking_status(
    id: i64,
    status: BookingStatus,
    conn: &mut SqliteConnection,
) -> Result<Booking, BookingGatewayError> {
    let result: Option<Booking> =
        sqlx::query_as("UPDATE bookings SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(BookingGatewayError::BookingIdNotFound(id))
}

/// Fetches bookings according to criteria specified in the `BookingQueryFilter`.
///
/// Resulting bookings are ordered by `created_at` in ascending order.
pub async fn search_bookings(
    query: BookingQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Booking>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM bookings
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(room_id) = query.room_id {
        where_clause.push("room_id = ");
        where_clause.push_bind_unseparated(room_id);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(check_in_after) = query.check_in_after {
        where_clause.push("check_in >= ");
        where_clause.push_bind_unseparated(check_in_after);
    }
    if let Some(check_out_before) = query.check_out_before {
        where_clause.push("check_out <= ");
        where_clause.push_bind_unseparated(check_out_before);
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Booking>();
    let bookings = query.fetch_all(conn).await?;
    trace!("Result of search_bookings: {:?}", bookings.len());
    Ok(bookings)
}

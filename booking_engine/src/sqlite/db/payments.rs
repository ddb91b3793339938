use hbg_common::Vnd;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Payment, MOMO_PAYMENT_METHOD},
    traits::BookingGatewayError,
};

/// Records the single `paid` payment for a settled booking, with `paid_at` stamped by the database at
/// the moment the settlement is committed.
pub async fn insert_paid_payment(
    booking_id: i64,
    amount: Vnd,
    conn: &mut SqliteConnection,
) -> Result<Payment, BookingGatewayError> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (booking_id, amount, method, status, paid_at)
            VALUES ($1, $2, $3, 'paid', CURRENT_TIMESTAMP)
            RETURNING *;
        "#,
    )
    .bind(booking_id)
    .bind(amount)
    .bind(MOMO_PAYMENT_METHOD)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Payment #{} ({amount}) recorded for booking #{booking_id}", payment.id);
    Ok(payment)
}

pub async fn fetch_payments_for_booking(
    booking_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE booking_id = $1 ORDER BY created_at ASC")
        .bind(booking_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

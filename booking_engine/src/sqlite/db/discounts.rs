use sqlx::SqliteConnection;

use crate::db_types::Discount;

/// Looks up a discount by code. Codes are stored uppercase; the lookup uppercases its argument so user
/// input can arrive in any case.
pub async fn fetch_discount_by_code(
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Discount>, sqlx::Error> {
    let discount = sqlx::query_as("SELECT * FROM discounts WHERE code = $1")
        .bind(code.trim().to_uppercase())
        .fetch_optional(conn)
        .await?;
    Ok(discount)
}

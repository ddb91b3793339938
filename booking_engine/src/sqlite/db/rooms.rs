use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::Room;

pub async fn fetch_room(room_id: i64, conn: &mut SqliteConnection) -> Result<Option<Room>, sqlx::Error> {
    let room = sqlx::query_as("SELECT * FROM rooms WHERE id = $1").bind(room_id).fetch_optional(conn).await?;
    Ok(room)
}

pub async fn fetch_rooms(conn: &mut SqliteConnection) -> Result<Vec<Room>, sqlx::Error> {
    let rooms = sqlx::query_as("SELECT * FROM rooms ORDER BY room_number ASC").fetch_all(conn).await?;
    Ok(rooms)
}

/// Raises the advisory occupancy flag on a room. Availability never consults this flag; it exists for
/// back-office listings only.
pub async fn mark_room_booked(room_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE rooms SET is_booked = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1")
        .bind(room_id)
        .execute(conn)
        .await?;
    debug!("📝️ Room #{room_id} flagged as occupied");
    Ok(())
}

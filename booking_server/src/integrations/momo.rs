//! Glue between the booking engine and the wallet gateway for the initiation leg.

use booking_engine::{
    db_types::{BookingStatus, OrderId},
    BookingFlowApi,
    BookingGatewayDatabase,
};
use chrono::Utc;
use log::*;
use momo_gateway::{MomoApi, PaymentRequestParams};

use crate::errors::ServerError;

/// Initiates a wallet payment for a booking and returns the `payUrl` to send the guest to.
///
/// The correlation id is persisted on the booking *before* the gateway is contacted, so a callback can
/// never race ahead of the reference it needs to match. If the gateway then refuses or times out, the
/// booking stays `pending` with a dangling reference; a retry simply overwrites it with a fresh id, and
/// the old id can never settle anything.
pub async fn initiate_momo_payment<B: BookingGatewayDatabase>(
    api: &BookingFlowApi<B>,
    momo: &MomoApi,
    booking_id: i64,
    discount_code: Option<String>,
) -> Result<String, ServerError> {
    let booking = api
        .db()
        .fetch_booking(booking_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Booking {booking_id} does not exist")))?;
    if booking.status != BookingStatus::Pending {
        return Err(ServerError::BookingNotPayable(format!(
            "Booking {booking_id} is {}, only pending bookings can be paid",
            booking.status
        )));
    }
    let room = api
        .db()
        .fetch_room(booking.room_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Room {} does not exist", booking.room_id)))?;

    let amount = api.charge_for_booking(&booking, discount_code.as_deref(), Utc::now()).await?;
    let order_id = OrderId::from(momo_gateway::new_order_id(momo.config()));
    api.register_payment_attempt(booking.id, &order_id, amount, discount_code.as_deref()).await?;

    let params = PaymentRequestParams {
        order_id: order_id.to_string(),
        amount,
        order_info: format!("Thanh toan dat phong {}", room.room_number),
    };
    let pay_url = momo.create_payment(&params).await?;
    info!("💻️💳️ Booking #{booking_id} initiated payment under order [{order_id}]");
    Ok(pay_url)
}

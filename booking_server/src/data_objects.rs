use std::fmt::Display;

use booking_engine::db_types::NewBooking;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBookingRequest {
    pub user_id: i64,
    pub room_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_guests")]
    pub guests: i64,
    #[serde(default)]
    pub discount_code: Option<String>,
}

fn default_guests() -> i64 {
    1
}

impl From<NewBookingRequest> for NewBooking {
    fn from(req: NewBookingRequest) -> Self {
        NewBooking {
            user_id: req.user_id,
            room_id: req.room_id,
            check_in: req.check_in,
            check_out: req.check_out,
            guests: req.guests,
            discount_code: req.discount_code,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Admin booking search. Empty fields do not constrain the search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingSearchQuery {
    pub user_id: Option<i64>,
    pub room_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentRequest {
    pub booking_id: i64,
    #[serde(default)]
    pub discount_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayUrlResponse {
    #[serde(rename = "payUrl")]
    pub pay_url: String,
}

/// The gateway's IPN body. Field names are the gateway's, verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomoNotifyPayload {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "resultCode")]
    pub result_code: i64,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Query string carried by the browser redirect. The gateway encodes `resultCode` as a string here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomoReturnQuery {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "resultCode")]
    pub result_code: i64,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

use hbg_common::Vnd;
use serde::{Deserialize, Serialize};

/// What the caller decides per payment attempt; everything else in the wire request comes from
/// [`crate::MomoConfig`].
#[derive(Debug, Clone)]
pub struct PaymentRequestParams {
    /// Fresh correlation id for this attempt. See [`crate::helpers::new_order_id`].
    pub order_id: String,
    /// The amount to collect. The wire encodes it as an integer string.
    pub amount: Vnd,
    /// Free-text description shown to the guest in the wallet app.
    pub order_info: String,
}

/// The create-payment request body. Field names are the gateway's, verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub partner_code: String,
    pub access_key: String,
    pub request_id: String,
    pub amount: String,
    pub order_id: String,
    pub order_info: String,
    pub redirect_url: String,
    pub ipn_url: String,
    pub extra_data: String,
    pub request_type: String,
    /// Lowercase-hex HMAC-SHA256 over the canonical key-ordered query string. See
    /// [`crate::helpers::raw_signature`].
    pub signature: String,
    pub lang: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    #[serde(default)]
    pub pay_url: Option<String>,
    #[serde(default)]
    pub result_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

use std::env;

use hbg_common::Secret;
use log::*;

/// The MoMo sandbox environment. Override every one of these for production via the `HBG_MOMO_*`
/// variables; the sandbox credentials are public test values.
const DEFAULT_MOMO_ENDPOINT: &str = "https://test-payment.momo.vn/v2/gateway/api/create";
const DEFAULT_MOMO_PARTNER_CODE: &str = "MOMO";
const DEFAULT_MOMO_ACCESS_KEY: &str = "F8BBA842ECF85";
const DEFAULT_MOMO_SECRET_KEY: &str = "K951B6PE1waDMi640xX08PD3vg6EkVlz";
const DEFAULT_REDIRECT_URL: &str = "http://localhost:8360/payment/momo/return";
const DEFAULT_IPN_URL: &str = "http://localhost:8360/payment/momo/notify";

/// Credentials and endpoints for the wallet gateway. Constructed once and injected into [`crate::MomoApi`];
/// never read from ambient state at call time.
#[derive(Clone, Debug)]
pub struct MomoConfig {
    pub partner_code: String,
    pub access_key: String,
    pub secret_key: Secret<String>,
    /// The create-payment endpoint.
    pub endpoint: String,
    /// Where the gateway redirects the guest's browser after payment (the return channel).
    pub redirect_url: String,
    /// Where the gateway posts its server-to-server notification (the notify channel).
    pub ipn_url: String,
    pub request_type: String,
    pub lang: String,
}

impl Default for MomoConfig {
    fn default() -> Self {
        Self {
            partner_code: DEFAULT_MOMO_PARTNER_CODE.to_string(),
            access_key: DEFAULT_MOMO_ACCESS_KEY.to_string(),
            secret_key: Secret::new(DEFAULT_MOMO_SECRET_KEY.to_string()),
            endpoint: DEFAULT_MOMO_ENDPOINT.to_string(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            ipn_url: DEFAULT_IPN_URL.to_string(),
            request_type: "captureWallet".to_string(),
            lang: "vi".to_string(),
        }
    }
}

impl MomoConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let partner_code = env::var("HBG_MOMO_PARTNER_CODE").unwrap_or(defaults.partner_code);
        let access_key = env::var("HBG_MOMO_ACCESS_KEY").unwrap_or_else(|_| {
            warn!("🪛️ HBG_MOMO_ACCESS_KEY is not set. Falling back to the sandbox access key.");
            defaults.access_key
        });
        let secret_key = env::var("HBG_MOMO_SECRET_KEY").map(Secret::new).unwrap_or_else(|_| {
            warn!("🪛️ HBG_MOMO_SECRET_KEY is not set. Falling back to the sandbox secret. Do NOT run production like this.");
            defaults.secret_key
        });
        let endpoint = env::var("HBG_MOMO_ENDPOINT").unwrap_or(defaults.endpoint);
        let redirect_url = env::var("HBG_MOMO_REDIRECT_URL").unwrap_or_else(|_| {
            info!("🪛️ HBG_MOMO_REDIRECT_URL is not set. Using {DEFAULT_REDIRECT_URL}.");
            defaults.redirect_url
        });
        let ipn_url = env::var("HBG_MOMO_IPN_URL").unwrap_or_else(|_| {
            info!("🪛️ HBG_MOMO_IPN_URL is not set. Using {DEFAULT_IPN_URL}.");
            defaults.ipn_url
        });
        Self {
            partner_code,
            access_key,
            secret_key,
            endpoint,
            redirect_url,
            ipn_url,
            request_type: defaults.request_type,
            lang: defaults.lang,
        }
    }
}

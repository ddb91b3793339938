use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::{config::MomoConfig, data_objects::CreatePaymentRequest};

/// Generates a fresh correlation id: partner code, millisecond timestamp, four random digits. Unique
/// per attempt; the uniqueness constraint on the booking column is the backstop.
pub fn new_order_id(config: &MomoConfig) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{}{}{:04}", config.partner_code, Utc::now().timestamp_millis(), suffix)
}

/// The canonical string the gateway verifies the signature against. The key order is part of the wire
/// contract and must not change:
/// `accessKey, amount, extraData, ipnUrl, orderId, orderInfo, partnerCode, redirectUrl, requestId, requestType`.
pub fn raw_signature(req: &CreatePaymentRequest) -> String {
    format!(
        "accessKey={}&amount={}&extraData={}&ipnUrl={}&orderId={}&orderInfo={}&partnerCode={}&redirectUrl={}&requestId={}&requestType={}",
        req.access_key,
        req.amount,
        req.extra_data,
        req.ipn_url,
        req.order_id,
        req.order_info,
        req.partner_code,
        req.redirect_url,
        req.request_id,
        req.request_type,
    )
}

/// Lowercase-hex HMAC-SHA256 of `data` under `key`.
pub fn sign_request(key: &str, data: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn request() -> CreatePaymentRequest {
        CreatePaymentRequest {
            partner_code: "MOMO".to_string(),
            access_key: "F8BBA842ECF85".to_string(),
            request_id: "MOMO17000000000000".to_string(),
            amount: "1350000".to_string(),
            order_id: "MOMO17000000000000".to_string(),
            order_info: "Thanh toan dat phong 101".to_string(),
            redirect_url: "http://localhost:8360/payment/momo/return".to_string(),
            ipn_url: "http://localhost:8360/payment/momo/notify".to_string(),
            extra_data: String::new(),
            request_type: "captureWallet".to_string(),
            signature: String::new(),
            lang: "vi".to_string(),
        }
    }

    #[test]
    fn raw_signature_has_the_exact_field_order() {
        let raw = raw_signature(&request());
        assert_eq!(
            raw,
            "accessKey=F8BBA842ECF85&amount=1350000&extraData=&ipnUrl=http://localhost:8360/payment/momo/notify&\
             orderId=MOMO17000000000000&orderInfo=Thanh toan dat phong 101&partnerCode=MOMO&\
             redirectUrl=http://localhost:8360/payment/momo/return&requestId=MOMO17000000000000&\
             requestType=captureWallet"
        );
    }

    #[test]
    fn signature_is_lowercase_hex_and_deterministic() {
        let raw = raw_signature(&request());
        let sig = sign_request("K951B6PE1waDMi640xX08PD3vg6EkVlz", &raw);
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(sig, sign_request("K951B6PE1waDMi640xX08PD3vg6EkVlz", &raw));
        // Different secrets must not collide
        assert_ne!(sig, sign_request("another-secret", &raw));
    }

    #[test]
    fn order_ids_carry_the_partner_code_and_vary() {
        let config = MomoConfig::default();
        let ids: std::collections::HashSet<String> = (0..5).map(|_| new_order_id(&config)).collect();
        assert!(ids.iter().all(|id| id.starts_with("MOMO") && id.len() > "MOMO".len()));
        // Five draws of a four-digit random suffix cannot realistically all collide
        assert!(ids.len() >= 2);
    }
}

use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::Client;

use crate::{
    config::MomoConfig,
    data_objects::{CreatePaymentRequest, CreatePaymentResponse, PaymentRequestParams},
    helpers::{raw_signature, sign_request},
    MomoApiError,
};

/// The gateway answers well inside this in the happy case; past it we report "unknown", never "failed".
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct MomoApi {
    config: MomoConfig,
    client: Arc<Client>,
}

impl MomoApi {
    pub fn new(config: MomoConfig) -> Result<Self, MomoApiError> {
        let client = Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| MomoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MomoConfig {
        &self.config
    }

    /// Posts a signed create-payment request and returns the `payUrl` to redirect the guest to.
    ///
    /// This is call-and-forget with a timeout: a timeout means the outcome is *unknown* (the gateway may
    /// still call back), so callers must leave the booking untouched and let a callback or an admin
    /// decide. The request is not retried here.
    pub async fn create_payment(&self, params: &PaymentRequestParams) -> Result<String, MomoApiError> {
        let request = self.build_request(params);
        debug!("💳️ Requesting payUrl for order [{}] ({})", request.order_id, request.amount);
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!("💳️ Gateway timed out for order [{}]. Outcome unknown.", request.order_id);
                    MomoApiError::Timeout
                } else {
                    MomoApiError::SendError(e.to_string())
                }
            })?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MomoApiError::SendError(e.to_string()))?;
            return Err(MomoApiError::QueryError { status, message });
        }
        let body: CreatePaymentResponse =
            response.json().await.map_err(|e| MomoApiError::JsonError(e.to_string()))?;
        match body.pay_url {
            Some(pay_url) => {
                info!("💳️ Gateway issued payUrl for order [{}]", request.order_id);
                Ok(pay_url)
            },
            None => {
                let detail = format!(
                    "resultCode: {:?}, message: {}",
                    body.result_code,
                    body.message.unwrap_or_else(|| "none".to_string())
                );
                Err(MomoApiError::NoPayUrl(detail))
            },
        }
    }

    /// Assembles and signs the wire request. `requestId` mirrors `orderId`, as the gateway examples do.
    fn build_request(&self, params: &PaymentRequestParams) -> CreatePaymentRequest {
        let mut request = CreatePaymentRequest {
            partner_code: self.config.partner_code.clone(),
            access_key: self.config.access_key.clone(),
            request_id: params.order_id.clone(),
            amount: params.amount.value().to_string(),
            order_id: params.order_id.clone(),
            order_info: params.order_info.clone(),
            redirect_url: self.config.redirect_url.clone(),
            ipn_url: self.config.ipn_url.clone(),
            extra_data: String::new(),
            request_type: self.config.request_type.clone(),
            signature: String::new(),
            lang: self.config.lang.clone(),
        };
        let raw = raw_signature(&request);
        request.signature = sign_request(self.config.secret_key.reveal(), &raw);
        request
    }
}

#[cfg(test)]
mod test {
    use hbg_common::Vnd;

    use super::*;

    #[test]
    fn build_request_signs_the_canonical_string() {
        let api = MomoApi::new(MomoConfig::default()).unwrap();
        let params = PaymentRequestParams {
            order_id: "MOMO17000000000000".to_string(),
            amount: Vnd::from(1_350_000),
            order_info: "Thanh toan dat phong 101".to_string(),
        };
        let request = api.build_request(&params);
        assert_eq!(request.amount, "1350000");
        assert_eq!(request.request_id, request.order_id);
        let expected = sign_request(api.config().secret_key.reveal(), &raw_signature(&request));
        assert_eq!(request.signature, expected);
    }
}

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MomoApiError {
    #[error("Error initializing the MoMo API client: {0}")]
    Initialization(String),
    #[error("Could not reach the payment gateway: {0}")]
    SendError(String),
    /// The request may or may not have been received. Callers must treat this as "unknown", not as a
    /// failure verdict; only a callback settles the booking.
    #[error("The payment gateway did not respond in time")]
    Timeout,
    #[error("The payment gateway returned an error. Status: {status}, {message}")]
    QueryError { status: u16, message: String },
    #[error("Error decoding the gateway response: {0}")]
    JsonError(String),
    #[error("The gateway response did not contain a payUrl: {0}")]
    NoPayUrl(String),
}

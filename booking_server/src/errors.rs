use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use booking_engine::{BookingApiError, BookingGatewayError};
use momo_gateway::MomoApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid date range. {0}")]
    InvalidDateRange(String),
    #[error("The room is not available for the requested dates. {0}")]
    RoomUnavailable(String),
    #[error("The requested status change is not permitted. {0}")]
    StatusChangeRejected(String),
    #[error("The booking cannot accept a payment. {0}")]
    BookingNotPayable(String),
    #[error("Payment initiation failed. {0}")]
    PaymentInitiationError(#[from] MomoApiError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidDateRange(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::RoomUnavailable(_) => StatusCode::CONFLICT,
            Self::StatusChangeRejected(_) => StatusCode::CONFLICT,
            Self::BookingNotPayable(_) => StatusCode::CONFLICT,
            Self::PaymentInitiationError(e) => match e {
                // Unknown outcome: the gateway may still call back, so tell the client to wait, not retry
                MomoApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<BookingGatewayError> for ServerError {
    fn from(e: BookingGatewayError) -> Self {
        match e {
            BookingGatewayError::RoomNotFound(_) | BookingGatewayError::BookingIdNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            BookingGatewayError::RoomUnavailable(_) => Self::RoomUnavailable(e.to_string()),
            BookingGatewayError::InvalidDateRange { .. } => Self::InvalidDateRange(e.to_string()),
            BookingGatewayError::BookingNotPayable(_) => Self::BookingNotPayable(e.to_string()),
            BookingGatewayError::StatusChangeNoOp | BookingGatewayError::StatusChangeForbidden => {
                Self::StatusChangeRejected(e.to_string())
            },
            BookingGatewayError::DatabaseError(_) | BookingGatewayError::QueryError(_) => {
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<BookingApiError> for ServerError {
    fn from(e: BookingApiError) -> Self {
        match e {
            BookingApiError::QueryError(msg) => Self::InvalidRequestBody(msg),
            BookingApiError::DatabaseError(msg) => Self::BackendError(msg),
        }
    }
}

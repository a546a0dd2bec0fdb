use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use storefront_payment_engine::{PaymentStatusError, SqliteDatabaseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Refund request rejected. {0}")]
    RefundRejected(String),
    #[error("Conflict. {0}")]
    Conflict(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::RefundRejected(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PaymentStatusError> for ServerError {
    fn from(e: PaymentStatusError) -> Self {
        match e {
            PaymentStatusError::Store(e) => Self::BackendError(e.to_string()),
            PaymentStatusError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentStatusError::OrderExists(_) => Self::Conflict(e.to_string()),
            PaymentStatusError::NotRefundable(_, _) |
            PaymentStatusError::RefundAlreadyRequested(_) |
            PaymentStatusError::InvalidRefundReason => Self::RefundRejected(e.to_string()),
        }
    }
}

impl From<SqliteDatabaseError> for ServerError {
    fn from(e: SqliteDatabaseError) -> Self {
        Self::InitializeError(e.to_string())
    }
}

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use matchpay_engine::traits::{
    ChatApiError,
    ExploreApiError,
    MatchmakingError,
    NotificationApiError,
    SettlementError,
};
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
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not serialize access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("Insufficient funds. {0}")]
    InsufficientFunds(String),
    #[error("The payment signature is invalid.")]
    PaymentSignatureInvalid,
    #[error("Conflicting payment state. {0}")]
    PaymentConflict(String),
    #[error("Payment gateway error. {0}")]
    GatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientFunds(_) => StatusCode::BAD_REQUEST,
            Self::PaymentSignatureInvalid => StatusCode::BAD_REQUEST,
            Self::PaymentConflict(_) => StatusCode::CONFLICT,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}

impl From<MatchmakingError> for ServerError {
    fn from(e: MatchmakingError) -> Self {
        match e {
            MatchmakingError::SelfSwipe => Self::InvalidRequest(e.to_string()),
            MatchmakingError::NothingToUndo(_) => Self::NoRecordFound(e.to_string()),
            MatchmakingError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<ChatApiError> for ServerError {
    fn from(e: ChatApiError) -> Self {
        match e {
            ChatApiError::EmptyMessage => Self::InvalidRequest(e.to_string()),
            ChatApiError::NotMatched(_, _) => Self::InvalidRequest(e.to_string()),
            ChatApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<NotificationApiError> for ServerError {
    fn from(e: NotificationApiError) -> Self {
        match e {
            NotificationApiError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            NotificationApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<ExploreApiError> for ServerError {
    fn from(e: ExploreApiError) -> Self {
        match e {
            ExploreApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            ExploreApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::OrderNotFound(_) | SettlementError::TransactionNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            SettlementError::PayoutNotFound(_) => Self::NoRecordFound(e.to_string()),
            SettlementError::DuplicateOrder(_) => Self::InvalidRequest(e.to_string()),
            SettlementError::InvalidAmount(_) => Self::InvalidRequest(e.to_string()),
            SettlementError::InvalidSignature => Self::PaymentSignatureInvalid,
            SettlementError::ReconciliationConflict { .. } => Self::PaymentConflict(e.to_string()),
            SettlementError::InsufficientFunds { .. } => Self::InsufficientFunds(e.to_string()),
            SettlementError::Gateway(e) => Self::GatewayError(e.to_string()),
            SettlementError::IllegalPayoutTransition(_, _) => Self::BackendError(e.to_string()),
            SettlementError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

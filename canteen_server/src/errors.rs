use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use canteen_engine::traits::{CartError, CatalogError, OrderFlowError, UserApiError};
use log::error;
use thiserror::Error;

use crate::integrations::GatewayError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    ValidationError(String),
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
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not issue access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Payment verification failed. {0}")]
    PaymentVerificationError(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("A third-party service failed. {0}")]
    DependencyError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::PaymentVerificationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidState(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DependencyError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Invalid mobile number or password.")]
    InvalidCredentials,
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            OrderFlowError::MissingPaymentDetails |
            OrderFlowError::InvalidOrder(_) |
            OrderFlowError::InvalidStatus(_) => Self::ValidationError(e.to_string()),
            OrderFlowError::InvalidPaymentSignature => Self::PaymentVerificationError("Invalid signature".into()),
            OrderFlowError::OrderNotFound(_) | OrderFlowError::CanteenNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::NotYourOrder | OrderFlowError::NotYourCanteenOrder => {
                Self::InsufficientPermissions(e.to_string())
            },
            OrderFlowError::CannotCancel { .. } | OrderFlowError::ForbiddenTransition { .. } => {
                Self::InvalidState(e.to_string())
            },
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            CartError::MenuItemNotFound(_) | CartError::CanteenNotFound(_) | CartError::ItemNotInCart(_) => {
                Self::NoRecordFound(e.to_string())
            },
            CartError::ItemUnavailable(_) | CartError::EmptyCart => Self::ValidationError(e.to_string()),
            CartError::CanteenClosed(_) => Self::InvalidState(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            CatalogError::CanteenNotFound(_) |
            CatalogError::MenuItemNotFound(_) |
            CatalogError::UserNotFound(_) |
            CatalogError::RequestNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::RequestAlreadyApproved(_) | CatalogError::CanteenHasOrders(_) => {
                Self::InvalidState(e.to_string())
            },
            CatalogError::NotCanteenAdmin(_) => Self::InsufficientPermissions(e.to_string()),
            CatalogError::ValidationError(_) => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<UserApiError> for ServerError {
    fn from(e: UserApiError) -> Self {
        match e {
            UserApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            UserApiError::UserAlreadyExists(_) => Self::ValidationError("User already exists".into()),
            UserApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            UserApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            UserApiError::ValidationError(_) => Self::ValidationError(e.to_string()),
            UserApiError::PasswordHashError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        Self::DependencyError(e.to_string())
    }
}

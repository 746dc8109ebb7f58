use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use loyalty_engine::{AccountApiError, AuthApiError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
    #[error("Order {0} has already been uploaded by another user")]
    OrderOwnedByAnotherUser(String),
    #[error("A withdrawal against order {0} has already been made")]
    DuplicateWithdrawal(String),
    #[error("Insufficient funds")]
    InsufficientFunds,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
                AuthError::PasswordHashError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::LoginTaken(_) => StatusCode::CONFLICT,
            Self::OrderOwnedByAnotherUser(_) => StatusCode::CONFLICT,
            Self::DuplicateWithdrawal(_) => StatusCode::CONFLICT,
            Self::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
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

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No session token was found in the request. Please log in first.")]
    MissingToken,
    #[error("Session token is invalid. {0}")]
    ValidationError(String),
    #[error("Session token has expired.")]
    ExpiredToken,
    #[error("Invalid login or password.")]
    InvalidCredentials,
    #[error("Login and password must not be empty.")]
    MissingCredentials,
    #[error("Could not process the password. {0}")]
    PasswordHashError(String),
    #[error("Could not issue a session token. {0}")]
    CouldNotIssueToken(String),
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::UsernameTaken(login) => Self::LoginTaken(login),
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::PasswordHashError(e) => Self::AuthenticationError(AuthError::PasswordHashError(e)),
            AuthApiError::DatabaseError(e) => {
                error!("💻️ Database error in auth API: {e}");
                Self::BackendError(format!("Database error: {e}"))
            },
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        error!("💻️ Account API error: {e}");
        Self::BackendError(e.to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::InvalidOrderNumber(_) | OrderFlowError::NonPositiveAmount => {
                Self::UnprocessableEntity(e.to_string())
            },
            OrderFlowError::DatabaseError(e) => {
                error!("💻️ Order flow error: {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

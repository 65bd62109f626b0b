use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

/// Coarse classification of an [`Error`], derived from its code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    Capacity,
    InvalidState,
    Transient,
    Internal,
}

impl Error {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.code {
            100 => ErrorKind::InvalidState,
            101 => ErrorKind::Validation,
            102 => ErrorKind::NotFound,
            103 => ErrorKind::Authorization,
            104 => ErrorKind::Capacity,
            6 | 7 => ErrorKind::Transient,
            _ => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Capacity | ErrorKind::InvalidState => StatusCode::CONFLICT,
            ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid_state_error(message: impl Into<String>) -> Self {
        Self::new(100, message)
    }

    pub fn invalid_input_error(message: impl Into<String>) -> Self {
        Self::new(101, message)
    }

    pub fn not_found_error(what: &str) -> Self {
        Self::new(102, format!("{} not found", what))
    }

    pub fn unauthorized_error() -> Self {
        Self::new(103, "unauthorized")
    }

    pub fn capacity_error(message: impl Into<String>) -> Self {
        Self::new(104, message)
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(1, message)
    }

    pub fn upstream_error() -> Self {
        Self::new(4, "upstream error")
    }

    pub fn unexpected_error() -> Self {
        Self::new(5, "unexpected error")
    }

    pub fn store_unavailable_error() -> Self {
        Self::new(6, "store unavailable")
    }

    pub fn timeout_error() -> Self {
        Self::new(7, "store call timed out")
    }

    pub fn is_invalid_state_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidState
    }

    pub fn is_invalid_input_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_not_found_error(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_unauthorized_error(&self) -> bool {
        self.kind() == ErrorKind::Authorization
    }

    pub fn is_capacity_error(&self) -> bool {
        self.kind() == ErrorKind::Capacity
    }

    pub fn is_transient_error(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        Self::new(1, format!("environment variable error: {}", err))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => {
                tracing::warn!(error = %err, "store unavailable");
                Self::store_unavailable_error()
            }
            _ => {
                tracing::error!(error = %err, "database error");
                Self::new(2, "database error")
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::new(3, format!("reqwest error: {}", err))
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        Self::new(8, format!("authorizor error: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::timeout_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let error_message = match self.kind() {
            ErrorKind::Internal => {
                tracing::error!(code = self.code, message = %self.message, "internal error");
                "Internal Server Error".to_string()
            }
            _ => self.message,
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

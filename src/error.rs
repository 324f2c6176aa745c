use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Application error taxonomy.
///
/// The first four variants are expected business outcomes and are surfaced
/// to callers as-is. `UnknownPlan`, `Storage`, `Pool` and `Internal` are
/// server faults: they are logged with full context and masked behind a
/// generic message before leaving the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid or already used activation code")]
    InvalidCode,

    #[error("device already has a binding")]
    AlreadyBound,

    #[error("device is not activated")]
    Unauthorized,

    #[error("subscription has expired")]
    Expired,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("code references plan '{0}' missing from configuration")]
    UnknownPlan(String),

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    error: String,
}

impl AppError {
    /// Stable machine-readable tag for clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCode => "invalid_code",
            Self::AlreadyBound => "already_bound",
            Self::Unauthorized => "unauthorized",
            Self::Expired => "expired",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::UnknownPlan(_) | Self::Storage(_) | Self::Pool(_) | Self::Internal(_) => {
                "internal"
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCode => StatusCode::FORBIDDEN,
            Self::AlreadyBound => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Expired => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnknownPlan(_) | Self::Storage(_) | Self::Pool(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show untrusted callers. Storage detail stays in logs.
    fn public_message(&self) -> String {
        match self {
            Self::UnknownPlan(_) | Self::Storage(_) | Self::Pool(_) | Self::Internal(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(ErrorBody {
            kind: self.kind(),
            error: self.public_message(),
        });
        (status, body).into_response()
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// AppError
///
/// The crate-wide error taxonomy. Every handler returns `Result<_, AppError>`,
/// and the `IntoResponse` impl maps each variant onto the HTTP status the
/// client contract expects. Policy denials and credential failures both map
/// to 401; clients must not branch on the message text.
#[derive(Debug, Error)]
pub enum AppError {
    /// The addressed record (admin, news, category) does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Bad credentials, missing password, or an authorization policy denial.
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed input: invalid id, missing required field, bad multipart body.
    #[error("{0}")]
    BadRequest(String),

    /// Uniqueness violation (duplicate username).
    #[error("{0}")]
    Conflict(String),

    /// Unexpected infrastructure failure. Details are logged, never surfaced.
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({
            "statusCode": status.as_u16(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

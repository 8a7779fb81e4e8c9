use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use starkeep::format_bytes;

/// Handler-level errors, rendered as JSON bodies. No panic path is exposed
/// to the network caller.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("storage limit exceeded")]
    StorageFull { usage: u64 },
    #[error("internal server error")]
    Internal,
}

impl From<starkeep::errors::Error> for AppError {
    fn from(e: starkeep::errors::Error) -> Self {
        use starkeep::errors::Error;

        match e {
            Error::NotFound => Self::NotFound,
            Error::StorageFull { usage } => Self::StorageFull { usage },
            Error::Io(_) | Error::Http(_) | Error::Json(_) | Error::BlobUnavailable => {
                Self::Internal
            }
        }
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(e: actix_multipart::MultipartError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::StorageFull { .. } => StatusCode::INSUFFICIENT_STORAGE,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::StorageFull { usage } => json!({
                "error": "Storage limit exceeded",
                "message": format!(
                    "Upload would exceed the {} storage limit. Current usage: {}",
                    format_bytes(starkeep::MAX_STORAGE_BYTES),
                    format_bytes(*usage),
                ),
            }),
            other => json!({ "error": other.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Service error taxonomy. Validation and not-found errors are caller errors;
/// store and gateway errors surface as opaque failures and are logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid phone number format(s). Use Kenyan format: +254712345678")]
    InvalidPhoneNumbers(Vec<String>),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("SMS gateway error: {0}")]
    Gateway(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidPhoneNumbers(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(rename = "invalidNumbers", skip_serializing_if = "Option::is_none")]
    invalid_numbers: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Store(e) => error!("store error: {}", e),
            AppError::Gateway(reason) => error!("SMS gateway error: {}", reason),
            _ => warn!("request rejected: {}", self),
        }

        let invalid_numbers = match &self {
            AppError::InvalidPhoneNumbers(numbers) => Some(numbers.clone()),
            _ => None,
        };

        let body = ErrorBody {
            error: match &self {
                // Do not leak driver details to callers.
                AppError::Store(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            invalid_numbers,
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

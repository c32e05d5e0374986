use serde::Deserialize;
use thiserror::Error;

use crate::error::Error as TaxonomyError;
use crate::models::SeriesId;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("API key rejected: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// FRED reports failures as `{"error_code": 400, "error_message": "..."}`.
#[derive(Debug, Deserialize)]
struct FredErrorBody {
    error_message: String,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // request URLs carry the api_key query parameter
        ApiError::NetworkError(err.without_url())
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut cut = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    fn message(body: &str) -> String {
        match serde_json::from_str::<FredErrorBody>(body) {
            Ok(parsed) => parsed.error_message,
            Err(_) => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::message(body);
        match status.as_u16() {
            400 => {
                let lower = message.to_lowercase();
                if lower.contains("does not exist") {
                    ApiError::NotFound(message)
                } else if lower.contains("api_key") {
                    ApiError::Unauthorized(message)
                } else {
                    ApiError::BadRequest(message)
                }
            }
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// Map onto the shared taxonomy for a request about `series_id`.
    pub fn into_error(self, series_id: &SeriesId) -> TaxonomyError {
        match self {
            ApiError::NotFound(_) => TaxonomyError::NotFound(series_id.clone()),
            ApiError::RateLimited => TaxonomyError::RateLimited,
            ApiError::Unauthorized(_) | ApiError::AccessDenied(_) => TaxonomyError::InvalidCredential,
            other => TaxonomyError::TransientFailure(other.to_string()),
        }
    }
}

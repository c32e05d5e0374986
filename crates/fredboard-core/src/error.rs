//! Error taxonomy shared by the fetcher, the preference store and the registry.

use thiserror::Error;

use crate::models::SeriesId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Series not found: {0}")]
    NotFound(SeriesId),

    #[error("Series already tracked: {0}")]
    AlreadyExists(SeriesId),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Temporary failure: {0}")]
    TransientFailure(String),

    #[error("Preference storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("API key was rejected by the provider")]
    InvalidCredential,
}

impl Error {
    /// Wrap an I/O or codec failure on the preference medium.
    pub(crate) fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Error::StorageUnavailable(format!("{}: {}", context, err))
    }

    /// Whether trying the same call again later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimited | Error::TransientFailure(_))
    }
}

/// Rejected user input, raised before any network or storage work happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("Series ID must not be empty")]
    EmptySeriesId,

    #[error("Series ID is too long ({0} characters, max {max})", max = crate::models::series::MAX_SERIES_ID_LEN)]
    SeriesIdTooLong(usize),

    #[error("Series ID contains an invalid character: {0:?}")]
    SeriesIdCharacter(char),

    #[error("Unknown line style: {0}")]
    LineStyle(String),

    #[error("Line thickness must be between {min} and {max}, got {0}", min = crate::models::preference::MIN_THICKNESS, max = crate::models::preference::MAX_THICKNESS)]
    Thickness(u8),

    #[error("Color must not be empty")]
    EmptyColor,

    #[error("Unknown date range: {0}")]
    RangePreset(String),

    #[error("Start date {start} is after end date {end}")]
    InvertedRange { start: String, end: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_variants() {
        assert!(Error::RateLimited.is_retryable());
        assert!(Error::TransientFailure("timeout".to_string()).is_retryable());
        assert!(!Error::InvalidCredential.is_retryable());
        assert!(!Error::StorageUnavailable("disk".to_string()).is_retryable());
    }

    #[test]
    fn test_thickness_message() {
        let msg = InvalidInput::Thickness(42).to_string();
        assert_eq!(msg, "Line thickness must be between 1 and 10, got 42");
    }
}

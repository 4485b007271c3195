//! Error taxonomy for Airwatch.
//!
//! Nothing here is fatal to the process. Validation errors are reported at
//! the point of entry, fetch errors surface one level up as a retryable state,
//! and provider errors never leave the guidance generator.

use thiserror::Error;

/// Malformed user input, detected before any collaborator is called.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required form field was empty or blank.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Password shorter than the accepted minimum.
    #[error("Password must be at least {min} characters long.")]
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },

    /// Too many evidence photos attached to a complaint.
    #[error("You can upload a maximum of {max} photos.")]
    TooManyPhotos {
        /// Maximum accepted number of photos.
        max: usize,
    },

    /// A negative or non-finite AQI value.
    #[error("AQI must be a finite, non-negative number (got {value})")]
    AqiOutOfRange {
        /// The rejected value.
        value: f64,
    },
}

/// A data-provider call failed or returned something unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The backend could not be reached or refused the call.
    #[error("data provider unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with an unexpected shape.
    #[error("unexpected response from data provider: {0}")]
    Malformed(String),
}

/// Failure of the external text-generation provider.
///
/// Always absorbed by [`crate::guidance::HealthAdvisor`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body.
        message: String,
    },

    /// The response carried no usable text.
    #[error("provider returned an empty response")]
    Empty,

    /// The call did not finish within the configured bound.
    #[error("provider timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/*!
 * Error types for the decktrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether a retry has any chance of succeeding.
    ///
    /// Authentication failures and other client-side API errors are final;
    /// connection problems, rate limits and server errors are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::AuthenticationError(_) => false,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::ParseError(_) => false,
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
        }
    }
}

/// Errors that can occur while reading or writing a presentation file
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input file could not be opened or is not a valid PPTX archive
    #[error("Cannot open file: {0}")]
    Open(String),

    /// A required part is missing from the archive
    #[error("Missing archive part: {0}")]
    MissingPart(String),

    /// The XML of a slide part could not be parsed
    #[error("XML error in {part}: {message}")]
    Xml {
        /// Archive part the error occurred in
        part: String,
        /// Parser error message
        message: String,
    },

    /// A text unit refers to a location that no longer exists
    #[error("Unit location not found: {0}")]
    UnitLocationMissing(String),

    /// The output file could not be written
    #[error("Failed to save document: {0}")]
    Save(String),
}


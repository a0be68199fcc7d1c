//! Error types for the Ragdesk application.

use thiserror::Error;

/// Classified outcome of a failed backend call.
///
/// Every transport-level failure is converted into one of these variants at
/// the backend client boundary; raw HTTP errors never reach the session
/// controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The request did not complete within its configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The backend could not be reached.
    #[error("Could not connect to the backend")]
    Connection,

    /// The backend answered with a non-200 status code.
    #[error("Backend returned status code: {0}")]
    BackendStatus(u16),

    /// The response body could not be parsed.
    #[error("Malformed backend response: {0}")]
    Decode(String),

    /// Any other failure.
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl QueryError {
    /// Short label used in logs and notices.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::BackendStatus(_) => "backend_status",
            Self::Decode(_) => "decode",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Input rejected locally, before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The question was empty or whitespace-only.
    #[error("Please enter a question.")]
    EmptyQuestion,

    /// A message with no content was offered to the message store.
    #[error("Message content must not be empty")]
    EmptyContent,
}

/// A shared error type for the non-backend parts of Ragdesk
/// (configuration, storage, start-up).
#[derive(Error, Debug, Clone)]
pub enum RagdeskError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Local validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RagdeskError {
    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RagdeskError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RagdeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RagdeskError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, RagdeskError>`.
pub type Result<T> = std::result::Result<T, RagdeskError>;

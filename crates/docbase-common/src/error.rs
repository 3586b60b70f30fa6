//! Error types for docbase

use thiserror::Error;

/// Result type alias for docbase operations
pub type Result<T> = std::result::Result<T, DocbaseError>;

/// MongoDB server code for a unique index violation
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Unified error type for all docbase operations
#[derive(Error, Debug, Clone)]
pub enum DocbaseError {
    #[error("MongoDB error: {0}")]
    MongoDB(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Duplicate key (server code 11000)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Socket read or write timed out
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl DocbaseError {
    /// Returns true if this error is potentially retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, DocbaseError::Timeout(_) | DocbaseError::Connection(_))
    }

    /// Returns true if this is a constraint violation error
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DocbaseError::Conflict(_))
    }
}

impl From<serde_json::Error> for DocbaseError {
    fn from(err: serde_json::Error) -> Self {
        DocbaseError::Serialization(err.to_string())
    }
}

// MongoDB-specific error conversions (when mongodb-errors feature is enabled)
#[cfg(feature = "mongodb-errors")]
impl From<mongodb::error::Error> for DocbaseError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
                classify_server_code(write_error.code, err.to_string())
            }
            ErrorKind::Io(io_error) if io_error.kind() == std::io::ErrorKind::TimedOut => {
                DocbaseError::Timeout(err.to_string())
            }
            // An unreachable server surfaces as a server selection failure
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => DocbaseError::Connection(err.to_string()),
            ErrorKind::InvalidArgument { .. } => DocbaseError::Query(err.to_string()),
            _ => DocbaseError::MongoDB(err.to_string()),
        }
    }
}

/// Map a server write error code to an error variant
pub fn classify_server_code(code: i32, message: String) -> DocbaseError {
    match code {
        DUPLICATE_KEY_CODE => DocbaseError::Conflict(message),
        _ => DocbaseError::MongoDB(message),
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::ser::Error> for DocbaseError {
    fn from(err: bson::ser::Error) -> Self {
        DocbaseError::Serialization(format!("BSON serialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::de::Error> for DocbaseError {
    fn from(err: bson::de::Error) -> Self {
        DocbaseError::Deserialization(format!("BSON deserialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::extjson::de::Error> for DocbaseError {
    fn from(err: bson::extjson::de::Error) -> Self {
        DocbaseError::Deserialization(format!("Extended JSON error: {}", err))
    }
}

//! Error handling for the courseware client

use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Unified error type for the courseware client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The API answered with a non-success status
    #[error("Request failed with status {}: {message}", .status.as_u16())]
    Api {
        /// Response status
        status: StatusCode,
        /// `detail` from the body, or the raw body
        message: String,
    },

    /// File storage errors
    #[error("{0}")]
    Storage(#[from] courseware_storage::StorageError),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Navigation could not be resolved
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Token persistence errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new API error
    pub fn api<T: fmt::Display>(status: StatusCode, msg: T) -> Self {
        Error::Api {
            status,
            message: msg.to_string(),
        }
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new navigation error
    pub fn navigation<T: fmt::Display>(msg: T) -> Self {
        Error::Navigation(msg.to_string())
    }

    /// Create a new persistence error
    pub fn persistence<T: fmt::Display>(msg: T) -> Self {
        Error::Persistence(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// HTTP status of the failed response, if the error came from one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(err) => err.status(),
            _ => None,
        }
    }

    /// Whether the server rejected the session
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Whether the server reported the resource as absent
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_and_status() {
        let err = Error::api(StatusCode::NOT_FOUND, "Course not found");
        assert_eq!(err.to_string(), "Request failed with status 404: Course not found");
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());

        assert!(Error::api(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert_eq!(Error::general("boom").status(), None);
    }

    #[test]
    fn test_storage_error_keeps_user_message() {
        let err: Error = courseware_storage::StorageError::UploadFailed.into();
        assert_eq!(err.to_string(), "Failed to upload file. Please try again.");
    }
}

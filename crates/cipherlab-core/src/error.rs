//! Error types for cipherlab.
//!
//! Engine-specific failures live next to their engines ([`CipherError`],
//! [`SolverError`], [`StegoError`]) and are wrapped transparently here so
//! their messages reach the client unchanged.

use crate::cipher::CipherError;
use crate::solver::SolverError;
use crate::stego::StegoError;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the cipherlab crates.
#[derive(Debug, Error)]
pub enum LabError {
    // Engine errors
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Stego(#[from] StegoError),

    #[error("{message}")]
    Image {
        message: String,
        #[source]
        source: Option<image::ImageError>,
    },

    // Request validation errors
    #[error("{message}")]
    InvalidParams { message: String },

    #[error("unknown request type: {0}")]
    UnknownRequestType(i64),

    #[error("malformed request: {message}")]
    MalformedRequest { message: String },

    // Credential store errors
    #[error("a user named '{username}' already exists")]
    UserExists { username: String },

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // Transport errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("no response from server after {0:?}")]
    Timeout(Duration),

    #[error("connection to {addr} lost")]
    ConnectionLost { addr: String },

    #[error("message of {size} bytes exceeds maximum {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for cipherlab operations.
pub type Result<T> = std::result::Result<T, LabError>;

/// Where in the request pipeline an error belongs.
///
/// Framing errors never produce a response, validation, engine and store
/// errors become error responses, transport errors end the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Framing,
    Validation,
    Engine,
    Store,
    Transport,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Framing => "framing",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Engine => "engine",
            ErrorCategory::Store => "store",
            ErrorCategory::Transport => "transport",
        };
        f.write_str(name)
    }
}

impl From<std::io::Error> for LabError {
    fn from(err: std::io::Error) -> Self {
        LabError::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for LabError {
    fn from(err: serde_json::Error) -> Self {
        LabError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for LabError {
    fn from(err: rusqlite::Error) -> Self {
        LabError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<image::ImageError> for LabError {
    fn from(err: image::ImageError) -> Self {
        LabError::Image {
            message: format!("failed to process image: {}", err),
            source: Some(err),
        }
    }
}

impl LabError {
    /// Shorthand for a request validation failure.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        LabError::InvalidParams {
            message: message.into(),
        }
    }

    /// Classify the error for logging and for deciding whether it is answered.
    pub fn category(&self) -> ErrorCategory {
        match self {
            LabError::MessageTooLarge { .. } => ErrorCategory::Framing,

            LabError::InvalidParams { .. }
            | LabError::UnknownRequestType(_)
            | LabError::MalformedRequest { .. } => ErrorCategory::Validation,

            LabError::Cipher(_)
            | LabError::Solver(_)
            | LabError::Stego(_)
            | LabError::Image { .. } => ErrorCategory::Engine,

            LabError::UserExists { .. }
            | LabError::InvalidCredentials
            | LabError::Database { .. } => ErrorCategory::Store,

            LabError::Io { .. }
            | LabError::Json { .. }
            | LabError::Timeout(_)
            | LabError::ConnectionLost { .. }
            | LabError::Other(_) => ErrorCategory::Transport,
        }
    }

    /// Check if re-sending the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LabError::Timeout(_) | LabError::ConnectionLost { .. } | LabError::Io { .. }
        )
    }
}

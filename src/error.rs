// Error types for cloudmenu
//
// Transport problems live in [`crate::api::ApiError`]; everything the menu
// layer can run into is collected here.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;

/// Main error type for the interactive tool
#[derive(Error, Debug)]
pub enum CliError {
    /// A required environment variable is not set
    #[error("Missing environment variable {name}")]
    MissingEnv { name: String },

    /// Settings file missing or malformed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reading or writing the local JSON cache failed
    #[error("Cache error: {operation} failed on {path}")]
    Cache {
        operation: String,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// HTTP request never produced a response
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A provider record did not have the expected shape
    #[error("Unexpected {what} payload: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Terminal prompt failed
    #[error("Prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    /// Standard input was closed or interrupted
    #[error("Input interrupted")]
    Interrupted,
}

impl CliError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new cache error
    pub fn cache<P: Into<PathBuf>>(
        operation: impl Into<String>,
        path: P,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Cache {
            operation: operation.into(),
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Create a new decode error
    pub fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            what: what.into(),
            source,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CliError>;

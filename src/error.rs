//! Error types for the AURA client

use std::path::PathBuf;

use thiserror::Error;

/// Shown for any analysis failure the backend did not explain.
pub const GENERIC_FAILURE_MESSAGE: &str = "Analysis request failed.";

/// A patient parameter edit that was refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("{field} does not accept {value:?}: not one of the configured options")]
    NotAnOption { field: &'static str, value: String },

    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },
}

impl ParameterError {
    pub(crate) fn not_an_option(field: &'static str, value: &str) -> Self {
        ParameterError::NotAnOption {
            field,
            value: value.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unsupported report file type: {name}")]
    UnsupportedType { name: String },

    #[error("Could not read report file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report file {name} is not valid UTF-8 text")]
    Encoding { name: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Cannot reach analysis backend at {0}")]
    Connect(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    Transport(String),

    #[error("Backend returned HTTP {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("Response parsing failed: {0}")]
    Decode(String),
}

impl BackendError {
    /// Text shown to the user for this failure.
    ///
    /// Only a protocol error carrying a well-formed `detail` message is
    /// passed through; everything else collapses to the generic message.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Status {
                detail: Some(msg), ..
            } => msg.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("Invalid backend base URL {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("Option catalog has no syndromes")]
    EmptyCatalog,
}

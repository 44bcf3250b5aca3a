use std::fmt;

use serde::Serialize;
use ts_rs::TS;

/// Structured error type for the application. Replaces stringly-typed errors
/// so the frontend can match on error codes and display appropriate UI.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(tag = "code", content = "detail")]
#[ts(export)]
pub enum AppError {
    NotFound { what: String },
    ValidationError { message: String },
    IoError { message: String },
    ConfigError { message: String },
    NoDocument,
    NoOutput,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound { what } => write!(f, "{what} not found"),
            AppError::ValidationError { message } => write!(f, "{message}"),
            AppError::IoError { message } => write!(f, "I/O error: {message}"),
            AppError::ConfigError { message } => write!(f, "Config error: {message}"),
            AppError::NoDocument => write!(f, "No document loaded"),
            AppError::NoOutput => write!(f, "No output produced"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::IoError {
            message: e.to_string(),
        }
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(e: crate::config::ConfigError) -> Self {
        match e {
            crate::config::ConfigError::Io(io_err) => AppError::IoError {
                message: io_err.to_string(),
            },
            crate::config::ConfigError::Json(json_err) => AppError::ConfigError {
                message: json_err.to_string(),
            },
            crate::config::ConfigError::InvalidConfig(msg) => {
                AppError::ConfigError { message: msg }
            }
        }
    }
}

/// Allow converting AppError to String for callers that only report text.
impl From<AppError> for String {
    fn from(e: AppError) -> String {
        e.to_string()
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::ValidationError { message: s }
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::ValidationError {
            message: s.to_string(),
        }
    }
}

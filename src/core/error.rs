//! Error types and error handling for the ifc2glb service.
//!
//! This module defines the error types used throughout the
//! application. HTTP status mapping lives in the http adapter.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for ifc2glb operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Main error type for the ifc2glb service
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Missing upload field: {0}")]
    MissingUpload(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Upload exceeds the {0} MB limit")]
    UploadTooLarge(usize),

    #[error("Converter unavailable ({program}): {reason}")]
    ConverterUnavailable { program: String, reason: String },

    #[error("Converter exited with {}: {stderr}", exit_label(.code))]
    ConverterFailed { code: Option<i32>, stderr: String },

    #[error("Converter timed out after {0}s")]
    ConverterTimeout(u64),

    #[error("Converter produced no output at {}", .0.display())]
    OutputMissing(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "signal".to_string(),
    }
}

impl ConvertError {
    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if the request itself was at fault
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingUpload(_)
                | ConvertError::InvalidUpload(_)
                | ConvertError::UploadTooLarge(_)
        )
    }

    /// Check if the external converter is to blame
    pub fn is_converter_fault(&self) -> bool {
        matches!(
            self,
            ConvertError::ConverterUnavailable { .. }
                | ConvertError::ConverterFailed { .. }
                | ConvertError::ConverterTimeout(_)
                | ConvertError::OutputMissing(_)
        )
    }
}

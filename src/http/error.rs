//! HTTP mapping for ConvertError
//!
//! Converts core errors into status codes and JSON bodies for axum.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::core::error::ConvertError;

/// Convert error to appropriate HTTP status code
pub fn status_code(err: &ConvertError) -> StatusCode {
    match err {
        ConvertError::MissingUpload(_) | ConvertError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
        ConvertError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        ConvertError::ConverterUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ConvertError::ConverterFailed { .. } => StatusCode::BAD_GATEWAY,
        ConvertError::ConverterTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ConvertError::OutputMissing(_)
        | ConvertError::ConfigError(_)
        | ConvertError::IoError(_)
        | ConvertError::TomlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Implement IntoResponse for automatic error conversion in Axum
impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let status = status_code(&self);
        let message = self.message();

        if self.is_bad_request() {
            warn!(status = status.as_u16(), error = %message, "Rejected request");
        } else {
            error!(
                status = status.as_u16(),
                converter_fault = self.is_converter_fault(),
                error = %message,
                "Conversion failed"
            );
        }

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

//! HTTP request handlers for the ifc2glb API
//!
//! Implements the startup page, the health check and the conversion
//! endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::debug;

use crate::core::conversion::{ConvertedFile, Upload};
use crate::core::error::{ConvertError, Result};
use crate::core::services::Services;
use crate::core::types::HealthResponse;

/// Multipart field carrying the IFC file
pub const UPLOAD_FIELD: &str = "ifc_file";

/// Startup page handler
pub async fn index_handler() -> &'static str {
    "Startup page"
}

/// Health check handler
///
/// Returns server status, version and the converter setup.
pub async fn health_handler(State(services): State<Arc<Services>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        converter: services.conversion.converter().program().to_string(),
        staging: services.conversion.staging().mode().to_string(),
    })
}

/// Convert handler
///
/// Streams the `ifc_file` multipart field to the converter and streams
/// the result back as an attachment. Fields before `ifc_file` are
/// skipped; anything after it is never read.
///
/// # Errors
///
/// - `InvalidUpload`: body is not multipart or cannot be parsed
/// - `MissingUpload`: no `ifc_file` field
/// - `UploadTooLarge`: body exceeds the configured limit
/// - converter and staging errors from `ConversionService::convert`
pub async fn convert_handler(
    State(services): State<Arc<Services>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let mut multipart = multipart.map_err(|e| ConvertError::InvalidUpload(e.body_text()))?;
    let max_upload_mb = services.config.server.max_upload_mb;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_mb))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = field.name().unwrap_or(""), "Skipping form field");
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let reader = StreamReader::new(
            field.map_err(move |e| std::io::Error::other(multipart_error(e, max_upload_mb))),
        );

        let converted = services
            .conversion
            .convert(Upload { file_name, reader })
            .await?;
        return Ok(attachment(converted));
    }

    Err(ConvertError::MissingUpload(UPLOAD_FIELD.to_string()))
}

fn attachment(converted: ConvertedFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", converted.file_name);

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, converted.content_type.to_string()),
            (header::CONTENT_LENGTH, converted.len.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(converted.output)),
    )
        .into_response()
}

fn multipart_error(e: MultipartError, max_upload_mb: usize) -> ConvertError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ConvertError::UploadTooLarge(max_upload_mb)
    } else {
        ConvertError::InvalidUpload(e.body_text())
    }
}

//! IFC to GLB conversion sequence
//!
//! One linear pass per request: clear the stale output, stream the
//! upload to the staged input, run the converter, remove the staged
//! input, open the output for streaming. The staged input is removed
//! whatever the converter did, and a failed conversion releases its
//! stage before returning.

use std::io::ErrorKind;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};
use tracing::{info, warn};

use crate::core::config::Config;
use crate::core::converter::Converter;
use crate::core::error::{ConvertError, Result};
use crate::core::staging::{Stage, StagingArea};

/// An uploaded source model, read as a byte stream
///
/// Read errors that wrap a [`ConvertError`] surface as that error.
#[derive(Debug)]
pub struct Upload<R> {
    /// Client-supplied file name, if any
    pub file_name: Option<String>,
    pub reader: R,
}

/// A converted model ready to send back
#[derive(Debug)]
pub struct ConvertedFile {
    /// Suggested download name
    pub file_name: String,
    pub content_type: &'static str,
    /// Output size in bytes
    pub len: u64,
    pub output: StagedOutput,
}

/// Open converter output that holds its stage until dropped
///
/// The request's stage is released once the reader goes away, so the
/// output file outlives the conversion call for as long as it is being
/// streamed.
#[derive(Debug)]
pub struct StagedOutput {
    file: File,
    _stage: Stage,
}

impl AsyncRead for StagedOutput {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_read(cx, buf)
    }
}

/// Runs conversions against a staging area and a converter
#[derive(Debug, Clone)]
pub struct ConversionService {
    staging: StagingArea,
    converter: Converter,
    check_exit_status: bool,
}

impl ConversionService {
    pub fn new(config: &Config) -> Self {
        Self {
            staging: StagingArea::new(&config.staging),
            converter: Converter::new(&config.converter),
            check_exit_status: config.converter.check_exit_status,
        }
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Convert one upload
    ///
    /// # Errors
    ///
    /// - `ConverterUnavailable`, `ConverterTimeout`: from the converter
    /// - `ConverterFailed`: non-zero exit while exit status is checked
    /// - `OutputMissing`: converter left nothing at the output path
    /// - `UploadTooLarge`, `InvalidUpload`: carried by the upload stream
    /// - `IoError`: staging failures
    pub async fn convert<R>(&self, upload: Upload<R>) -> Result<ConvertedFile>
    where
        R: AsyncRead,
    {
        let mut stage = self.staging.prepare().await?;

        let staged = self.run_stage(&mut stage, upload).await;
        match staged {
            Ok((file_name, file, len)) => Ok(ConvertedFile {
                content_type: content_type_for(&file_name),
                file_name,
                len,
                output: StagedOutput { file, _stage: stage },
            }),
            Err(e) => {
                stage.cleanup().await;
                Err(e)
            }
        }
    }

    async fn run_stage<R>(&self, stage: &mut Stage, upload: Upload<R>) -> Result<(String, File, u64)>
    where
        R: AsyncRead,
    {
        stage.clear_output().await?;

        let size_bytes = write_input(stage.input(), upload.reader).await?;

        info!(
            input = %stage.input().display(),
            size_bytes,
            original_name = upload.file_name.as_deref().unwrap_or(""),
            "Staged upload"
        );

        let run = self.converter.run(stage.input(), stage.output()).await;
        stage.remove_input().await;
        let run = run?;

        if !run.success {
            if self.check_exit_status {
                return Err(ConvertError::ConverterFailed {
                    code: run.code,
                    stderr: run.stderr,
                });
            }
            warn!(code = ?run.code, "Ignoring converter exit status");
        }

        let file = match File::open(stage.output()).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConvertError::OutputMissing(stage.output().to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();

        let file_name = download_name(
            upload.file_name.as_deref(),
            self.staging.output_file_name(),
        );

        info!(
            file_name = %file_name,
            size_bytes = len,
            converter_ms = run.duration_ms,
            "Conversion complete"
        );

        Ok((file_name, file, len))
    }
}

/// Stream `reader` into a fresh file at `path`
async fn write_input<R: AsyncRead>(path: &Path, reader: R) -> Result<u64> {
    let mut reader = std::pin::pin!(reader);
    let mut file = File::create(path).await?;

    let size = tokio::io::copy(&mut reader, &mut file)
        .await
        .map_err(upload_error)?;
    file.flush().await?;

    Ok(size)
}

/// Unwrap a `ConvertError` smuggled through the upload's io::Error
fn upload_error(e: std::io::Error) -> ConvertError {
    if !e.get_ref().is_some_and(|inner| inner.is::<ConvertError>()) {
        return e.into();
    }

    match e.into_inner().map(|inner| inner.downcast::<ConvertError>()) {
        Some(Ok(err)) => *err,
        _ => ConvertError::InvalidUpload("Upload stream failed".to_string()),
    }
}

/// Download name: the upload's stem with the output extension
///
/// Falls back to `output_name` when the upload has no usable name.
pub fn download_name(upload_name: Option<&str>, output_name: &str) -> String {
    let stem = upload_name
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name))
        .and_then(|name| Path::new(name).file_stem())
        .map(|stem| sanitize(&stem.to_string_lossy()))
        .unwrap_or_default();

    if stem.is_empty() {
        return output_name.to_string();
    }

    match Path::new(output_name).extension() {
        Some(ext) => format!("{stem}.{}", ext.to_string_lossy()),
        None => stem,
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

/// Content type for the formats IfcConvert can write
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "glb" => "model/gltf-binary",
        "gltf" => "model/gltf+json",
        "obj" => "model/obj",
        "dae" => "model/vnd.collada+xml",
        "stp" | "step" => "model/step",
        "igs" | "iges" => "model/iges",
        "svg" => "image/svg+xml",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}

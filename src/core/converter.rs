//! External converter invocation
//!
//! Runs the configured converter as `<program> [args...] <input> <output>`.
//! The process is spawned directly from an argument list (no shell), bounded
//! by a timeout, and killed if the waiting future is dropped. Stdout is
//! discarded; IfcConvert prints progress there and nothing else.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::core::config::ConverterConfig;
use crate::core::error::{ConvertError, Result};

/// Maximum stderr kept for diagnostics. Anything beyond this is truncated.
const MAX_STDERR_BYTES: usize = 4_096;

/// Outcome of a converter process that ran to completion
#[derive(Debug, Clone)]
pub struct ConverterRun {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub success: bool,
    /// Trailing stderr, truncated
    pub stderr: String,
    pub duration_ms: u64,
}

/// Handle to the external converter executable
#[derive(Debug, Clone)]
pub struct Converter {
    program: String,
    args: Vec<String>,
    timeout_sec: u64,
}

impl Converter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout_sec: config.timeout_sec,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_sec)
    }

    /// Run the converter against `input`, writing `output`
    ///
    /// A non-zero exit status is reported in the returned [`ConverterRun`],
    /// not as an error; the caller decides whether it is fatal.
    ///
    /// # Errors
    ///
    /// - `ConverterUnavailable`: program missing or not executable
    /// - `ConverterTimeout`: process exceeded the timeout and was killed
    /// - `IoError`: any other spawn or wait failure
    pub async fn run(&self, input: &Path, output: &Path) -> Result<ConverterRun> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            program = %self.program,
            args = ?self.args,
            input = %input.display(),
            output = %output.display(),
            "Spawning converter"
        );

        let start = Instant::now();
        let child = command.spawn().map_err(|e| self.spawn_error(e))?;

        // Dropping the wait future on timeout kills the child (kill_on_drop)
        let result = match tokio::time::timeout(self.timeout(), child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    program = %self.program,
                    timeout_sec = self.timeout_sec,
                    "Converter timed out, killing process"
                );
                return Err(ConvertError::ConverterTimeout(self.timeout_sec));
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let stderr = truncate_tail(&String::from_utf8_lossy(&result.stderr), MAX_STDERR_BYTES);

        let run = ConverterRun {
            code: result.status.code(),
            success: result.status.success(),
            stderr,
            duration_ms,
        };

        if run.success {
            info!(duration_ms, "Converter finished");
        } else {
            warn!(
                code = ?run.code,
                duration_ms,
                stderr = %run.stderr,
                "Converter exited unsuccessfully"
            );
        }

        Ok(run)
    }

    fn spawn_error(&self, e: std::io::Error) -> ConvertError {
        match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                ConvertError::ConverterUnavailable {
                    program: self.program.clone(),
                    reason: e.to_string(),
                }
            }
            _ => ConvertError::IoError(e),
        }
    }
}

/// Keep the last `max_bytes` of `output`, on a char boundary
fn truncate_tail(output: &str, max_bytes: usize) -> String {
    let output = output.trim_end();
    if output.len() <= max_bytes {
        return output.to_string();
    }

    let mut start = output.len() - max_bytes;
    while !output.is_char_boundary(start) {
        start += 1;
    }
    format!("[truncated] ...{}", &output[start..])
}

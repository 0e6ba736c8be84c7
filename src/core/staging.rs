//! Stage areas for conversion artifacts
//!
//! A stage is the pair of paths a single conversion reads from and
//! writes to. In `shared` mode every request gets the same two fixed
//! paths inside the work directory. In `isolated` mode each request
//! gets its own directory.
//!
//! Cleanup is explicit and async on the normal path (`remove_input`,
//! `cleanup`). A stage dropped early, e.g. when the client disconnects
//! mid-conversion, hands whatever is left to a background task.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::runtime::Handle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::config::{StagingConfig, StagingMode};
use crate::core::error::Result;

/// Factory for per-request stages
#[derive(Debug, Clone)]
pub struct StagingArea {
    mode: StagingMode,
    root: PathBuf,
    input_file_name: String,
    output_file_name: String,
}

impl StagingArea {
    pub fn new(config: &StagingConfig) -> Self {
        Self {
            mode: config.mode,
            root: config.work_dir.clone(),
            input_file_name: config.input_file_name.clone(),
            output_file_name: config.output_file_name.clone(),
        }
    }

    pub fn mode(&self) -> StagingMode {
        self.mode
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configured output file name (also the fallback download name)
    pub fn output_file_name(&self) -> &str {
        &self.output_file_name
    }

    /// Create the work directory if missing
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Allocate the stage for one conversion
    pub async fn prepare(&self) -> Result<Stage> {
        match self.mode {
            StagingMode::Shared => {
                self.ensure_root().await?;
                Ok(Stage {
                    input: self.root.join(&self.input_file_name),
                    output: self.root.join(&self.output_file_name),
                    input_pending: true,
                    scratch_dir: None,
                })
            }
            StagingMode::Isolated => {
                let dir = self.root.join(Uuid::new_v4().to_string());
                tokio::fs::create_dir_all(&dir).await?;
                debug!(dir = %dir.display(), "Created stage directory");
                Ok(Stage {
                    input: dir.join(&self.input_file_name),
                    output: dir.join(&self.output_file_name),
                    input_pending: true,
                    scratch_dir: Some(dir),
                })
            }
        }
    }
}

/// Input and output paths for one conversion
#[derive(Debug)]
pub struct Stage {
    input: PathBuf,
    output: PathBuf,
    /// Input may still be on disk
    input_pending: bool,
    /// Request-owned directory, removed by `cleanup` or on drop
    scratch_dir: Option<PathBuf>,
}

impl Stage {
    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch_dir.as_deref()
    }

    /// Delete a leftover output artifact, if any
    pub async fn clear_output(&self) -> Result<()> {
        remove_file_if_exists(&self.output).await?;
        Ok(())
    }

    /// Delete the input artifact
    ///
    /// Never fails: this runs after the converter regardless of its
    /// outcome and must not mask the converter's own error. On failure
    /// the input stays pending and drop retries.
    pub async fn remove_input(&mut self) {
        match remove_file_if_exists(&self.input).await {
            Ok(()) => self.input_pending = false,
            Err(e) => warn!(
                path = %self.input.display(),
                error = %e,
                "Failed to remove staged input"
            ),
        }
    }

    /// Remove the input and the request directory
    ///
    /// Shared-mode output is left in place.
    pub async fn cleanup(mut self) {
        if self.input_pending {
            self.remove_input().await;
        }
        if let Some(dir) = self.scratch_dir.take() {
            remove_dir_logged(dir).await;
        }
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        let input = self.input_pending.then(|| self.input.clone());
        let dir = self.scratch_dir.take();
        if input.is_none() && dir.is_none() {
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Some(input) = input {
                        if let Err(e) = remove_file_if_exists(&input).await {
                            warn!(path = %input.display(), error = %e, "Failed to remove staged input");
                        }
                    }
                    if let Some(dir) = dir {
                        remove_dir_logged(dir).await;
                    }
                });
            }
            // No runtime to hand off to, so nothing async is blocked here
            Err(_) => {
                if let Some(input) = input {
                    if let Err(e) = std::fs::remove_file(&input) {
                        if e.kind() != ErrorKind::NotFound {
                            warn!(path = %input.display(), error = %e, "Failed to remove staged input");
                        }
                    }
                }
                if let Some(dir) = dir {
                    if let Err(e) = std::fs::remove_dir_all(&dir) {
                        if e.kind() != ErrorKind::NotFound {
                            warn!(dir = %dir.display(), error = %e, "Failed to remove stage directory");
                        }
                    }
                }
            }
        }
    }
}

async fn remove_file_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

async fn remove_dir_logged(dir: PathBuf) {
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => debug!(dir = %dir.display(), "Removed stage directory"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(
            dir = %dir.display(),
            error = %e,
            "Failed to remove stage directory"
        ),
    }
}

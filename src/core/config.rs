//! Configuration management for the ifc2glb service.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::error::{ConvertError, Result};
use crate::core::xdg::XdgDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub staging: StagingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum request body size in MB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

/// External converter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConverterConfig {
    /// Converter executable, absolute or resolved through PATH
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra arguments placed before the input and output paths
    #[serde(default)]
    pub args: Vec<String>,

    /// Seconds before the converter is killed
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,

    /// Treat a non-zero exit status as failure even if output exists
    #[serde(default = "default_check_exit_status")]
    pub check_exit_status: bool,
}

/// How input/output artifacts are laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingMode {
    /// One fresh directory per request, removed afterwards
    Isolated,
    /// Fixed file names shared by every request (no isolation)
    Shared,
}

impl fmt::Display for StagingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagingMode::Isolated => f.write_str("isolated"),
            StagingMode::Shared => f.write_str("shared"),
        }
    }
}

impl FromStr for StagingMode {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolated" => Ok(StagingMode::Isolated),
            "shared" => Ok(StagingMode::Shared),
            other => Err(ConvertError::ConfigError(format!(
                "Unknown staging mode '{other}' (expected 'isolated' or 'shared')"
            ))),
        }
    }
}

/// Staging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagingConfig {
    #[serde(default = "default_staging_mode")]
    pub mode: StagingMode,

    /// Directory holding staged artifacts
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    #[serde(default = "default_input_file_name")]
    pub input_file_name: String,

    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,
}

/// Config file looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "ifc2glb.toml";

/// Command-line values that take precedence over every other source
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Replaces the config file lookup
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_mb() -> usize {
    512
}

fn default_program() -> String {
    "IfcConvert".to_string()
}

fn default_timeout_sec() -> u64 {
    300
}

fn default_check_exit_status() -> bool {
    true
}

fn default_staging_mode() -> StagingMode {
    StagingMode::Isolated
}

fn default_work_dir() -> PathBuf {
    env::temp_dir().join("ifc2glb")
}

fn default_input_file_name() -> String {
    "temporary.ifc".to_string()
}

fn default_output_file_name() -> String {
    "output.glb".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            timeout_sec: default_timeout_sec(),
            check_exit_status: default_check_exit_status(),
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            mode: default_staging_mode(),
            work_dir: default_work_dir(),
            input_file_name: default_input_file_name(),
            output_file_name: default_output_file_name(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConvertError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config with priority: env vars > TOML > defaults
    pub fn load() -> Result<Self> {
        Self::load_with_overrides(&ConfigOverrides::default())
    }

    /// Load config with priority: CLI overrides > env vars > TOML > defaults
    pub fn load_with_overrides(overrides: &ConfigOverrides) -> Result<Self> {
        let xdg = XdgDirs::new();
        Self::load_with_overrides_and_xdg(&xdg, overrides)
    }

    /// Load config with explicit XDG directories
    ///
    /// File lookup order:
    /// 1. IFC2GLB_CONFIG env var
    /// 2. XDG config file (~/.config/ifc2glb/config.toml)
    /// 3. ./ifc2glb.toml
    /// 4. Defaults
    pub fn load_with_xdg(xdg: &XdgDirs) -> Result<Self> {
        Self::load_with_overrides_and_xdg(xdg, &ConfigOverrides::default())
    }

    /// Load config with explicit XDG directories and CLI overrides
    ///
    /// An explicit `config_file` replaces the file lookup. Overrides are
    /// applied after the environment, then the result is validated.
    pub fn load_with_overrides_and_xdg(xdg: &XdgDirs, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match &overrides.config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::from_lookup(xdg)?,
        };

        config.merge_env()?;
        overrides.apply(&mut config);
        config.validate()?;

        Ok(config)
    }

    fn from_lookup(xdg: &XdgDirs) -> Result<Self> {
        if let Ok(config_path) = env::var("IFC2GLB_CONFIG") {
            return Self::from_file(config_path);
        }

        let xdg_config = xdg.config_file();
        if xdg_config.exists() {
            Self::from_file(xdg_config)
        } else if Path::new(LOCAL_CONFIG_FILE).exists() {
            Self::from_file(LOCAL_CONFIG_FILE)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Unparseable numeric values are ignored; an unknown staging
    /// mode is an error since silently falling back would change
    /// isolation semantics.
    pub fn merge_env(&mut self) -> Result<()> {
        // Server configuration
        if let Ok(host) = env::var("IFC2GLB_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("IFC2GLB_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(max_upload) = env::var("IFC2GLB_MAX_UPLOAD_MB") {
            if let Ok(mb) = max_upload.parse() {
                self.server.max_upload_mb = mb;
            }
        }

        // Converter configuration
        if let Ok(program) = env::var("IFC2GLB_CONVERTER") {
            self.converter.program = program;
        }
        if let Ok(timeout) = env::var("IFC2GLB_CONVERTER_TIMEOUT_SEC") {
            if let Ok(t) = timeout.parse() {
                self.converter.timeout_sec = t;
            }
        }
        if let Ok(check) = env::var("IFC2GLB_CHECK_EXIT_STATUS") {
            if let Ok(c) = check.parse() {
                self.converter.check_exit_status = c;
            }
        }

        // Staging configuration
        if let Ok(mode) = env::var("IFC2GLB_STAGING_MODE") {
            self.staging.mode = mode.parse()?;
        }
        if let Ok(work_dir) = env::var("IFC2GLB_WORK_DIR") {
            self.staging.work_dir = PathBuf::from(work_dir);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.max_upload_mb == 0 {
            return Err(ConvertError::ConfigError(
                "Max upload size must be non-zero".to_string(),
            ));
        }

        if self.converter.program.trim().is_empty() {
            return Err(ConvertError::ConfigError(
                "Converter program must be set".to_string(),
            ));
        }

        if self.converter.timeout_sec == 0 {
            return Err(ConvertError::ConfigError(
                "Converter timeout must be non-zero".to_string(),
            ));
        }

        validate_file_name("input_file_name", &self.staging.input_file_name)?;
        validate_file_name("output_file_name", &self.staging.output_file_name)?;

        if self.staging.input_file_name == self.staging.output_file_name {
            return Err(ConvertError::ConfigError(
                "Input and output file names must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// Upload limit in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Log configuration
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Bind: {}:{}", self.server.host, self.server.port);
        tracing::info!("  Max upload: {} MB", self.server.max_upload_mb);
        tracing::info!("  Converter: {}", self.converter.program);
        tracing::info!("  Converter args: {:?}", self.converter.args);
        tracing::info!("  Converter timeout: {}s", self.converter.timeout_sec);
        tracing::info!("  Check exit status: {}", self.converter.check_exit_status);
        tracing::info!("  Staging mode: {}", self.staging.mode);
        tracing::info!("  Work dir: {:?}", self.staging.work_dir);
        if self.staging.mode == StagingMode::Shared {
            tracing::warn!("  Shared staging: concurrent requests share artifact paths");
        }
    }
}

/// Artifact names are joined onto the stage directory, so they must be
/// plain file names.
fn validate_file_name(key: &str, name: &str) -> Result<()> {
    let plain = Path::new(name)
        .file_name()
        .map(|f| f == name)
        .unwrap_or(false);

    if name.is_empty() || !plain {
        return Err(ConvertError::ConfigError(format!(
            "staging.{key} must be a plain file name, got '{name}'"
        )));
    }

    Ok(())
}

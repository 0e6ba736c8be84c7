//! XDG Base Directory Support
//!
//! Resolves where the ifc2glb config file lives, following the XDG Base
//! Directory specification with an explicit override.

use std::env;
use std::path::PathBuf;

/// Application directory name under the XDG roots
const APP_DIR: &str = "ifc2glb";

/// XDG directory structure for ifc2glb
#[derive(Debug, Clone)]
pub struct XdgDirs {
    pub config_dir: PathBuf,
}

impl Default for XdgDirs {
    fn default() -> Self {
        Self::new()
    }
}

impl XdgDirs {
    /// Create new XDG directory structure with proper resolution order
    ///
    /// Priority order (highest to lowest):
    /// 1. IFC2GLB_CONFIG_DIR
    /// 2. XDG_CONFIG_HOME
    /// 3. XDG default (~/.config)
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Build from an explicit config directory (tests, embedding)
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(dir) = env::var("IFC2GLB_CONFIG_DIR") {
            return PathBuf::from(dir);
        }

        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    /// Path of the TOML config file
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }
}

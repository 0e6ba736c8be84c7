//! Unified service container for ifc2glb
//!
//! Provides shared access to the conversion service and configuration.

use crate::core::config::Config;
use crate::core::conversion::ConversionService;
use crate::core::error::Result;
use std::sync::Arc;

/// Unified services container
///
/// Cloned into every handler through axum state.
#[derive(Clone)]
pub struct Services {
    /// Staging + converter pipeline
    pub conversion: Arc<ConversionService>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl Services {
    /// Create services from configuration
    pub fn new(config: Config) -> Self {
        let conversion = Arc::new(ConversionService::new(&config));

        Self {
            conversion,
            config: Arc::new(config),
        }
    }

    /// Prepare the filesystem before serving
    pub async fn init(&self) -> Result<()> {
        let staging = self.conversion.staging();
        staging.ensure_root().await?;
        tracing::info!(work_dir = %staging.root().display(), "Work directory ready");
        Ok(())
    }
}

//! ifc2glb HTTP server entry point
//!
//! Starts the conversion service.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ifc2glb::core::config::{Config, ConfigOverrides};
use ifc2glb::core::services::Services;
use ifc2glb::http;

/// IFC to GLB conversion server
///
/// Accepts IFC uploads on POST /convert_ifc_to_glb and returns the GLB
/// produced by the configured converter (IfcConvert by default).
#[derive(Parser, Debug)]
#[command(name = "ifc2glb-server")]
#[command(version)]
#[command(about = "IFC to GLB conversion server", long_about = None)]
struct Args {
    /// Config file (overrides the XDG and ./ifc2glb.toml lookup)
    #[arg(long, env = "IFC2GLB_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(long)]
    port: Option<u16>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ifc2glb=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ifc2glb conversion service");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_with_overrides(&args.overrides())?;
    config.log_config();

    let services = Arc::new(Services::new(config.clone()));
    services.init().await?;

    let app = http::build_router(services);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("Service ready - Startup page at http://{}/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

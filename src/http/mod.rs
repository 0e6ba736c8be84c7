//! HTTP adapter
//!
//! Depends only on core/. Exposes the startup page, a health check and
//! the IFC to GLB conversion endpoint via the Axum web framework.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::*;
pub use router::build_router;

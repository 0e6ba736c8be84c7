//! ifc2glb - IFC to GLB conversion over HTTP
//!
//! Accepts an IFC model as a multipart upload, runs an external
//! converter (IfcConvert or compatible) on it and returns the GLB.
//!
//! # Architecture
//!
//! - **core**: Domain logic (protocol-agnostic)
//!   - config, error, types, xdg
//!   - staging (where input/output artifacts live)
//!   - converter (external process with timeout)
//!   - conversion (stream in → convert → stream back)
//!   - services (unified service container)
//!
//! - **http**: REST adapter (depends on core)
//!   - handlers, router, middleware, error mapping
//!
//! # Staging modes
//!
//! - `isolated` (default): one directory per request, removed afterwards
//! - `shared`: fixed `temporary.ifc` / `output.glb` in the work directory,
//!   shared by all requests with no locking

// Core domain logic (protocol-agnostic)
pub mod core;

// HTTP REST adapter
pub mod http;

// Re-export commonly used types for convenience
pub use core::config::{Config, StagingMode};
pub use core::error::{ConvertError, Result};
pub use core::services::Services;

//! Core domain logic (protocol-agnostic)
//!
//! This module contains the conversion logic, independent of the
//! HTTP transport.
//!
//! # Architecture
//!
//! - **config**: Configuration loading (TOML + environment)
//! - **error**: Error types and Result alias
//! - **types**: Response data structures
//! - **xdg**: XDG config directory handling
//! - **staging**: Input/output artifact locations
//! - **converter**: External converter process
//! - **conversion**: The stage → convert → read back sequence
//! - **services**: Unified service container

pub mod config;
pub mod conversion;
pub mod converter;
pub mod error;
pub mod services;
pub mod staging;
pub mod types;
pub mod xdg;

// Re-export key types for convenience
pub use config::Config;
pub use error::{ConvertError, Result};
pub use services::Services;

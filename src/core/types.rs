//! Core data types for the ifc2glb service.
//!
//! Response bodies shared by the HTTP adapter and its tests.

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the server answers
    pub status: String,

    /// Crate version
    pub version: String,

    /// Configured converter program
    pub converter: String,

    /// Staging mode ("isolated" or "shared")
    pub staging: String,
}

/// Error body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

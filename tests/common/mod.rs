// Common test utilities and fixtures


// Re-export commonly used items
// Note: These may appear unused in some test binaries
#[allow(unused_imports)]
pub use fixtures::{ConverterScript, SAMPLE_IFC};
#[allow(unused_imports)]
pub use helpers::{
    body_bytes, convert_request, create_test_app, dir_is_empty, multipart_body, test_config,
    wait_for, TestApp, BOUNDARY,
};

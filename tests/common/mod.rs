//! Common test utilities for gridspline.
//!
//! This module provides shared utilities for the integration tests.

// Re-export all common test utilities
pub mod assertions;
pub mod test_data;

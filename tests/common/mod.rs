//! Shared helpers for integration tests
//!
//! Each test binary only uses part of this module, hence the `dead_code` allows.

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

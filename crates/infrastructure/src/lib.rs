//! Tripcheck Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus the suite file loader.

pub mod adapters;
pub mod reporting;
pub mod suite;

pub use adapters::{JSON_CONTENT_TYPE, ReqwestHttpClient};
pub use reporting::{ConsoleReporter, write_listing};
pub use suite::{
    DEFAULT_SUITE_YAML, SuiteLoadError, default_suite, load_suite_file, load_suite_str,
};

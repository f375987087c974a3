//! Tripcheck Application - Use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (HTTP transport, reporting)
//! - The request executor, outcome evaluator and mutation sequencer
//! - The `RunSuite` use case tying them together

pub mod config;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod ports;
pub mod run_suite;
pub mod sequencer;

#[cfg(test)]
mod test_support;

pub use config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS, HarnessConfig};
pub use error::{ApplicationError, ApplicationResult};
pub use evaluator::{Observation, OutcomeEvaluator};
pub use executor::RequestExecutor;
pub use ports::{HttpClient, HttpClientError, PreparedRequest, Reporter};
pub use run_suite::RunSuite;
pub use sequencer::{MutationSequencer, planned_labels};

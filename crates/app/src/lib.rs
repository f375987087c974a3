//! Tripcheck - conformance harness for the travels JSON API
//!
//! Wires the suite loader, the reqwest transport and the console reporter
//! into the [`RunSuite`] use case. The binary is a thin shell over [`run`].

pub mod cli;

use std::io;
use std::sync::Arc;

use termcolor::WriteColor;
use thiserror::Error;
use tracing::info;
use tripcheck_application::{
    ApplicationError, HarnessConfig, HttpClientError, RequestExecutor, RunSuite,
};
use tripcheck_domain::{CaseRegistry, RunSummary};
use tripcheck_infrastructure::{
    ConsoleReporter, ReqwestHttpClient, SuiteLoadError, default_suite, load_suite_file,
    write_listing,
};

pub use cli::{Args, ColorMode};

/// Exit status when every case passed.
pub const EXIT_PASSED: u8 = 0;
/// Exit status when at least one case failed.
pub const EXIT_FAILED: u8 = 1;
/// Exit status when the run could not start.
pub const EXIT_SETUP: u8 = 2;

/// Anything that stops a run before the first request.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad base URL or timeout.
    #[error(transparent)]
    Config(#[from] ApplicationError),

    /// The suite could not be loaded.
    #[error(transparent)]
    Suite(#[from] SuiteLoadError),

    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] HttpClientError),

    /// Writing the listing failed.
    #[error("failed to write listing: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Suite(_) | Self::Client(_) | Self::Io(_) => EXIT_SETUP,
        }
    }
}

/// What a successful invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `--list` printed the registry.
    Listed,
    /// The suite ran to completion.
    Ran(RunSummary),
}

impl Outcome {
    /// Process exit status for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Listed => EXIT_PASSED,
            Self::Ran(summary) if summary.all_passed() => EXIT_PASSED,
            Self::Ran(_) => EXIT_FAILED,
        }
    }
}

/// Builds the harness configuration from the arguments.
///
/// # Errors
///
/// Returns an error for an unusable base URL or a zero timeout.
pub fn config(args: &Args) -> Result<HarnessConfig, ApplicationError> {
    HarnessConfig::new(&args.base_url, args.timeout_ms)
}

/// Loads `--suite` if given, else the built-in suite.
///
/// # Errors
///
/// Returns an error if the suite cannot be read or is invalid.
pub fn load_registry(args: &Args) -> Result<CaseRegistry, SuiteLoadError> {
    match &args.suite {
        Some(path) => load_suite_file(path),
        None => default_suite(),
    }
}

/// Runs (or lists) the suite, writing the report to `out`.
///
/// # Errors
///
/// Returns an error if configuration, suite loading or client creation
/// fails. Failing cases are not errors; they show up in the summary.
pub async fn run<W: WriteColor>(args: &Args, out: &mut W) -> Result<Outcome, AppError> {
    let config = config(args)?;
    let registry = load_registry(args)?;

    if args.list {
        write_listing(out, &registry)?;
        return Ok(Outcome::Listed);
    }

    let client = ReqwestHttpClient::new()?;
    info!(base_url = %config.base_url(), timeout = ?config.timeout(), "client ready");
    let use_case = RunSuite::new(RequestExecutor::new(Arc::new(client), config));
    let mut reporter = ConsoleReporter::new(out);
    let summary = use_case.execute(&registry, &mut reporter).await;
    Ok(Outcome::Ran(summary))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summary(passed: usize, failed: usize) -> RunSummary {
        RunSummary {
            total: passed + failed,
            passed,
            failed,
            ..RunSummary::default()
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Listed.exit_code(), EXIT_PASSED);
        assert_eq!(Outcome::Ran(summary(86, 0)).exit_code(), EXIT_PASSED);
        assert_eq!(Outcome::Ran(summary(85, 1)).exit_code(), EXIT_FAILED);
    }

    #[test]
    fn test_config_errors_exit_with_setup_code() {
        let error = AppError::from(
            HarnessConfig::new("http://localhost:8080", 0).unwrap_err(),
        );
        assert_eq!(error.exit_code(), EXIT_SETUP);
    }
}

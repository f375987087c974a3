//! Command-line arguments.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use termcolor::ColorChoice;
use tripcheck_application::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};

/// Arguments of the `tripcheck` binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tripcheck",
    version,
    about = "Black-box conformance harness for the travels JSON API."
)]
pub struct Args {
    /// Base URL of the server under test.
    #[arg(long, env = "TRIPCHECK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "TRIPCHECK_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Suite file to run instead of the built-in travels suite.
    #[arg(long, env = "TRIPCHECK_SUITE")]
    pub suite: Option<PathBuf>,

    /// Print the scenarios and case count without sending any request.
    #[arg(long)]
    pub list: bool,

    /// When to color the output.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
}

/// `--color` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color when stdout is a terminal.
    Auto,
    /// Always emit color codes.
    Always,
    /// Plain text.
    Never,
}

impl ColorMode {
    /// Resolves the mode against the actual stdout.
    #[must_use]
    pub fn choice(self) -> ColorChoice {
        match self {
            // termcolor's Auto honors TERM and NO_COLOR but not redirection.
            Self::Auto if std::io::stdout().is_terminal() => ColorChoice::Auto,
            Self::Auto | Self::Never => ColorChoice::Never,
            Self::Always => ColorChoice::Always,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "tripcheck",
            "--base-url",
            "http://10.0.0.1:80",
            "--timeout-ms",
            "250",
            "--suite",
            "smoke.yaml",
            "--list",
            "--color",
            "never",
        ])
        .unwrap();

        assert_eq!(args.base_url, "http://10.0.0.1:80");
        assert_eq!(args.timeout_ms, 250);
        assert_eq!(args.suite, Some(PathBuf::from("smoke.yaml")));
        assert!(args.list);
        assert_eq!(args.color, ColorMode::Never);
    }

    #[test]
    fn test_rejects_unknown_color() {
        assert!(Args::try_parse_from(["tripcheck", "--color", "sometimes"]).is_err());
    }

    #[test]
    fn test_rejects_non_numeric_timeout() {
        assert!(Args::try_parse_from(["tripcheck", "--timeout-ms", "soon"]).is_err());
    }

    #[test]
    fn test_explicit_choices() {
        assert_eq!(ColorMode::Always.choice(), ColorChoice::Always);
        assert_eq!(ColorMode::Never.choice(), ColorChoice::Never);
    }
}

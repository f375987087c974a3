//! Predicates and verdicts.
//!
//! A [`Predicate`] decides whether a response is acceptable. Evaluating one
//! yields a [`Verdict`], which carries both the observed and expected values
//! so that a failing line is self-explanatory.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::comparison::display_value;
use crate::json_path;

/// Expected status code value or range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatusExpectation {
    /// Exact status code.
    Exact(u16),
    /// Range of status codes (e.g., 400-499).
    Range {
        /// Minimum status code (inclusive).
        min: u16,
        /// Maximum status code (inclusive).
        max: u16,
    },
    /// One of multiple status codes.
    OneOf(Vec<u16>),
}

impl StatusExpectation {
    /// Check if a status code matches this expectation.
    #[must_use]
    pub fn matches(&self, status: u16) -> bool {
        match self {
            Self::Exact(expected) => status == *expected,
            Self::Range { min, max } => status >= *min && status <= *max,
            Self::OneOf(codes) => codes.contains(&status),
        }
    }

    /// Get description of the expectation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Exact(code) => code.to_string(),
            Self::Range { min, max } => format!("{min}-{max}"),
            Self::OneOf(codes) => {
                let codes_str: Vec<_> = codes.iter().map(ToString::to_string).collect();
                format!("one of [{}]", codes_str.join(", "))
            }
        }
    }

    /// Create a "client error" expectation (400-499).
    #[must_use]
    pub const fn client_error() -> Self {
        Self::Range { min: 400, max: 499 }
    }

    /// Create an exact status expectation.
    #[must_use]
    pub const fn exact(code: u16) -> Self {
        Self::Exact(code)
    }
}

/// Why a value could not be pulled out of a response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The body was required but could not be parsed as JSON.
    #[error("parse error")]
    Parse,
    /// Nothing lives at the path.
    #[error("missing {0}")]
    Missing(String),
    /// The value at the path has the wrong shape.
    #[error("{path} is not {wanted}")]
    WrongShape {
        /// Path that was queried.
        path: String,
        /// What the extractor needed.
        wanted: &'static str,
    },
    /// The path itself is malformed.
    #[error("invalid path {0}")]
    InvalidPath(String),
}

/// Pulls a single value out of a response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Extractor {
    /// The status code as a number.
    Status,
    /// The whole parsed body.
    Body,
    /// The value at a JSON path.
    Field {
        /// JSON path, e.g. `$.first_name`.
        path: String,
    },
    /// Number of elements of the array, object or string at a JSON path.
    Length {
        /// JSON path, e.g. `$.visits`.
        path: String,
    },
    /// Sum of a numeric key over the array of objects at a JSON path.
    Sum {
        /// JSON path of the array.
        path: String,
        /// Key summed in every element.
        key: String,
    },
}

impl Extractor {
    /// Shorthand for [`Extractor::Field`].
    #[must_use]
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field { path: path.into() }
    }

    /// Shorthand for [`Extractor::Length`].
    #[must_use]
    pub fn length(path: impl Into<String>) -> Self {
        Self::Length { path: path.into() }
    }

    /// Shorthand for [`Extractor::Sum`].
    #[must_use]
    pub fn sum(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Sum {
            path: path.into(),
            key: key.into(),
        }
    }

    /// Returns true if extraction needs the parsed body.
    #[must_use]
    pub const fn needs_body(&self) -> bool {
        !matches!(self, Self::Status)
    }

    /// The JSON path this extractor reads, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Status | Self::Body => None,
            Self::Field { path } | Self::Length { path } | Self::Sum { path, .. } => Some(path),
        }
    }

    /// Extracts the value from a status code and an optional parsed body.
    ///
    /// `body` is `None` when parsing failed or was not attempted.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractError`] when the value cannot be produced.
    pub fn extract(&self, status: u16, body: Option<&Value>) -> Result<Value, ExtractError> {
        if let Self::Status = self {
            return Ok(Value::from(status));
        }
        let body = body.ok_or(ExtractError::Parse)?;
        match self {
            Self::Status => Ok(Value::from(status)),
            Self::Body => Ok(body.clone()),
            Self::Field { path } => lookup(body, path).cloned(),
            Self::Length { path } => match lookup(body, path)? {
                Value::Array(items) => Ok(Value::from(items.len())),
                Value::Object(map) => Ok(Value::from(map.len())),
                Value::String(s) => Ok(Value::from(s.chars().count())),
                _ => Err(ExtractError::WrongShape {
                    path: path.clone(),
                    wanted: "a collection",
                }),
            },
            Self::Sum { path, key } => {
                let Value::Array(items) = lookup(body, path)? else {
                    return Err(ExtractError::WrongShape {
                        path: path.clone(),
                        wanted: "an array",
                    });
                };
                let mut total = 0.0;
                for item in items {
                    total += item.get(key).and_then(Value::as_f64).ok_or_else(|| {
                        ExtractError::WrongShape {
                            path: format!("{path}[*].{key}"),
                            wanted: "a number",
                        }
                    })?;
                }
                Ok(number(total))
            }
        }
    }
}

/// Integral totals stay integers so `3` is not shown as `3.0`.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn number(total: f64) -> Value {
    if total.fract() == 0.0 && total.abs() < 9.0e15 {
        Value::from(total as i64)
    } else {
        serde_json::Number::from_f64(total).map_or(Value::Null, Value::Number)
    }
}

fn lookup<'a>(body: &'a Value, path: &str) -> Result<&'a Value, ExtractError> {
    json_path::query(body, path)
        .map_err(|_| ExtractError::InvalidPath(path.to_string()))?
        .ok_or_else(|| ExtractError::Missing(path.to_string()))
}

impl fmt::Display for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => write!(f, "status"),
            Self::Body => write!(f, "body"),
            Self::Field { path } => write!(f, "{path}"),
            Self::Length { path } => write!(f, "len({path})"),
            Self::Sum { path, key } => write!(f, "sum({path}[*].{key})"),
        }
    }
}

/// A named native check on status and parsed body.
///
/// Custom checks exist only in code; suite files cannot declare them.
#[derive(Clone, Copy)]
pub struct CustomCheck {
    /// Name shown as the expected value.
    pub name: &'static str,
    /// Whether the check needs the parsed body.
    pub needs_body: bool,
    /// The check itself.
    pub check: fn(u16, Option<&Value>) -> bool,
}

impl fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCheck")
            .field("name", &self.name)
            .field("needs_body", &self.needs_body)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomCheck {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.needs_body == other.needs_body
    }
}

/// Decides pass/fail for one response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Extract a value and compare it to a literal.
    Equals {
        /// What to extract.
        extract: Extractor,
        /// Literal expected value.
        value: Value,
    },
    /// Assert on the status code.
    Status {
        /// Accepted status codes.
        expected: StatusExpectation,
    },
    /// A native check.
    #[serde(skip)]
    Custom {
        /// The check.
        check: CustomCheck,
    },
}

impl Predicate {
    /// Equality predicate shorthand.
    #[must_use]
    pub fn equals(extract: Extractor, value: impl Into<Value>) -> Self {
        Self::Equals {
            extract,
            value: value.into(),
        }
    }

    /// Status predicate shorthand.
    #[must_use]
    pub const fn status(expected: StatusExpectation) -> Self {
        Self::Status { expected }
    }

    /// The server's "accepted" reply to a mutation: an empty JSON object.
    #[must_use]
    pub fn empty_object() -> Self {
        Self::equals(Extractor::Body, Value::Object(serde_json::Map::new()))
    }

    /// Returns true if evaluation needs the parsed body.
    #[must_use]
    pub const fn needs_body(&self) -> bool {
        match self {
            Self::Equals { extract, .. } => extract.needs_body(),
            Self::Status { .. } => false,
            Self::Custom { check } => check.needs_body,
        }
    }

    /// Human-readable expected value.
    #[must_use]
    pub fn expected_display(&self) -> String {
        match self {
            Self::Equals { value, .. } => display_value(value),
            Self::Status { expected } => expected.description(),
            Self::Custom { check } => check.name.to_string(),
        }
    }

    /// Short description of what is checked.
    #[must_use]
    pub fn subject(&self) -> String {
        match self {
            Self::Equals { extract, .. } => extract.to_string(),
            Self::Status { .. } => "status".to_string(),
            Self::Custom { check } => check.name.to_string(),
        }
    }
}

/// Index of a scenario in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScenarioId(pub usize);

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0 + 1)
    }
}

/// Position of a single case: the scenario plus the step within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseRef {
    /// Owning scenario.
    pub scenario: ScenarioId,
    /// Step within the scenario, starting at 0.
    pub step: usize,
}

impl CaseRef {
    /// Creates a case reference.
    #[must_use]
    pub const fn new(scenario: ScenarioId, step: usize) -> Self {
        Self { scenario, step }
    }
}

impl fmt::Display for CaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scenario, self.step + 1)
    }
}

/// Why a case failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Response was well formed but the value did not match.
    Mismatch,
    /// The server could not be reached or did not answer in time.
    Unreachable,
    /// The body was not valid JSON where JSON was required.
    ParseError,
    /// The case depended on data an earlier case failed to produce.
    Skipped,
}

impl FailureKind {
    /// Short label for reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mismatch => "mismatch",
            Self::Unreachable => "unreachable",
            Self::ParseError => "parse error",
            Self::Skipped => "skipped",
        }
    }
}

/// Outcome of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Which case produced this verdict.
    pub case: CaseRef,
    /// Line label, e.g. `GET  /users/1 $.first_name`.
    pub label: String,
    /// Whether the case passed.
    pub passed: bool,
    /// Observed value.
    pub actual: String,
    /// Expected value.
    pub expected: String,
    /// Failure category, `None` when passed.
    pub failure: Option<FailureKind>,
}

impl Verdict {
    /// Creates a passed verdict.
    #[must_use]
    pub fn pass(
        case: CaseRef,
        label: impl Into<String>,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            case,
            label: label.into(),
            passed: true,
            actual: actual.into(),
            expected: expected.into(),
            failure: None,
        }
    }

    /// Creates a failed verdict of the given kind.
    #[must_use]
    pub fn fail(
        case: CaseRef,
        kind: FailureKind,
        label: impl Into<String>,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            case,
            label: label.into(),
            passed: false,
            actual: actual.into(),
            expected: expected.into(),
            failure: Some(kind),
        }
    }

    /// Creates a mismatch verdict.
    #[must_use]
    pub fn mismatch(
        case: CaseRef,
        label: impl Into<String>,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::fail(case, FailureKind::Mismatch, label, actual, expected)
    }

    /// Creates the verdict for a case that never reached the server.
    #[must_use]
    pub fn unreachable(
        case: CaseRef,
        label: impl Into<String>,
        reason: &str,
        expected: impl Into<String>,
    ) -> Self {
        Self::fail(
            case,
            FailureKind::Unreachable,
            label,
            format!("unreachable: {reason}"),
            expected,
        )
    }
}

/// Aggregated outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Total number of verdicts.
    pub total: usize,
    /// Number of passed verdicts.
    pub passed: usize,
    /// Number of failed verdicts.
    pub failed: usize,
    /// Failed verdicts caused by transport failures.
    pub unreachable: usize,
    /// Failed verdicts caused by unparseable bodies.
    pub parse_errors: usize,
    /// Failed verdicts skipped for missing upstream data.
    pub skipped: usize,
    /// Wall-clock time in milliseconds.
    pub duration_ms: u64,
}

impl RunSummary {
    /// Builds a summary from a set of verdicts.
    #[must_use]
    pub fn from_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a Verdict>) -> Self {
        let mut summary = Self::default();
        for verdict in verdicts {
            summary.record(verdict);
        }
        summary
    }

    /// Accounts for one more verdict.
    pub fn record(&mut self, verdict: &Verdict) {
        self.total += 1;
        if verdict.passed {
            self.passed += 1;
            return;
        }
        self.failed += 1;
        match verdict.failure {
            Some(FailureKind::Unreachable) => self.unreachable += 1,
            Some(FailureKind::ParseError) => self.parse_errors += 1,
            Some(FailureKind::Skipped) => self.skipped += 1,
            Some(FailureKind::Mismatch) | None => {}
        }
    }

    /// Check if all cases passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Get pass rate as percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }
}

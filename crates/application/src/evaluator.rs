//! Outcome evaluation.
//!
//! Applies a [`Predicate`] to a [`ResponseSpec`] and produces a [`Verdict`].
//! Nothing here fails: transport errors, unparseable bodies and missing
//! fields all become failing verdicts with a category attached.

use serde_json::Value;
use tracing::debug;
use tripcheck_domain::comparison::{display_value, values_match};
use tripcheck_domain::response::ResponseSpec;
use tripcheck_domain::{CaseRef, ExtractError, Extractor, FailureKind, Predicate, Verdict};

/// Longest body excerpt written to diagnostics, in characters.
const PREVIEW_CHARS: usize = 100;

/// A value that could not be observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Failure category.
    pub kind: FailureKind,
    /// What to report as the actual value.
    pub actual: String,
}

impl From<ExtractError> for Observation {
    fn from(error: ExtractError) -> Self {
        let kind = match error {
            ExtractError::Parse => FailureKind::ParseError,
            _ => FailureKind::Mismatch,
        };
        Self {
            kind,
            actual: error.to_string(),
        }
    }
}

/// Evaluator turning responses into verdicts.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutcomeEvaluator;

impl OutcomeEvaluator {
    /// Create a new evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluates one case.
    #[must_use]
    pub fn evaluate(
        &self,
        case: CaseRef,
        label: &str,
        predicate: &Predicate,
        response: &ResponseSpec,
    ) -> Verdict {
        let expected = predicate.expected_display();
        if let Some(reason) = unreachable_reason(response) {
            return Verdict::unreachable(case, label, reason, expected);
        }

        match predicate {
            Predicate::Status { expected: status } => {
                let actual = response.status.to_string();
                if status.matches(response.status) {
                    Verdict::pass(case, label, actual, expected)
                } else {
                    Verdict::mismatch(case, label, actual, expected)
                }
            }
            Predicate::Equals { extract, value } => match self.observe(extract, response) {
                Ok(actual) if values_match(&actual, value) => {
                    Verdict::pass(case, label, display_value(&actual), expected)
                }
                Ok(actual) => Verdict::mismatch(case, label, display_value(&actual), expected),
                Err(observation) => {
                    Verdict::fail(case, observation.kind, label, observation.actual, expected)
                }
            },
            Predicate::Custom { check } => {
                let body = if check.needs_body {
                    match parse_body(response) {
                        Ok(body) => Some(body),
                        Err(observation) => {
                            return Verdict::fail(
                                case,
                                observation.kind,
                                label,
                                observation.actual,
                                expected,
                            );
                        }
                    }
                } else {
                    None
                };
                let actual = format!("{} {}", response.status, preview(response));
                if (check.check)(response.status, body.as_ref()) {
                    Verdict::pass(case, label, actual.trim_end(), expected)
                } else {
                    Verdict::mismatch(case, label, actual.trim_end(), expected)
                }
            }
        }
    }

    /// Extracts a single value from a response.
    ///
    /// The body is parsed only if the extractor reads it.
    ///
    /// # Errors
    ///
    /// Returns an [`Observation`] describing why no value could be produced.
    pub fn observe(&self, extractor: &Extractor, response: &ResponseSpec) -> Result<Value, Observation> {
        if let Some(reason) = unreachable_reason(response) {
            return Err(Observation {
                kind: FailureKind::Unreachable,
                actual: format!("unreachable: {reason}"),
            });
        }
        let body = if extractor.needs_body() {
            Some(parse_body(response)?)
        } else {
            None
        };
        Ok(extractor.extract(response.status, body.as_ref())?)
    }
}

fn unreachable_reason(response: &ResponseSpec) -> Option<&str> {
    if !response.is_unreachable() {
        return None;
    }
    Some(
        response
            .transport_error
            .as_deref()
            .unwrap_or("no response"),
    )
}

fn parse_body(response: &ResponseSpec) -> Result<Value, Observation> {
    response.json().map_err(|error| {
        debug!(
            status = response.status,
            %error,
            body = %preview(response),
            "response body is not JSON"
        );
        Observation::from(ExtractError::Parse)
    })
}

/// First characters of the body, cut on a character boundary.
fn preview(response: &ResponseSpec) -> String {
    let text = response.body_text();
    let mut excerpt: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().nth(PREVIEW_CHARS).is_some() {
        excerpt.push_str("...");
    }
    excerpt
}

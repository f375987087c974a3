//! Mutation chains: baseline, mutate, re-measure.
//!
//! A chain first reads a few values once ([`Capture`]s), then measures a set of
//! named [`Probe`]s to establish a baseline. Each [`MutationStep`] posts a
//! partial update and declares, per probe, how the measurement must move.
//! Captured values can be spliced into paths as `{name}` and referenced by
//! [`Amount`]s, which is how data from one response feeds the assertions of a
//! later one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::comparison::{display_value, numbers_match, round_decimals, values_match};
use crate::error::{DomainError, DomainResult};
use crate::json_path;
use crate::request::{HttpMethod, RequestSpec};
use crate::testing::{Extractor, Predicate};

/// Values captured at the start of a chain, by name.
pub type Captures = BTreeMap<String, Value>;

/// A value read once before the chain starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    /// Name used in `{name}` placeholders and amounts.
    pub name: String,
    /// Path to GET; may reference earlier captures.
    pub path: String,
    /// What to read from the response.
    pub extract: Extractor,
}

/// A named measurement re-taken after mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    /// Probe name.
    pub name: String,
    /// Path to GET; may reference captures.
    pub path: String,
    /// What to measure in the response.
    pub measure: Extractor,
}

/// One operand of an [`Amount`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Term {
    /// A captured value.
    Capture {
        /// Capture name.
        name: String,
        /// Multiplier.
        #[serde(default = "one")]
        coefficient: f64,
    },
    /// The probe's own value before the step.
    Previous {
        /// Multiplier.
        #[serde(default = "one")]
        coefficient: f64,
    },
}

const fn one() -> f64 {
    1.0
}

/// A number that may depend on captures: `constant + Σ coefficient × operand`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    /// A plain number.
    Constant(f64),
    /// A linear combination.
    Linear {
        /// Constant part.
        #[serde(default)]
        constant: f64,
        /// Variable parts.
        terms: Vec<Term>,
    },
}

impl Amount {
    /// Resolves the amount against captured values and the probe's previous value.
    ///
    /// # Errors
    ///
    /// Returns a description of the missing or non-numeric operand.
    pub fn resolve(&self, previous: Option<f64>, captures: &Captures) -> Result<f64, String> {
        match self {
            Self::Constant(value) => Ok(*value),
            Self::Linear { constant, terms } => {
                let mut total = *constant;
                for term in terms {
                    total += match term {
                        Term::Capture { name, coefficient } => {
                            let value = captures
                                .get(name)
                                .and_then(Value::as_f64)
                                .ok_or_else(|| format!("capture {name} is not a number"))?;
                            coefficient * value
                        }
                        Term::Previous { coefficient } => {
                            coefficient * previous.ok_or("no previous value")?
                        }
                    };
                }
                Ok(total)
            }
        }
    }

    fn capture_names(&self) -> impl Iterator<Item = &str> {
        let terms: &[Term] = match self {
            Self::Constant(_) => &[],
            Self::Linear { terms, .. } => terms,
        };
        terms.iter().filter_map(|term| match term {
            Term::Capture { name, .. } => Some(name.as_str()),
            Term::Previous { .. } => None,
        })
    }
}

/// How a probe's measurement must move across a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expectation {
    /// Same value as before the step.
    Unchanged,
    /// Different value than before the step.
    Changed,
    /// A fixed value, regardless of the baseline.
    Equals {
        /// Expected value.
        value: Value,
    },
    /// `after - before == by`.
    Delta {
        /// Expected difference.
        by: Amount,
    },
    /// `sign(after - before) == sign(of)`; a zero amount means unchanged.
    DeltaSign {
        /// Amount whose sign is expected.
        of: Amount,
    },
}

/// Result of checking one effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectCheck {
    /// Whether the expectation held.
    pub passed: bool,
    /// Expected value or movement, for display.
    pub expected: String,
}

impl EffectCheck {
    fn failed(expected: impl Into<String>) -> Self {
        Self {
            passed: false,
            expected: expected.into(),
        }
    }
}

impl Expectation {
    /// Checks the expectation for a probe that measured `before` and then `after`.
    #[must_use]
    pub fn check(&self, before: Option<&Value>, after: &Value, captures: &Captures) -> EffectCheck {
        match (self, before) {
            (Self::Equals { value }, _) => EffectCheck {
                passed: values_match(after, value),
                expected: display_value(value),
            },
            (_, None) => EffectCheck::failed("a baseline measurement"),
            (Self::Unchanged, Some(before)) => EffectCheck {
                passed: values_match(after, before),
                expected: display_value(before),
            },
            (Self::Changed, Some(before)) => EffectCheck {
                passed: !values_match(after, before),
                expected: format!("anything but {}", display_value(before)),
            },
            (Self::Delta { by }, Some(before)) => {
                let (prev, amount) = match numeric_baseline(before, by, captures) {
                    Ok(pair) => pair,
                    Err(check) => return check,
                };
                let target = round_decimals(prev + amount);
                EffectCheck {
                    passed: after.as_f64().is_some_and(|now| numbers_match(now, target)),
                    expected: format!("{target} ({})", signed(amount)),
                }
            }
            (Self::DeltaSign { of }, Some(before)) => {
                let (prev, amount) = match numeric_baseline(before, of, captures) {
                    Ok(pair) => pair,
                    Err(check) => return check,
                };
                let wanted = Direction::of(amount);
                EffectCheck {
                    passed: after
                        .as_f64()
                        .is_some_and(|now| Direction::of(now - prev) == wanted),
                    expected: format!("{wanted} from {}", display_value(before)),
                }
            }
        }
    }
}

fn numeric_baseline(
    before: &Value,
    amount: &Amount,
    captures: &Captures,
) -> Result<(f64, f64), EffectCheck> {
    let prev = before
        .as_f64()
        .ok_or_else(|| EffectCheck::failed("a numeric baseline"))?;
    let amount = amount
        .resolve(Some(prev), captures)
        .map_err(EffectCheck::failed)?;
    Ok((prev, amount))
}

fn signed(amount: f64) -> String {
    let amount = round_decimals(amount);
    if amount >= 0.0 {
        format!("+{amount}")
    } else {
        amount.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    fn of(delta: f64) -> Self {
        if numbers_match(delta, 0.0) {
            Self::Flat
        } else if delta > 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "increase",
            Self::Down => "decrease",
            Self::Flat => "no change",
        })
    }
}

/// A probe expectation attached to a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Probe name.
    pub probe: String,
    /// Expected movement.
    pub expect: Expectation,
}

/// A mutating request and its expected ripple.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationStep {
    /// Label shown in reports.
    pub label: String,
    /// The POST request; its path may reference captures.
    pub request: RequestSpec,
    /// Predicate for the POST response.
    pub expect: Predicate,
    /// Probe expectations checked after the POST.
    pub effects: Vec<Effect>,
}

/// An ordered baseline → mutate → re-measure sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationChain {
    /// Chain name.
    pub name: String,
    /// Values read once up front.
    pub captures: Vec<Capture>,
    /// Measurements taken for the baseline and after steps.
    pub probes: Vec<Probe>,
    /// Mutations, in order.
    pub steps: Vec<MutationStep>,
}

impl MutationChain {
    /// Number of verdicts the chain produces: one per capture, one per
    /// baseline probe, and per step one for the POST plus one per effect.
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.captures.len()
            + self.probes.len()
            + self
                .steps
                .iter()
                .map(|step| 1 + step.effects.len())
                .sum::<usize>()
    }

    /// Looks up a probe by name.
    #[must_use]
    pub fn probe(&self, name: &str) -> Option<&Probe> {
        self.probes.iter().find(|probe| probe.name == name)
    }

    /// Structural validation.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown captures or probes, malformed paths,
    /// duplicate names, or a chain without steps.
    pub fn validate(&self) -> DomainResult<()> {
        if self.steps.is_empty() {
            return Err(DomainError::InvalidScenario(format!(
                "chain '{}' has no steps",
                self.name
            )));
        }

        let mut known = BTreeSet::new();
        for capture in &self.captures {
            self.check_template(&capture.path, &known)?;
            if let Some(path) = capture.extract.path() {
                json_path::validate(path)?;
            }
            if !known.insert(capture.name.as_str()) {
                return Err(self.duplicate("capture", &capture.name));
            }
        }

        let mut probes = BTreeSet::new();
        for probe in &self.probes {
            self.check_template(&probe.path, &known)?;
            if let Some(path) = probe.measure.path() {
                json_path::validate(path)?;
            }
            if !probes.insert(probe.name.as_str()) {
                return Err(self.duplicate("probe", &probe.name));
            }
        }

        for step in &self.steps {
            if step.request.method != HttpMethod::Post || step.request.body.is_none() {
                return Err(DomainError::InvalidScenario(format!(
                    "step '{}' in chain '{}' must be a POST with a body",
                    step.label, self.name
                )));
            }
            self.check_template(&step.request.path, &known)?;
            for effect in &step.effects {
                if !probes.contains(effect.probe.as_str()) {
                    return Err(DomainError::UnknownProbe {
                        chain: self.name.clone(),
                        name: effect.probe.clone(),
                    });
                }
                let amount = match &effect.expect {
                    Expectation::Delta { by } => Some(by),
                    Expectation::DeltaSign { of } => Some(of),
                    _ => None,
                };
                for name in amount.into_iter().flat_map(Amount::capture_names) {
                    if !known.contains(name) {
                        return Err(self.unknown_capture(name));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_template(&self, template: &str, known: &BTreeSet<&str>) -> DomainResult<()> {
        if !template.starts_with('/') {
            return Err(DomainError::InvalidPath {
                path: template.to_string(),
                reason: "must start with '/'".to_string(),
            });
        }
        for name in placeholders(template)? {
            if !known.contains(name) {
                return Err(self.unknown_capture(name));
            }
        }
        Ok(())
    }

    fn unknown_capture(&self, name: &str) -> DomainError {
        DomainError::UnknownCapture {
            chain: self.name.clone(),
            name: name.to_string(),
        }
    }

    fn duplicate(&self, what: &str, name: &str) -> DomainError {
        DomainError::InvalidScenario(format!(
            "duplicate {what} '{name}' in chain '{}'",
            self.name
        ))
    }
}

/// Names referenced as `{name}` in a path template.
///
/// # Errors
///
/// Returns an error for an unterminated or empty placeholder.
pub fn placeholders(template: &str) -> DomainResult<Vec<&str>> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(DomainError::InvalidPath {
                path: template.to_string(),
                reason: "unterminated placeholder".to_string(),
            });
        };
        let name = &after[..close];
        if name.is_empty() {
            return Err(DomainError::InvalidPath {
                path: template.to_string(),
                reason: "empty placeholder".to_string(),
            });
        }
        names.push(name);
        rest = &after[close + 1..];
    }
    Ok(names)
}

/// Substitutes captured values into a path template.
///
/// # Errors
///
/// Returns an error for malformed placeholders or a capture that is not set.
pub fn render(template: &str, chain: &str, captures: &Captures) -> DomainResult<String> {
    let mut rendered = template.to_string();
    for name in placeholders(template)? {
        let value = captures.get(name).ok_or_else(|| DomainError::UnknownCapture {
            chain: chain.to_string(),
            name: name.to_string(),
        })?;
        rendered = rendered.replace(&format!("{{{name}}}"), &display_value(value));
    }
    Ok(rendered)
}

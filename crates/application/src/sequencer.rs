//! Mutation chain execution.
//!
//! Runs a [`MutationChain`] in three phases: captures, baseline probes, then
//! each step followed by re-measuring the probes it declares effects on.
//! Every phase emits verdicts as it goes, and the number emitted always
//! equals [`MutationChain::case_count`].

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info, warn};
use tripcheck_domain::comparison::display_value;
use tripcheck_domain::mutation::render;
use tripcheck_domain::request::RequestSpec;
use tripcheck_domain::{
    CaseRef, Captures, FailureKind, MutationChain, MutationStep, Probe, ScenarioId, Verdict,
};

use crate::evaluator::{Observation, OutcomeEvaluator};
use crate::executor::RequestExecutor;
use crate::ports::HttpClient;

/// Hands out consecutive case positions within one scenario.
struct Cursor {
    scenario: ScenarioId,
    next: usize,
}

impl Cursor {
    const fn new(scenario: ScenarioId) -> Self {
        Self { scenario, next: 0 }
    }

    const fn advance(&mut self) -> CaseRef {
        let case = CaseRef::new(self.scenario, self.next);
        self.next += 1;
        case
    }
}

/// Executes mutation chains against the server.
pub struct MutationSequencer<'a, C: HttpClient> {
    executor: &'a RequestExecutor<C>,
    evaluator: OutcomeEvaluator,
}

impl<'a, C: HttpClient> MutationSequencer<'a, C> {
    /// Creates a sequencer issuing requests through `executor`.
    pub const fn new(executor: &'a RequestExecutor<C>, evaluator: OutcomeEvaluator) -> Self {
        Self {
            executor,
            evaluator,
        }
    }

    /// Runs the chain, passing each verdict to `emit` as soon as it is known.
    pub async fn run(&self, id: ScenarioId, chain: &MutationChain, emit: &mut impl FnMut(Verdict)) {
        info!(chain = %chain.name, cases = chain.case_count(), "running mutation chain");
        let mut cursor = Cursor::new(id);

        let mut captures = Captures::new();
        for capture in &chain.captures {
            let case = cursor.advance();
            let label = format!("{} capture {}", RequestSpec::get(&capture.path), capture.name);
            let expected = capture.extract.to_string();
            let observed = match render(&capture.path, &chain.name, &captures) {
                Ok(path) => {
                    let response = self.executor.execute(&RequestSpec::get(path)).await;
                    self.evaluator.observe(&capture.extract, &response)
                }
                Err(error) => Err(Observation {
                    kind: FailureKind::Mismatch,
                    actual: error.to_string(),
                }),
            };
            match observed {
                Ok(value) => {
                    debug!(chain = %chain.name, capture = %capture.name, value = %value, "captured");
                    emit(Verdict::pass(case, label, display_value(&value), expected));
                    captures.insert(capture.name.clone(), value);
                }
                Err(observation) => {
                    warn!(
                        chain = %chain.name,
                        capture = %capture.name,
                        reason = %observation.actual,
                        "capture failed, abandoning chain"
                    );
                    emit(Verdict::fail(
                        case,
                        observation.kind,
                        label,
                        observation.actual,
                        expected,
                    ));
                    skip_rest(chain, &mut cursor, &capture.name, emit);
                    return;
                }
            }
        }

        let mut baseline: BTreeMap<&str, Value> = BTreeMap::new();
        for probe in &chain.probes {
            let case = cursor.advance();
            let (label, measured) = self.measure(probe, chain, &captures).await;
            let label = format!("{label} baseline {}", probe.name);
            match measured {
                Ok(value) => {
                    emit(Verdict::pass(
                        case,
                        label,
                        display_value(&value),
                        probe.measure.to_string(),
                    ));
                    baseline.insert(&probe.name, value);
                }
                Err(observation) => emit(Verdict::fail(
                    case,
                    observation.kind,
                    label,
                    observation.actual,
                    probe.measure.to_string(),
                )),
            }
        }

        for step in &chain.steps {
            self.run_step(step, chain, &captures, &mut baseline, &mut cursor, emit)
                .await;
        }
    }

    async fn run_step<'c>(
        &self,
        step: &MutationStep,
        chain: &'c MutationChain,
        captures: &Captures,
        baseline: &mut BTreeMap<&'c str, Value>,
        cursor: &mut Cursor,
        emit: &mut impl FnMut(Verdict),
    ) {
        let case = cursor.advance();
        match render(&step.request.path, &chain.name, captures) {
            Ok(path) => {
                let request = RequestSpec {
                    path,
                    ..step.request.clone()
                };
                let label = format!("{request} {}", step.label);
                let response = self.executor.execute(&request).await;
                emit(self.evaluator.evaluate(case, &label, &step.expect, &response));
            }
            Err(error) => emit(Verdict::mismatch(
                case,
                format!("{} {}", step.request, step.label),
                error.to_string(),
                step.expect.expected_display(),
            )),
        }

        // All effects of a step compare against the values from before it.
        let before = baseline.clone();
        let mut measured: BTreeMap<&str, (String, Result<Value, Observation>)> = BTreeMap::new();
        for effect in &step.effects {
            let case = cursor.advance();
            let Some(probe) = chain.probe(&effect.probe) else {
                emit(Verdict::mismatch(
                    case,
                    format!("{} {}", effect.probe, step.label),
                    "unknown probe",
                    effect.probe.as_str(),
                ));
                continue;
            };
            if !measured.contains_key(probe.name.as_str()) {
                let result = self.measure(probe, chain, captures).await;
                measured.insert(&probe.name, result);
            }
            let Some((label, after)) = measured.get(probe.name.as_str()) else {
                continue;
            };
            let label = format!("{label} {} after {}", probe.name, step.label);

            match after {
                Ok(after) => {
                    let check = effect
                        .expect
                        .check(before.get(probe.name.as_str()), after, captures);
                    let actual = display_value(after);
                    emit(if check.passed {
                        Verdict::pass(case, label, actual, check.expected)
                    } else {
                        Verdict::mismatch(case, label, actual, check.expected)
                    });
                    baseline.insert(&probe.name, after.clone());
                }
                Err(observation) => {
                    baseline.remove(probe.name.as_str());
                    emit(Verdict::fail(
                        case,
                        observation.kind,
                        label,
                        observation.actual.clone(),
                        probe.measure.to_string(),
                    ));
                }
            }
        }
    }

    /// GETs the probe's path and extracts its measurement. Returns the label
    /// of the request alongside the result.
    async fn measure(
        &self,
        probe: &Probe,
        chain: &MutationChain,
        captures: &Captures,
    ) -> (String, Result<Value, Observation>) {
        match render(&probe.path, &chain.name, captures) {
            Ok(path) => {
                let request = RequestSpec::get(path);
                let response = self.executor.execute(&request).await;
                (
                    request.to_string(),
                    self.evaluator.observe(&probe.measure, &response),
                )
            }
            Err(error) => (
                RequestSpec::get(&probe.path).to_string(),
                Err(Observation {
                    kind: FailureKind::Mismatch,
                    actual: error.to_string(),
                }),
            ),
        }
    }
}

/// Emits a skipped verdict for every case the cursor has not reached yet.
fn skip_rest(
    chain: &MutationChain,
    cursor: &mut Cursor,
    failed_capture: &str,
    emit: &mut impl FnMut(Verdict),
) {
    let labels = planned_labels(chain);
    let expected = format!("capture {failed_capture}");
    while cursor.next < labels.len() {
        let label = labels[cursor.next].clone();
        let case = cursor.advance();
        emit(Verdict::fail(
            case,
            FailureKind::Skipped,
            label,
            "skipped",
            expected.as_str(),
        ));
    }
}

/// Labels of every case of the chain in execution order, with unrendered
/// path templates.
#[must_use]
pub fn planned_labels(chain: &MutationChain) -> Vec<String> {
    let mut labels = Vec::with_capacity(chain.case_count());
    labels.extend(
        chain
            .captures
            .iter()
            .map(|c| format!("{} capture {}", RequestSpec::get(&c.path), c.name)),
    );
    labels.extend(
        chain
            .probes
            .iter()
            .map(|p| format!("{} baseline {}", RequestSpec::get(&p.path), p.name)),
    );
    for step in &chain.steps {
        labels.push(format!("{} {}", step.request, step.label));
        for effect in &step.effects {
            let path = chain
                .probe(&effect.probe)
                .map_or_else(|| effect.probe.clone(), |p| RequestSpec::get(&p.path).to_string());
            labels.push(format!("{path} {} after {}", effect.probe, step.label));
        }
    }
    labels
}

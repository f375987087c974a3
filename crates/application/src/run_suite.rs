//! Run Suite use case
//!
//! Walks the registry in order, executing every case and streaming verdicts
//! to a [`Reporter`].

use std::time::Instant;

use tracing::info;
use tripcheck_domain::{CaseRef, CaseRegistry, RunSummary, Scenario, ScenarioId, TestCase, Verdict};

use crate::evaluator::OutcomeEvaluator;
use crate::executor::RequestExecutor;
use crate::ports::{HttpClient, Reporter};
use crate::sequencer::MutationSequencer;

/// Use case for running a whole suite.
pub struct RunSuite<C: HttpClient> {
    executor: RequestExecutor<C>,
    evaluator: OutcomeEvaluator,
}

impl<C: HttpClient> RunSuite<C> {
    /// Creates a new use case instance.
    pub const fn new(executor: RequestExecutor<C>) -> Self {
        Self {
            executor,
            evaluator: OutcomeEvaluator::new(),
        }
    }

    /// Runs every scenario of the registry in order.
    ///
    /// Always completes: every case yields exactly one verdict, so the
    /// returned summary's `total` equals [`CaseRegistry::case_count`].
    pub async fn execute<R: Reporter + ?Sized>(
        &self,
        registry: &CaseRegistry,
        reporter: &mut R,
    ) -> RunSummary {
        let start = Instant::now();
        info!(
            suite = registry.name(),
            base_url = %self.executor.config().base_url(),
            scenarios = registry.len(),
            cases = registry.case_count(),
            "starting run"
        );

        let mut summary = RunSummary::default();
        let mut section: Option<&str> = None;
        for entry in registry.all() {
            if section != Some(entry.section.as_str()) {
                reporter.section(&entry.section);
                section = Some(entry.section.as_str());
            }

            let mut emit = |verdict: Verdict| {
                summary.record(&verdict);
                reporter.verdict(&verdict);
            };
            match &entry.scenario {
                Scenario::Get(case) => emit(self.run_case(entry.id, 0, case).await),
                Scenario::PostThenVerify { post, verify } => {
                    emit(self.run_case(entry.id, 0, post).await);
                    emit(self.run_case(entry.id, 1, verify).await);
                }
                Scenario::Chain(chain) => {
                    MutationSequencer::new(&self.executor, self.evaluator)
                        .run(entry.id, chain, &mut emit)
                        .await;
                }
            }
        }

        summary.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            duration_ms = summary.duration_ms,
            "run finished"
        );
        reporter.finish(&summary);
        summary
    }

    async fn run_case(&self, scenario: ScenarioId, step: usize, case: &TestCase) -> Verdict {
        let label = format!("{} {}", case.label(), case.expect.subject());
        let response = self.executor.execute(&case.request).await;
        self.evaluator
            .evaluate(CaseRef::new(scenario, step), &label, &case.expect, &response)
    }
}

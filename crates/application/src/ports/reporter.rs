//! Reporter port

use tripcheck_domain::{RunSummary, Verdict};

/// Sink for the verdicts of a run.
///
/// Reporters only present results; they never influence pass/fail.
pub trait Reporter {
    /// A new section starts.
    fn section(&mut self, name: &str);

    /// One case finished.
    fn verdict(&mut self, verdict: &Verdict);

    /// The run finished.
    fn finish(&mut self, summary: &RunSummary);
}

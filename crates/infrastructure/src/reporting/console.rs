//! Colored console output.
//!
//! One line per verdict, grouped under section banners, followed by a
//! summary line. Colors go through `termcolor`, so `--color never` and
//! non-terminal output degrade to plain text.

use std::io;

use termcolor::{Color, ColorSpec, WriteColor};
use tracing::warn;
use tripcheck_application::planned_labels;
use tripcheck_application::ports::Reporter;
use tripcheck_domain::{CaseRegistry, RunSummary, Scenario, Verdict};

/// Writes verdicts to a color-capable stream.
pub struct ConsoleReporter<W: WriteColor> {
    out: W,
}

impl<W: WriteColor> ConsoleReporter<W> {
    /// Reporter writing to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Gives the underlying stream back.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_section(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out)?;
        self.out
            .set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
        write!(self.out, "===== {name} =====")?;
        self.out.reset()?;
        writeln!(self.out)
    }

    fn write_verdict(&mut self, verdict: &Verdict) -> io::Result<()> {
        let (tag, color) = if verdict.passed {
            ("PASS", Color::Green)
        } else {
            ("FAIL", Color::Red)
        };
        self.out
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(self.out, "{tag}")?;
        self.out.reset()?;

        if verdict.passed {
            writeln!(
                self.out,
                " {}: {} == {}",
                verdict.label, verdict.actual, verdict.expected
            )
        } else {
            let kind = verdict.failure.map_or("failed", |kind| kind.label());
            writeln!(
                self.out,
                " {}: {} != {} [{kind}]",
                verdict.label, verdict.actual, verdict.expected
            )
        }
    }

    fn write_summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        writeln!(self.out)?;
        let color = if summary.all_passed() {
            Color::Green
        } else {
            Color::Red
        };
        self.out
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(
            self.out,
            "{}/{} passed ({:.1}%)",
            summary.passed,
            summary.total,
            summary.pass_rate()
        )?;
        self.out.reset()?;

        write!(self.out, ", {} failed", summary.failed)?;
        let breakdown: Vec<String> = [
            ("unreachable", summary.unreachable),
            ("parse errors", summary.parse_errors),
            ("skipped", summary.skipped),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(what, count)| format!("{what}: {count}"))
        .collect();
        if !breakdown.is_empty() {
            write!(self.out, " ({})", breakdown.join(", "))?;
        }
        writeln!(self.out, " in {} ms", summary.duration_ms)?;
        self.out.flush()
    }
}

impl<W: WriteColor> Reporter for ConsoleReporter<W> {
    fn section(&mut self, name: &str) {
        if let Err(error) = self.write_section(name) {
            warn!(%error, "failed to write section header");
        }
    }

    fn verdict(&mut self, verdict: &Verdict) {
        if let Err(error) = self.write_verdict(verdict) {
            warn!(%error, case = %verdict.case, "failed to write verdict");
        }
    }

    fn finish(&mut self, summary: &RunSummary) {
        if let Err(error) = self.write_summary(summary) {
            warn!(%error, "failed to write summary");
        }
    }
}

/// Prints the registry without executing anything.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_listing<W: WriteColor>(out: &mut W, registry: &CaseRegistry) -> io::Result<()> {
    writeln!(
        out,
        "suite {}: {} scenarios, {} cases",
        registry.name(),
        registry.len(),
        registry.case_count()
    )?;

    let mut section: Option<&str> = None;
    for entry in registry.all() {
        if section != Some(entry.section.as_str()) {
            writeln!(out)?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
            write!(out, "===== {} =====", entry.section)?;
            out.reset()?;
            writeln!(out)?;
            section = Some(entry.section.as_str());
        }

        let cases = entry.scenario.case_count();
        writeln!(
            out,
            "{:>4} [{}] {} ({cases} {})",
            entry.id.to_string(),
            entry.scenario.shape(),
            entry.scenario.title(),
            if cases == 1 { "case" } else { "cases" }
        )?;
        if let Scenario::Chain(chain) = &entry.scenario {
            for label in planned_labels(chain) {
                writeln!(out, "       {label}")?;
            }
        }
    }
    out.flush()
}

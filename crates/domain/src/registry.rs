//! The ordered, read-only set of scenarios a run executes.
//!
//! Order is load-bearing: POST scenarios create records that later sections
//! read, and chains depend on the state left by everything before them.

use std::collections::HashSet;

use crate::error::DomainResult;
use crate::scenario::Scenario;
use crate::testing::ScenarioId;

/// A scenario together with its position and section.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    /// Position in the registry.
    pub id: ScenarioId,
    /// Section the scenario is reported under.
    pub section: String,
    /// The scenario.
    pub scenario: Scenario,
}

/// Collects scenarios in order; [`RegistryBuilder::build`] freezes them.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    name: String,
    entries: Vec<RegistryEntry>,
}

impl RegistryBuilder {
    /// Starts an empty registry with the given suite name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Appends a scenario under `section` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario fails validation.
    pub fn register(
        &mut self,
        section: impl Into<String>,
        scenario: Scenario,
    ) -> DomainResult<ScenarioId> {
        scenario.validate()?;
        let id = ScenarioId(self.entries.len());
        self.entries.push(RegistryEntry {
            id,
            section: section.into(),
            scenario,
        });
        Ok(id)
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> CaseRegistry {
        CaseRegistry {
            name: self.name,
            entries: self.entries,
        }
    }
}

/// Immutable, ordered scenarios grouped into sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseRegistry {
    name: String,
    entries: Vec<RegistryEntry>,
}

impl CaseRegistry {
    /// Suite name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All entries in execution order.
    #[must_use]
    pub fn all(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Section names in first-seen order.
    #[must_use]
    pub fn sections(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|entry| entry.section.as_str())
            .filter(|section| seen.insert(*section))
            .collect()
    }

    /// Number of verdicts a full run produces.
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.scenario.case_count())
            .sum()
    }

    /// Number of scenarios.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

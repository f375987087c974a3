//! Loading suites from YAML.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use tripcheck_domain::{CaseRegistry, DomainError, RegistryBuilder};

use super::schema::SuiteFile;

/// The travels suite compiled into the binary.
pub const DEFAULT_SUITE_YAML: &str = include_str!("../../suites/travels.yaml");

/// Error type for suite loading.
#[derive(Debug, Error)]
pub enum SuiteLoadError {
    /// The file could not be read.
    #[error("failed to read suite {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The YAML does not match the suite schema.
    #[error("invalid suite YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A scenario failed validation.
    #[error("invalid scenario in section '{section}': {source}")]
    Invalid {
        /// Section holding the scenario.
        section: String,
        /// Validation error.
        #[source]
        source: DomainError,
    },

    /// The suite holds no scenarios at all.
    #[error("suite '{0}' has no scenarios")]
    Empty(String),
}

/// Parses and validates a suite from YAML text.
///
/// # Errors
///
/// Returns an error if the YAML is malformed, a scenario is invalid, or
/// the suite is empty.
pub fn load_suite_str(yaml: &str) -> Result<CaseRegistry, SuiteLoadError> {
    let file: SuiteFile = serde_yaml::from_str(yaml)?;

    let mut builder = RegistryBuilder::new(file.name);
    for section in file.sections {
        for scenario in section.scenarios {
            builder
                .register(section.name.as_str(), scenario.into_scenario())
                .map_err(|source| SuiteLoadError::Invalid {
                    section: section.name.clone(),
                    source,
                })?;
        }
    }

    let registry = builder.build();
    if registry.is_empty() {
        return Err(SuiteLoadError::Empty(registry.name().to_string()));
    }
    debug!(
        suite = registry.name(),
        scenarios = registry.len(),
        cases = registry.case_count(),
        "suite loaded"
    );
    Ok(registry)
}

/// Reads a suite file from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to load.
pub fn load_suite_file(path: &Path) -> Result<CaseRegistry, SuiteLoadError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| SuiteLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_suite_str(&yaml)
}

/// The embedded travels suite.
///
/// # Errors
///
/// Only fails if the embedded YAML is broken, which the tests rule out.
pub fn default_suite() -> Result<CaseRegistry, SuiteLoadError> {
    load_suite_str(DEFAULT_SUITE_YAML)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tripcheck_domain::{
        Extractor, Predicate, Scenario, ScenarioShape, StatusExpectation,
    };

    #[test]
    fn test_default_suite_loads() {
        let registry = default_suite().unwrap();

        assert_eq!(registry.name(), "travels");
        assert_eq!(
            registry.sections(),
            vec!["GET", "POST", "GET params", "Visit POSTs"]
        );
    }

    #[test]
    fn test_default_suite_case_count_is_stable() {
        let registry = default_suite().unwrap();

        // 10 GETs, 15 POST-then-verify pairs, 17 parameter GETs and a
        // 29-case visit chain.
        assert_eq!(registry.len(), 43);
        assert_eq!(registry.case_count(), 10 + 30 + 17 + 29);
    }

    #[test]
    fn test_default_suite_shapes() {
        let registry = default_suite().unwrap();
        let shapes: Vec<_> = registry.all().iter().map(|e| e.scenario.shape()).collect();

        assert_eq!(shapes.iter().filter(|s| **s == ScenarioShape::StaticGet).count(), 10);
        assert_eq!(shapes.iter().filter(|s| **s == ScenarioShape::QueryGet).count(), 17);
        assert_eq!(shapes.iter().filter(|s| **s == ScenarioShape::PostThenVerify).count(), 15);
        assert_eq!(shapes.iter().filter(|s| **s == ScenarioShape::MutationChain).count(), 1);
    }

    #[test]
    fn test_default_suite_first_case() {
        let registry = default_suite().unwrap();
        let Scenario::Get(case) = &registry.all()[0].scenario else {
            panic!("first scenario should be a GET");
        };

        assert_eq!(case.request.path, "/users/1");
        assert_eq!(
            case.expect,
            Predicate::equals(Extractor::field("$.first_name"), "Пётр")
        );
    }

    #[test]
    fn test_post_defaults_to_empty_object_reply() {
        let registry = load_suite_str(
            r#"
name: posts
sections:
  - name: POST
    scenarios:
      - type: post_then_verify
        post: { path: /users/52, body: { "first_name": "Маша" } }
        verify:
          path: /users/52
          expect: { type: equals, extract: { type: field, path: $.first_name }, value: "Маша" }
"#,
        )
        .unwrap();

        let Scenario::PostThenVerify { post, .. } = &registry.all()[0].scenario else {
            panic!("expected a POST-then-verify scenario");
        };
        assert_eq!(post.expect, Predicate::empty_object());
        assert_eq!(
            post.request.body,
            Some(serde_json::json!({"first_name": "Маша"}))
        );
    }

    #[test]
    fn test_status_range_in_yaml() {
        let registry = load_suite_str(
            r"
name: params
sections:
  - name: GET params
    scenarios:
      - type: get
        path: /users/44/visits?toDistance=abc
        expect: { type: status, expected: { min: 400, max: 499 } }
",
        )
        .unwrap();

        let Scenario::Get(case) = &registry.all()[0].scenario else {
            panic!("expected a GET scenario");
        };
        assert_eq!(
            case.expect,
            Predicate::status(StatusExpectation::client_error())
        );
    }

    #[test]
    fn test_unknown_capture_is_rejected() {
        let result = load_suite_str(
            r#"
name: broken
sections:
  - name: chains
    scenarios:
      - type: chain
        name: c
        probes:
          - { name: visits, path: "/users/{nobody}/visits", measure: { type: length, path: $.visits } }
        steps:
          - { label: touch, path: /visits/1, body: { "mark": 1 } }
"#,
        );

        assert!(matches!(
            result,
            Err(SuiteLoadError::Invalid {
                source: DomainError::UnknownCapture { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_scenario_type_is_yaml_error() {
        let result = load_suite_str(
            "name: x\nsections:\n  - name: s\n    scenarios:\n      - { type: delete, path: /users/1 }\n",
        );
        assert!(matches!(result, Err(SuiteLoadError::Yaml(_))));
    }

    #[test]
    fn test_empty_suite_is_rejected() {
        let result = load_suite_str("name: nothing\nsections: []\n");
        assert!(matches!(result, Err(SuiteLoadError::Empty(name)) if name == "nothing"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            "name: file\nsections:\n  - name: GET\n    scenarios:\n      - { type: get, path: /users/1000000, expect: { type: status, expected: 404 } }\n"
                .as_bytes(),
        )
        .unwrap();

        let registry = load_suite_file(file.path()).unwrap();
        assert_eq!(registry.case_count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_suite_file(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(SuiteLoadError::Io { .. })));
    }
}

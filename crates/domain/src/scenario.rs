//! Test cases and the scenario shapes the registry holds.

use std::fmt;

use crate::error::{DomainError, DomainResult};
use crate::json_path;
use crate::mutation::MutationChain;
use crate::request::{HttpMethod, RequestSpec};
use crate::testing::Predicate;

/// One declarative request/expectation pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    /// Request to issue.
    pub request: RequestSpec,
    /// Predicate applied to the response.
    pub expect: Predicate,
}

impl TestCase {
    /// Creates a test case.
    #[must_use]
    pub const fn new(request: RequestSpec, expect: Predicate) -> Self {
        Self { request, expect }
    }

    /// Line label used in reports.
    #[must_use]
    pub fn label(&self) -> String {
        self.request.to_string()
    }

    /// Checks the request and any JSON path the predicate reads.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed paths.
    pub fn validate(&self) -> DomainResult<()> {
        self.request.validate()?;
        if let Predicate::Equals { extract, .. } = &self.expect
            && let Some(path) = extract.path()
        {
            json_path::validate(path)?;
        }
        Ok(())
    }
}

/// The four shapes of scenario the harness knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioShape {
    /// GET a fixed path.
    StaticGet,
    /// GET a path with a query string.
    QueryGet,
    /// POST a body, then GET to verify the effect.
    PostThenVerify,
    /// Baseline, mutate, re-measure.
    MutationChain,
}

impl fmt::Display for ScenarioShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StaticGet => "static GET",
            Self::QueryGet => "query GET",
            Self::PostThenVerify => "POST then verify",
            Self::MutationChain => "mutation chain",
        };
        f.write_str(name)
    }
}

/// A registry entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Scenario {
    /// A single GET request.
    Get(TestCase),
    /// A POST followed by a verifying GET. Produces two verdicts.
    PostThenVerify {
        /// The mutating request.
        post: TestCase,
        /// The follow-up read.
        verify: TestCase,
    },
    /// A stateful mutation chain.
    Chain(MutationChain),
}

impl Scenario {
    /// Builds a GET scenario.
    #[must_use]
    pub fn get(path: impl Into<String>, expect: Predicate) -> Self {
        Self::Get(TestCase::new(RequestSpec::get(path), expect))
    }

    /// Builds a POST-then-verify scenario.
    #[must_use]
    pub fn post_then_verify(post: TestCase, verify: TestCase) -> Self {
        Self::PostThenVerify { post, verify }
    }

    /// The shape of this scenario.
    #[must_use]
    pub fn shape(&self) -> ScenarioShape {
        match self {
            Self::Get(case) if case.request.has_query() => ScenarioShape::QueryGet,
            Self::Get(_) => ScenarioShape::StaticGet,
            Self::PostThenVerify { .. } => ScenarioShape::PostThenVerify,
            Self::Chain(_) => ScenarioShape::MutationChain,
        }
    }

    /// Number of verdicts this scenario produces when run.
    #[must_use]
    pub fn case_count(&self) -> usize {
        match self {
            Self::Get(_) => 1,
            Self::PostThenVerify { .. } => 2,
            Self::Chain(chain) => chain.case_count(),
        }
    }

    /// Short title for listings.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::Get(case) => case.label(),
            Self::PostThenVerify { post, verify } => {
                format!("{} -> {}", post.label(), verify.request.path)
            }
            Self::Chain(chain) => format!("chain {}", chain.name),
        }
    }

    /// Structural validation.
    ///
    /// # Errors
    ///
    /// Returns an error if a request has the wrong method or a path or chain
    /// is malformed.
    pub fn validate(&self) -> DomainResult<()> {
        match self {
            Self::Get(case) => {
                expect_method(case, HttpMethod::Get)?;
                case.validate()
            }
            Self::PostThenVerify { post, verify } => {
                expect_method(post, HttpMethod::Post)?;
                expect_method(verify, HttpMethod::Get)?;
                post.validate()?;
                verify.validate()
            }
            Self::Chain(chain) => chain.validate(),
        }
    }
}

fn expect_method(case: &TestCase, method: HttpMethod) -> DomainResult<()> {
    if case.request.method == method {
        Ok(())
    } else {
        Err(DomainError::InvalidScenario(format!(
            "{} must be a {method} request",
            case.request.path
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Extractor, StatusExpectation};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_get_shapes() {
        let plain = Scenario::get(
            "/users/1",
            Predicate::equals(Extractor::field("$.first_name"), "Пётр"),
        );
        assert_eq!(plain.shape(), ScenarioShape::StaticGet);
        assert_eq!(plain.case_count(), 1);

        let query = Scenario::get(
            "/users/44/visits?toDistance=abc",
            Predicate::status(StatusExpectation::client_error()),
        );
        assert_eq!(query.shape(), ScenarioShape::QueryGet);
    }

    #[test]
    fn test_post_then_verify_counts_two_cases() {
        let scenario = Scenario::post_then_verify(
            TestCase::new(
                RequestSpec::post("/users/new", json!({"id": 808_081})),
                Predicate::empty_object(),
            ),
            TestCase::new(
                RequestSpec::get("/users/808081"),
                Predicate::equals(Extractor::field("$.first_name"), "Jessie"),
            ),
        );
        assert_eq!(scenario.shape(), ScenarioShape::PostThenVerify);
        assert_eq!(scenario.case_count(), 2);
        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.title(), "POST /users/new -> /users/808081");
    }

    #[test]
    fn test_post_then_verify_rejects_swapped_methods() {
        let scenario = Scenario::post_then_verify(
            TestCase::new(RequestSpec::get("/users/1"), Predicate::empty_object()),
            TestCase::new(RequestSpec::get("/users/1"), Predicate::empty_object()),
        );
        assert!(matches!(
            scenario.validate(),
            Err(DomainError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_json_path() {
        let scenario = Scenario::get(
            "/users/1",
            Predicate::equals(Extractor::field("first_name"), "Пётр"),
        );
        assert!(matches!(
            scenario.validate(),
            Err(DomainError::InvalidJsonPath { .. })
        ));
    }
}

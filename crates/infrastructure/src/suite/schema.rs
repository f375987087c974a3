//! Suite file types.
//!
//! These mirror the YAML layout and are mapped onto domain scenarios by
//! the loader. Predicates, captures, probes and effects
//! reuse the domain types directly since their serde shape is the file
//! shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tripcheck_domain::mutation::{Capture, Effect, MutationChain, MutationStep, Probe};
use tripcheck_domain::request::RequestSpec;
use tripcheck_domain::{Predicate, Scenario, TestCase};

/// Root of a suite file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteFile {
    /// Suite name.
    pub name: String,
    /// Sections, in execution order.
    #[serde(default)]
    pub sections: Vec<SectionFile>,
}

/// A named group of scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionFile {
    /// Section name, shown as a banner.
    pub name: String,
    /// Scenarios, in execution order.
    #[serde(default)]
    pub scenarios: Vec<ScenarioFile>,
}

/// One scenario entry, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioFile {
    /// `type: get`
    Get {
        /// Path with optional query string.
        path: String,
        /// Predicate on the response.
        expect: Predicate,
    },
    /// `type: post_then_verify`
    PostThenVerify {
        /// The mutating request.
        post: PostFile,
        /// The verifying read.
        verify: GetFile,
    },
    /// `type: chain`
    Chain {
        /// Chain name.
        name: String,
        /// Values read once up front.
        #[serde(default)]
        captures: Vec<Capture>,
        /// Named measurements.
        #[serde(default)]
        probes: Vec<Probe>,
        /// Mutations.
        steps: Vec<StepFile>,
    },
}

/// A POST and the predicate on its reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostFile {
    /// Target path.
    pub path: String,
    /// JSON body.
    pub body: Value,
    /// Defaults to the empty-object acceptance reply.
    #[serde(default = "Predicate::empty_object")]
    pub expect: Predicate,
}

/// A GET and the predicate on its reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetFile {
    /// Target path.
    pub path: String,
    /// Predicate on the response.
    pub expect: Predicate,
}

/// One mutation step of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepFile {
    /// Label shown in reports.
    pub label: String,
    /// Target path; may reference captures.
    pub path: String,
    /// Partial update body.
    pub body: Value,
    /// Defaults to the empty-object acceptance reply.
    #[serde(default = "Predicate::empty_object")]
    pub expect: Predicate,
    /// Expected probe movements.
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl ScenarioFile {
    /// Maps the file entry onto a domain scenario.
    #[must_use]
    pub fn into_scenario(self) -> Scenario {
        match self {
            Self::Get { path, expect } => Scenario::get(path, expect),
            Self::PostThenVerify { post, verify } => Scenario::post_then_verify(
                TestCase::new(RequestSpec::post(post.path, post.body), post.expect),
                TestCase::new(RequestSpec::get(verify.path), verify.expect),
            ),
            Self::Chain {
                name,
                captures,
                probes,
                steps,
            } => Scenario::Chain(MutationChain {
                name,
                captures,
                probes,
                steps: steps
                    .into_iter()
                    .map(|step| MutationStep {
                        label: step.label,
                        request: RequestSpec::post(step.path, step.body),
                        expect: step.expect,
                        effects: step.effects,
                    })
                    .collect(),
            }),
        }
    }
}

//! Tripcheck Domain - Core conformance types
//!
//! This crate defines the model of a conformance run: requests, responses,
//! predicates, verdicts, scenarios, mutation chains and the registry that
//! orders them. All types here are pure Rust with no I/O dependencies.

pub mod comparison;
pub mod error;
pub mod json_path;
pub mod mutation;
pub mod registry;
pub mod request;
pub mod response;
pub mod scenario;
pub mod testing;

pub use error::{DomainError, DomainResult};
pub use mutation::{
    Amount, Capture, Captures, Effect, EffectCheck, Expectation, MutationChain, MutationStep,
    Probe, Term,
};
pub use registry::{CaseRegistry, RegistryBuilder, RegistryEntry};
pub use scenario::{Scenario, ScenarioShape, TestCase};
pub use testing::{
    CaseRef, CustomCheck, ExtractError, Extractor, FailureKind, Predicate, RunSummary, ScenarioId,
    StatusExpectation, Verdict,
};

//! Suite files: YAML schema, loader and the embedded default suite.

mod loader;
mod schema;

pub use loader::{
    DEFAULT_SUITE_YAML, SuiteLoadError, default_suite, load_suite_file, load_suite_str,
};
pub use schema::{GetFile, PostFile, ScenarioFile, SectionFile, StepFile, SuiteFile};

//! Terminal reporting.

mod console;

pub use console::{ConsoleReporter, write_listing};

//! Browser conformance harness
//!
//! Resolves per-browser expected values (profile over family group over
//! default, for either the real-browser truth or the emulator's current
//! state), runs test pages through an emulation engine and compares what the
//! engine emitted against the resolved expectation.

pub mod capture;
pub mod cli;
pub mod commands;
pub mod common;
pub mod compare;
pub mod engine;
pub mod expect;
pub mod profile;
pub mod report;
pub mod resolve;
pub mod runner;
pub mod suite;

// Re-export commonly used types for tests
pub use capture::{CapturedOutput, Executor, FAULT_SENTINEL};
pub use common::{Error, Result};
pub use compare::{ComparisonResult, MemberDiff};
pub use expect::{ExpectationTable, Expectations, Mode};
pub use profile::ProfileRegistry;
pub use resolve::resolve;

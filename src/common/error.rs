//! Error types for the conformance harness
//!
//! Configuration errors name the test case and the key or profile involved so
//! a suite author can fix the data without reading harness code.

use std::io;
use thiserror::Error;

use crate::expect::Mode;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the conformance harness
#[derive(Error, Debug)]
pub enum Error {
    // === Profile Errors ===
    #[error("Profile '{id}' already registered in group {existing}, cannot re-register in group {requested}")]
    DuplicateProfile {
        id: String,
        existing: String,
        requested: String,
    },

    #[error("Profile '{0}' clashes with a group of the same name")]
    ProfileGroupClash(String),

    #[error("Unknown profile '{0}'. Use 'conformance profiles' to list registered profiles")]
    UnknownProfile(String),

    // === Expectation Errors ===
    #[error("Test '{test}': no {mode} expectation resolves for profile '{profile}' (no profile, group or default entry)")]
    MissingExpectation {
        test: String,
        profile: String,
        mode: Mode,
    },

    #[error("Test '{test}': {mode} key '{key}' is neither 'default', a profile nor a group")]
    UnknownExpectationKey {
        test: String,
        key: String,
        mode: Mode,
    },

    // === Suite Errors ===
    #[error("Test '{0}' is defined more than once")]
    DuplicateTest(String),

    #[error("Test '{0}' not found in suite")]
    UnknownTest(String),

    #[error("Test '{test}' must define exactly one of 'html', 'page' or 'script'")]
    InvalidPage { test: String },

    #[error("Suite has {} configuration defect(s):\n  {}", .0.len(), .0.join("\n  "))]
    InvalidSuite(Vec<String>),

    // === Engine Errors ===
    #[error("Engine '{name}' not found. Set [engine] command in the config or pass --engine")]
    EngineNotFound { name: String },

    #[error("Engine failed: {0}")]
    EngineFailed(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a missing expectation error
    pub fn missing_expectation(test: &str, profile: &str, mode: Mode) -> Self {
        Self::MissingExpectation {
            test: test.to_string(),
            profile: profile.to_string(),
            mode,
        }
    }

    /// Create an unknown expectation key error
    pub fn unknown_key(test: &str, key: &str, mode: Mode) -> Self {
        Self::UnknownExpectationKey {
            test: test.to_string(),
            key: key.to_string(),
            mode,
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Whether this error is a defect in the suite or configuration rather
    /// than a runtime fault
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::DuplicateProfile { .. }
                | Error::ProfileGroupClash(_)
                | Error::UnknownProfile(_)
                | Error::MissingExpectation { .. }
                | Error::UnknownExpectationKey { .. }
                | Error::DuplicateTest(_)
                | Error::UnknownTest(_)
                | Error::InvalidPage { .. }
                | Error::InvalidSuite(_)
                | Error::Config(_)
                | Error::ConfigParse(_)
        )
    }
}

//! CLI command definitions
//!
//! Defines the clap commands for the conformance CLI.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::expect::Mode;

/// Which expectation sets to check
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Real-browser truth
    Target,
    /// Emulator's current known state
    Current,
    /// Both sets, as independent units
    Both,
}

impl ModeArg {
    pub fn modes(self) -> Vec<Mode> {
        match self {
            ModeArg::Target => vec![Mode::Target],
            ModeArg::Current => vec![Mode::Current],
            ModeArg::Both => Mode::ALL.to_vec(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a suite against an emulation engine
    Run {
        /// Path to the YAML suite file
        suite: PathBuf,

        /// Engine program (overrides [engine] command from the config)
        #[arg(long)]
        engine: Option<String>,

        /// Replay recorded engine output from a YAML file instead of running an engine
        #[arg(long, conflicts_with = "engine")]
        replay: Option<PathBuf>,

        /// Only run these profiles (repeatable)
        #[arg(long = "profile", short = 'p')]
        profiles: Vec<String>,

        /// Only run these tests (repeatable)
        #[arg(long = "test", short = 't')]
        tests: Vec<String>,

        /// Expectation set to check
        #[arg(long, value_enum, default_value = "target")]
        mode: ModeArg,

        /// Maximum concurrent executions (default from config)
        #[arg(long, short)]
        jobs: Option<usize>,

        /// Per-execution timeout in seconds (default from config)
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Also list passing units
        #[arg(long, short)]
        verbose: bool,
    },

    /// Check a suite for configuration defects without running it
    Validate {
        /// Path to the YAML suite file
        suite: PathBuf,
    },

    /// Show which expectation applies to a test on a profile
    Resolve {
        /// Path to the YAML suite file
        suite: PathBuf,

        /// Test identifier
        test: String,

        /// Profile identifier
        profile: String,

        /// Expectation set to resolve
        #[arg(long, value_enum, default_value = "both")]
        mode: ModeArg,
    },

    /// List registered profiles and their groups
    Profiles {
        /// Include profiles declared by this suite
        #[arg(long)]
        suite: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration and log file locations
    Config,
}

//! Run reports
//!
//! Aggregates unit outcomes and renders them for a terminal or as JSON.
//! Nothing here outlives the run.

use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::compare::{ComparisonResult, UnitOutcome};
use crate::expect::Mode;

/// Exit code when every executed unit passed
pub const EXIT_PASSED: i32 = 0;
/// Exit code when at least one unit failed
pub const EXIT_FAILED: i32 = 1;
/// Exit code when the suite or configuration is defective
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when the run was interrupted
pub const EXIT_CANCELLED: i32 = 130;

/// A unit that never reached comparison
#[derive(Debug, Clone, Serialize)]
pub struct CancelledUnit {
    pub test: String,
    pub profile: String,
    pub mode: Mode,
}

/// Pass/fail counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct Counts {
    pub passed: usize,
    pub failed: usize,
}

/// Totals over the run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub by_mode: BTreeMap<Mode, Counts>,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub suite: String,
    pub summary: Summary,
    pub results: Vec<ComparisonResult>,
    pub cancelled: Vec<CancelledUnit>,
}

impl Report {
    pub fn new(suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            summary: Summary::default(),
            results: Vec::new(),
            cancelled: Vec::new(),
        }
    }

    /// Record one unit outcome
    pub fn push(&mut self, outcome: UnitOutcome) {
        self.summary.total += 1;
        match outcome {
            UnitOutcome::Completed(result) => {
                let counts = self.summary.by_mode.entry(result.mode).or_default();
                if result.passed {
                    self.summary.passed += 1;
                    counts.passed += 1;
                } else {
                    self.summary.failed += 1;
                    counts.failed += 1;
                }
                self.results.push(result);
            }
            UnitOutcome::Cancelled {
                test,
                profile,
                mode,
            } => {
                self.summary.cancelled += 1;
                self.cancelled.push(CancelledUnit {
                    test,
                    profile,
                    mode,
                });
            }
        }
    }

    /// Put results in a stable order regardless of completion order
    pub fn finish(&mut self) {
        self.results.sort_by(|a, b| {
            (&a.test, &a.profile, a.mode).cmp(&(&b.test, &b.profile, b.mode))
        });
        self.cancelled.sort_by(|a, b| {
            (&a.test, &a.profile, a.mode).cmp(&(&b.test, &b.profile, b.mode))
        });
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Every failing (test, profile, mode) triple
    pub fn failures(&self) -> impl Iterator<Item = &ComparisonResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn exit_code(&self) -> i32 {
        if self.summary.failed > 0 {
            EXIT_FAILED
        } else if self.summary.cancelled > 0 {
            EXIT_CANCELLED
        } else {
            EXIT_PASSED
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Print the report to stdout
    pub fn print(&self, verbose: bool) {
        println!(
            "\n{} {}",
            "Suite:".blue().bold(),
            self.suite.white().bold()
        );

        if verbose {
            for result in self.results.iter().filter(|r| r.passed) {
                println!(
                    "  {} {} [{} {}] via {}",
                    "✓".green(),
                    result.test,
                    result.profile.dimmed(),
                    result.mode.as_str().dimmed(),
                    result.matched_key.dimmed()
                );
            }
        }

        let failures: Vec<&ComparisonResult> = self.failures().collect();
        if !failures.is_empty() {
            println!("\n{}", "Failures:".red().bold());
            for result in failures {
                print_failure(result);
            }
        }

        if !self.cancelled.is_empty() {
            println!(
                "\n{} {} unit(s) cancelled",
                "!".yellow().bold(),
                self.cancelled.len()
            );
        }

        println!();
        for (mode, counts) in &self.summary.by_mode {
            println!(
                "  {:<8} {} passed, {} failed",
                mode.as_str(),
                counts.passed.to_string().green(),
                counts.failed.to_string().red()
            );
        }

        let line = format!(
            "{} passed, {} failed, {} cancelled ({} total)",
            self.summary.passed, self.summary.failed, self.summary.cancelled, self.summary.total
        );
        if self.summary.failed == 0 && self.summary.cancelled == 0 {
            println!("\n{} {}\n", "✓".green().bold(), line.green().bold());
        } else {
            println!("\n{} {}\n", "✗".red().bold(), line.red().bold());
        }
    }
}

fn print_failure(result: &ComparisonResult) {
    println!(
        "  {} {} [{} {}]",
        "✗".red(),
        result.test.white().bold(),
        result.profile,
        result.mode
    );
    println!("      expected ({}): {}", result.matched_key, result.expected);
    println!("      captured: {}", result.captured);
    if let Some(diff) = &result.diff {
        if diff.is_empty() {
            println!("      {}", "same members, different order or grouping".dimmed());
        }
        if !diff.missing_from_captured.is_empty() {
            println!(
                "      {} {}",
                "missing:".yellow(),
                diff.missing_from_captured.join(", ")
            );
        }
        if !diff.unexpected_in_captured.is_empty() {
            println!(
                "      {} {}",
                "unexpected:".yellow(),
                diff.unexpected_in_captured.join(", ")
            );
        }
    }
}

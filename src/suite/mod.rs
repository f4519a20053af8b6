//! Test suites
//!
//! A suite is built once from a YAML file into read-only tables: test cases
//! live in an arena addressed by [`TestId`], and the profile registry is
//! frozen behind an `Arc`. Validation runs before anything executes, so a
//! forgotten expectation aborts the run instead of showing up as a failure.

mod config;

pub use config::{
    ExpectDefinition, SuiteFile, TestDefinition, DEFAULT_TEMPLATE, SCRIPT_PLACEHOLDER,
};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::common::{Error, Result};
use crate::expect::members::{split_alerts, MemberList};
use crate::expect::{ExpectationKey, ExpectationTable, Expectations, Mode};
use crate::profile::ProfileRegistry;
use crate::resolve::resolve;

/// Index of a test case within its suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TestId(pub usize);

/// One test case, ready to execute
#[derive(Debug, Clone)]
pub struct TestCase {
    /// Unique identifier
    pub id: String,
    /// Generated page markup
    pub html: String,
    /// Expected values per mode
    pub expectations: Expectations,
}

/// Non-fatal findings from validation
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

/// A loaded suite
#[derive(Debug)]
pub struct Suite {
    pub name: String,
    pub description: Option<String>,
    tests: Vec<TestCase>,
    index: HashMap<String, TestId>,
    registry: Arc<ProfileRegistry>,
}

impl Suite {
    /// Load a suite from a YAML file
    ///
    /// Profiles declared by the suite are registered on top of `registry`.
    /// `page` paths resolve relative to the suite file.
    pub fn load(path: &Path, registry: ProfileRegistry) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::from_yaml(&content, base_dir, registry)
    }

    /// Build a suite from YAML text
    pub fn from_yaml(content: &str, base_dir: &Path, registry: ProfileRegistry) -> Result<Self> {
        let file: SuiteFile = serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse suite: {}", e)))?;
        Self::build(file, base_dir, registry)
    }

    /// Build a suite from a parsed file
    pub fn build(file: SuiteFile, base_dir: &Path, mut registry: ProfileRegistry) -> Result<Self> {
        for profile in &file.profiles {
            registry.register(&profile.id, profile.group.as_deref())?;
        }

        let template = file.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
        if !template.contains(SCRIPT_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "Suite template must contain '{}'",
                SCRIPT_PLACEHOLDER
            )));
        }

        let mut tests = Vec::with_capacity(file.tests.len());
        let mut index = HashMap::with_capacity(file.tests.len());

        for def in file.tests {
            if index.contains_key(&def.id) {
                return Err(Error::DuplicateTest(def.id));
            }
            let html = build_page(&def, base_dir, template)?;
            let expectations = Expectations::new(
                def.expect.target.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
                def.expect
                    .current
                    .as_ref()
                    .map(|m| m.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect::<ExpectationTable>()),
            );

            index.insert(def.id.clone(), TestId(tests.len()));
            tests.push(TestCase {
                id: def.id,
                html,
                expectations,
            });
        }

        tracing::info!(
            suite = %file.name,
            tests = tests.len(),
            profiles = registry.len(),
            "Suite loaded"
        );

        Ok(Self {
            name: file.name,
            description: file.description,
            tests,
            index,
            registry: Arc::new(registry),
        })
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn get(&self, id: TestId) -> &TestCase {
        &self.tests[id.0]
    }

    /// Find a test case by its identifier
    pub fn find(&self, id: &str) -> Result<(TestId, &TestCase)> {
        self.index
            .get(id)
            .map(|&tid| (tid, &self.tests[tid.0]))
            .ok_or_else(|| Error::UnknownTest(id.to_string()))
    }

    pub fn test_ids(&self) -> impl Iterator<Item = TestId> {
        (0..self.tests.len()).map(TestId)
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<ProfileRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Check the suite for configuration defects
    ///
    /// Every key must be `default`, a registered profile or a group, and every
    /// test must resolve a target expectation for every registered profile.
    /// All defects are collected into one [`Error::InvalidSuite`].
    pub fn validate(&self) -> Result<ValidationReport> {
        let mut defects = Vec::new();
        let mut report = ValidationReport::default();

        for test in &self.tests {
            for mode in Mode::ALL {
                for (key, value) in test.expectations.entries(mode) {
                    if let ExpectationKey::Id(id) = key {
                        if !self.registry.contains(id) && !self.registry.is_group(id) {
                            defects.push(Error::unknown_key(&test.id, id, mode).to_string());
                        }
                    }
                    for alert in split_alerts(value) {
                        let members = MemberList::parse(alert);
                        if !members.is_case_fold_sorted() {
                            report.warnings.push(format!(
                                "Test '{}': {} value for '{}' is not in case-insensitive order: {} (sorted: {})",
                                test.id,
                                mode,
                                key,
                                alert,
                                members.sorted().render()
                            ));
                        }
                    }
                }
            }

            for profile in self.registry.profiles() {
                if let Err(e) = resolve(
                    &test.id,
                    &test.expectations,
                    &self.registry,
                    &profile.id,
                    Mode::Target,
                ) {
                    defects.push(e.to_string());
                }
            }
        }

        for warning in &report.warnings {
            tracing::warn!("{}", warning);
        }

        if defects.is_empty() {
            Ok(report)
        } else {
            Err(Error::InvalidSuite(defects))
        }
    }
}

fn build_page(def: &TestDefinition, base_dir: &Path, template: &str) -> Result<String> {
    match (&def.html, &def.page, &def.script) {
        (Some(html), None, None) => Ok(html.clone()),
        (None, Some(page), None) => {
            let path = if page.is_relative() {
                base_dir.join(page)
            } else {
                page.clone()
            };
            std::fs::read_to_string(&path).map_err(|e| Error::file_read(&path, e))
        }
        (None, None, Some(script)) => Ok(template.replace(SCRIPT_PLACEHOLDER, script)),
        _ => Err(Error::InvalidPage {
            test: def.id.clone(),
        }),
    }
}

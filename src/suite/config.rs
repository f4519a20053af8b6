//! Suite file configuration types
//!
//! Defines the data structures for deserializing YAML suite files.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::common::config::ProfileConfig;

/// Placeholder replaced by a test's script in the page template
pub const SCRIPT_PLACEHOLDER: &str = "{{script}}";

/// Template used for `script` tests when the suite does not define one
pub const DEFAULT_TEMPLATE: &str = "<html><head><script>\n{{script}}\n</script></head><body onload='test()'></body></html>";

/// A complete suite loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct SuiteFile {
    /// Name of the suite
    pub name: String,
    /// Optional description of what the suite covers
    pub description: Option<String>,
    /// Extra profiles to register for this suite
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
    /// Page template for `script` tests, containing `{{script}}`
    pub template: Option<String>,
    /// The test cases
    pub tests: Vec<TestDefinition>,
}

/// One test case as written in the suite file
#[derive(Deserialize, Debug)]
pub struct TestDefinition {
    /// Unique test identifier
    pub id: String,
    /// Optional description
    pub description: Option<String>,
    /// Inline page markup
    pub html: Option<String>,
    /// Path to a page file, relative to the suite file
    pub page: Option<PathBuf>,
    /// Script inserted into the suite's page template
    pub script: Option<String>,
    /// Expected values per mode
    pub expect: ExpectDefinition,
}

/// Both expectation maps of a test case
#[derive(Deserialize, Debug)]
pub struct ExpectDefinition {
    /// Real-browser truth, keyed by profile, group or `default`
    pub target: BTreeMap<String, String>,
    /// Known emulator state; omitted for tests without known gaps
    pub current: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suite_file() {
        let suite: SuiteFile = serde_yaml::from_str(
            r#"
name: prototypes
profiles:
  - id: FF78
    group: FF
tests:
  - id: document
    html: "<html></html>"
    expect:
      target:
        default: "a,b()"
        IE: "-"
      current:
        FF: "a"
  - id: window
    script: "function test() { alert('x'); }"
    expect:
      target: {}
"#,
        )
        .unwrap();

        assert_eq!(suite.name, "prototypes");
        assert_eq!(suite.profiles[0].group.as_deref(), Some("FF"));
        assert_eq!(suite.tests.len(), 2);
        assert_eq!(suite.tests[0].expect.target["IE"], "-");
        assert_eq!(suite.tests[0].expect.current.as_ref().unwrap()["FF"], "a");
        assert!(suite.tests[1].expect.target.is_empty());
        assert!(suite.tests[1].expect.current.is_none());
    }

    #[test]
    fn test_target_is_required() {
        let result: Result<SuiteFile, _> = serde_yaml::from_str(
            r#"
name: s
tests:
  - id: t
    html: ""
    expect:
      current: {}
"#,
        );
        assert!(result.is_err());
    }
}

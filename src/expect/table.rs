//! Expectation tables
//!
//! A test case carries one table per mode. Keys are a profile id, a group id
//! or the literal `default`; which of the first two a key names is decided by
//! the profile registry when resolving, never by the shape of the string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::common::Error;

/// Literal key of the catch-all entry
pub const DEFAULT_KEY: &str = "default";

/// Which expectation set is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Real-browser ground truth
    Target,
    /// What the emulator currently produces, known gaps included
    Current,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Target, Mode::Current];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Target => "target",
            Mode::Current => "current",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "target" => Ok(Mode::Target),
            "current" => Ok(Mode::Current),
            _ => Err(Error::Config(format!(
                "Unknown mode '{}'. Supported modes: 'target', 'current'",
                s
            ))),
        }
    }
}

/// Key of a table entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExpectationKey {
    /// Applies to every profile without a more specific entry
    Default,
    /// A profile id or a group id
    Id(String),
}

impl ExpectationKey {
    pub fn id(id: impl Into<String>) -> Self {
        ExpectationKey::Id(id.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExpectationKey::Default => DEFAULT_KEY,
            ExpectationKey::Id(id) => id,
        }
    }
}

impl From<&str> for ExpectationKey {
    fn from(s: &str) -> Self {
        if s == DEFAULT_KEY {
            ExpectationKey::Default
        } else {
            ExpectationKey::Id(s.to_string())
        }
    }
}

impl fmt::Display for ExpectationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key to expected value mapping for one mode of one test case
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectationTable {
    entries: BTreeMap<ExpectationKey, String>,
}

impl ExpectationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry
    pub fn set(&mut self, key: impl Into<ExpectationKey>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &ExpectationKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up an entry for a profile or group id
    pub fn get_id(&self, id: &str) -> Option<&str> {
        // `default` is never a profile or group, so it must not match here
        if id == DEFAULT_KEY {
            return None;
        }
        self.get(&ExpectationKey::id(id))
    }

    pub fn get_default(&self) -> Option<&str> {
        self.get(&ExpectationKey::Default)
    }

    /// Raw entries, `default` first, then ids in lexical order
    pub fn entries(&self) -> impl Iterator<Item = (&ExpectationKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<ExpectationKey>, V: Into<String>> FromIterator<(K, V)> for ExpectationTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, value) in iter {
            table.set(key, value);
        }
        table
    }
}

/// Both expectation sets of one test case
///
/// The target table is always present. The current table only exists for
/// tests with known emulator gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectations {
    target: ExpectationTable,
    current: Option<ExpectationTable>,
}

impl Expectations {
    pub fn new(target: ExpectationTable, current: Option<ExpectationTable>) -> Self {
        Self { target, current }
    }

    /// Insert or overwrite an entry in the table for `mode`
    pub fn set(&mut self, mode: Mode, key: impl Into<ExpectationKey>, value: impl Into<String>) {
        match mode {
            Mode::Target => self.target.set(key, value),
            Mode::Current => self.current.get_or_insert_with(Default::default).set(key, value),
        }
    }

    /// Table for `mode`, if that mode has one
    pub fn table(&self, mode: Mode) -> Option<&ExpectationTable> {
        match mode {
            Mode::Target => Some(&self.target),
            Mode::Current => self.current.as_ref(),
        }
    }

    pub fn target(&self) -> &ExpectationTable {
        &self.target
    }

    /// Raw entries for `mode`; empty when the mode has no table
    pub fn entries(&self, mode: Mode) -> Vec<(&ExpectationKey, &str)> {
        self.table(mode)
            .map(|t| t.entries().collect())
            .unwrap_or_default()
    }

    pub fn has_current(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("target".parse::<Mode>().unwrap(), Mode::Target);
        assert_eq!("CURRENT".parse::<Mode>().unwrap(), Mode::Current);
        assert!("both".parse::<Mode>().is_err());
        assert_eq!(Mode::Current.to_string(), "current");
    }

    #[test]
    fn test_default_key_parses_to_default() {
        assert_eq!(ExpectationKey::from("default"), ExpectationKey::Default);
        assert_eq!(ExpectationKey::from("FF"), ExpectationKey::id("FF"));
        assert_eq!(ExpectationKey::Default.to_string(), "default");
    }

    #[test]
    fn test_set_overwrites() {
        let mut table = ExpectationTable::new();
        table.set("IE", "a");
        table.set("IE", "b");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get_id("IE"), Some("b"));
        assert_eq!(table.get_id("default"), None);
    }

    #[test]
    fn test_entries_default_first() {
        let table: ExpectationTable = [("IE", "x"), ("default", "y"), ("CHROME", "z")]
            .into_iter()
            .collect();
        let keys: Vec<String> = table.entries().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["default", "CHROME", "IE"]);
    }

    #[test]
    fn test_current_table_created_on_first_set() {
        let mut expectations = Expectations::default();
        assert!(expectations.table(Mode::Current).is_none());
        assert!(expectations.entries(Mode::Current).is_empty());
        assert!(!expectations.has_current());

        expectations.set(Mode::Current, "FF", "a");
        assert!(expectations.has_current());
        assert_eq!(expectations.entries(Mode::Current).len(), 1);
        assert!(expectations.entries(Mode::Target).is_empty());
    }
}

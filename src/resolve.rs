//! Expectation resolution
//!
//! Picks the single expected value for a (test, profile, mode) triple:
//!
//! 1. an entry keyed by the profile itself
//! 2. an entry keyed by the profile's group
//! 3. the `default` entry
//!
//! In [`Mode::Current`] the target table is consulted with the same order
//! when the current table has no applicable entry, since a test without known
//! emulator gaps has no current table at all.

use serde::Serialize;

use crate::common::{Error, Result};
use crate::expect::{ExpectationKey, ExpectationTable, Expectations, Mode};
use crate::profile::ProfileRegistry;

/// Which entry a resolution used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    Profile,
    Group,
    Default,
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// The expected value
    pub value: &'a str,
    /// Key of the entry that supplied the value
    pub key: ExpectationKey,
    /// How the key relates to the resolved profile
    pub matched_by: MatchedBy,
    /// Table the value came from; differs from the requested mode only when
    /// a current-mode lookup fell through to the target table
    pub source: Mode,
}

/// Resolve the expected value, returning only the value
pub fn resolve<'a>(
    test: &str,
    expectations: &'a Expectations,
    registry: &ProfileRegistry,
    profile: &str,
    mode: Mode,
) -> Result<&'a str> {
    resolve_entry(test, expectations, registry, profile, mode).map(|r| r.value)
}

/// Resolve the expected value and report which entry supplied it
pub fn resolve_entry<'a>(
    test: &str,
    expectations: &'a Expectations,
    registry: &ProfileRegistry,
    profile: &str,
    mode: Mode,
) -> Result<Resolution<'a>> {
    let group = registry.group_of(profile);

    let found = expectations
        .table(mode)
        .and_then(|table| lookup(table, profile, group))
        .map(|(value, key, matched_by)| (value, key, matched_by, mode));

    let found = match (found, mode) {
        (Some(found), _) => Some(found),
        (None, Mode::Current) => lookup(expectations.target(), profile, group)
            .map(|(value, key, matched_by)| (value, key, matched_by, Mode::Target)),
        (None, Mode::Target) => None,
    };

    match found {
        Some((value, key, matched_by, source)) => Ok(Resolution {
            value,
            key,
            matched_by,
            source,
        }),
        None => Err(Error::missing_expectation(test, profile, mode)),
    }
}

/// Precedence lookup within a single table
fn lookup<'a>(
    table: &'a ExpectationTable,
    profile: &str,
    group: Option<&str>,
) -> Option<(&'a str, ExpectationKey, MatchedBy)> {
    if let Some(value) = table.get_id(profile) {
        return Some((value, ExpectationKey::id(profile), MatchedBy::Profile));
    }
    if let Some(group) = group {
        if let Some(value) = table.get_id(group) {
            return Some((value, ExpectationKey::id(group), MatchedBy::Group));
        }
    }
    table
        .get_default()
        .map(|value| (value, ExpectationKey::Default, MatchedBy::Default))
}

//! Profile registry
//!
//! Knows which browser profiles exist and which family group each belongs to.
//! Populated once while the suite is built and shared read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use crate::common::{Error, Result};

/// One simulated browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    /// Unique identifier (e.g., "FF68", "IE")
    pub id: String,
    /// Family group, shared by several versions of the same browser
    pub group: Option<String>,
}

impl fmt::Display for BrowserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{} ({})", self.id, group),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Static description of a built-in profile
#[derive(Debug, Clone, Copy)]
pub struct ProfileInfo {
    pub id: &'static str,
    pub group: Option<&'static str>,
    pub description: &'static str,
}

/// Profiles every registry starts with
static BUILTIN_PROFILES: &[ProfileInfo] = &[
    ProfileInfo {
        id: "CHROME",
        group: None,
        description: "Chrome, current release",
    },
    ProfileInfo {
        id: "EDGE",
        group: None,
        description: "Edge, current release",
    },
    ProfileInfo {
        id: "FF60",
        group: Some("FF"),
        description: "Firefox 60 ESR",
    },
    ProfileInfo {
        id: "FF68",
        group: Some("FF"),
        description: "Firefox 68",
    },
    ProfileInfo {
        id: "IE",
        group: None,
        description: "Internet Explorer 11",
    },
];

/// Get the built-in profile catalogue
pub fn builtin_profiles() -> &'static [ProfileInfo] {
    BUILTIN_PROFILES
}

/// Registry of known profiles, in registration order
#[derive(Debug, Default, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<BrowserProfile>,
    index: HashMap<String, usize>,
}

impl ProfileRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in catalogue
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for info in BUILTIN_PROFILES {
            registry.insert(info.id, info.group);
        }
        registry
    }

    /// Register a profile
    ///
    /// Re-registering with the same group is a no-op. A different group, or
    /// an id that collides with a group name, is a configuration error.
    pub fn register(&mut self, id: &str, group: Option<&str>) -> Result<()> {
        if let Some(&existing) = self.index.get(id) {
            let existing = &self.profiles[existing];
            if existing.group.as_deref() == group {
                return Ok(());
            }
            return Err(Error::DuplicateProfile {
                id: id.to_string(),
                existing: describe_group(existing.group.as_deref()),
                requested: describe_group(group),
            });
        }

        if self.is_group(id) {
            return Err(Error::ProfileGroupClash(id.to_string()));
        }
        if let Some(group) = group {
            if group == id || self.index.contains_key(group) {
                return Err(Error::ProfileGroupClash(group.to_string()));
            }
        }

        tracing::debug!(profile = id, group = ?group, "Registered profile");
        self.insert(id, group);
        Ok(())
    }

    fn insert(&mut self, id: &str, group: Option<&str>) {
        self.index.insert(id.to_string(), self.profiles.len());
        self.profiles.push(BrowserProfile {
            id: id.to_string(),
            group: group.map(str::to_string),
        });
    }

    /// Get a profile by id
    pub fn get(&self, id: &str) -> Option<&BrowserProfile> {
        self.index.get(id).map(|&i| &self.profiles[i])
    }

    /// Whether a profile with this id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Group the profile belongs to, if any
    pub fn group_of(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|p| p.group.as_deref())
    }

    /// Whether at least one profile belongs to a group with this id
    pub fn is_group(&self, id: &str) -> bool {
        self.profiles.iter().any(|p| p.group.as_deref() == Some(id))
    }

    /// Profiles belonging to a group
    pub fn members_of<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a BrowserProfile> {
        self.profiles
            .iter()
            .filter(move |p| p.group.as_deref() == Some(group))
    }

    /// All registered profiles in registration order
    pub fn profiles(&self) -> &[BrowserProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn describe_group(group: Option<&str>) -> String {
    match group {
        Some(g) => format!("'{}'", g),
        None => "(none)".to_string(),
    }
}

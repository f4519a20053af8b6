//! Engine that replays recorded outputs
//!
//! Recordings are YAML keyed by test id, then profile id:
//!
//! ```yaml
//! document:
//!   CHROME: "a,b()"
//!   IE: ["first alert", "second alert"]
//! ```
//!
//! A missing recording is an engine error, which the executor turns into the
//! fault sentinel like any other engine failure.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::{Engine, PageRequest};
use crate::common::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Recording {
    One(String),
    Many(Vec<String>),
}

impl Recording {
    fn entries(&self) -> Vec<String> {
        match self {
            Recording::One(s) => vec![s.clone()],
            Recording::Many(v) => v.clone(),
        }
    }
}

/// Serves recorded engine output
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    recordings: HashMap<String, HashMap<String, Recording>>,
}

impl ReplayEngine {
    /// Load recordings from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let recordings = serde_yaml::from_str(content)?;
        Ok(Self { recordings })
    }

    /// Number of recorded (test, profile) pairs
    pub fn len(&self) -> usize {
        self.recordings.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Engine for ReplayEngine {
    fn name(&self) -> &str {
        "replay"
    }

    async fn run_page(&self, request: PageRequest<'_>) -> Result<Vec<String>> {
        self.recordings
            .get(request.test)
            .and_then(|by_profile| by_profile.get(request.profile))
            .map(Recording::entries)
            .ok_or_else(|| {
                Error::EngineFailed(format!(
                    "no recording for test '{}' on profile '{}'",
                    request.test, request.profile
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDINGS: &str = r#"
document:
  CHROME: "a,b()"
  IE: ["first", "second"]
"#;

    fn request<'a>(test: &'a str, profile: &'a str) -> PageRequest<'a> {
        PageRequest {
            test,
            profile,
            html: "",
        }
    }

    #[tokio::test]
    async fn test_replays_single_and_multiple_alerts() {
        let engine = ReplayEngine::parse(RECORDINGS).unwrap();
        assert_eq!(engine.len(), 2);

        let out = engine.run_page(request("document", "CHROME")).await.unwrap();
        assert_eq!(out, vec!["a,b()"]);

        let out = engine.run_page(request("document", "IE")).await.unwrap();
        assert_eq!(out, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_missing_recording_is_engine_error() {
        let engine = ReplayEngine::parse(RECORDINGS).unwrap();
        assert!(matches!(
            engine.run_page(request("document", "EDGE")).await,
            Err(Error::EngineFailed(_))
        ));
        assert!(matches!(
            engine.run_page(request("window", "CHROME")).await,
            Err(Error::EngineFailed(_))
        ));
    }
}

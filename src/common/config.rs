//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Emulation engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Runner settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Extra browser profiles registered on top of the built-in catalogue
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
}

/// Configuration for the external emulation engine
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineConfig {
    /// Program that runs a page and prints one emitted string per line
    pub command: Option<String>,

    /// Additional arguments to pass to the engine
    #[serde(default)]
    pub args: Vec<String>,
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Upper bound for a single page execution
    #[serde(default = "default_execute")]
    pub execute_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            execute_secs: default_execute(),
        }
    }
}

fn default_execute() -> u64 {
    30
}

/// Runner configuration
#[derive(Debug, Deserialize)]
pub struct RunnerConfig {
    /// Maximum number of units executing at once
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// A profile declared in the config file
#[derive(Debug, Deserialize, Clone)]
pub struct ProfileConfig {
    /// Profile identifier (e.g. "FF78")
    pub id: String,

    /// Family group the profile belongs to (e.g. "FF")
    #[serde(default)]
    pub group: Option<String>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        if config.runner.jobs == 0 {
            return Err(super::Error::Config(
                "[runner] jobs must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Resolve the engine executable
    ///
    /// An explicit override wins over the configured command. Bare names are
    /// looked up in PATH.
    pub fn engine_program(&self, override_cmd: Option<&str>) -> Option<PathBuf> {
        let name = override_cmd.or(self.engine.command.as_deref())?;
        let path = PathBuf::from(name);
        if path.components().count() > 1 || path.is_absolute() {
            return Some(path);
        }
        which::which(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.timeouts.execute_secs, 30);
        assert!(config.runner.jobs >= 1);
        assert!(config.engine.command.is_none());
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [engine]
            command = "/opt/emu/run-page"
            args = ["--headless"]

            [timeouts]
            execute_secs = 5

            [runner]
            jobs = 2

            [[profiles]]
            id = "FF78"
            group = "FF"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.command.as_deref(), Some("/opt/emu/run-page"));
        assert_eq!(config.engine.args, vec!["--headless"]);
        assert_eq!(config.timeouts.execute_secs, 5);
        assert_eq!(config.runner.jobs, 2);
        assert_eq!(config.profiles[0].id, "FF78");
        assert_eq!(config.profiles[0].group.as_deref(), Some("FF"));
    }

    #[test]
    fn test_zero_jobs_rejected() {
        assert!(Config::parse("[runner]\njobs = 0\n").is_err());
    }

    #[test]
    fn test_engine_program_keeps_explicit_paths() {
        let config = Config::default();
        assert_eq!(
            config.engine_program(Some("/opt/emu/run-page")),
            Some(PathBuf::from("/opt/emu/run-page"))
        );
        assert_eq!(config.engine_program(None), None);
    }
}

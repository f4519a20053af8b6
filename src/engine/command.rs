//! Engine backed by an external program
//!
//! The program receives the page on stdin and the profile as
//! `--profile <id>` (also exported as `CONFORMANCE_PROFILE`). Every stdout
//! line is one emitted string.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;

use super::{Engine, PageRequest};
use crate::common::config::Config;
use crate::common::{Error, Result};

/// Longest stderr excerpt kept in an engine error
const STDERR_EXCERPT: usize = 200;

/// Runs pages through an external program
#[derive(Debug, Clone)]
pub struct CommandEngine {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());
        Self {
            name,
            program,
            args,
        }
    }

    /// Build from configuration, with an optional command override
    pub fn from_config(config: &Config, override_cmd: Option<&str>) -> Result<Self> {
        let program = config.engine_program(override_cmd).ok_or_else(|| {
            Error::EngineNotFound {
                name: override_cmd
                    .or(config.engine.command.as_deref())
                    .unwrap_or("<unset>")
                    .to_string(),
            }
        })?;
        Ok(Self::new(program, config.engine.args.clone()))
    }
}

#[async_trait]
impl Engine for CommandEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_page(&self, request: PageRequest<'_>) -> Result<Vec<String>> {
        let mut child = TokioCommand::new(&self.program)
            .args(&self.args)
            .arg("--profile")
            .arg(request.profile)
            .env("CONFORMANCE_PROFILE", request.profile)
            .env("CONFORMANCE_TEST", request.test)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::EngineFailed(format!(
                    "failed to spawn '{}': {}",
                    self.program.display(),
                    e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Internal("engine stdin not captured".to_string()))?;
        let page = request.html.as_bytes().to_vec();
        // Feed stdin concurrently so a chatty engine cannot stall on a full pipe
        let feeder = tokio::spawn(async move {
            let result = stdin.write_all(&page).await;
            drop(stdin);
            result
        });

        let output = child.wait_with_output().await?;
        if let Ok(Err(e)) = feeder.await {
            tracing::debug!(engine = %self.name, "Engine did not read the whole page: {}", e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let excerpt: String = stderr.chars().take(STDERR_EXCERPT).collect();
            return Err(Error::EngineFailed(format!(
                "'{}' exited with {:?}: {}",
                self.name,
                output.status.code(),
                excerpt
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandEngine {
        CommandEngine::new(
            PathBuf::from("/bin/sh"),
            vec!["-c".to_string(), script.to_string(), "engine".to_string()],
        )
    }

    fn request<'a>(html: &'a str) -> PageRequest<'a> {
        PageRequest {
            test: "t",
            profile: "FF68",
            html,
        }
    }

    #[tokio::test]
    async fn test_lines_become_entries() {
        let engine = sh("cat >/dev/null; echo 'a,b()'; echo \"$CONFORMANCE_PROFILE\"; echo \"$2\"");
        let out = engine.run_page(request("<html></html>")).await.unwrap();
        assert_eq!(out, vec!["a,b()", "FF68", "FF68"]);
    }

    #[tokio::test]
    async fn test_page_arrives_on_stdin() {
        let engine = sh("cat");
        let out = engine.run_page(request("line1\nline2")).await.unwrap();
        assert_eq!(out, vec!["line1", "line2"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_engine_error() {
        let engine = sh("echo broken >&2; exit 3");
        let err = engine.run_page(request("")).await.unwrap_err();
        match err {
            Error::EngineFailed(msg) => {
                assert!(msg.contains("Some(3)"));
                assert!(msg.contains("broken"));
            }
            other => panic!("Expected EngineFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_engine_error() {
        let engine = CommandEngine::new(PathBuf::from("/nonexistent/engine"), Vec::new());
        assert!(matches!(
            engine.run_page(request("")).await,
            Err(Error::EngineFailed(_))
        ));
    }
}

//! CLI command handling
//!
//! Builds suites, engines and runs from parsed commands and formats output.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::capture::{cancel_pair, Executor};
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{logging, paths, Result};
use crate::compare::Comparator;
use crate::engine::{CommandEngine, Engine, ReplayEngine};
use crate::profile::{builtin_profiles, ProfileRegistry};
use crate::resolve::resolve_entry;
use crate::runner::{self, RunPlan};
use crate::suite::Suite;

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands, config: Config) -> Result<i32> {
    match command {
        Commands::Run {
            suite,
            engine,
            replay,
            profiles,
            tests,
            mode,
            jobs,
            timeout,
            json,
            verbose,
        } => {
            let suite = load_suite(&suite, &config)?;

            let engine: Arc<dyn Engine> = match replay {
                Some(path) => Arc::new(ReplayEngine::load(&path)?),
                None => Arc::new(CommandEngine::from_config(&config, engine.as_deref())?),
            };
            let timeout = Duration::from_secs(timeout.unwrap_or(config.timeouts.execute_secs));
            let executor = Executor::new(engine, timeout);
            tracing::debug!(engine = executor.engine_name(), ?timeout, "Engine ready");

            let comparator = Comparator::new(suite.shared_registry(), executor);

            let plan = RunPlan {
                tests,
                profiles,
                modes: mode.modes(),
                jobs: jobs.unwrap_or(config.runner.jobs),
            };

            let (handle, token) = cancel_pair();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, cancelling remaining units");
                    handle.cancel();
                }
            });

            let progress = (!json).then(progress_bar);
            let report = runner::run(Arc::new(suite), comparator, &plan, token, progress).await?;

            if json {
                println!("{}", report.to_json()?);
            } else {
                report.print(verbose);
            }
            Ok(report.exit_code())
        }

        Commands::Validate { suite: path } => {
            let suite = load_suite(&path, &config)?;
            let report = suite.validate()?;

            println!(
                "{} Suite '{}' is valid: {} tests, {} profiles",
                "✓".green(),
                suite.name,
                suite.len(),
                suite.registry().len()
            );
            if !report.warnings.is_empty() {
                println!("{} warning(s):", report.warnings.len().to_string().yellow());
                for warning in &report.warnings {
                    println!("  {}", warning);
                }
            }
            Ok(0)
        }

        Commands::Resolve {
            suite: path,
            test,
            profile,
            mode,
        } => {
            let suite = load_suite(&path, &config)?;
            let registry = suite.registry();
            if !registry.contains(&profile) {
                return Err(crate::Error::UnknownProfile(profile));
            }
            let (_, case) = suite.find(&test)?;

            match registry.get(&profile).and_then(|p| p.group.as_deref()) {
                Some(group) => println!("{} {} (group {})", "Profile:".cyan(), profile, group),
                None => println!("{} {}", "Profile:".cyan(), profile),
            }
            for mode in mode.modes() {
                let res = resolve_entry(&case.id, &case.expectations, registry, &profile, mode)?;
                let source = if res.source == mode {
                    String::new()
                } else {
                    format!(", from {} table", res.source)
                };
                println!(
                    "  {:<8} {}  {}",
                    mode.as_str(),
                    res.value,
                    format!("(via '{}' {:?}{})", res.key, res.matched_by, source).dimmed()
                );
            }
            Ok(0)
        }

        Commands::Profiles { suite, json } => {
            let registry = match suite {
                Some(path) => load_suite(&path, &config)?.registry().clone(),
                None => config_registry(&config)?,
            };

            if json {
                let profiles: Vec<serde_json::Value> = registry
                    .profiles()
                    .iter()
                    .map(|p| serde_json::json!({ "id": p.id, "group": p.group }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&profiles)?);
                return Ok(0);
            }

            println!("Profiles:");
            for profile in registry.profiles() {
                let description = builtin_profiles()
                    .iter()
                    .find(|info| info.id == profile.id)
                    .map(|info| info.description)
                    .unwrap_or("");
                println!(
                    "  {:<10} {:<8} {}",
                    profile.id,
                    profile.group.as_deref().unwrap_or("-"),
                    description.dimmed()
                );
            }

            let mut groups: Vec<&str> = registry
                .profiles()
                .iter()
                .filter_map(|p| p.group.as_deref())
                .collect();
            groups.sort_unstable();
            groups.dedup();
            if !groups.is_empty() {
                println!("Groups:");
                for group in groups {
                    let members: Vec<&str> =
                        registry.members_of(group).map(|p| p.id.as_str()).collect();
                    println!("  {:<10} {}", group, members.join(", "));
                }
            }
            Ok(0)
        }

        Commands::Config => {
            match paths::config_path() {
                Some(path) => {
                    let state = if path.exists() { "" } else { " (not present)" };
                    println!("Config: {}{}", path.display(), state);
                }
                None => println!("Config: unavailable on this platform"),
            }
            if let Some(path) = logging::log_path() {
                println!("Log:    {}", path.display());
            }
            println!("Engine: {}", config.engine.command.as_deref().unwrap_or("<unset>"));
            println!("Jobs:   {}", config.runner.jobs);
            println!("Timeout: {}s", config.timeouts.execute_secs);
            Ok(0)
        }
    }
}

/// Built-in profiles plus those declared in the config file
fn config_registry(config: &Config) -> Result<ProfileRegistry> {
    let mut registry = ProfileRegistry::builtin();
    for profile in &config.profiles {
        registry.register(&profile.id, profile.group.as_deref())?;
    }
    Ok(registry)
}

fn load_suite(path: &Path, config: &Config) -> Result<Suite> {
    Suite::load(path, config_registry(config)?)
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

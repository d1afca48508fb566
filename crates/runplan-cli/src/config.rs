//! Configuration file management for runplan.
//!
//! Provides a TOML config file at `~/.config/runplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use runplan_core::generation::gemini::GEMINI_API_KEY_ENV;
use runplan_core::generation::{CommandGenerator, GeminiGenerator, RetryPolicy, TextGenerator};
use runplan_core::orchestrator::DEFAULT_MODEL;
use runplan_core::OrchestratorConfig;
use runplan_db::config::{DATABASE_URL_ENV, DbConfig};

/// Env var overriding the model name.
pub const MODEL_ENV: &str = "RUNPLAN_MODEL";

/// Command used by the `command` backend when none is configured.
const DEFAULT_COMMAND: &str = "claude";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Google Gemini over HTTP.
    #[default]
    Gemini,
    /// A local CLI that reads the prompt on stdin.
    Command,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => f.write_str("gemini"),
            Self::Command => f.write_str("command"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub generator: GeneratorSection,
    pub retry: RetrySection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquire_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    pub backend: Backend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Program for the `command` backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Arguments for the `command` backend; `{model}` is substituted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_reply_retries: Option<u32>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/runplan` or `~/.config/runplan`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("runplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("runplan")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Load the config file if there is one.
///
/// A missing file is not an error; an unreadable or invalid one is.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_config_from(&path).map(Some)
}

/// Write the config file, creating parent dirs. Mode 0600 on Unix since it
/// may hold an API key.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line; each wins over everything else.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_url: Option<String>,
    pub model: Option<String>,
    pub backend: Option<Backend>,
}

/// How to reach the model.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorSettings {
    Gemini {
        api_key: Option<String>,
        temperature: Option<f32>,
    },
    Command {
        program: String,
        args: Vec<String>,
    },
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct RunplanConfig {
    pub db_config: DbConfig,
    pub generator: GeneratorSettings,
    pub orchestrator: OrchestratorConfig,
}

impl RunplanConfig {
    /// Resolve against the config file on disk.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file = load_config()?;
        Ok(Self::resolve_with(file.unwrap_or_default(), cli))
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `--database-url` > `RUNPLAN_DATABASE_URL` > `[database] url` > default
    /// - Model: `--model` > `RUNPLAN_MODEL` > `[generator] model` > `gemini-2.5-flash`
    /// - API key: `GEMINI_API_KEY` > `[generator] api_key`
    pub fn resolve_with(file: ConfigFile, cli: &CliOverrides) -> Self {
        let database_url = cli
            .database_url
            .clone()
            .or_else(|| env_non_empty(DATABASE_URL_ENV))
            .or(file.database.url)
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_string());

        let model = cli
            .model
            .clone()
            .or_else(|| env_non_empty(MODEL_ENV))
            .or(file.generator.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let generator = match cli.backend.unwrap_or(file.generator.backend) {
            Backend::Gemini => GeneratorSettings::Gemini {
                api_key: env_non_empty(GEMINI_API_KEY_ENV).or(file.generator.api_key),
                temperature: file.generator.temperature,
            },
            Backend::Command => GeneratorSettings::Command {
                program: file
                    .generator
                    .command
                    .unwrap_or_else(|| DEFAULT_COMMAND.to_string()),
                args: if file.generator.args.is_empty() {
                    vec!["-p".to_string()]
                } else {
                    file.generator.args
                },
            },
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_retries: file.retry.max_retries.unwrap_or(defaults.max_retries),
            base_delay: file
                .retry
                .base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            deadline: file.retry.deadline_secs.map(Duration::from_secs),
        };

        Self {
            db_config: DbConfig::new(database_url).with_pool_limits(
                file.database
                    .max_connections
                    .unwrap_or(DbConfig::DEFAULT_MAX_CONNECTIONS),
                file.database
                    .acquire_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DbConfig::DEFAULT_ACQUIRE_TIMEOUT),
            ),
            generator,
            orchestrator: OrchestratorConfig {
                model,
                retry,
                invalid_reply_retries: file.retry.invalid_reply_retries.unwrap_or(0),
            },
        }
    }

    /// Instantiate the configured backend.
    pub fn build_generator(&self) -> Result<Arc<dyn TextGenerator>> {
        match &self.generator {
            GeneratorSettings::Gemini {
                api_key,
                temperature,
            } => {
                let Some(key) = api_key else {
                    bail!(
                        "no Gemini API key; set {GEMINI_API_KEY_ENV} or `api_key` under [generator] in {}",
                        config_path().display()
                    );
                };
                Ok(Arc::new(
                    GeminiGenerator::new(key.clone()).with_temperature(*temperature),
                ))
            }
            GeneratorSettings::Command { program, args } => {
                Ok(Arc::new(CommandGenerator::new(program.clone(), args.clone())))
            }
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

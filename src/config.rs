//! YAML configuration for the jobnorm pipeline.
//!
//! One file describes where the rule set comes from, how batches run and how
//! the binary logs. [`JobnormConfig::load`] reads that file (when given) and
//! then applies `JOBNORM__*` environment overrides, with `.env` honoured.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "gulf-boards"
//! environment: production
//! debug: false
//!
//! rules:
//!   path: "rules.yml"        # or `inline: { ... }`, or `builtin: true`
//!
//! batch:
//!   parallel: true
//!
//! logging:
//!   level: INFO              # DEBUG | INFO | WARNING | ERROR | CRITICAL
//!   json: false
//! ```
//!
//! Overrides use `__` between nesting levels, e.g. `JOBNORM__LOGGING__LEVEL=debug`
//! or `JOBNORM__RULES__PATH=/etc/jobnorm/rules.yml`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use listing::BatchOptions;
use rules::RuleSetDefinition;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of environment overrides read by [`JobnormConfig::load`].
pub const ENV_PREFIX: &str = "JOBNORM";

/// Errors that can occur when loading configuration or rule files
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("failed to apply environment overrides: {0}")]
    Environment(#[from] config::ConfigError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobnormConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub environment: Environment,

    /// Forces debug-level logging regardless of `logging.level`
    #[serde(default)]
    pub debug: bool,

    /// Where the rule set comes from
    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub batch: BatchOptions,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directory relative rule paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl JobnormConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let config = Self::read_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: JobnormConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the optional file, then `.env` and `JOBNORM__*` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        dotenvy::dotenv().ok();
        Self::load_with_env(
            path,
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
    }

    /// Same as [`JobnormConfig::load`] with an explicit environment source.
    pub fn load_with_env(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, ConfigLoadError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };

        // Overrides go through the `config` crate on their own so the YAML
        // file keeps its key order (rule tables are ordered maps).
        let overrides: EnvOverrides = config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        overrides.apply(&mut config);

        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        let mut config: JobnormConfig = serde_yaml::from_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.rules.validate()
    }

    /// Replaces the rule source. Paths set this way are taken as given.
    pub fn set_rules(&mut self, rules: RulesConfig) {
        self.rules = rules;
        self.base_dir = None;
    }

    /// Rule file path, resolved against the config file's directory.
    pub fn rules_path(&self) -> Option<PathBuf> {
        let path = self.rules.path.as_ref()?;
        match &self.base_dir {
            Some(base) if path.is_relative() => Some(base.join(path)),
            _ => Some(path.clone()),
        }
    }

    /// Filter directive for the subscriber; `debug` wins over `logging.level`.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            LogLevel::Debug.as_filter()
        } else {
            self.logging.level.as_filter()
        }
    }
}

impl Default for JobnormConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            environment: Environment::default(),
            debug: false,
            rules: RulesConfig::default(),
            batch: BatchOptions::default(),
            logging: LoggingConfig::default(),
            base_dir: None,
        }
    }
}

/// Rule set source. At most one of the three may be set; none means an empty
/// rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// YAML rule file
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Rule definition embedded in the pipeline config
    #[serde(default)]
    pub inline: Option<RuleSetDefinition>,

    /// Use the rule set compiled into the binary
    #[serde(default)]
    pub builtin: bool,
}

impl RulesConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let sources = [self.path.is_some(), self.inline.is_some(), self.builtin]
            .into_iter()
            .filter(|set| *set)
            .count();
        if sources > 1 {
            return Err(ConfigLoadError::Validation(
                "rules: set only one of path, inline, builtin".to_string(),
            ));
        }
        if self
            .path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigLoadError::Validation(
                "rules.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn builtin() -> Self {
        Self {
            builtin: true,
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        self.path.is_some() || self.inline.is_some() || self.builtin
    }
}

/// Reads a YAML rule set definition.
pub fn load_rule_definition<P: AsRef<Path>>(
    path: P,
) -> Result<RuleSetDefinition, ConfigLoadError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigLoadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(ConfigLoadError::Validation(format!(
                "environment must be one of development, staging, production (got '{other}')"
            ))),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = ConfigLoadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log severity, spelled the upper-case way in files and accepted in any case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// `tracing` has no critical level; it maps to `error`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigLoadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            other => Err(ConfigLoadError::Validation(format!(
                "log level must be one of DEBUG, INFO, WARNING, ERROR, CRITICAL (got '{other}')"
            ))),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ConfigLoadError;

    fn try_from(value: String) -> Result<Self, <LogLevel as TryFrom<String>>::Error> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(value: LogLevel) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar settings that may come from the environment.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    name: Option<String>,
    environment: Option<Environment>,
    debug: Option<bool>,
    #[serde(default)]
    rules: RulesOverrides,
    #[serde(default)]
    batch: BatchOverrides,
    #[serde(default)]
    logging: LoggingOverrides,
}

#[derive(Debug, Default, Deserialize)]
struct RulesOverrides {
    path: Option<PathBuf>,
    builtin: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct BatchOverrides {
    parallel: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingOverrides {
    level: Option<LogLevel>,
    json: Option<bool>,
}

impl EnvOverrides {
    fn apply(self, config: &mut JobnormConfig) {
        if let Some(name) = self.name {
            config.name = Some(name);
        }
        if let Some(environment) = self.environment {
            config.environment = environment;
        }
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
        // A rule source from the environment replaces the file's source.
        if let Some(path) = self.rules.path {
            config.set_rules(RulesConfig::from_path(path));
        } else if let Some(builtin) = self.rules.builtin {
            if builtin {
                config.set_rules(RulesConfig::builtin());
            } else {
                config.rules.builtin = false;
            }
        }
        if let Some(parallel) = self.batch.parallel {
            config.batch.parallel = parallel;
        }
        if let Some(level) = self.logging.level {
            config.logging.level = level;
        }
        if let Some(json) = self.logging.json {
            config.logging.json = json;
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

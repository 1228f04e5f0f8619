use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::DEFAULT_UNCATEGORIZED_LABEL;
use crate::profile::{ProfileSettings, DEFAULT_CROSS_SELL_LIMIT, DEFAULT_TOP_PRODUCTS};

pub const DEFAULT_CONFIG_FILE: &str = "clientlens.toml";
pub const NESTED_CONFIG_FILE: &str = "config/clientlens.toml";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub snapshot_chunk_size: usize,
    pub parallel_evaluators: bool,
    pub uncategorized_label: String,
    pub top_products_limit: usize,
    pub cross_sell_limit: usize,
}

impl EngineConfig {
    pub fn profile_settings(&self) -> ProfileSettings {
        ProfileSettings {
            top_products: self.top_products_limit,
            cross_sell_limit: self.cross_sell_limit,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_chunk_size: 500,
            parallel_evaluators: false,
            uncategorized_label: DEFAULT_UNCATEGORIZED_LABEL.to_string(),
            top_products_limit: DEFAULT_TOP_PRODUCTS,
            cross_sell_limit: DEFAULT_CROSS_SELL_LIMIT,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub snapshot_chunk_size: Option<usize>,
    pub parallel_evaluators: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(snapshot_chunk_size) = engine.snapshot_chunk_size {
                self.engine.snapshot_chunk_size = snapshot_chunk_size;
            }
            if let Some(parallel_evaluators) = engine.parallel_evaluators {
                self.engine.parallel_evaluators = parallel_evaluators;
            }
            if let Some(uncategorized_label) = engine.uncategorized_label {
                self.engine.uncategorized_label = uncategorized_label;
            }
            if let Some(top_products_limit) = engine.top_products_limit {
                self.engine.top_products_limit = top_products_limit;
            }
            if let Some(cross_sell_limit) = engine.cross_sell_limit {
                self.engine.cross_sell_limit = cross_sell_limit;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CLIENTLENS_ENGINE_SNAPSHOT_CHUNK_SIZE") {
            self.engine.snapshot_chunk_size =
                parse_usize("CLIENTLENS_ENGINE_SNAPSHOT_CHUNK_SIZE", &value)?;
        }
        if let Some(value) = read_env("CLIENTLENS_ENGINE_PARALLEL_EVALUATORS") {
            self.engine.parallel_evaluators =
                parse_bool("CLIENTLENS_ENGINE_PARALLEL_EVALUATORS", &value)?;
        }
        if let Some(value) = read_env("CLIENTLENS_ENGINE_UNCATEGORIZED_LABEL") {
            self.engine.uncategorized_label = value;
        }
        if let Some(value) = read_env("CLIENTLENS_ENGINE_TOP_PRODUCTS_LIMIT") {
            self.engine.top_products_limit =
                parse_usize("CLIENTLENS_ENGINE_TOP_PRODUCTS_LIMIT", &value)?;
        }
        if let Some(value) = read_env("CLIENTLENS_ENGINE_CROSS_SELL_LIMIT") {
            self.engine.cross_sell_limit =
                parse_usize("CLIENTLENS_ENGINE_CROSS_SELL_LIMIT", &value)?;
        }

        let log_level =
            read_env("CLIENTLENS_LOGGING_LEVEL").or_else(|| read_env("CLIENTLENS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CLIENTLENS_LOGGING_FORMAT").or_else(|| read_env("CLIENTLENS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(snapshot_chunk_size) = overrides.snapshot_chunk_size {
            self.engine.snapshot_chunk_size = snapshot_chunk_size;
        }
        if let Some(parallel_evaluators) = overrides.parallel_evaluators {
            self.engine.parallel_evaluators = parallel_evaluators;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_engine(&self.engine)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Config file that [`AppConfig::load`] would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.snapshot_chunk_size == 0 {
        return Err(ConfigError::Validation(
            "engine.snapshot_chunk_size must be greater than zero".to_string(),
        ));
    }

    if engine.uncategorized_label.trim().is_empty() {
        return Err(ConfigError::Validation(
            "engine.uncategorized_label must not be empty".to_string(),
        ));
    }

    if engine.top_products_limit == 0 {
        return Err(ConfigError::Validation(
            "engine.top_products_limit must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    snapshot_chunk_size: Option<usize>,
    parallel_evaluators: Option<bool>,
    uncategorized_label: Option<String>,
    top_products_limit: Option<usize>,
    cross_sell_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

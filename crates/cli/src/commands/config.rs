use std::env;
use std::fs;
use std::path::Path;

use clientlens_core::config::{resolve_config_path, AppConfig, LoadOptions};
use clientlens_core::errors::ApplicationError;
use toml::Value;

use super::CommandResult;

const COMMAND: &str = "config";

pub fn run() -> CommandResult {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => CommandResult::success(COMMAND, render(&config)),
        Err(error) => CommandResult::from_error(
            COMMAND,
            ApplicationError::Configuration(format!("config validation failed: {error}")),
        ),
    }
}

fn render(config: &AppConfig) -> String {
    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let engine = &config.engine;
    let lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "engine.snapshot_chunk_size",
            &engine.snapshot_chunk_size.to_string(),
            source("engine.snapshot_chunk_size", &["CLIENTLENS_ENGINE_SNAPSHOT_CHUNK_SIZE"]),
        ),
        render_line(
            "engine.parallel_evaluators",
            &engine.parallel_evaluators.to_string(),
            source("engine.parallel_evaluators", &["CLIENTLENS_ENGINE_PARALLEL_EVALUATORS"]),
        ),
        render_line(
            "engine.uncategorized_label",
            &engine.uncategorized_label,
            source("engine.uncategorized_label", &["CLIENTLENS_ENGINE_UNCATEGORIZED_LABEL"]),
        ),
        render_line(
            "engine.top_products_limit",
            &engine.top_products_limit.to_string(),
            source("engine.top_products_limit", &["CLIENTLENS_ENGINE_TOP_PRODUCTS_LIMIT"]),
        ),
        render_line(
            "engine.cross_sell_limit",
            &engine.cross_sell_limit.to_string(),
            source("engine.cross_sell_limit", &["CLIENTLENS_ENGINE_CROSS_SELL_LIMIT"]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["CLIENTLENS_LOGGING_LEVEL", "CLIENTLENS_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            source("logging.format", &["CLIENTLENS_LOGGING_FORMAT", "CLIENTLENS_LOG_FORMAT"]),
        ),
    ];

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

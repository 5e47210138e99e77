use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use freshcart_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use serde::Serialize;
use toml::Value;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: String,
    value: String,
    source: String,
}

/// Effective configuration with the layer each value came from
/// (precedence: cli flag > env > file > default).
pub fn run(config_path: Option<&Path>, overrides: &ConfigOverrides) -> CommandResult {
    let options = LoadOptions {
        config_path: config_path.map(Path::to_path_buf),
        overrides: overrides.clone(),
        ..LoadOptions::default()
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = detect_config_path(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: Option<&str>| {
        if let Some(flag) = override_flag(overrides, key_path) {
            return format!("cli ({flag})");
        }
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let recommender = &config.recommender;
    let mut entries = vec![
        ConfigEntry {
            key: "recommender.default_limit".to_string(),
            value: recommender.default_limit.to_string(),
            source: source("recommender.default_limit", Some("FRESHCART_RECOMMENDER_DEFAULT_LIMIT")),
        },
        ConfigEntry {
            key: "recommender.max_walk_depth".to_string(),
            value: recommender.max_walk_depth.to_string(),
            source: source(
                "recommender.max_walk_depth",
                Some("FRESHCART_RECOMMENDER_MAX_WALK_DEPTH"),
            ),
        },
        ConfigEntry {
            key: "recommender.jitter".to_string(),
            value: recommender.jitter.to_string(),
            source: source("recommender.jitter", Some("FRESHCART_RECOMMENDER_JITTER")),
        },
        ConfigEntry {
            key: "recommender.bundle_discount_percent".to_string(),
            value: recommender.bundle_discount_percent.to_string(),
            source: source(
                "recommender.bundle_discount_percent",
                Some("FRESHCART_RECOMMENDER_BUNDLE_DISCOUNT_PERCENT"),
            ),
        },
        ConfigEntry {
            key: "recommender.trending_per_category".to_string(),
            value: recommender.trending_per_category.to_string(),
            source: source(
                "recommender.trending_per_category",
                Some("FRESHCART_RECOMMENDER_TRENDING_PER_CATEGORY"),
            ),
        },
        ConfigEntry {
            key: "recommender.collaborative.decay_days".to_string(),
            value: recommender
                .collaborative
                .decay_days
                .map(|days| days.to_string())
                .unwrap_or_else(|| "<disabled>".to_string()),
            source: source(
                "recommender.collaborative.decay_days",
                Some("FRESHCART_COLLABORATIVE_DECAY_DAYS"),
            ),
        },
        ConfigEntry {
            key: "recommender.complements".to_string(),
            value: format!("{} categories", recommender.complements.len()),
            source: source("recommender.complements", None),
        },
    ];

    for (name, weight) in recommender.similarity.values() {
        entries.push(ConfigEntry {
            key: format!("recommender.similarity.{name}"),
            value: weight.to_string(),
            source: source(&format!("recommender.similarity.{name}"), None),
        });
    }
    for (name, weight) in recommender.strategies.values() {
        entries.push(ConfigEntry {
            key: format!("recommender.strategies.{name}"),
            value: weight.to_string(),
            source: source(&format!("recommender.strategies.{name}"), None),
        });
    }

    entries.push(ConfigEntry {
        key: "logging.level".to_string(),
        value: config.logging.level.clone(),
        source: source("logging.level", Some("FRESHCART_LOGGING_LEVEL")),
    });
    entries.push(ConfigEntry {
        key: "logging.format".to_string(),
        value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
        source: source("logging.format", Some("FRESHCART_LOGGING_FORMAT")),
    });

    CommandResult::success("config", entries)
}

fn override_flag(overrides: &ConfigOverrides, key_path: &str) -> Option<&'static str> {
    let (set, flag) = match key_path {
        "logging.level" => (overrides.log_level.is_some(), "--log-level"),
        "logging.format" => (overrides.log_format.is_some(), "--log-format"),
        "recommender.default_limit" => (overrides.default_limit.is_some(), "--default-limit"),
        "recommender.max_walk_depth" => (overrides.max_walk_depth.is_some(), "--walk-depth"),
        "recommender.jitter" => (overrides.jitter.is_some(), "--jitter"),
        "recommender.collaborative.decay_days" => (overrides.decay_days.is_some(), "--decay-days"),
        _ => return None,
    };
    set.then_some(flag)
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("freshcart.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/freshcart.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
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

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::ApplicationError;
use crate::recommend::{
    SimilarityWeights, StrategyWeights, DEFAULT_BUNDLE_DISCOUNT_PERCENT, DEFAULT_JITTER,
    DEFAULT_LIMIT, DEFAULT_MAX_DEPTH, DEFAULT_TRENDING_PER_CATEGORY,
};

const MAX_LIMIT: usize = 1_000;
const MAX_WALK_DEPTH: usize = 50;

#[derive(Clone, Debug, Default, Serialize)]
pub struct AppConfig {
    pub recommender: RecommenderConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecommenderConfig {
    pub default_limit: usize,
    pub max_walk_depth: usize,
    pub jitter: f64,
    pub bundle_discount_percent: u8,
    pub trending_per_category: usize,
    pub similarity: SimilarityWeights,
    pub strategies: StrategyWeights,
    pub collaborative: CollaborativeConfig,
    /// Category → categories whose products complement it.
    pub complements: BTreeMap<String, Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CollaborativeConfig {
    /// Half-life-like decay constant; `None` disables time decay.
    pub decay_days: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
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
    pub default_limit: Option<usize>,
    pub max_walk_depth: Option<usize>,
    pub jitter: Option<f64>,
    pub decay_days: Option<f64>,
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

impl From<ConfigError> for ApplicationError {
    fn from(error: ConfigError) -> Self {
        ApplicationError::Configuration(error.to_string())
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_walk_depth: DEFAULT_MAX_DEPTH,
            jitter: DEFAULT_JITTER,
            bundle_discount_percent: DEFAULT_BUNDLE_DISCOUNT_PERCENT,
            trending_per_category: DEFAULT_TRENDING_PER_CATEGORY,
            similarity: SimilarityWeights::default(),
            strategies: StrategyWeights::default(),
            collaborative: CollaborativeConfig::default(),
            complements: BTreeMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("freshcart.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(recommender) = patch.recommender {
            let target = &mut self.recommender;
            if let Some(default_limit) = recommender.default_limit {
                target.default_limit = default_limit;
            }
            if let Some(max_walk_depth) = recommender.max_walk_depth {
                target.max_walk_depth = max_walk_depth;
            }
            if let Some(jitter) = recommender.jitter {
                target.jitter = jitter;
            }
            if let Some(bundle_discount_percent) = recommender.bundle_discount_percent {
                target.bundle_discount_percent = bundle_discount_percent;
            }
            if let Some(trending_per_category) = recommender.trending_per_category {
                target.trending_per_category = trending_per_category;
            }
            if let Some(similarity) = recommender.similarity {
                similarity.apply(&mut target.similarity);
            }
            if let Some(strategies) = recommender.strategies {
                strategies.apply(&mut target.strategies);
            }
            if let Some(collaborative) = recommender.collaborative {
                if let Some(decay_days) = collaborative.decay_days {
                    target.collaborative.decay_days = Some(decay_days);
                }
            }
            if let Some(complements) = recommender.complements {
                target.complements = complements;
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
        if let Some(value) = read_env("FRESHCART_RECOMMENDER_DEFAULT_LIMIT") {
            self.recommender.default_limit =
                parse_usize("FRESHCART_RECOMMENDER_DEFAULT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("FRESHCART_RECOMMENDER_MAX_WALK_DEPTH") {
            self.recommender.max_walk_depth =
                parse_usize("FRESHCART_RECOMMENDER_MAX_WALK_DEPTH", &value)?;
        }
        if let Some(value) = read_env("FRESHCART_RECOMMENDER_JITTER") {
            self.recommender.jitter = parse_f64("FRESHCART_RECOMMENDER_JITTER", &value)?;
        }
        if let Some(value) = read_env("FRESHCART_RECOMMENDER_BUNDLE_DISCOUNT_PERCENT") {
            self.recommender.bundle_discount_percent =
                parse_u8("FRESHCART_RECOMMENDER_BUNDLE_DISCOUNT_PERCENT", &value)?;
        }
        if let Some(value) = read_env("FRESHCART_RECOMMENDER_TRENDING_PER_CATEGORY") {
            self.recommender.trending_per_category =
                parse_usize("FRESHCART_RECOMMENDER_TRENDING_PER_CATEGORY", &value)?;
        }
        if let Some(value) = read_env("FRESHCART_COLLABORATIVE_DECAY_DAYS") {
            self.recommender.collaborative.decay_days =
                Some(parse_f64("FRESHCART_COLLABORATIVE_DECAY_DAYS", &value)?);
        }

        let log_level =
            read_env("FRESHCART_LOGGING_LEVEL").or_else(|| read_env("FRESHCART_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FRESHCART_LOGGING_FORMAT").or_else(|| read_env("FRESHCART_LOG_FORMAT"));
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
        if let Some(default_limit) = overrides.default_limit {
            self.recommender.default_limit = default_limit;
        }
        if let Some(max_walk_depth) = overrides.max_walk_depth {
            self.recommender.max_walk_depth = max_walk_depth;
        }
        if let Some(jitter) = overrides.jitter {
            self.recommender.jitter = jitter;
        }
        if let Some(decay_days) = overrides.decay_days {
            self.recommender.collaborative.decay_days = Some(decay_days);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_recommender(&self.recommender)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("freshcart.toml"), PathBuf::from("config/freshcart.toml")]
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

fn validate_recommender(recommender: &RecommenderConfig) -> Result<(), ConfigError> {
    if recommender.default_limit == 0 || recommender.default_limit > MAX_LIMIT {
        return Err(ConfigError::Validation(format!(
            "recommender.default_limit must be in range 1..={MAX_LIMIT}"
        )));
    }

    if recommender.max_walk_depth == 0 || recommender.max_walk_depth > MAX_WALK_DEPTH {
        return Err(ConfigError::Validation(format!(
            "recommender.max_walk_depth must be in range 1..={MAX_WALK_DEPTH}"
        )));
    }

    if !recommender.jitter.is_finite() || !(0.0..=1.0).contains(&recommender.jitter) {
        return Err(ConfigError::Validation(
            "recommender.jitter must be a number in range 0.0..=1.0".to_string(),
        ));
    }

    if recommender.bundle_discount_percent >= 100 {
        return Err(ConfigError::Validation(
            "recommender.bundle_discount_percent must be below 100".to_string(),
        ));
    }

    if recommender.trending_per_category == 0 {
        return Err(ConfigError::Validation(
            "recommender.trending_per_category must be greater than zero".to_string(),
        ));
    }

    recommender
        .similarity
        .validate()
        .map_err(|message| ConfigError::Validation(format!("recommender.similarity: {message}")))?;

    if let Some((name, weight)) = recommender
        .strategies
        .values()
        .into_iter()
        .find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
    {
        return Err(ConfigError::Validation(format!(
            "recommender.strategies.{name} must be a non-negative number, got {weight}"
        )));
    }

    if let Some(decay_days) = recommender.collaborative.decay_days {
        if !decay_days.is_finite() || decay_days <= 0.0 {
            return Err(ConfigError::Validation(
                "recommender.collaborative.decay_days must be greater than zero".to_string(),
            ));
        }
    }

    for (category, partners) in &recommender.complements {
        if category.trim().is_empty() || partners.iter().any(|partner| partner.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "recommender.complements must not contain empty category names".to_string(),
            ));
        }
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

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.parse::<u8>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    recommender: Option<RecommenderPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommenderPatch {
    default_limit: Option<usize>,
    max_walk_depth: Option<usize>,
    jitter: Option<f64>,
    bundle_discount_percent: Option<u8>,
    trending_per_category: Option<usize>,
    similarity: Option<SimilarityPatch>,
    strategies: Option<StrategyPatch>,
    collaborative: Option<CollaborativePatch>,
    complements: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarityPatch {
    category: Option<f64>,
    tags: Option<f64>,
    price: Option<f64>,
    rating: Option<f64>,
    origin: Option<f64>,
    organic: Option<f64>,
    attributes: Option<f64>,
    shelf_life: Option<f64>,
}

impl SimilarityPatch {
    fn apply(self, weights: &mut SimilarityWeights) {
        let fields = [
            (self.category, &mut weights.category),
            (self.tags, &mut weights.tags),
            (self.price, &mut weights.price),
            (self.rating, &mut weights.rating),
            (self.origin, &mut weights.origin),
            (self.organic, &mut weights.organic),
            (self.attributes, &mut weights.attributes),
            (self.shelf_life, &mut weights.shelf_life),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct StrategyPatch {
    similarity: Option<f64>,
    user_based: Option<f64>,
    item_based: Option<f64>,
    random_walk: Option<f64>,
    category_popular: Option<f64>,
    complementary: Option<f64>,
    derivative: Option<f64>,
    two_hop: Option<f64>,
    user_profile: Option<f64>,
    recent_category: Option<f64>,
    trending: Option<f64>,
}

impl StrategyPatch {
    fn apply(self, weights: &mut StrategyWeights) {
        let fields = [
            (self.similarity, &mut weights.similarity),
            (self.user_based, &mut weights.user_based),
            (self.item_based, &mut weights.item_based),
            (self.random_walk, &mut weights.random_walk),
            (self.category_popular, &mut weights.category_popular),
            (self.complementary, &mut weights.complementary),
            (self.derivative, &mut weights.derivative),
            (self.two_hop, &mut weights.two_hop),
            (self.user_profile, &mut weights.user_profile),
            (self.recent_category, &mut weights.recent_category),
            (self.trending, &mut weights.trending),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CollaborativePatch {
    decay_days: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

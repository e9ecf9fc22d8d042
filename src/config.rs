use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::selection::{
    ActionSpec, FormValueProviderFactory, QueryValueProviderFactory, RouteValueProviderFactory,
    ValueProviderFactoryPort,
};

const SCHEMA_FILE_NAME: &str = "action-selector.schema.json";

/// Root of `action-selector.jsonc`. Every section is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    /// Value sources consulted when several actions survive constraint
    /// matching, in this order.
    pub value_sources: Vec<ValueSource>,
    pub actions: Vec<ActionSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            value_sources: vec![ValueSource::Route, ValueSource::Query, ValueSource::Form],
            actions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub filter: String,
    pub rotation: LoggingRotation,
    pub retention_days: usize,
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs/selector"),
            filter: "info".to_string(),
            rotation: LoggingRotation::Daily,
            retention_days: 14,
            stderr_warn_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub socket_path: PathBuf,
    /// Per-request budget; past it the selection is cancelled.
    pub selection_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("action-selector.sock"),
            selection_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Route,
    Query,
    Form,
}

impl ValueSource {
    pub fn factory(self) -> Arc<dyn ValueProviderFactoryPort> {
        match self {
            ValueSource::Route => Arc::new(RouteValueProviderFactory),
            ValueSource::Query => Arc::new(QueryValueProviderFactory),
            ValueSource::Form => Arc::new(FormValueProviderFactory),
        }
    }
}

impl Config {
    /// Reads JSON5, validates it against the JSON schema, then deserializes.
    /// A relative `server.socket_path` is anchored at the config directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(config_path)
            .with_context(|| format!("unable to read config {}", config_path.display()))?;
        let document: Value = json5::from_str(&raw)
            .with_context(|| format!("invalid JSON5 in {}", config_path.display()))?;

        let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema = load_schema(&schema_location(config_dir, &document)?)?;
        check_document(&schema, &document)?;

        let mut config: Config = serde_json::from_value(document)
            .context("failed to deserialize action selector config")?;
        if config.server.socket_path.is_relative() {
            config.server.socket_path = config_dir.join(&config.server.socket_path);
        }

        Ok(config)
    }

    pub fn value_provider_factories(&self) -> Vec<Arc<dyn ValueProviderFactoryPort>> {
        self.value_sources
            .iter()
            .map(|source| source.factory())
            .collect()
    }
}

/// `$schema` wins when present; otherwise the schema must sit beside the config.
fn schema_location(config_dir: &Path, document: &Value) -> Result<PathBuf> {
    match document.get("$schema").and_then(Value::as_str) {
        Some(declared) => Ok(config_dir.join(declared)),
        None => {
            let sibling = config_dir.join(SCHEMA_FILE_NAME);
            if !sibling.exists() {
                bail!("no $schema in config and no {SCHEMA_FILE_NAME} next to it");
            }
            Ok(sibling)
        }
    }
}

fn load_schema(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("unable to read schema {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid schema {}", path.display()))
}

fn check_document(schema: &Value, document: &Value) -> Result<()> {
    let validator =
        JSONSchema::compile(schema).map_err(|err| anyhow!("schema does not compile: {err}"))?;
    if let Err(errors) = validator.validate(document) {
        let details = errors
            .map(|error| error.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        bail!("config validation failed: {details}");
    }
    Ok(())
}

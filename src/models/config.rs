use serde::{Deserialize, Serialize};

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION: &str = "embeddings";
pub const DEFAULT_DIMENSION: u64 = 128;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("vecload").join("config.toml"))
    }

    pub fn load() -> Result<Self, crate::error::ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.apply_env();
            return Ok(config);
        }
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<std::path::PathBuf, crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::Path("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    // The API key never lives in the config file
    fn apply_env(&mut self) {
        if self.store.api_key.is_none()
            && let Ok(key) = std::env::var("QDRANT_API_KEY")
        {
            self.store.api_key = Some(key);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// Vector dimension used when creating collections.
    #[serde(default = "default_dimension")]
    pub dimension: u64,

    /// Attempts per store call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_dimension() -> u64 {
    DEFAULT_DIMENSION
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            collection: default_collection(),
            dimension: default_dimension(),
            max_attempts: default_max_attempts(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Records per upsert call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound on concurrent upsert calls.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: OutputFormat,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = Config::default();
        assert_eq!(config.store.url, DEFAULT_QDRANT_URL);
        assert_eq!(config.store.collection, DEFAULT_COLLECTION);
        assert_eq!(config.ingest.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.ingest.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert_eq!(config.output.default_format, OutputFormat::Text);
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = Config::default();
        config.store.collection = "articles".to_string();
        config.ingest.batch_size = 50;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.store.collection, "articles");
        assert_eq!(parsed.ingest.batch_size, 50);
        assert_eq!(parsed.store.dimension, DEFAULT_DIMENSION);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("[store]\ncollection = \"articles\"\n").unwrap();
        assert_eq!(parsed.store.collection, "articles");
        assert_eq!(parsed.store.url, DEFAULT_QDRANT_URL);
        assert_eq!(parsed.ingest.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}

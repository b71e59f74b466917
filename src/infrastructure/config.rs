use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::{ClientConfig, DistanceMetric, DomainError};

pub const CONFIG_PATH_ENV: &str = "DOCBOT_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub client: String,
    pub clients_dir: PathBuf,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub vector_store: VectorStoreConfig,
    pub message_store: MessageStoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub max_tokens: u64,
    pub temperature: f64,
    pub timeout_seconds: u64,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    /// Upper bound on texts sent in one embedding request.
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_results: usize,
    pub history_window: usize,
    pub history_fetch_limit: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    #[default]
    Memory,
    Qdrant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorBackend,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageStoreConfig {
    pub backend: MessageBackend,
    pub url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: "maveric".to_string(),
            clients_dir: PathBuf::from("examples"),
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            rag: RagConfig::default(),
            vector_store: VectorStoreConfig::default(),
            message_store: MessageStoreConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            timeout_seconds: 60,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8000,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            metric: DistanceMetric::Cosine,
            batch_size: 256,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            max_results: 5,
            history_window: 5,
            history_fetch_limit: 10,
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Memory,
            url: "http://localhost:6334".to_string(),
        }
    }
}

impl Default for MessageStoreConfig {
    fn default() -> Self {
        Self {
            backend: MessageBackend::Memory,
            url: "redis://localhost:6379".to_string(),
        }
    }
}

impl FromStr for VectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "qdrant" => Ok(Self::Qdrant),
            other => Err(format!("unknown vector store backend '{other}'")),
        }
    }
}

impl FromStr for MessageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown message store backend '{other}'")),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl AppConfig {
    /// Defaults, then the YAML file named by `DOCBOT_CONFIG` (if set), then
    /// environment variables.
    pub fn load() -> Result<Self, DomainError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_yaml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, DomainError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), "Loaded configuration file");
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(raw).map_err(|e| DomainError::configuration(e.to_string()))
    }

    /// Overrides fields from `lookup` (normally the process environment).
    /// Values that fail to parse are logged and ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(client) = lookup("CLIENT") {
            self.client = client;
        }
        if let Some(dir) = lookup("CLIENTS_DIR") {
            self.clients_dir = PathBuf::from(dir);
        }

        if let Some(host) = lookup("BACKEND_HOST") {
            self.server.host = host;
        }
        parse_into(&lookup, "BACKEND_PORT", &mut self.server.port);
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        parse_into(&lookup, "LLM_MAX_TOKENS", &mut self.llm.max_tokens);
        parse_into(&lookup, "LLM_TEMPERATURE", &mut self.llm.temperature);
        parse_into(&lookup, "LLM_TIMEOUT_SECONDS", &mut self.llm.timeout_seconds);
        parse_into(&lookup, "LLM_MAX_ATTEMPTS", &mut self.llm.retry.max_attempts);

        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        parse_into(&lookup, "EMBEDDING_DIMENSION", &mut self.embedding.dimension);
        parse_into(&lookup, "DISTANCE_METRIC", &mut self.embedding.metric);
        parse_into(&lookup, "EMBEDDING_BATCH_SIZE", &mut self.embedding.batch_size);

        parse_into(&lookup, "CHUNK_SIZE", &mut self.rag.chunk_size);
        parse_into(&lookup, "CHUNK_OVERLAP", &mut self.rag.chunk_overlap);
        parse_into(&lookup, "MAX_RESULTS", &mut self.rag.max_results);

        parse_into(&lookup, "VECTOR_STORE", &mut self.vector_store.backend);
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.url = url;
        }
        parse_into(&lookup, "MESSAGE_STORE", &mut self.message_store.backend);
        if let Some(url) = lookup("REDIS_URL") {
            self.message_store.url = url;
        }
    }

    pub fn client_dir(&self) -> PathBuf {
        self.clients_dir.join(&self.client)
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.client_dir().join("docs")
    }

    pub fn client_config_path(&self) -> PathBuf {
        self.client_dir().join("config").join("config.json")
    }
}

fn parse_into<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(e) => warn!(key, value = %raw, error = %e, "Ignoring unparseable environment value"),
    }
}

/// Reads `{client}/config/config.json`. A missing file falls back to a
/// config named after the client; a malformed one is an error.
pub fn load_client_config(path: &Path, client: &str) -> Result<ClientConfig, DomainError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), client, "Client config not found, using defaults");
            return Ok(ClientConfig::fallback(client));
        }
        Err(e) => return Err(e.into()),
    };

    let mut config: ClientConfig = serde_json::from_str(&raw).map_err(|e| {
        DomainError::configuration(format!("invalid client config {}: {e}", path.display()))
    })?;
    if config.client_name.trim().is_empty() {
        config.client_name = client.to_string();
    }
    Ok(config)
}

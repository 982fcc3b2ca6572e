use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Settings shared by the HTTP service and the offline `build-index` command.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub index_path: PathBuf,
    pub dataset_path: PathBuf,
    pub embedding_url: String,
    /// Pinned embedding model id. Written into the index manifest at build time
    /// and compared against at search time.
    pub embedding_model: String,
    pub embedding_batch_size: usize,
    pub embedding_timeout: Duration,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub index: IndexConfig,
    pub pplx_api_key: String,
    pub pplx_base_url: String,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub llm_max_attempts: u32,
    pub search_top_k: usize,
    pub port: u16,
    pub rust_log: String,
}

impl IndexConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let embedding_batch_size: usize = parse_env("EMBEDDING_BATCH_SIZE", 64)?;
        if embedding_batch_size == 0 {
            bail!("EMBEDDING_BATCH_SIZE must be greater than zero");
        }

        Ok(IndexConfig {
            index_path: PathBuf::from(env_or("INDEX_PATH", "./db")),
            dataset_path: PathBuf::from(env_or("QUESTION_DATASET", "dataset_question.csv")),
            embedding_url: env_or("EMBEDDING_URL", "http://localhost:11434"),
            embedding_model: env_or("EMBEDDING_MODEL", "paraphrase-multilingual"),
            embedding_batch_size,
            embedding_timeout: Duration::from_secs(parse_env("EMBEDDING_TIMEOUT_SECS", 60)?),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let index = IndexConfig::from_env()?;

        let llm_max_attempts: u32 = parse_env("LLM_MAX_ATTEMPTS", 1)?;
        if llm_max_attempts == 0 {
            bail!("LLM_MAX_ATTEMPTS must be at least 1");
        }
        let search_top_k: usize = parse_env("SEARCH_TOP_K", 3)?;
        if search_top_k == 0 {
            bail!("SEARCH_TOP_K must be greater than zero");
        }

        Ok(Config {
            index,
            pplx_api_key: require_env("PPLX_API_KEY")?,
            pplx_base_url: env_or("PPLX_BASE_URL", "https://api.perplexity.ai"),
            llm_model: env_or("LLM_MODEL", "sonar"),
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 60)?),
            llm_max_attempts,
            search_top_k,
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

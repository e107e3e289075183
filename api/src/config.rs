use anyhow::{anyhow, Context, Result};
use rag_system::DEFAULT_API_BASE;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Model every advisory chat is built with.
pub const ADVISOR_MODEL: &str = "gpt-4";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_ASSETS_DIR: &str = "logo";

/// Process-wide settings, read once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        if api_key.trim().is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is empty"));
        }

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:3000")?;

        Ok(Self {
            api_key,
            api_base: env::var("OPENAI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            model: ADVISOR_MODEL.to_string(),
            bind_addr,
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()).into(),
            assets_dir: env::var("ASSETS_DIR").unwrap_or_else(|_| DEFAULT_ASSETS_DIR.to_string()).into(),
        })
    }

    /// Settings for tests and embedding: given key and scratch directory, defaults elsewhere.
    pub fn new(api_key: impl Into<String>, data_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: ADVISOR_MODEL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.parse()?,
            data_dir: data_dir.into(),
            assets_dir: DEFAULT_ASSETS_DIR.into(),
        })
    }
}

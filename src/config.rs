//! Environment-driven configuration.
//!
//! Values are read from the process environment after loading an optional
//! `.env` file. Every strategy choice (fetch backend, mock mode, model-backed
//! summaries) is an explicit setting; a missing credential never silently
//! switches the service to mock data.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_DATABASE_URL: &str = "sqlite://pagelens.db?mode=rwc";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Which collaborator retrieves page content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchBackend {
    /// Plain HTTP GET, no JavaScript and no screenshot
    #[default]
    Http,
    /// Managed scraping API (rendered HTML + screenshot)
    ScrapeApi,
    /// Local headless browser (requires the `browser` feature)
    Browser,
    /// Deterministic canned page
    Mock,
}

impl FetchBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchBackend::Http => "http",
            FetchBackend::ScrapeApi => "scrape-api",
            FetchBackend::Browser => "browser",
            FetchBackend::Mock => "mock",
        }
    }
}

impl FromStr for FetchBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "scrape-api" | "scrape_api" | "api" => Ok(Self::ScrapeApi),
            "browser" => Ok(Self::Browser),
            "mock" => Ok(Self::Mock),
            other => Err(AppError::config(format!("unknown fetch backend '{other}'"))),
        }
    }
}

/// Credentials and endpoint for the managed scraping service.
#[derive(Debug, Clone)]
pub struct ScrapeApiConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// Hosted language model used by the model-backed summarizer.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

/// Timeouts and limits for the pipeline stages.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub fetch_timeout: Duration,
    pub settle_time: Duration,
    pub probe_batch_size: usize,
    pub probe_timeout: Duration,
    pub pipeline_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(25),
            settle_time: Duration::from_millis(1500),
            probe_batch_size: 5,
            probe_timeout: Duration::from_secs(10),
            pipeline_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub fetch_backend: FetchBackend,
    pub use_mock: bool,
    pub scrape_api: Option<ScrapeApiConfig>,
    pub llm: Option<LlmConfig>,
    pub pipeline: PipelineSettings,
    pub cors_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            fetch_backend: FetchBackend::default(),
            use_mock: false,
            scrape_api: None,
            llm: None,
            pipeline: PipelineSettings::default(),
            cors_enabled: true,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read configuration from the environment.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            log::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = PipelineSettings::default();

        let use_mock = match get("PAGELENS_USE_MOCK") {
            Some(v) => parse_bool("PAGELENS_USE_MOCK", &v)?,
            None => false,
        };

        let fetch_backend = match get("PAGELENS_FETCH_BACKEND") {
            Some(v) => v.parse()?,
            None => FetchBackend::default(),
        };
        let fetch_backend = if use_mock { FetchBackend::Mock } else { fetch_backend };

        let scrape_api = match (get("PAGELENS_SCRAPE_API_URL"), get("PAGELENS_SCRAPE_API_KEY")) {
            (Some(endpoint), Some(api_key)) => Some(ScrapeApiConfig { endpoint, api_key }),
            _ => None,
        };

        if fetch_backend == FetchBackend::ScrapeApi && scrape_api.is_none() {
            return Err(AppError::config(
                "fetch backend 'scrape-api' requires PAGELENS_SCRAPE_API_URL and PAGELENS_SCRAPE_API_KEY",
            ));
        }

        let llm = get("PAGELENS_LLM_API_KEY").map(|api_key| LlmConfig {
            base_url: get("PAGELENS_LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: get("PAGELENS_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            api_key,
        });

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match get(key) {
                Some(v) => parse_number::<u64>(key, &v).map(Duration::from_secs),
                None => Ok(default),
            }
        };

        let pipeline = PipelineSettings {
            fetch_timeout: secs("PAGELENS_FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?,
            settle_time: match get("PAGELENS_SETTLE_MS") {
                Some(v) => Duration::from_millis(parse_number::<u64>("PAGELENS_SETTLE_MS", &v)?),
                None => defaults.settle_time,
            },
            probe_batch_size: match get("PAGELENS_PROBE_BATCH_SIZE") {
                Some(v) => parse_number::<usize>("PAGELENS_PROBE_BATCH_SIZE", &v)?.max(1),
                None => defaults.probe_batch_size,
            },
            probe_timeout: secs("PAGELENS_PROBE_TIMEOUT_SECS", defaults.probe_timeout)?,
            pipeline_timeout: secs("PAGELENS_PIPELINE_TIMEOUT_SECS", defaults.pipeline_timeout)?,
        };

        let cors_enabled = match get("PAGELENS_CORS") {
            Some(v) => parse_bool("PAGELENS_CORS", &v)?,
            None => true,
        };

        Ok(Self {
            listen_addr: get("PAGELENS_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            database_url: get("PAGELENS_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            fetch_backend,
            use_mock,
            scrape_api,
            llm,
            pipeline,
            cors_enabled,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::config(format!("{key} must be a boolean, got '{value}'"))),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| AppError::config(format!("{key} must be a number, got '{value}'")))
}

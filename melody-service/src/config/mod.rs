use secrecy::Secret;
use service_core::config::{self as core_config, get_env, get_env_parsed};
use service_core::error::AppError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SUNO_BASE_URL: &str = "https://api.sunoapi.org";
const DEFAULT_SUNO_MODEL: &str = "V3_5";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

/// Immutable service configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct MelodyConfig {
    pub common: core_config::Config,
    pub suno: SunoConfig,
    pub delivery: DeliveryConfig,
    pub store: StoreConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct SunoConfig {
    pub api_key: Secret<String>,
    /// Scheme and host of the upstream API, without trailing slash.
    pub base_url: String,
    pub model: String,
    pub submit_timeout: Duration,
    pub health_timeout: Duration,
    /// Retries for transient submit failures, on top of the first attempt.
    pub submit_retries: u32,
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub mode: DeliveryMode,
    /// Address the upstream can reach this service on. Only used in callback mode.
    pub public_base_url: String,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub ttl: Duration,
    pub max_entries: u64,
    /// Answer 404 for task ids this process never saw instead of "not ready".
    pub unknown_is_not_found: bool,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// How a submitted task is resolved to an audio URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// `/generate_music` polls the upstream until the track is ready.
    Polling,
    /// `/generate_music` returns the task id; the upstream calls `/callback`.
    Callback,
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "poll" => Ok(DeliveryMode::Polling),
            "callback" => Ok(DeliveryMode::Callback),
            other => Err(format!("unknown delivery mode '{}'", other)),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Polling => f.write_str("polling"),
            DeliveryMode::Callback => f.write_str("callback"),
        }
    }
}

impl MelodyConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_prod();

        let allowed_origins = get_env("ALLOWED_ORIGINS", Some("*"), false)?;

        Ok(MelodyConfig {
            common: common_config,
            suno: SunoConfig {
                api_key: Secret::new(get_env("SUNO_API_KEY", None, is_prod)?),
                base_url: get_env("SUNO_API_BASE_URL", Some(DEFAULT_SUNO_BASE_URL), false)?
                    .trim_end_matches('/')
                    .to_string(),
                model: get_env("SUNO_MODEL", Some(DEFAULT_SUNO_MODEL), false)?,
                submit_timeout: Duration::from_secs(get_env_parsed("SUBMIT_TIMEOUT_SECS", 60)?),
                health_timeout: Duration::from_secs(get_env_parsed("HEALTH_TIMEOUT_SECS", 10)?),
                submit_retries: get_env_parsed("SUBMIT_MAX_RETRIES", 2)?,
            },
            delivery: DeliveryConfig {
                mode: get_env_parsed("DELIVERY_MODE", DeliveryMode::Polling)?,
                public_base_url: get_env(
                    "PUBLIC_BASE_URL",
                    Some(DEFAULT_PUBLIC_BASE_URL),
                    false,
                )?
                .trim_end_matches('/')
                .to_string(),
                poll_interval: Duration::from_millis(get_env_parsed("POLL_INTERVAL_MS", 2000)?),
                poll_max_attempts: get_env_parsed("POLL_MAX_ATTEMPTS", 60)?,
            },
            store: StoreConfig {
                ttl: Duration::from_secs(get_env_parsed("RESULT_TTL_SECS", 3600)?),
                max_entries: get_env_parsed("RESULT_MAX_ENTRIES", 10_000)?,
                unknown_is_not_found: get_env_parsed("LOOKUP_UNKNOWN_IS_NOT_FOUND", false)?,
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&allowed_origins),
            },
        })
    }

    /// Upstream endpoint that accepts generation requests.
    pub fn generate_url(&self) -> String {
        format!("{}/api/v1/generate", self.suno.base_url)
    }

    /// Upstream endpoint reporting the state of one task.
    pub fn status_url(&self, task_id: &str) -> String {
        format!("{}/api/v1/status/{}", self.suno.base_url, task_id)
    }

    /// Callback address registered with the upstream, if callbacks are in use.
    pub fn callback_url(&self) -> Option<String> {
        match self.delivery.mode {
            DeliveryMode::Callback => Some(format!("{}/callback", self.delivery.public_base_url)),
            DeliveryMode::Polling => None,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

use marquee_core::{RetryPolicy, ScreenConfig};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub reservation_service: ReservationServiceConfig,
    #[serde(default)]
    pub selection: SelectionRules,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReservationServiceConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelectionRules {
    #[serde(default = "default_max_seats")]
    pub max_seats: usize,
    /// 0 disables the background refresh.
    #[serde(default)]
    pub refresh_interval_secs: u64,
    /// Screens untouched for this long are closed and evicted. 0 keeps them until deleted.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self {
            max_seats: default_max_seats(),
            refresh_interval_secs: 0,
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_request_timeout_ms() -> u64 { 5_000 }
fn default_max_seats() -> usize { 8 }
fn default_idle_timeout_secs() -> u64 { 900 }
fn default_attempts() -> u32 { 3 }
fn default_initial_delay_ms() -> u64 { 200 }
fn default_max_delay_ms() -> u64 { 5_000 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `MARQUEE_SELECTION__MAX_SEATS=4`
            .add_source(config::Environment::with_prefix("MARQUEE").separator("__"))
            .build()?;

        Self::from_settings(s)
    }

    pub fn from_settings(settings: config::Config) -> Result<Self, config::ConfigError> {
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.selection.max_seats == 0 {
            return Err(config::ConfigError::Message(
                "selection.max_seats must be at least 1".to_string(),
            ));
        }
        if self.retry.attempts == 0 {
            return Err(config::ConfigError::Message(
                "retry.attempts must be at least 1".to_string(),
            ));
        }
        if self.reservation_service.base_url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "reservation_service.base_url is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry.attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            multiplier: 2.0,
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    pub fn screen_config(&self) -> ScreenConfig {
        ScreenConfig {
            max_seats: self.selection.max_seats,
            refresh_interval: match self.selection.refresh_interval_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            retry: self.retry_policy(),
            idle_timeout: match self.selection.idle_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            ..ScreenConfig::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.reservation_service.request_timeout_ms)
    }
}

use crate::retry::RetryPolicy;
use anyhow::{bail, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Personal token, sent as both `token` and `user_id` and forced
    /// into the `x-user_id` cookie.
    pub client_token: String,
    pub listing_url: String,
    pub task_url: String,
    pub token_url: String,
    pub upload_url: String,
    /// Stop collecting once this many records are gathered.
    pub max_records: usize,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub initial_delay_secs: u64,
    pub max_delay_secs: u64,
    pub batch_pause_secs: u64,
    pub proxies_file: String,
    pub results_file: String,
    pub time_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_token: "t_1a6e35f4".to_string(),
            listing_url: "https://advanced.name/freeproxy".to_string(),
            task_url: "https://test-rg8.ddns.net/task".to_string(),
            token_url: "https://test-rg8.ddns.net/api/get_token".to_string(),
            upload_url: "https://test-rg8.ddns.net/api/post_proxies".to_string(),
            max_records: 150,
            batch_size: 10,
            max_attempts: 10,
            initial_delay_secs: 10,
            max_delay_secs: 60,
            batch_pause_secs: 2,
            proxies_file: "proxies.json".to_string(),
            results_file: "results.json".to_string(),
            time_file: "time.txt".to_string(),
        }
    }
}

impl Settings {
    /// Reads `config.toml` from the working directory; a missing or
    /// empty file means defaults.
    pub fn new() -> Result<Self> {
        let config_data = fs::read_to_string("config.toml").unwrap_or_default();
        if config_data.is_empty() {
            return Ok(Settings::default());
        }

        let settings: Settings = toml::from_str(&config_data)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be positive");
        }
        if self.max_attempts == 0 {
            bail!("max_attempts must be positive");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_secs(self.initial_delay_secs),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_secs(self.batch_pause_secs)
    }
}

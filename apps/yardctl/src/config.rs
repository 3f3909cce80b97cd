use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use client_core::{normalize_base_url, ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_CEP_BASE_URL};
use serde::Deserialize;
use toml::{Table, Value};
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "yardctl.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub cep_base_url: String,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            cep_base_url: DEFAULT_CEP_BASE_URL.into(),
            request_timeout_secs: 30,
            cache_ttl_secs: 60,
        }
    }
}

impl Settings {
    pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        let base_url = normalize_base_url(&self.api_base_url)
            .with_context(|| format!("invalid api base url {:?}", self.api_base_url))?;
        let cep_base_url = normalize_base_url(&self.cep_base_url)
            .with_context(|| format!("invalid cep base url {:?}", self.cep_base_url))?;
        Ok(ClientConfig {
            base_url,
            cep_base_url,
            timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Defaults, then the optional config file, then environment overrides.
pub fn load_settings(config_file: &Path) -> Settings {
    let raw = fs::read_to_string(config_file).ok();
    settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

fn settings_from(file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match raw.parse::<Table>() {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("api_base_url").and_then(Value::as_str) {
                    settings.api_base_url = v.to_string();
                }
                if let Some(v) = file_cfg.get("cep_base_url").and_then(Value::as_str) {
                    settings.cep_base_url = v.to_string();
                }
                if let Some(v) = file_cfg.get("request_timeout_secs").and_then(seconds) {
                    settings.request_timeout_secs = v;
                }
                if let Some(v) = file_cfg.get("cache_ttl_secs").and_then(seconds) {
                    settings.cache_ttl_secs = v;
                }
            }
            Err(err) => warn!(error = %err, "config: ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("YARD_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("YARD_CEP_BASE_URL") {
        settings.cep_base_url = v;
    }
    if let Some(v) = env("APP__CEP_BASE_URL") {
        settings.cep_base_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = env("APP__CACHE_TTL_SECS") {
        if let Ok(parsed) = v.parse() {
            settings.cache_ttl_secs = parsed;
        }
    }

    settings
}

/// Accepts `10` as well as `"10"`.
fn seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Integer(n) => u64::try_from(*n).ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

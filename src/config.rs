use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

const APP_DIR: &str = "hn-digest";
const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";
const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub translator_api_key: Option<String>,

    #[serde(default = "default_translator_base_url")]
    pub translator_base_url: String,

    #[serde(default = "default_translator_model")]
    pub translator_model: String,

    /// Stories kept per sort mode before merging.
    #[serde(default = "default_story_limit")]
    pub story_limit: usize,

    /// Comments per story that get a translated body.
    #[serde(default = "default_comment_translation_cap")]
    pub comment_translation_cap: usize,

    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_enrichment_delay_ms")]
    pub enrichment_delay_ms: u64,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("stories.db").to_string_lossy().to_string()
}

fn default_translator_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_translator_model() -> String {
    "deepseek-chat".to_string()
}

fn default_story_limit() -> usize {
    20
}

fn default_comment_translation_cap() -> usize {
    20
}

fn default_retention_days() -> i64 {
    7
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_enrichment_delay_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            translator_api_key: None,
            translator_base_url: default_translator_base_url(),
            translator_model: default_translator_model(),
            story_limit: default_story_limit(),
            comment_translation_cap: default_comment_translation_cap(),
            retention_days: default_retention_days(),
            request_timeout_secs: default_request_timeout_secs(),
            enrichment_delay_ms: default_enrichment_delay_ms(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        if config.translator_api_key.is_none() {
            config.translator_api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.story_limit == 0 {
            return Err(AppError::Config("story_limit must be at least 1".to_string()));
        }
        if !(1..=MAX_RETENTION_DAYS).contains(&config.retention_days) {
            return Err(AppError::Config(format!(
                "retention_days must be between 1 and {MAX_RETENTION_DAYS}"
            )));
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Oldest `fetched_at` kept by a purge. Saturates at the earliest
    /// representable time rather than overflowing.
    pub fn retention_cutoff(&self, now: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
        chrono::Duration::try_days(self.retention_days)
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = Config::from_toml(r#"db_path = "/tmp/x.db""#).unwrap();
        assert_eq!(config.db_path, "/tmp/x.db");
        assert_eq!(config.story_limit, 20);
        assert_eq!(config.comment_translation_cap, 20);
        assert_eq!(config.retention_days, 7);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.enrichment_delay_ms, 100);
        assert!(config.translator_api_key.is_none());
    }

    #[test]
    fn zero_story_limit_is_rejected() {
        let err = Config::from_toml("story_limit = 0").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn out_of_range_retention_is_rejected() {
        for value in ["0", "-3", "9223372036854775807"] {
            let err = Config::from_toml(&format!("retention_days = {value}")).unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "accepted {value}");
        }
    }

    #[test]
    fn huge_retention_saturates_instead_of_panicking() {
        let config = Config {
            retention_days: i64::MAX,
            ..Config::default()
        };
        let cutoff = config.retention_cutoff(chrono::Utc::now());
        assert_eq!(cutoff, chrono::DateTime::<chrono::Utc>::MIN_UTC);
    }

    #[test]
    fn retention_cutoff_subtracts_days() {
        let config = Config::from_toml("retention_days = 3").unwrap();
        let now = chrono::Utc::now();
        assert_eq!(now - config.retention_cutoff(now), chrono::Duration::days(3));
    }
}

use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/state.json";
pub const DEFAULT_SENTIMENT_SERVICE_URL: &str = "http://localhost:8000";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_PRESENCE_INTERVAL_SECS: u64 = 30;
pub const MAX_PRESENCE_INTERVAL_SECS: u64 = 3_600;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 15;
pub const MAX_UPSTREAM_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub sentiment_service_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub presence_interval: Duration,
    /// Applies to every outbound call (Gemini, sentiment service).
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let seconds = |name: &'static str, default: u64, max: u64| match var(name) {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if (1..=max).contains(&secs) => Ok(secs),
                _ => Err(ConfigError::Invalid {
                    name,
                    expected: "a number of seconds within range",
                    value,
                }),
            },
            None => Ok(default),
        };
        let presence_secs = seconds(
            "PRESENCE_INTERVAL_SECS",
            DEFAULT_PRESENCE_INTERVAL_SECS,
            MAX_PRESENCE_INTERVAL_SECS,
        )?;
        let timeout_secs = seconds(
            "UPSTREAM_TIMEOUT_SECS",
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
            MAX_UPSTREAM_TIMEOUT_SECS,
        )?;

        Ok(Self {
            port,
            data_path: var("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            sentiment_service_url: var("SENTIMENT_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_SENTIMENT_SERVICE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_base: var("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            presence_interval: Duration::from_secs(presence_secs),
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// How long a heartbeat keeps a user "online": two polling intervals.
    pub fn presence_window(&self) -> Duration {
        self.presence_interval
            .checked_mul(2)
            .unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn config_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.sentiment_service_url, DEFAULT_SENTIMENT_SERVICE_URL);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.presence_interval, Duration::from_secs(30));
        assert_eq!(config.presence_window(), Duration::from_secs(60));
        assert_eq!(config.upstream_timeout, Duration::from_secs(15));
    }

    #[test]
    fn config_reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9001"),
            ("APP_DATA_PATH", "/tmp/journal.json"),
            ("SENTIMENT_SERVICE_URL", "http://127.0.0.1:9999/"),
            ("GEMINI_API_KEY", "secret"),
            ("PRESENCE_INTERVAL_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.data_path, PathBuf::from("/tmp/journal.json"));
        assert_eq!(config.sentiment_service_url, "http://127.0.0.1:9999");
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.presence_interval, Duration::from_secs(5));
    }

    #[test]
    fn config_blank_key_means_unset() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn config_rejects_bad_numbers() {
        assert!(Config::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup(&[("PRESENCE_INTERVAL_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("UPSTREAM_TIMEOUT_SECS", "0")])).is_err());
    }

    #[test]
    fn presence_interval_is_bounded() {
        let max = MAX_PRESENCE_INTERVAL_SECS.to_string();
        let config = Config::from_lookup(lookup(&[("PRESENCE_INTERVAL_SECS", max.as_str())]))
            .unwrap();
        assert_eq!(
            config.presence_window(),
            Duration::from_secs(2 * MAX_PRESENCE_INTERVAL_SECS)
        );

        let over = (MAX_PRESENCE_INTERVAL_SECS + 1).to_string();
        assert!(Config::from_lookup(lookup(&[("PRESENCE_INTERVAL_SECS", over.as_str())])).is_err());
        assert!(
            Config::from_lookup(lookup(&[("PRESENCE_INTERVAL_SECS", "18446744073709551615")]))
                .is_err()
        );
    }

    #[test]
    fn presence_window_saturates() {
        let mut config = Config::from_lookup(lookup(&[])).unwrap();
        config.presence_interval = Duration::MAX;
        assert_eq!(config.presence_window(), Duration::MAX);
    }

    #[test]
    fn upstream_timeout_override() {
        let config = Config::from_lookup(lookup(&[("UPSTREAM_TIMEOUT_SECS", "3")])).unwrap();
        assert_eq!(config.upstream_timeout, Duration::from_secs(3));
        assert!(Config::from_lookup(lookup(&[("UPSTREAM_TIMEOUT_SECS", "301")])).is_err());
    }
}

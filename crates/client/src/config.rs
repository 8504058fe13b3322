use std::path::PathBuf;
use std::time::Duration;

use genproxy_core::backoff::StatusCheckConfig;

use crate::keep_warm::KeepWarmConfig;
use crate::transport::DEFAULT_REQUEST_TIMEOUT;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got `{value}`")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Client configuration loaded from environment variables.
///
/// Everything except the base URL has a default matching the proxy's
/// production behaviour.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Proxy base URL, e.g. `https://example.com/.netlify/functions`.
    pub base_url: String,
    /// Timeout of a single HTTP call.
    pub request_timeout: Duration,
    /// Status-check loop tunables.
    pub status: StatusCheckConfig,
    /// Keep-warm pinger tunables.
    pub keep_warm: KeepWarmConfig,
    /// Session record providing the bearer token, if any.
    pub session_file: Option<PathBuf>,
    /// Local token ledger document, if any.
    pub ledger_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `GENPROXY_BASE_URL`       | required                |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `STATUS_MAX_ATTEMPTS`     | `60`                    |
    /// | `STATUS_MAX_ELAPSED_SECS` | `600`                   |
    /// | `STATUS_MIN_INTERVAL_MS`  | `2000`                  |
    /// | `STATUS_MAX_INTERVAL_MS`  | `15000`                 |
    /// | `WEBHOOK_FALLBACK_SECS`   | `30`                    |
    /// | `KEEP_WARM_INTERVAL_SECS` | `300`                   |
    /// | `KEEP_WARM_PATHS`         | `/image,/video,/chat`   |
    /// | `SESSION_FILE`            | unset                   |
    /// | `LEDGER_FILE`             | unset                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("GENPROXY_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("GENPROXY_BASE_URL"))?;

        let defaults = StatusCheckConfig::default();
        let status = StatusCheckConfig {
            max_attempts: positive(&lookup, "STATUS_MAX_ATTEMPTS", "a positive integer")?
                .unwrap_or(defaults.max_attempts),
            max_elapsed: secs(&lookup, "STATUS_MAX_ELAPSED_SECS")?.unwrap_or(defaults.max_elapsed),
            min_interval: millis(&lookup, "STATUS_MIN_INTERVAL_MS")?.unwrap_or(defaults.min_interval),
            max_interval: millis(&lookup, "STATUS_MAX_INTERVAL_MS")?.unwrap_or(defaults.max_interval),
            webhook_fallback_after: secs(&lookup, "WEBHOOK_FALLBACK_SECS")?
                .unwrap_or(defaults.webhook_fallback_after),
            ..defaults
        };

        let keep_warm_defaults = KeepWarmConfig::default();
        let keep_warm = KeepWarmConfig {
            interval: positive::<u64>(
                &lookup,
                "KEEP_WARM_INTERVAL_SECS",
                "a positive number of seconds",
            )?
            .map(Duration::from_secs)
            .unwrap_or(keep_warm_defaults.interval),
            paths: lookup("KEEP_WARM_PATHS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(keep_warm_defaults.paths),
        };

        Ok(Self {
            base_url,
            request_timeout: secs(&lookup, "REQUEST_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            status,
            keep_warm,
            session_file: lookup("SESSION_FILE").map(PathBuf::from),
            ledger_file: lookup("LEDGER_FILE").map(PathBuf::from),
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                name,
                expected,
                value,
            }),
    }
}

/// Like [`parse`], rejecting zero.
fn positive<T: std::str::FromStr + Default + PartialEq>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match parse::<T>(lookup, name, expected)? {
        Some(value) if value == T::default() => Err(ConfigError::Invalid {
            name,
            expected,
            value: lookup(name).unwrap_or_default(),
        }),
        parsed => Ok(parsed),
    }
}

fn secs(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    Ok(parse::<u64>(lookup, name, "a number of seconds")?.map(Duration::from_secs))
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    Ok(parse::<u64>(lookup, name, "a number of milliseconds")?.map(Duration::from_millis))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn base_url_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::Missing("GENPROXY_BASE_URL"))
        ));
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("GENPROXY_BASE_URL", "http://proxy")]).unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.status, StatusCheckConfig::default());
        assert_eq!(cfg.keep_warm, KeepWarmConfig::default());
        assert!(cfg.session_file.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("GENPROXY_BASE_URL", "http://proxy"),
            ("STATUS_MAX_ATTEMPTS", "10"),
            ("WEBHOOK_FALLBACK_SECS", "45"),
            ("STATUS_MIN_INTERVAL_MS", "500"),
            ("KEEP_WARM_PATHS", "/a, /b,,"),
        ])
        .unwrap();
        assert_eq!(cfg.status.max_attempts, 10);
        assert_eq!(cfg.status.webhook_fallback_after, Duration::from_secs(45));
        assert_eq!(cfg.status.min_interval, Duration::from_millis(500));
        assert_eq!(cfg.keep_warm.paths, vec!["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = config(&[
            ("GENPROXY_BASE_URL", "http://proxy"),
            ("REQUEST_TIMEOUT_SECS", "soon"),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "REQUEST_TIMEOUT_SECS must be a number of seconds, got `soon`"
        );
    }

    #[test]
    fn zero_keep_warm_interval_is_rejected() {
        let err = config(&[
            ("GENPROXY_BASE_URL", "http://proxy"),
            ("KEEP_WARM_INTERVAL_SECS", "0"),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "KEEP_WARM_INTERVAL_SECS must be a positive number of seconds, got `0`"
        );
    }

    #[test]
    fn zero_status_attempts_are_rejected() {
        let err = config(&[
            ("GENPROXY_BASE_URL", "http://proxy"),
            ("STATUS_MAX_ATTEMPTS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "STATUS_MAX_ATTEMPTS",
                ..
            }
        ));
    }
}

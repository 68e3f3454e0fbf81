//! Environment-based configuration with development defaults.

use std::time::Duration as StdDuration;

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    /// Absent means the volatile in-memory store (dev only).
    pub database_url: Option<String>,
    pub hold_ttl: Duration,
    pub sweep_interval: StdDuration,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let database_url = lookup("DATABASE_URL");
        let hold_ttl =
            Duration::minutes(positive_i64(lookup("HOLD_TTL_MINUTES"), "HOLD_TTL_MINUTES", 15));
        let sweep_interval = StdDuration::from_secs(positive_i64(
            lookup("SWEEP_INTERVAL_SECS"),
            "SWEEP_INTERVAL_SECS",
            60,
        ) as u64);
        Self {
            bind_addr,
            database_url,
            hold_ttl,
            sweep_interval,
        }
    }
}

fn positive_i64(raw: Option<String>, name: &str, default: i64) -> i64 {
    match raw {
        Some(raw) => match raw.parse::<i64>() {
            Ok(value) if value > 0 => value,
            _ => {
                tracing::warn!(var = name, value = %raw, "invalid value; using default {default}");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ApiConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.database_url.is_none());
        assert_eq!(config.hold_ttl, Duration::minutes(15));
        assert_eq!(config.sweep_interval, StdDuration::from_secs(60));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = ApiConfig::from_lookup(|name| match name {
            "HOLD_TTL_MINUTES" => Some("5".to_string()),
            "SWEEP_INTERVAL_SECS" => Some("10".to_string()),
            _ => None,
        });
        assert_eq!(config.hold_ttl, Duration::minutes(5));
        assert_eq!(config.sweep_interval, StdDuration::from_secs(10));
    }

    #[test]
    fn unparsable_or_non_positive_values_fall_back() {
        let config = ApiConfig::from_lookup(|name| match name {
            "HOLD_TTL_MINUTES" => Some("soon".to_string()),
            "SWEEP_INTERVAL_SECS" => Some("-5".to_string()),
            _ => None,
        });
        assert_eq!(config.hold_ttl, Duration::minutes(15));
        assert_eq!(config.sweep_interval, StdDuration::from_secs(60));
    }
}

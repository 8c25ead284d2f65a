//! Runtime configuration, read from environment variables with defaults.

use std::{env, str::FromStr, time::Duration};

use crate::{retry::RetryPolicy, traffic::TrafficConfig};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

#[derive(Debug, Clone, PartialEq)]
pub struct OverpassConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
    /// Minimum gap between consecutive requests.
    pub request_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OVERPASS_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            request_delay: Duration::from_millis(1000),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    pub statistics_ttl: Duration,
    pub infrastructure_ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            statistics_ttl: Duration::from_secs(2 * 60 * 60),
            infrastructure_ttl: Duration::from_secs(30 * 60),
            max_entries: 256,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisConfig {
    /// Traffic analysis hits an external service, so it is opt-in.
    pub enable_traffic_analysis: bool,
    pub overpass: OverpassConfig,
    pub traffic: TrafficConfig,
    pub cache: CacheConfig,
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut c = Self::default();

        if let Some(v) = lookup("ENABLE_TRAFFIC_ANALYSIS") {
            c.enable_traffic_analysis = parse_flag(&v);
        }
        if let Some(v) = lookup("OVERPASS_URL") {
            c.overpass.endpoint = v;
        }
        if let Some(v) = lookup("OVERPASS_TIMEOUT_SECS") {
            c.overpass.request_timeout = Duration::from_secs(parse_or("OVERPASS_TIMEOUT_SECS", &v, 30));
        }
        if let Some(v) = lookup("OVERPASS_REQUEST_DELAY_MS") {
            c.overpass.request_delay =
                Duration::from_millis(parse_or("OVERPASS_REQUEST_DELAY_MS", &v, 1000));
        }
        if let Some(v) = lookup("OVERPASS_MAX_ATTEMPTS") {
            c.overpass.retry.max_attempts = parse_or("OVERPASS_MAX_ATTEMPTS", &v, 3);
        }
        if let Some(v) = lookup("STATS_CACHE_TTL_SECS") {
            c.cache.statistics_ttl = Duration::from_secs(parse_or("STATS_CACHE_TTL_SECS", &v, 7200));
        }
        if let Some(v) = lookup("INFRA_CACHE_TTL_SECS") {
            c.cache.infrastructure_ttl = Duration::from_secs(parse_or("INFRA_CACHE_TTL_SECS", &v, 1800));
        }
        if let Some(v) = lookup("CACHE_MAX_ENTRIES") {
            c.cache.max_entries = parse_or("CACHE_MAX_ENTRIES", &v, 256);
        }

        c
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_or<T: FromStr + Copy>(key: &str, value: &str, default: T) -> T {
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!("Ignoring malformed {key}={value:?}, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AnalysisConfig::default());
        assert!(!config.enable_traffic_analysis);
        assert_eq!(config.overpass.endpoint, DEFAULT_OVERPASS_URL);
        assert_eq!(config.overpass.request_timeout, Duration::from_secs(30));
        assert_eq!(config.overpass.retry.max_attempts, 3);
        assert_eq!(config.cache.statistics_ttl, Duration::from_secs(7200));
        assert_eq!(config.cache.infrastructure_ttl, Duration::from_secs(1800));
        assert_eq!(config.traffic, TrafficConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = AnalysisConfig::from_lookup(lookup(&[
            ("ENABLE_TRAFFIC_ANALYSIS", "true"),
            ("OVERPASS_URL", "http://localhost:12345/api"),
            ("OVERPASS_TIMEOUT_SECS", "5"),
            ("OVERPASS_REQUEST_DELAY_MS", "250"),
            ("OVERPASS_MAX_ATTEMPTS", "5"),
            ("CACHE_MAX_ENTRIES", "8"),
        ]));
        assert!(config.enable_traffic_analysis);
        assert_eq!(config.overpass.endpoint, "http://localhost:12345/api");
        assert_eq!(config.overpass.request_timeout, Duration::from_secs(5));
        assert_eq!(config.overpass.request_delay, Duration::from_millis(250));
        assert_eq!(config.overpass.retry.max_attempts, 5);
        assert_eq!(config.cache.max_entries, 8);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = AnalysisConfig::from_lookup(lookup(&[
            ("OVERPASS_TIMEOUT_SECS", "soon"),
            ("STATS_CACHE_TTL_SECS", "-1"),
            ("ENABLE_TRAFFIC_ANALYSIS", "maybe"),
        ]));
        assert_eq!(config.overpass.request_timeout, Duration::from_secs(30));
        assert_eq!(config.cache.statistics_ttl, Duration::from_secs(7200));
        assert!(!config.enable_traffic_analysis);
    }
}

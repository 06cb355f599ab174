// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::api_key::ApiKey;
use crate::error::ConfigError;
use crate::hostname::{is_valid_hostname, is_valid_port};
use std::collections::HashSet;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://app.datadoghq.com/api/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_LOG_LEVEL: &str = "info";
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Jobs excluded from all reporting.
///
/// Entries are stored without whitespace and lower-cased; empty entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist(HashSet<String>);

impl Blacklist {
    /// Parses a comma-separated list of job names.
    pub fn parse(blacklist: &str) -> Self {
        let normalized: String = blacklist
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        Self(
            normalized
                .split(',')
                .filter(|job| !job.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Case-insensitive membership test on the job display name.
    pub fn contains(&self, job_name: &str) -> bool {
        self.0.contains(&job_name.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// HTTP proxy every API call is routed through when enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<String>,
}

impl ProxyConfig {
    pub fn new(host: &str, port: &str) -> Self {
        Self {
            enabled: true,
            host: Some(normalize_proxy_host(host)),
            port: Some(port.trim().to_string()),
        }
    }

    /// `http://<host>:<port>` when the proxy is enabled and fully configured.
    pub fn url(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        match (&self.host, &self.port) {
            (Some(host), Some(port)) => Some(format!("http://{host}:{port}")),
            _ => None,
        }
    }
}

fn normalize_proxy_host(host: &str) -> String {
    host.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Configuration of the build reporter, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: ApiKey,
    /// Hostname that takes precedence over any detected one
    pub hostname: Option<String>,
    pub blacklist: Blacklist,
    /// Whether to tag telemetry with the node the build ran on
    pub tag_node: bool,
    pub proxy: ProxyConfig,
    /// Base URL of the Datadog API, ending with `/`
    pub api_url: String,
    /// Timeout of a single API call
    pub timeout: Duration,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Configuration with defaults for everything but the API key.
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            hostname: None,
            blacklist: Blacklist::default(),
            tag_node: false,
            proxy: ProxyConfig::default(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("DD_API_KEY")
            .and_then(|key| ApiKey::new(&key))
            .ok_or(ConfigError::MissingApiKey)?;

        let hostname = lookup("DD_HOSTNAME")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        let blacklist = lookup("DD_JOB_BLACKLIST")
            .map(|b| Blacklist::parse(&b))
            .unwrap_or_default();
        let tag_node = parse_bool("DD_TAG_NODE", lookup("DD_TAG_NODE"))?;

        let proxy = ProxyConfig {
            enabled: parse_bool("DD_USE_PROXY", lookup("DD_USE_PROXY"))?,
            host: lookup("DD_PROXY_HOST")
                .map(|h| normalize_proxy_host(&h))
                .filter(|h| !h.is_empty()),
            port: lookup("DD_PROXY_PORT")
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        };

        let mut api_url = lookup("DD_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.ends_with('/') {
            api_url.push('/');
        }

        let timeout = match lookup("DD_HTTP_TIMEOUT_SECS") {
            Some(secs) => secs
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidValue {
                    name: "DD_HTTP_TIMEOUT_SECS",
                    value: secs,
                })?,
            None => DEFAULT_TIMEOUT,
        };

        let log_level = lookup("DD_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let config = Self {
            api_key,
            hostname,
            blacklist,
            tag_node,
            proxy,
            api_url,
            timeout,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hostname) = &self.hostname {
            if !is_valid_hostname(hostname) {
                return Err(ConfigError::InvalidHostname(hostname.clone()));
            }
        }

        if self.proxy.enabled {
            let host = self.proxy.host.clone().unwrap_or_default();
            if !is_valid_hostname(&host) {
                return Err(ConfigError::InvalidProxyHost(host));
            }
            let port = self.proxy.port.clone().unwrap_or_default();
            if !is_valid_port(&port) {
                return Err(ConfigError::InvalidProxyPort(port));
            }
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        Ok(())
    }
}

fn parse_bool(name: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DD_API_KEY", "mock-api-key")])).unwrap();
        assert_eq!(config.api_key.as_str(), "mock-api-key");
        assert_eq!(config.hostname, None);
        assert!(config.blacklist.is_empty());
        assert!(!config.tag_node);
        assert_eq!(config.proxy, ProxyConfig::default());
        assert_eq!(config.proxy.url(), None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("DD_API_KEY", "  ")])),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_lookup(lookup(&[
            ("DD_API_KEY", "mock-api-key"),
            ("DD_HOSTNAME", "ci-master.example.com"),
            ("DD_JOB_BLACKLIST", "Nightly Build, deploy-prod,,"),
            ("DD_TAG_NODE", "TRUE"),
            ("DD_USE_PROXY", "true"),
            ("DD_PROXY_HOST", " Proxy.Example.com "),
            ("DD_PROXY_PORT", "3128"),
            ("DD_URL", "http://127.0.0.1:8080/api"),
            ("DD_HTTP_TIMEOUT_SECS", "3"),
            ("DD_LOG_LEVEL", "DEBUG"),
        ]))
        .unwrap();
        assert_eq!(config.hostname.as_deref(), Some("ci-master.example.com"));
        assert!(config.blacklist.contains("NIGHTLYBUILD"));
        assert!(config.blacklist.contains("Deploy-Prod"));
        assert!(!config.blacklist.contains(""));
        assert!(config.tag_node);
        assert_eq!(
            config.proxy.url().as_deref(),
            Some("http://proxy.example.com:3128")
        );
        assert_eq!(config.api_url, "http://127.0.0.1:8080/api/");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_blacklist_parse() {
        let blacklist = Blacklist::parse(" job-a ,JOB-B,, job c");
        assert!(blacklist.contains("job-a"));
        assert!(blacklist.contains("Job-B"));
        assert!(blacklist.contains("jobc"));
        assert!(!blacklist.contains("job-d"));
        assert!(Blacklist::parse("").is_empty());
        assert!(Blacklist::parse(" , ,").is_empty());
    }

    #[test]
    fn test_invalid_values() {
        let result = Config::from_lookup(lookup(&[
            ("DD_API_KEY", "mock-api-key"),
            ("DD_TAG_NODE", "yes"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                name: "DD_TAG_NODE",
                ..
            })
        ));

        let result = Config::from_lookup(lookup(&[
            ("DD_API_KEY", "mock-api-key"),
            ("DD_HTTP_TIMEOUT_SECS", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_validate_invalid_hostname() {
        let result = Config::from_lookup(lookup(&[
            ("DD_API_KEY", "mock-api-key"),
            ("DD_HOSTNAME", "localhost"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidHostname(_))));
    }

    #[test]
    fn test_validate_proxy() {
        let key = ApiKey::new("mock-api-key").unwrap();

        let config = Config {
            proxy: ProxyConfig::new("proxy.example.com", "8080"),
            ..Config::new(key.clone())
        };
        assert!(config.validate().is_ok());

        let config = Config {
            proxy: ProxyConfig::new("bad_host", "8080"),
            ..Config::new(key.clone())
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProxyHost(_))
        ));

        let config = Config {
            proxy: ProxyConfig::new("proxy.example.com", "70000"),
            ..Config::new(key.clone())
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProxyPort(_))
        ));

        // An incomplete proxy is fine as long as it is disabled.
        let config = Config {
            proxy: ProxyConfig {
                enabled: false,
                host: None,
                port: Some("not-a-port".to_string()),
            },
            ..Config::new(key)
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "invalid".to_string(),
            ..Config::new(ApiKey::new("mock-api-key").unwrap())
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var("DD_API_KEY", "env-api-key");
        env::set_var("DD_JOB_BLACKLIST", "secret-job");
        env::remove_var("DD_USE_PROXY");

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_key.as_str(), "env-api-key");
        assert!(config.blacklist.contains("Secret-Job"));

        env::remove_var("DD_API_KEY");
        env::remove_var("DD_JOB_BLACKLIST");
    }
}

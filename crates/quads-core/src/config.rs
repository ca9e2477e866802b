//! Configuration for QUADS clients.
//!
//! [`QuadsConfig`] carries the server URL, API credentials and transport
//! knobs. It deserializes from the keys the QUADS server configuration uses
//! (`API_URL`, `quads_api_username`, `quads_api_password`) and can also be
//! read from the environment.

use crate::client::{ClientConfig, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT_SECS};
use crate::Error;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "API_URL";
/// Alternate environment variable for the API base URL.
pub const ENV_QUADS_API_URL: &str = "QUADS_API_URL";
/// Environment variable holding the API username.
pub const ENV_USERNAME: &str = "QUADS_API_USERNAME";
/// Environment variable holding the API password.
pub const ENV_PASSWORD: &str = "QUADS_API_PASSWORD";
/// Environment variable toggling TLS verification (`true`/`1` to verify).
pub const ENV_TLS_VERIFY: &str = "QUADS_API_TLS_VERIFY";

/// Configuration for a QUADS client instance.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuadsConfig {
    /// API base URL, e.g. `https://quads.example.com/api/v3`
    #[validate(url)]
    #[serde(alias = "API_URL")]
    pub api_url: String,

    /// API username used for login
    #[serde(default, rename = "quads_api_username", alias = "username")]
    pub username: Option<String>,

    /// API password used for login
    #[serde(
        default,
        rename = "quads_api_password",
        alias = "password",
        deserialize_with = "deserialize_secret"
    )]
    pub password: Option<SecretString>,

    /// Whether to verify TLS certificates
    #[serde(default)]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(default)]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Total attempts per request, first try included
    #[validate(range(min = 1, max = 10))]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Whether connection failures are retried like gateway errors
    #[serde(default)]
    pub retry_on_connect_errors: bool,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl QuadsConfig {
    /// Create a new client configuration for the given API URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(api_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            api_url: api_url.into(),
            username: None,
            password: None,
            tls_verify: false,
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_on_connect_errors: false,
        };

        config.validate().map_err(|e| {
            Error::ConfigError(format!("Invalid configuration: {}", e))
        })?;

        Ok(config)
    }

    /// Read the configuration from environment variables.
    ///
    /// `API_URL` (or `QUADS_API_URL`) is required; `QUADS_API_USERNAME`,
    /// `QUADS_API_PASSWORD` and `QUADS_API_TLS_VERIFY` are optional.
    ///
    /// # Errors
    ///
    /// Returns an error if no URL is set or the resulting configuration is invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(ENV_API_URL)
            .or_else(|| lookup(ENV_QUADS_API_URL))
            .ok_or_else(|| {
                Error::ConfigError(format!(
                    "neither {ENV_API_URL} nor {ENV_QUADS_API_URL} is set"
                ))
            })?;

        let mut config = Self::new(api_url)?;
        match (lookup(ENV_USERNAME), lookup(ENV_PASSWORD)) {
            (Some(username), Some(password)) => {
                config = config.with_credentials(username, password);
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(Error::ConfigError(format!(
                    "{ENV_USERNAME} is set without {ENV_PASSWORD}"
                )));
            }
            (None, Some(_)) => {
                return Err(Error::ConfigError(format!(
                    "{ENV_PASSWORD} is set without {ENV_USERNAME}"
                )));
            }
        }
        if let Some(verify) = lookup(ENV_TLS_VERIFY) {
            config.tls_verify = matches!(verify.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(config)
    }

    /// Parse a configuration from a JSON document and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not deserialize or fails validation.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration document: {e}")))?;
        config.validate()?;
        config.credentials()?;
        Ok(config)
    }

    /// Set the API credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set the total number of attempts per request.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Retry connection failures as well as gateway errors.
    #[must_use]
    pub const fn with_retry_on_connect_errors(mut self, enabled: bool) -> Self {
        self.retry_on_connect_errors = enabled;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse and validate the API URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_api_url(&self) -> Result<Url, Error> {
        Url::parse(&self.api_url)
            .map_err(|e| Error::ConfigError(format!("Invalid API URL: {}", e)))
    }

    /// The configured username and password, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when only one of the two is set.
    pub fn credentials(&self) -> Result<Option<(&str, &SecretString)>, Error> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Some((username.as_str(), password))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::ConfigError(
                "quads_api_username is set without quads_api_password".to_string(),
            )),
            (None, Some(_)) => Err(Error::ConfigError(
                "quads_api_password is set without quads_api_username".to_string(),
            )),
        }
    }

    /// Derive the HTTP client settings described by this configuration.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let retry_policy = RetryPolicy::new()
            .with_max_attempts(self.max_attempts)
            .with_retry_on_connect_errors(self.retry_on_connect_errors);

        let mut config = ClientConfig::new()
            .with_timeout(self.timeout())
            .with_retry_policy(retry_policy)
            .with_tls_verify(self.tls_verify);
        if let Some(path) = &self.tls_ca_cert {
            config = config.with_ca_cert(path.clone());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    #[test]
    fn test_quads_config_new() {
        let config = QuadsConfig::new("https://quads.example.com/api/v3").unwrap();
        assert_eq!(config.api_url, "https://quads.example.com/api/v3");
        assert!(!config.tls_verify);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_attempts, 5);
        assert!(config.username.is_none());
    }

    #[test]
    fn test_quads_config_invalid_url() {
        let result = QuadsConfig::new("not-a-url");
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_quads_config_builder() {
        let config = QuadsConfig::new("https://quads.example.com")
            .unwrap()
            .with_credentials("admin", "hunter2")
            .with_tls_verify(true)
            .with_timeout(60)
            .with_max_attempts(3)
            .with_retry_on_connect_errors(true);

        assert_eq!(config.username.as_deref(), Some("admin"));
        assert_eq!(
            config.password.as_ref().map(|p| p.expose_secret().to_string()),
            Some("hunter2".to_string())
        );
        assert!(config.tls_verify);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_attempts, 3);
        assert!(config.retry_on_connect_errors);
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let config = QuadsConfig::new("https://quads.example.com")
            .unwrap()
            .with_credentials("admin", "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_from_json_with_quads_keys() {
        let config = QuadsConfig::from_json(
            r#"{
                "API_URL": "http://quads.example.com/api/v3",
                "quads_api_username": "grafuls",
                "quads_api_password": "secret"
            }"#,
        )
        .unwrap();

        assert_eq!(config.api_url, "http://quads.example.com/api/v3");
        assert_eq!(config.username.as_deref(), Some("grafuls"));
        assert!(config.password.is_some());
        assert!(!config.tls_verify);
        assert_eq!(config.max_attempts, 5);
    }

    #[test]
    fn test_from_json_rejects_out_of_range() {
        let result = QuadsConfig::from_json(
            r#"{"api_url": "http://quads.example.com", "request_timeout_secs": 0}"#,
        );
        assert!(matches!(result, Err(Error::ValidationError(_))));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("QUADS_API_URL", "http://quads.example.com/api/v3"),
            ("QUADS_API_USERNAME", "admin"),
            ("QUADS_API_PASSWORD", "pw"),
            ("QUADS_API_TLS_VERIFY", "true"),
        ]
        .into_iter()
        .collect();

        let config = QuadsConfig::from_lookup(|key| vars.get(key).map(ToString::to_string)).unwrap();
        assert_eq!(config.api_url, "http://quads.example.com/api/v3");
        assert_eq!(config.username.as_deref(), Some("admin"));
        assert!(config.tls_verify);
    }

    #[test]
    fn test_from_lookup_requires_both_credentials() {
        let username_only = |key: &str| match key {
            "API_URL" => Some("http://quads.example.com".to_string()),
            "QUADS_API_USERNAME" => Some("admin".to_string()),
            _ => None,
        };
        let err = QuadsConfig::from_lookup(username_only).unwrap_err();
        assert!(matches!(&err, Error::ConfigError(msg) if msg.contains("QUADS_API_PASSWORD")));

        let password_only = |key: &str| match key {
            "API_URL" => Some("http://quads.example.com".to_string()),
            "QUADS_API_PASSWORD" => Some("pw".to_string()),
            _ => None,
        };
        let err = QuadsConfig::from_lookup(password_only).unwrap_err();
        assert!(matches!(&err, Error::ConfigError(msg) if msg.contains("QUADS_API_USERNAME")));
    }

    #[test]
    fn test_from_json_requires_both_credentials() {
        let result = QuadsConfig::from_json(
            r#"{"API_URL": "http://quads.example.com", "quads_api_username": "admin"}"#,
        );
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_credentials_pair() {
        let config = QuadsConfig::new("http://quads.example.com").unwrap();
        assert!(config.credentials().unwrap().is_none());

        let config = config.with_credentials("admin", "pw");
        let (username, password) = config.credentials().unwrap().unwrap();
        assert_eq!(username, "admin");
        assert_eq!(password.expose_secret(), "pw");
    }

    #[test]
    fn test_from_lookup_missing_url() {
        let result = QuadsConfig::from_lookup(|_| None);
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_client_config_from_quads_config() {
        let config = QuadsConfig::new("https://quads.example.com")
            .unwrap()
            .with_timeout(10)
            .with_max_attempts(2);
        let client = config.client_config();
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert_eq!(client.retry_policy.max_attempts, 2);
        assert!(!client.tls_verify);
    }

    #[test]
    fn test_config_validation_ranges() {
        let mut config = QuadsConfig::new("https://quads.example.com").unwrap();
        config.request_timeout_secs = 301;
        assert!(config.validate().is_err());

        config.request_timeout_secs = 30;
        config.max_attempts = 0;
        assert!(config.validate().is_err());

        config.max_attempts = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_api_url() {
        let config = QuadsConfig::new("https://quads.example.com:8443/api/v3").unwrap();
        let url = config.parse_api_url().unwrap();
        assert_eq!(url.host_str(), Some("quads.example.com"));
        assert_eq!(url.port(), Some(8443));
        assert_eq!(url.path(), "/api/v3");
    }
}

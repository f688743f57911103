//! Application configuration
//!
//! `AppConfig` is built once at startup (usually from the process
//! environment) and then passed explicitly to whichever component needs it.
//! Nothing in the workspace reads credentials from ambient state after that.

use crate::error::{ConfigError, Result};
use std::time::Duration;

/// Environment variable holding the Gemini API key
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
/// Environment variable overriding the model name
pub const GEMINI_MODEL: &str = "GEMINI_MODEL";
/// Environment variable holding the Serper search key
pub const SERPER_API_KEY: &str = "SERPER_API_KEY";
/// Environment variable holding the sec-api.io key
pub const SEC_API_API_KEY: &str = "SEC_API_API_KEY";
/// Environment variable overriding the SEC download User-Agent
pub const SEC_USER_AGENT: &str = "SEC_USER_AGENT";
/// Environment variable overriding the per-request HTTP timeout
pub const REQUEST_TIMEOUT_SECS: &str = "FINSIGHT_REQUEST_TIMEOUT_SECS";

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_SEC_USER_AGENT: &str = "finsight contact@example.com";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Immutable application configuration
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Gemini API key (required)
    pub google_api_key: String,

    /// Gemini model name
    pub model: String,

    /// Serper API key; web search is disabled without it
    pub serper_api_key: Option<String>,

    /// sec-api.io key; filing tools are disabled without it
    pub sec_api_key: Option<String>,

    /// User-Agent sent when downloading filings from sec.gov
    pub sec_user_agent: String,

    /// Timeout applied to each outbound HTTP request
    pub request_timeout: Duration,
}

// Manual impl keeps keys out of logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("google_api_key", &redact(Some(&self.google_api_key)))
            .field("model", &self.model)
            .field("serper_api_key", &redact(self.serper_api_key.as_ref()))
            .field("sec_api_key", &redact(self.sec_api_key.as_ref()))
            .field("sec_user_agent", &self.sec_user_agent)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl AppConfig {
    /// Create a new configuration builder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load `.env` (if present) and build the configuration from the process
    /// environment
    pub fn from_env() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut builder = AppConfigBuilder::default()
            .google_api_key(get(GOOGLE_API_KEY).ok_or_else(|| {
                ConfigError::MissingVariable(GOOGLE_API_KEY.to_string())
            })?);

        if let Some(model) = get(GEMINI_MODEL) {
            builder = builder.model(model);
        }
        if let Some(key) = get(SERPER_API_KEY) {
            builder = builder.serper_api_key(key);
        }
        if let Some(key) = get(SEC_API_API_KEY) {
            builder = builder.sec_api_key(key);
        }
        if let Some(agent) = get(SEC_USER_AGENT) {
            builder = builder.sec_user_agent(agent);
        }
        if let Some(raw) = get(REQUEST_TIMEOUT_SECS) {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: REQUEST_TIMEOUT_SECS.to_string(),
                reason: format!("expected whole seconds, got '{raw}'"),
            })?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.google_api_key.trim().is_empty() {
            return Err(ConfigError::MissingVariable(GOOGLE_API_KEY.to_string()));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model name must not be empty".to_string()));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether web search can be offered
    pub fn search_enabled(&self) -> bool {
        self.serper_api_key.is_some()
    }

    /// Whether SEC filing retrieval can be offered
    pub fn filings_enabled(&self) -> bool {
        self.sec_api_key.is_some()
    }

    /// Redacted, human-readable status lines
    pub fn display_status(&self) -> Vec<String> {
        vec![
            format!("Model: {}", self.model),
            format!("{GOOGLE_API_KEY}: {}", redact(Some(&self.google_api_key))),
            format!("{SERPER_API_KEY}: {}", redact(self.serper_api_key.as_ref())),
            format!("{SEC_API_API_KEY}: {}", redact(self.sec_api_key.as_ref())),
            format!("Request timeout: {}s", self.request_timeout.as_secs()),
        ]
    }
}

/// Load variables from a `.env` file in the working directory, if any
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }
}

fn redact(value: Option<&String>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "set",
        _ => "not set",
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    google_api_key: Option<String>,
    model: Option<String>,
    serper_api_key: Option<String>,
    sec_api_key: Option<String>,
    sec_user_agent: Option<String>,
    request_timeout: Option<Duration>,
}

impl AppConfigBuilder {
    /// Set the Gemini API key
    pub fn google_api_key(mut self, key: impl Into<String>) -> Self {
        self.google_api_key = Some(key.into());
        self
    }

    /// Set the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the Serper API key
    pub fn serper_api_key(mut self, key: impl Into<String>) -> Self {
        self.serper_api_key = Some(key.into());
        self
    }

    /// Set the sec-api.io key
    pub fn sec_api_key(mut self, key: impl Into<String>) -> Self {
        self.sec_api_key = Some(key.into());
        self
    }

    /// Set the SEC download User-Agent
    pub fn sec_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.sec_user_agent = Some(agent.into());
        self
    }

    /// Set the per-request HTTP timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig> {
        let config = AppConfig {
            google_api_key: self.google_api_key.unwrap_or_default(),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            serper_api_key: self.serper_api_key,
            sec_api_key: self.sec_api_key,
            sec_user_agent: self
                .sec_user_agent
                .unwrap_or_else(|| DEFAULT_SEC_USER_AGENT.to_string()),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_builder_defaults() {
        let config = AppConfig::builder().google_api_key("key").build().unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!(!config.search_enabled());
        assert!(!config.filings_enabled());
    }

    #[test]
    fn test_missing_api_key() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVariable(GOOGLE_API_KEY.to_string()));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (GOOGLE_API_KEY, "abc"),
            (SERPER_API_KEY, "   "),
        ]))
        .unwrap();
        assert!(config.serper_api_key.is_none());
    }

    #[test]
    fn test_from_lookup_all_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (GOOGLE_API_KEY, "abc"),
            (GEMINI_MODEL, "gemini-1.5-pro"),
            (SERPER_API_KEY, "serp"),
            (SEC_API_API_KEY, "sec"),
            (SEC_USER_AGENT, "Acme ops@acme.test"),
            (REQUEST_TIMEOUT_SECS, "45"),
        ]))
        .unwrap();

        assert_eq!(config.model, "gemini-1.5-pro");
        assert!(config.search_enabled());
        assert!(config.filings_enabled());
        assert_eq!(config.sec_user_agent, "Acme ops@acme.test");
        assert_eq!(config.request_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = AppConfig::from_lookup(lookup_from(&[
            (GOOGLE_API_KEY, "abc"),
            (REQUEST_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = AppConfig::builder()
            .google_api_key("abc")
            .request_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_debug_and_status_redact_keys() {
        let config = AppConfig::builder()
            .google_api_key("super-secret")
            .serper_api_key("also-secret")
            .build()
            .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("also-secret"));

        let status = config.display_status().join("\n");
        assert!(status.contains("GOOGLE_API_KEY: set"));
        assert!(status.contains("SEC_API_API_KEY: not set"));
        assert!(!status.contains("super-secret"));
    }
}

//! # Client Configuration
//!
//! Where the sessions API lives and how long to wait for it.
//! Loaded from environment variables; the API key is not part of it.

use pay_core::PaymentError;
use std::env;
use std::time::Duration;
use url::Url;

/// Production API
pub const DEFAULT_API_URL: &str = "https://chainpe.onrender.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sessions API client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub api_base_url: String,

    /// Per-request timeout. Expiry surfaces as a transport error.
    pub timeout: Duration,

    /// User-Agent header value
    pub user_agent: String,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `CHAINPE_API_URL` (default: production API)
    /// - `CHAINPE_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PaymentError> {
        let api_base_url =
            lookup("CHAINPE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = match lookup("CHAINPE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                PaymentError::Configuration(format!(
                    "CHAINPE_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
                    raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Self::new(api_base_url).map(|c| c.with_timeout(Duration::from_secs(timeout)))
    }

    /// Create config for an explicit base URL
    pub fn new(api_base_url: impl Into<String>) -> Result<Self, PaymentError> {
        let api_base_url = normalize_base_url(&api_base_url.into())?;

        Ok(Self {
            api_base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("chainpe-rs/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Builder: set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an API path such as `/api/sessions/create`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, PaymentError> {
    let parsed = Url::parse(raw.trim()).map_err(|e| {
        PaymentError::Configuration(format!("Invalid API base URL {:?}: {}", raw, e))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PaymentError::Configuration(format!(
            "API base URL must be http or https, got {:?}",
            raw
        )));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_base_url_normalized() {
        let config = ClientConfig::new("http://localhost:8000/").unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(
            config.endpoint("/api/sessions/create"),
            "http://localhost:8000/api/sessions/create"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ClientConfig::new("not a url").is_err());
        assert!(ClientConfig::new("ftp://example.com").is_err());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars = HashMap::from([
            ("CHAINPE_API_URL", "http://localhost:8000/"),
            ("CHAINPE_TIMEOUT_SECS", "5"),
        ]);
        let config =
            ClientConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(5));

        let bad = ClientConfig::from_lookup(|name| {
            (name == "CHAINPE_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(bad.unwrap_err().kind(), "configuration_error");
    }
}

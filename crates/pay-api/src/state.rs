//! # Application State
//!
//! Shared state for the storefront: merchant credentials, the gateway to the
//! sessions API and a verifier bound to them.

use pay_client::HttpSessionGateway;
use pay_core::{ApiKey, IntegrationConfig, SessionInitiator, SessionVerifier, SharedGateway};
use std::net::SocketAddr;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this storefront (for return URLs)
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Merchant API key for the sessions API
    pub api_key: ApiKey,
}

impl AppConfig {
    /// Load from environment variables. `CHAINPE_API_KEY` is required.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_key = lookup("CHAINPE_API_KEY")
            .map(ApiKey::new)
            .ok_or_else(|| anyhow::anyhow!("CHAINPE_API_KEY not set"))?;
        if api_key.is_blank() {
            anyhow::bail!("CHAINPE_API_KEY is empty");
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: lookup("BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            api_key,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Where the hosted checkout sends the shopper after paying
    pub fn success_url(&self) -> String {
        format!("{}/checkout/success", self.base_url.trim_end_matches('/'))
    }

    /// Where the hosted checkout sends the shopper on cancel
    pub fn cancel_url(&self) -> String {
        format!("{}/checkout/cancel", self.base_url.trim_end_matches('/'))
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Transport to the sessions API
    pub gateway: SharedGateway,
    /// Verifier bound to the merchant key
    pub verifier: SessionVerifier,
    /// Application config
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new AppState talking to the configured sessions API
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let gateway = HttpSessionGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize sessions API client: {}", e))?;

        Ok(Self::with_gateway(config, Arc::new(gateway)))
    }

    /// Build state around an explicit gateway
    pub fn with_gateway(config: AppConfig, gateway: SharedGateway) -> Self {
        let verifier = SessionVerifier::new(gateway.clone(), config.api_key.clone());
        Self {
            gateway,
            verifier,
            config: Arc::new(config),
        }
    }

    /// A fresh pay control for one shopper request
    pub fn initiator(&self) -> SessionInitiator {
        SessionInitiator::new(self.gateway.clone())
    }

    /// Integration config for a purchase from this storefront
    pub fn integration_config(&self, amount: f64, order_id: Option<String>) -> IntegrationConfig {
        let mut config = IntegrationConfig::new(self.config.api_key.clone(), amount)
            .with_success_url(self.config.success_url())
            .with_cancel_url(self.config.cancel_url())
            .with_metadata_entry("source", "storefront");
        config.order_id = order_id;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            base_url: "http://localhost:3000/".to_string(),
            environment: "test".to_string(),
            api_key: ApiKey::new("cp_test_key"),
        }
    }

    #[test]
    fn test_app_config_requires_key() {
        assert!(AppConfig::from_lookup(|_| None).is_err());
        assert!(AppConfig::from_lookup(|name| {
            (name == "CHAINPE_API_KEY").then(|| "  ".to_string())
        })
        .is_err());

        let config = AppConfig::from_lookup(|name| match name {
            "CHAINPE_API_KEY" => Some("cp_test_key".to_string()),
            "PORT" => Some("9000".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.api_key.expose(), "cp_test_key");
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");

        let bad = AppConfig {
            host: "not a host".to_string(),
            ..config()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_return_urls() {
        let config = config();
        assert_eq!(config.success_url(), "http://localhost:3000/checkout/success");
        assert_eq!(config.cancel_url(), "http://localhost:3000/checkout/cancel");
    }
}

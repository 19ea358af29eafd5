//! # pay-client
//!
//! HTTP transport for the ChainPe sessions API.
//!
//! `HttpSessionGateway` implements `pay_core::SessionGateway` with `reqwest`
//! and compiles for both native targets and `wasm32` (browser `fetch`).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_client::HttpSessionGateway;
//! use pay_core::{IntegrationConfig, SessionInitiator};
//! use std::sync::Arc;
//!
//! let gateway = Arc::new(HttpSessionGateway::from_env()?);
//! let initiator = SessionInitiator::new(gateway);
//!
//! let config = IntegrationConfig::new("cp_live_...", 50.0)
//!     .with_success_url("https://yourstore.com/success");
//! let activation = initiator.activate(&config).await?;
//! ```

pub mod config;
pub mod http;

// Re-exports
pub use config::{ClientConfig, DEFAULT_API_URL};
pub use http::HttpSessionGateway;

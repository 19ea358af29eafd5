//! # pay-core
//!
//! Core types and protocol for the ChainPe pay button.
//!
//! This crate provides:
//! - `IntegrationConfig` and `PaymentSession` for the session data model
//! - `SessionGateway` trait for the transport to the sessions API
//! - `SessionInitiator`, the Idle → Pending → Redirecting | Failed state machine
//! - `SessionVerifier` for return-page status lookups
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{Activation, IntegrationConfig, SessionInitiator, SessionVerifier};
//!
//! let initiator = SessionInitiator::new(gateway.clone());
//! let config = IntegrationConfig::new(api_key, 50.0).with_order_id("ORDER-12345");
//!
//! if let Activation::Redirect(session) = initiator.activate(&config).await? {
//!     // Send the shopper to session.checkout_url
//! }
//!
//! // Later, on the success page:
//! let verifier = SessionVerifier::new(gateway, api_key);
//! let session = verifier.verify(&session_id).await?;
//! ```

pub mod error;
pub mod gateway;
pub mod initiator;
pub mod session;
pub mod verifier;
pub mod wire;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult};
pub use gateway::{SessionGateway, SharedGateway};
pub use initiator::{Activation, ControlState, Phase, SessionInitiator};
pub use session::{ApiKey, IntegrationConfig, PaymentSession, SessionStatus, WebhookPayload};
pub use verifier::SessionVerifier;
pub use wire::{decode_created_session, decode_session_response, CreateSessionRequest};

//! # Session Gateway Trait
//!
//! The seam between the protocol core and whatever carries requests to the
//! sessions API. `pay-client` provides the HTTP implementation; tests provide
//! in-memory ones.
//!
//! ```text
//! ┌────────────────────┐      ┌────────────────────┐
//! │  SessionInitiator  │      │  SessionVerifier   │
//! └─────────┬──────────┘      └─────────┬──────────┘
//!           │ create_session()          │ get_session()
//!           └─────────────┬─────────────┘
//!                         ▼
//!             ┌───────────────────────┐
//!             │ SessionGateway (trait)│
//!             └───────────┬───────────┘
//!                         ▲
//!          ┌──────────────┴──────────────┐
//!  ┌───────┴──────────┐         ┌────────┴────────┐
//!  │HttpSessionGateway│         │ test doubles    │
//!  └──────────────────┘         └─────────────────┘
//! ```

use crate::error::PaymentResult;
use crate::session::{ApiKey, PaymentSession};
use crate::wire::CreateSessionRequest;
use async_trait::async_trait;
use std::sync::Arc;

/// Transport for the two session calls.
///
/// Implementations map outcomes onto `Rejected`, `Transport` and `Protocol`
/// errors and never retry.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait SessionGateway {
    /// Issue exactly one create-session request.
    async fn create_session(
        &self,
        api_key: &ApiKey,
        request: &CreateSessionRequest,
    ) -> PaymentResult<PaymentSession>;

    /// Fetch the current snapshot of a session by id.
    async fn get_session(&self, api_key: &ApiKey, session_id: &str)
        -> PaymentResult<PaymentSession>;

    /// Gateway name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Shared handle to a gateway (dynamic dispatch)
#[cfg(not(target_arch = "wasm32"))]
pub type SharedGateway = Arc<dyn SessionGateway + Send + Sync>;

/// Shared handle to a gateway (dynamic dispatch)
#[cfg(target_arch = "wasm32")]
pub type SharedGateway = Arc<dyn SessionGateway>;

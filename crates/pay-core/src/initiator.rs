//! # Session Initiator
//!
//! Drives the pay control through its four-state lifecycle:
//!
//! ```text
//!            activate()              2xx + well-formed
//!   Idle ───────────────▶ Pending ─────────────────────▶ Redirecting
//!    ▲                       │
//!    │ reset()               │ 4xx / 5xx / network / malformed
//!    │                       ▼
//!    └──────────────────── Failed ──── activate() ──▶ Pending
//! ```
//!
//! At most one create-session request is in flight per control. The gate is
//! checked and flipped under the state lock before any await point.

use crate::error::{PaymentError, PaymentResult};
use crate::gateway::SharedGateway;
use crate::session::{IntegrationConfig, PaymentSession};
use crate::wire::CreateSessionRequest;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

/// Observable phase of the control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
    Redirecting,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Pending => "pending",
            Phase::Redirecting => "redirecting",
            Phase::Failed => "failed",
        }
    }

    /// Whether the control accepts an activation in this phase
    pub fn accepts_activation(&self) -> bool {
        matches!(self, Phase::Idle | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full control state, including the outcome of the last activation
#[derive(Debug, Clone, PartialEq)]
pub enum ControlState {
    Idle,
    Pending,
    /// Session created; the shopper is being sent to its checkout URL
    Redirecting(PaymentSession),
    /// Last activation failed; the control is re-enabled
    Failed(PaymentError),
}

impl ControlState {
    pub fn phase(&self) -> Phase {
        match self {
            ControlState::Idle => Phase::Idle,
            ControlState::Pending => Phase::Pending,
            ControlState::Redirecting(_) => Phase::Redirecting,
            ControlState::Failed(_) => Phase::Failed,
        }
    }
}

/// Result of a call to [`SessionInitiator::activate`]
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// Navigate to `session.checkout_url`
    Redirect(PaymentSession),
    /// The control was busy or already redirecting; nothing was sent
    Ignored(Phase),
}

impl Activation {
    pub fn checkout_url(&self) -> Option<&str> {
        match self {
            Activation::Redirect(session) => session.checkout_url.as_deref(),
            Activation::Ignored(_) => None,
        }
    }
}

type Listener = Arc<dyn Fn(Phase) + Send + Sync>;

/// One pay control instance.
///
/// Holds no credentials of its own; the API key travels with each
/// `IntegrationConfig`.
pub struct SessionInitiator {
    gateway: SharedGateway,
    state: Mutex<ControlState>,
    listener: Option<Listener>,
}

impl SessionInitiator {
    pub fn new(gateway: SharedGateway) -> Self {
        Self {
            gateway,
            state: Mutex::new(ControlState::Idle),
            listener: None,
        }
    }

    /// Called after every phase change, outside the state lock.
    ///
    /// UIs use this to show the busy affordance on `Pending` and re-enable
    /// the control on `Failed`.
    pub fn with_listener(mut self, listener: impl Fn(Phase) + Send + Sync + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn state(&self) -> ControlState {
        self.lock_state().clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock_state().phase()
    }

    /// The session from the last successful activation, if still held
    pub fn last_session(&self) -> Option<PaymentSession> {
        match &*self.lock_state() {
            ControlState::Redirecting(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<PaymentError> {
        match &*self.lock_state() {
            ControlState::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// Return to `Idle`, discarding the last session or error.
    ///
    /// Refused (returns `false`) while a request is in flight.
    pub fn reset(&self) -> bool {
        {
            let mut state = self.lock_state();
            if state.phase() == Phase::Pending {
                return false;
            }
            *state = ControlState::Idle;
        }
        self.notify(Phase::Idle);
        true
    }

    /// Create a payment session for `config`.
    ///
    /// - Busy or already redirecting: `Ok(Activation::Ignored)`, no request.
    /// - Invalid config: `Err(Validation)`, state unchanged, no request.
    /// - Otherwise exactly one create-session request; the state ends in
    ///   `Redirecting` on success or `Failed` with the returned error.
    #[instrument(skip(self, config), fields(amount = config.amount, provider = self.gateway.provider_name()))]
    pub async fn activate(&self, config: &IntegrationConfig) -> PaymentResult<Activation> {
        let request = {
            let mut state = self.lock_state();
            let phase = state.phase();
            if !phase.accepts_activation() {
                debug!("Activation ignored while {}", phase);
                return Ok(Activation::Ignored(phase));
            }

            if let Err(e) = config.validate() {
                warn!("Rejected activation: {}", e);
                return Err(e);
            }

            *state = ControlState::Pending;
            CreateSessionRequest::from_config(config)
        };
        self.notify(Phase::Pending);

        debug!("Creating payment session for order {}", request.order_id);

        let outcome = self
            .gateway
            .create_session(&config.api_key, &request)
            .await
            .and_then(|session| {
                let shape = session.redirect_target().map(|_| ());
                match shape {
                    Ok(()) => Ok(session),
                    Err(PaymentError::Protocol { message, .. }) => Err(PaymentError::protocol(
                        message,
                        serde_json::to_string(&session).ok(),
                    )),
                    Err(other) => Err(other),
                }
            });

        match outcome {
            Ok(session) => {
                info!(
                    "Created payment session: id={}, status={}",
                    session.session_id, session.status
                );
                self.set_state(ControlState::Redirecting(session.clone()));
                Ok(Activation::Redirect(session))
            }
            Err(err) => {
                warn!("Payment session creation failed: {}", err);
                self.set_state(ControlState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    fn set_state(&self, next: ControlState) {
        let phase = next.phase();
        *self.lock_state() = next;
        self.notify(phase);
    }

    fn notify(&self, phase: Phase) {
        if let Some(listener) = &self.listener {
            listener(phase);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for SessionInitiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionInitiator")
            .field("provider", &self.gateway.provider_name())
            .field("phase", &self.phase())
            .finish()
    }
}

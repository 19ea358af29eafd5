//! In-memory gateway for unit tests.

use crate::error::{PaymentError, PaymentResult};
use crate::gateway::SessionGateway;
use crate::session::{ApiKey, PaymentSession, SessionStatus};
use crate::wire::CreateSessionRequest;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn created_session(session_id: &str, order_id: &str) -> PaymentSession {
    PaymentSession::new(session_id, 50.0, order_id, SessionStatus::Created)
        .with_checkout_url("https://pay/x")
}

/// Replays scripted outcomes in order and records what it was asked
pub struct ScriptedGateway {
    creates: Mutex<VecDeque<PaymentResult<PaymentSession>>>,
    lookups: Mutex<VecDeque<PaymentResult<PaymentSession>>>,
    requests: Mutex<Vec<CreateSessionRequest>>,
    create_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedGateway {
    pub fn new(creates: Vec<PaymentResult<PaymentSession>>) -> Self {
        Self {
            creates: Mutex::new(creates.into()),
            lookups: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            create_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn with_lookups(lookups: Vec<PaymentResult<PaymentSession>>) -> Self {
        let gateway = Self::new(Vec::new());
        *gateway.lookups.lock().unwrap() = lookups.into();
        gateway
    }

    /// Hold every create-session call until `gate` is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CreateSessionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(queue: &Mutex<VecDeque<PaymentResult<PaymentSession>>>) -> PaymentResult<PaymentSession> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PaymentError::Transport("no scripted response".into())))
    }
}

#[async_trait]
impl SessionGateway for ScriptedGateway {
    async fn create_session(
        &self,
        _api_key: &ApiKey,
        request: &CreateSessionRequest,
    ) -> PaymentResult<PaymentSession> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Self::next(&self.creates)
    }

    async fn get_session(
        &self,
        _api_key: &ApiKey,
        _session_id: &str,
    ) -> PaymentResult<PaymentSession> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.lookups)
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

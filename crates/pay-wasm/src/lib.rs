//! # pay-wasm
//!
//! WebAssembly bindings for the ChainPe pay button.
//!
//! This crate exposes the session initiator and verifier to a merchant page:
//! - `PayButton` attaches to a DOM button and drives the checkout redirect
//! - `verifyPayment` fetches a session on the return page
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PayButton } from 'chainpe-wasm';
//!
//! await init();
//!
//! const button = new PayButton({
//!   apiKey: 'cp_live_...',
//!   amount: 50.00,
//!   orderId: 'ORDER-12345',
//!   successUrl: 'https://yourstore.com/success',
//!   cancelUrl: 'https://yourstore.com/cart',
//!   metadata: { customer_email: 'customer@example.com' },
//! });
//! button.attach();
//!
//! // On the success page:
//! const session = await button.verifyPayment(sessionId);
//! if (session.status === 'completed') { ... }
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use pay_client::{ClientConfig, HttpSessionGateway, DEFAULT_API_URL};
use pay_core::{
    Activation, IntegrationConfig, PaymentError, PaymentSession, SessionInitiator,
    SessionVerifier, SharedGateway,
};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

const DEFAULT_BUTTON_ID: &str = "chainpe-payment-button";
const BUTTON_LABEL: &str = "Pay with ChainPe";
const BUSY_LABEL: &str = "Processing...";

/// Options object passed to `new PayButton(...)`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonOptions {
    #[serde(flatten)]
    pub integration: IntegrationConfig,

    /// Sessions API base URL (defaults to production)
    #[serde(default)]
    pub api_url: Option<String>,

    /// Id of the button element to attach to
    #[serde(default = "default_button_id")]
    pub button_id: String,

    /// Show a browser alert when an activation fails
    #[serde(default = "default_true")]
    pub alert_on_error: bool,
}

fn default_button_id() -> String {
    DEFAULT_BUTTON_ID.to_string()
}

fn default_true() -> bool {
    true
}

impl ButtonOptions {
    fn client_config(&self) -> Result<ClientConfig, PaymentError> {
        ClientConfig::new(self.api_url.as_deref().unwrap_or(DEFAULT_API_URL))
    }
}

/// Error shape handed to JavaScript (`{ kind, message, retryable }`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl From<&PaymentError> for ErrorInfo {
    fn from(err: &PaymentError) -> Self {
        Self {
            kind: err.kind(),
            message: err.message(),
            retryable: err.is_retryable(),
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

fn error_to_js(err: &PaymentError) -> JsValue {
    to_js(&ErrorInfo::from(err))
}

struct ButtonInner {
    options: ButtonOptions,
    initiator: SessionInitiator,
    verifier: SessionVerifier,
}

impl ButtonInner {
    fn button(&self) -> Option<web_sys::HtmlButtonElement> {
        web_sys::window()?
            .document()?
            .get_element_by_id(&self.options.button_id)?
            .dyn_into::<web_sys::HtmlButtonElement>()
            .ok()
    }

    fn show_ready(&self) {
        if let Some(button) = self.button() {
            button.set_disabled(false);
            button.set_inner_text(BUTTON_LABEL);
        }
    }

    fn show_busy(&self) {
        if let Some(button) = self.button() {
            button.set_disabled(true);
            button.set_inner_text(BUSY_LABEL);
        }
    }

    async fn run(&self) -> Result<JsValue, JsValue> {
        let config = &self.options.integration;

        // Nothing can interleave before activate() takes the gate
        if self.initiator.phase().accepts_activation() && config.validate().is_ok() {
            self.show_busy();
        }

        match self.initiator.activate(config).await {
            Ok(Activation::Redirect(session)) => {
                let url = session.redirect_target().map_err(|e| error_to_js(&e))?;
                let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
                window.location().set_href(url)?;
                Ok(to_js(&session))
            }
            Ok(Activation::Ignored(_)) => Ok(JsValue::UNDEFINED),
            Err(err) => {
                log_error(&format!("ChainPe payment error: {}", err));
                self.show_ready();
                if self.options.alert_on_error {
                    if let Some(window) = web_sys::window() {
                        let _ = window
                            .alert_with_message(&format!("Payment error: {}", err.message()));
                    }
                }
                Err(error_to_js(&err))
            }
        }
    }

    async fn verify(&self, session_id: &str) -> Result<PaymentSession, PaymentError> {
        self.verifier.verify(session_id).await.map_err(|err| {
            log_error(&format!("ChainPe verification error: {}", err));
            err
        })
    }
}

/// A pay control bound to one merchant configuration
#[wasm_bindgen]
pub struct PayButton {
    inner: Rc<ButtonInner>,
}

#[wasm_bindgen]
impl PayButton {
    /// Parse options and set up the control. Fails on a missing API key.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<PayButton, JsValue> {
        let options: ButtonOptions = serde_wasm_bindgen::from_value(options).map_err(|e| {
            error_to_js(&PaymentError::validation(format!("Invalid options: {}", e)))
        })?;

        if options.integration.api_key.is_blank() {
            return Err(error_to_js(&PaymentError::validation("API key is required")));
        }

        let gateway = options
            .client_config()
            .and_then(HttpSessionGateway::new)
            .map_err(|e| error_to_js(&e))?;
        let gateway: SharedGateway = Arc::new(gateway);

        let verifier = SessionVerifier::new(gateway.clone(), options.integration.api_key.clone());
        let initiator = SessionInitiator::new(gateway);

        Ok(PayButton {
            inner: Rc::new(ButtonInner {
                options,
                initiator,
                verifier,
            }),
        })
    }

    /// Label the button and start a payment on click
    #[wasm_bindgen]
    pub fn attach(&self) -> Result<(), JsValue> {
        let button = self.inner.button().ok_or_else(|| {
            JsValue::from_str(&format!(
                "ChainPe: Button element with id \"{}\" not found",
                self.inner.options.button_id
            ))
        })?;
        self.inner.show_ready();

        let inner = self.inner.clone();
        let on_click =
            Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |_event: web_sys::MouseEvent| {
                let inner = inner.clone();
                spawn_local(async move {
                    let _ = inner.run().await;
                });
            });
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        // The listener lives as long as the page
        on_click.forget();

        Ok(())
    }

    /// Start a payment programmatically. Resolves with the session
    /// (navigation is already under way) or `undefined` if busy.
    #[wasm_bindgen]
    pub fn activate(&self) -> js_sys::Promise {
        let inner = self.inner.clone();
        future_to_promise(async move { inner.run().await })
    }

    /// `idle`, `pending`, `redirecting` or `failed`
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.inner.initiator.phase().as_str().to_string()
    }

    /// Last created session, or `null`
    #[wasm_bindgen(js_name = lastSession)]
    pub fn last_session(&self) -> JsValue {
        self.inner
            .initiator
            .last_session()
            .map(|s| to_js(&s))
            .unwrap_or(JsValue::NULL)
    }

    /// Back to idle. Returns `false` while a request is in flight.
    #[wasm_bindgen]
    pub fn reset(&self) -> bool {
        let reset = self.inner.initiator.reset();
        if reset {
            self.inner.show_ready();
        }
        reset
    }

    /// Fetch the current status of a session (call this on the success page)
    #[wasm_bindgen(js_name = verifyPayment)]
    pub fn verify_payment(&self, session_id: String) -> js_sys::Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner
                .verify(&session_id)
                .await
                .map(|session| to_js(&session))
                .map_err(|e| error_to_js(&e))
        })
    }
}

fn log_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

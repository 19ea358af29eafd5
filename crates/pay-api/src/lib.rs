//! # pay-api
//!
//! Merchant storefront for the ChainPe pay flow.
//!
//! This crate provides:
//! - Axum-based HTTP server with a server-side pay control
//! - Return pages that verify the session with the API
//! - A receiver for the gateway's `payment.success` webhook
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/` | Pay form |
//! | POST | `/pay` | Create session, redirect to checkout |
//! | GET | `/checkout/success` | Verify and show status |
//! | GET | `/checkout/cancel` | Cancel page |
//! | GET | `/api/v1/sessions/{session_id}` | Session snapshot |
//! | POST | `/webhook/chainpe` | Payment webhook |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};

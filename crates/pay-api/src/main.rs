//! # pay-storefront
//!
//! Demo storefront that takes payments through ChainPe.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export CHAINPE_API_KEY=cp_...
//! export CHAINPE_API_URL=https://chainpe.onrender.com
//! export BASE_URL=http://localhost:8080
//!
//! # Run the server
//! pay-storefront
//! ```

use pay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Payment provider: {}", state.gateway.provider_name());

    let app = routes::create_router(state);

    info!("🚀 Storefront starting on http://{}", addr);

    if !is_prod {
        info!("🛒 Pay page: http://{}/", addr);
        info!("🔎 Session status: GET http://{}/api/v1/sessions/{{session_id}}", addr);
        info!("🔔 Webhook: POST http://{}/webhook/chainpe", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  ⚡ ChainPe Storefront ⚡
  ━━━━━━━━━━━━━━━━━━━━━━━
  Pay-button demo merchant
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}

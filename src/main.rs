//! Quizdesk · Quiz Session Backend
//!
//! - Axum HTTP JSON API over the quiz session engine
//! - File-backed sessions / history / notes (base64-wrapped JSON documents)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   QUIZ_CONFIG_PATH : path to TOML config (port, data dir, question banks)
//!   PORT             : u16 (default 5002)
//!   DATA_DIR         : directory for sessions/history/notes (default "data")
//!   STATIC_DIR       : front-end directory (default "static")
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod banks;
mod config;
mod domain;
mod engine;
mod error;
mod notes;
mod protocol;
mod routes;
mod scoring;
mod state;
mod store;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = AppConfig::from_env();
  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

  // Opens the data directory and registers the configured banks.
  let state = Arc::new(AppState::new(config).await?);
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quizdesk_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "quizdesk_backend", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "quizdesk_backend", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "quizdesk_backend", "Shutdown requested");
}

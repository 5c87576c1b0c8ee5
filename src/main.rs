//! WriteLevel · CEFR Writing Assessment Backend
//!
//! - Axum HTTP API
//! - Optional Mistral integration (via environment variables)
//! - Optional Supabase persistence (sessions + evaluation results)
//!
//! Important env variables:
//!   PORT          : u16 (default 3000)
//!   MISTRAL_API_KEY    : enables Mistral integration if present
//!   MISTRAL_BASE_URL    : default "https://api.mistral.ai/v1"
//!   MISTRAL_MODEL  : default "mistral-small"
//!   SUPABASE_URL    : enables persistence if present (with the anon key)
//!   SUPABASE_ANON_KEY  : Supabase project anon key
//!   ASSESSMENT_CONFIG_PATH  : path to TOML config (prompts + level overrides)
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod errors;
mod domain;
mod config;
mod catalog;
mod prompt;
mod mistral;
mod evaluation;
mod storage;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (prompt catalog, Mistral + Supabase clients).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "writelevel_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "writelevel_backend", error = %e, "Failed to listen for shutdown signal");
  } else {
    info!(target: "writelevel_backend", "Shutdown signal received");
  }
}

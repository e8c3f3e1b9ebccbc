//! # Sandbox Server
//!
//! A minimal transaction sandbox - an in-process account ledger with an
//! HTTP submission API, built with Rust, Axum, and Tokio.
//!
//! ## Features
//! - Async/await HTTP server using Axum framework
//! - Structured logging with tracing
//! - Atomic account initialization with per-address concurrency
//! - Replay-protected transaction submission with confirmation timeouts
//! - Health check endpoints for monitoring
//!
//! ## Architecture
//! The server is organized into modules:
//! - `server`: Core server initialization and configuration
//! - `config`: Environment variable configuration management
//! - `ledger`: Account store, instruction dispatcher and transaction submitter
//! - `program`: Typed client handle over the sandbox instruction set
//! - `routes`: HTTP route handlers organized by functionality
//!   - `health`: Health check and monitoring endpoints
//!   - `ledger`: Transaction submission and account inspection endpoints
//!
//! ## Environment Setup
//! All settings have defaults; override via environment variables or `.env`:
//! `SERVER_HOST`, `SERVER_PORT`, `CONFIRMATION_TIMEOUT_MS`, `MAX_IN_FLIGHT`,
//! `QUEUE_DEPTH`, `DISPATCH_DELAY_MS`.
//!
//! ## Running the Server
//! ```bash
//! cargo run
//! ```
//!
//! The server will start on `http://127.0.0.1:3000` by default.

mod config;
mod ledger;
mod program;
mod routes;
mod server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point.
///
/// Initializes the tracing/logging system, loads configuration and starts
/// the HTTP server. Runs until the process is terminated.
#[tokio::main]
async fn main() {
    // Pick up a local .env before reading configuration
    dotenv::dotenv().ok();

    // Initialize the tracing subscriber for structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false) // Don't show module targets for cleaner output
                .compact(), // Use compact formatting
        )
        .init();

    // Log application startup
    tracing::info!("🏁 Starting Sandbox Server...");
    tracing::info!(
        "📦 Package: {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        "🏗️  Build profile: {}",
        if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        }
    );

    let config = config::Config::from_env().expect("Failed to load configuration from environment");

    // Start the HTTP server - this will run indefinitely
    server::start(config).await;
}

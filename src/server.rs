//! # Server Module
//!
//! HTTP server setup and route configuration for the sandbox server.

use std::sync::Arc;

use axum::http::{Method, header};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::ledger::types::Address;
use crate::ledger::{self, Ledger};
use crate::program::SandboxProgramInstance;
use crate::routes::health::ping;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub program: Arc<SandboxProgramInstance>,
    pub ledger: Arc<Ledger>,
}

/// Starts the sandbox HTTP server.
///
/// Spawns the ledger core from the provided configuration, wires the typed
/// program instance on top of it, and serves the submission and inspection
/// routes until the process is terminated.
pub async fn start(config: Config) {
    // Spawn the ledger core: store, dispatcher worker, submitter handle
    let ledger = Arc::new(ledger::start(&config.ledger));

    // The typed program handle submits on behalf of a server-side payer
    // identity; raw submissions carry their own submitter address
    let payer = Address::new_unique();
    let program = Arc::new(SandboxProgramInstance::new(
        ledger.submitter.clone(),
        payer,
    ));

    let app_state = AppState { program, ledger };

    let ledger_routes = Router::new()
        .route(
            "/api/v1/program/initialize",
            post(crate::routes::ledger::initialize),
        )
        .route(
            "/api/v1/transaction/submit",
            post(crate::routes::ledger::submit_transaction),
        )
        .route(
            "/api/v1/account/{address}",
            get(crate::routes::ledger::get_account),
        )
        .route("/api/v1/ledger/status", get(crate::routes::ledger::status));

    // Main app router
    let app = Router::new()
        .route("/ping", get(ping)) // Health check endpoint
        .merge(ledger_routes)
        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT]),
            ),
        )
        .with_state(app_state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create a TCP listener bound to the configured address
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address - port may already be in use");

    // Log server startup information
    tracing::info!("🚀 Sandbox Server starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("📊 Ledger endpoints available at http://{}/api/v1/*", addr);
    tracing::info!(
        "⏱️  Confirmation timeout: {:?}",
        config.ledger.confirmation_timeout
    );
    tracing::info!("💳 Server payer: {}", app_state.program.payer());

    // Start serving the application
    axum::serve(listener, app).await.unwrap();
}

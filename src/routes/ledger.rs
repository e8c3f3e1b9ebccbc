//! Transaction submission and account inspection endpoints.
//!
//! Request and response bodies carry addresses, nonces and signatures as
//! base58 strings and packed instruction datas as base64, mirroring how the
//! typed core renders them. Parsing happens here; everything behind these
//! handlers works with the typed forms.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::dispatcher::DispatchStats;
use crate::ledger::error::LedgerError;
use crate::ledger::submitter::SubmitterMetrics;
use crate::ledger::types::{Address, Nonce, Transaction};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct InitializeRequest {
    /// Base58 address of the account to initialize
    pub target: String,
}

#[derive(Deserialize)]
pub struct SubmitTransactionRequest {
    /// Base58 address the submission is attributed to
    pub submitter: String,
    /// Base58 uniqueness nonce; replays are rejected
    pub nonce: String,
    /// Base64-encoded packed instruction datas, executed in order
    pub instructions: Vec<String>,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub tx_signature: Option<String>,
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub address: String,
    pub initialized: bool,
    /// Base64-encoded payload bytes
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub accounts: usize,
    pub dispatch: DispatchStats,
    pub submissions: SubmitterMetrics,
}

/// HTTP status for a ledger error surfaced to a client.
fn error_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidAccount(_) | LedgerError::InvalidInstruction(_) => {
            StatusCode::BAD_REQUEST
        }
        LedgerError::AlreadyInitialized(_) | LedgerError::SubmissionRejected(_) => {
            StatusCode::CONFLICT
        }
        LedgerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn rejection(err: &LedgerError) -> Response {
    (
        error_status(err),
        Json(SubmitResponse {
            success: false,
            message: err.to_string(),
            tx_signature: None,
        }),
    )
        .into_response()
}

/// Invoke the program's `initialize` instruction on a target account.
///
/// # Route
/// - **Method**: POST
/// - **Path**: `/api/v1/program/initialize`
/// - **Body**: `{"target": "<base58 address>"}`
///
/// Responds with the transaction signature on confirmation, 409 if the
/// account is already initialized, and 504 if no decision was reached in
/// time (the transaction may still land).
#[axum::debug_handler]
pub async fn initialize(
    State(state): State<AppState>,
    Json(body): Json<InitializeRequest>,
) -> Response {
    let target = match Address::from_str(&body.target) {
        Ok(address) => address,
        Err(err) => return rejection(&err),
    };

    match state.program.initialize(target).await {
        Ok(signature) => (
            StatusCode::OK,
            Json(SubmitResponse {
                success: true,
                message: format!("account {target} initialized"),
                tx_signature: Some(signature.to_string()),
            }),
        )
            .into_response(),
        Err(err) => rejection(&err),
    }
}

/// Submit a raw transaction: packed instructions plus submitter and nonce.
///
/// # Route
/// - **Method**: POST
/// - **Path**: `/api/v1/transaction/submit`
pub async fn submit_transaction(
    State(state): State<AppState>,
    Json(body): Json<SubmitTransactionRequest>,
) -> Response {
    let submitter = match Address::from_str(&body.submitter) {
        Ok(address) => address,
        Err(err) => return rejection(&err),
    };
    let nonce = match Nonce::from_str(&body.nonce) {
        Ok(nonce) => nonce,
        Err(err) => return rejection(&err),
    };

    let mut instructions = Vec::with_capacity(body.instructions.len());
    for encoded in &body.instructions {
        match BASE64.decode(encoded) {
            Ok(data) => instructions.push(data),
            Err(_) => {
                return rejection(&LedgerError::InvalidInstruction(
                    "instruction data is not valid base64".to_string(),
                ));
            }
        }
    }

    let transaction = Transaction::with_nonce(instructions, submitter, nonce);
    match state.ledger.submitter.submit(transaction).await {
        Ok(signature) => (
            StatusCode::OK,
            Json(SubmitResponse {
                success: true,
                message: "transaction confirmed".to_string(),
                tx_signature: Some(signature.to_string()),
            }),
        )
            .into_response(),
        Err(err) => rejection(&err),
    }
}

/// Fetch the account record at an address.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/api/v1/account/{address}`
pub async fn get_account(State(state): State<AppState>, Path(address): Path<String>) -> Response {
    let address = match Address::from_str(&address) {
        Ok(address) => address,
        Err(err) => return rejection(&err),
    };

    match state.ledger.store.get(&address) {
        Some(record) => (
            StatusCode::OK,
            Json(AccountResponse {
                address: address.to_string(),
                initialized: record.initialized,
                payload: BASE64.encode(&record.payload),
                created_at: record.created_at,
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(SubmitResponse {
                success: false,
                message: format!("account {address} not found"),
                tx_signature: None,
            }),
        )
            .into_response(),
    }
}

/// Report ledger counters: account count, dispatch decisions, submissions.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/api/v1/ledger/status`
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        accounts: state.ledger.store.len(),
        dispatch: state.ledger.dispatcher.stats(),
        submissions: state.ledger.submitter.metrics().await,
    })
}

//! Client-side transaction submission.
//!
//! The submitter packages a transaction onto the dispatcher queue together
//! with a oneshot reply channel, then suspends the calling task until the
//! dispatcher reaches a terminal decision or the configured wait elapses.
//! Suspension is cooperative: independent submissions proceed in parallel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::ledger::dispatcher::SubmitRequest;
use crate::ledger::error::LedgerError;
use crate::ledger::types::{Signature, Transaction};

/// Running counters over submissions made through one submitter (and its
/// clones).
#[derive(Debug, Default, Clone, Serialize)]
pub struct SubmitterMetrics {
    pub submitted: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub timed_out: u64,
    pub last_submission: Option<DateTime<Utc>>,
}

/// Handle for submitting transactions to a running dispatcher.
///
/// Cheap to clone; all clones feed the same queue and share metrics.
#[derive(Clone)]
pub struct TransactionSubmitter {
    queue: mpsc::Sender<SubmitRequest>,
    confirmation_timeout: Duration,
    metrics: Arc<RwLock<SubmitterMetrics>>,
}

impl TransactionSubmitter {
    pub(crate) fn new(queue: mpsc::Sender<SubmitRequest>, confirmation_timeout: Duration) -> Self {
        Self {
            queue,
            confirmation_timeout,
            metrics: Arc::new(RwLock::new(SubmitterMetrics::default())),
        }
    }

    /// Submit `transaction` and wait for the dispatcher's decision.
    ///
    /// Returns the signature on acceptance and the dispatcher's own error,
    /// unchanged, on rejection. `Timeout` means no decision was observed in
    /// time — the transaction may still land afterwards, so callers must
    /// treat it as "unknown", not "failed".
    pub async fn submit(&self, transaction: Transaction) -> Result<Signature, LedgerError> {
        {
            let mut metrics = self.metrics.write().await;
            metrics.submitted += 1;
            metrics.last_submission = Some(Utc::now());
        }

        let (reply, decision) = oneshot::channel();
        let outcome = if self
            .queue
            .send(SubmitRequest { transaction, reply })
            .await
            .is_err()
        {
            Err(LedgerError::SubmissionRejected(
                "dispatcher is no longer running".to_string(),
            ))
        } else {
            match timeout(self.confirmation_timeout, decision).await {
                Ok(Ok(decision)) => decision,
                Ok(Err(_)) => Err(LedgerError::SubmissionRejected(
                    "dispatcher dropped the transaction".to_string(),
                )),
                Err(_) => Err(LedgerError::Timeout(self.confirmation_timeout)),
            }
        };

        let mut metrics = self.metrics.write().await;
        match &outcome {
            Ok(signature) => {
                metrics.accepted += 1;
                debug!(%signature, "submission confirmed");
            }
            Err(LedgerError::Timeout(waited)) => {
                metrics.timed_out += 1;
                warn!(?waited, "no decision before deadline, transaction fate unknown");
            }
            Err(err) => {
                metrics.rejected += 1;
                debug!(error = %err, "submission rejected");
            }
        }

        outcome
    }

    pub async fn metrics(&self) -> SubmitterMetrics {
        self.metrics.read().await.clone()
    }
}

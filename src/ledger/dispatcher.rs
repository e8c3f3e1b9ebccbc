//! Transaction dispatch: validation, the instruction handlers, and the
//! worker loop that drains the submission queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tracing::{debug, warn};

use crate::config::LedgerConfig;
use crate::ledger::error::LedgerError;
use crate::ledger::instruction::Instruction;
use crate::ledger::store::{AccountStore, StoreError};
use crate::ledger::types::{Address, Nonce, Signature, Transaction};

/// A transaction awaiting a terminal decision, paired with the channel its
/// submitter is blocked on.
pub struct SubmitRequest {
    pub transaction: Transaction,
    pub reply: oneshot::Sender<Result<Signature, LedgerError>>,
}

/// Running counters over dispatch decisions.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DispatchStats {
    pub processed: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub last_decision: Option<DateTime<Utc>>,
}

/// Validates and executes transactions against the account store.
///
/// The dispatcher holds no per-transaction state of its own: replay guarding
/// goes through a concurrent nonce set and account preconditions go through
/// the store's atomic create, so unrelated transactions can execute in
/// parallel without a global lock.
pub struct Dispatcher {
    store: Arc<AccountStore>,
    seen_nonces: DashSet<(Address, Nonce)>,
    stats: RwLock<DispatchStats>,
    /// Artificial latency applied before each execution, for exercising
    /// client timeout handling against the sandbox.
    dispatch_delay: Option<Duration>,
}

impl Dispatcher {
    pub fn new(store: Arc<AccountStore>, config: &LedgerConfig) -> Self {
        Self {
            store,
            seen_nonces: DashSet::new(),
            stats: RwLock::new(DispatchStats::default()),
            dispatch_delay: config.dispatch_delay,
        }
    }

    /// Reach a terminal decision for one transaction: a fresh signature on
    /// acceptance, the first failing instruction's error otherwise.
    pub fn execute(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        let decision = self.execute_inner(transaction);

        let mut stats = self.stats.write();
        stats.processed += 1;
        match decision {
            Ok(_) => stats.accepted += 1,
            Err(_) => stats.rejected += 1,
        }
        stats.last_decision = Some(Utc::now());

        decision
    }

    fn execute_inner(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        if transaction.instructions.is_empty() {
            return Err(LedgerError::SubmissionRejected(
                "transaction carries no instructions".to_string(),
            ));
        }

        // Replay guard: the first submission of a (submitter, nonce) pair
        // wins, atomically.
        if !self
            .seen_nonces
            .insert((transaction.submitter, transaction.nonce))
        {
            return Err(LedgerError::SubmissionRejected(format!(
                "duplicate nonce {} from {}",
                transaction.nonce, transaction.submitter
            )));
        }

        let mut created: Vec<Address> = Vec::new();
        for data in &transaction.instructions {
            let outcome = Instruction::unpack(data)
                .and_then(|instruction| self.process(instruction, &mut created));
            if let Err(err) = outcome {
                // A failed transaction leaves no state behind: unwind the
                // records earlier instructions of this transaction created.
                for address in created.iter().rev() {
                    self.store.remove(address);
                }
                return Err(err);
            }
        }

        Ok(Signature::new_unique())
    }

    /// Execute one unpacked instruction, recording any record it creates so
    /// a later failure in the same transaction can unwind it.
    fn process(
        &self,
        instruction: Instruction,
        created: &mut Vec<Address>,
    ) -> Result<(), LedgerError> {
        debug!(instruction = instruction.name(), "executing instruction");
        match instruction {
            Instruction::Initialize { target } => {
                match self.store.create_if_absent(target, Vec::new()) {
                    Ok(_) => {
                        created.push(target);
                        Ok(())
                    }
                    Err(StoreError::AlreadyExists) => Err(LedgerError::AlreadyInitialized(target)),
                }
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats.read().clone()
    }
}

/// Drain the submission queue until every submitter handle is gone.
///
/// Each transaction executes on its own task, bounded by `max_in_flight`
/// permits. Ordering is per-address only (the store's atomic create), never
/// global.
pub async fn run(
    dispatcher: Arc<Dispatcher>,
    mut queue: mpsc::Receiver<SubmitRequest>,
    max_in_flight: usize,
) {
    let limiter = Arc::new(Semaphore::new(max_in_flight));

    while let Some(request) = queue.recv().await {
        let permit = limiter
            .clone()
            .acquire_owned()
            .await
            .expect("execution limiter is never closed");
        let dispatcher = dispatcher.clone();

        tokio::spawn(async move {
            if let Some(delay) = dispatcher.dispatch_delay {
                tokio::time::sleep(delay).await;
            }

            let decision = dispatcher.execute(&request.transaction);
            match &decision {
                Ok(signature) => debug!(%signature, "transaction accepted"),
                Err(err) => warn!(error = %err, "transaction rejected"),
            }

            // The submitter may have stopped waiting; the decision stands
            // either way.
            let _ = request.reply.send(decision);
            drop(permit);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> (Arc<AccountStore>, Dispatcher) {
        let store = Arc::new(AccountStore::new());
        let dispatcher = Dispatcher::new(store.clone(), &LedgerConfig::default());
        (store, dispatcher)
    }

    fn initialize_tx(target: Address) -> Transaction {
        Transaction::new(
            vec![Instruction::Initialize { target }.pack()],
            Address::new_unique(),
        )
    }

    #[test]
    fn test_initialize_succeeds_exactly_once() {
        let (store, dispatcher) = dispatcher();
        let target = Address::new_unique();

        dispatcher.execute(&initialize_tx(target)).unwrap();
        let snapshot = store.get(&target).unwrap();
        assert!(snapshot.initialized);

        assert_eq!(
            dispatcher.execute(&initialize_tx(target)),
            Err(LedgerError::AlreadyInitialized(target))
        );
        // the failed attempt must not disturb the record
        assert_eq!(store.get(&target).unwrap(), snapshot);
    }

    #[test]
    fn test_duplicate_nonce_is_rejected() {
        let (_store, dispatcher) = dispatcher();
        let transaction = initialize_tx(Address::new_unique());

        dispatcher.execute(&transaction).unwrap();
        assert!(matches!(
            dispatcher.execute(&transaction),
            Err(LedgerError::SubmissionRejected(_))
        ));
    }

    #[test]
    fn test_empty_transaction_is_rejected() {
        let (_store, dispatcher) = dispatcher();
        let transaction = Transaction::new(Vec::new(), Address::new_unique());

        assert!(matches!(
            dispatcher.execute(&transaction),
            Err(LedgerError::SubmissionRejected(_))
        ));
    }

    #[test]
    fn test_malformed_instruction_is_rejected() {
        let (store, dispatcher) = dispatcher();
        let transaction =
            Transaction::new(vec![vec![0xde, 0xad, 0xbe, 0xef]], Address::new_unique());

        assert!(matches!(
            dispatcher.execute(&transaction),
            Err(LedgerError::InvalidInstruction(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_transaction_leaves_no_state() {
        let (store, dispatcher) = dispatcher();
        let target = Address::new_unique();

        // second instruction hits the already-created target; the first
        // instruction's record must be unwound
        let transaction = Transaction::new(
            vec![
                Instruction::Initialize { target }.pack(),
                Instruction::Initialize { target }.pack(),
            ],
            Address::new_unique(),
        );

        assert_eq!(
            dispatcher.execute(&transaction),
            Err(LedgerError::AlreadyInitialized(target))
        );
        assert!(store.get(&target).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_stats_track_decisions() {
        let (_store, dispatcher) = dispatcher();
        let target = Address::new_unique();

        dispatcher.execute(&initialize_tx(target)).unwrap();
        let _ = dispatcher.execute(&initialize_tx(target));

        let stats = dispatcher.stats();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 1);
        assert!(stats.last_decision.is_some());
    }
}

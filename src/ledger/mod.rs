//! The sandbox ledger core: account state store, instruction dispatcher and
//! transaction submitter, wired together over channels.
//!
//! [`start`] spawns the dispatcher worker and hands back the pieces a caller
//! needs: the shared store for reads, a cloneable submitter for writes, and
//! the dispatcher for its decision counters. The HTTP layer sits on top of
//! exactly this surface; tests drive it directly.

pub mod dispatcher;
pub mod error;
pub mod instruction;
pub mod store;
pub mod submitter;
pub mod types;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::LedgerConfig;
use dispatcher::Dispatcher;
use store::AccountStore;
use submitter::TransactionSubmitter;

/// A running ledger.
pub struct Ledger {
    pub store: Arc<AccountStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub submitter: TransactionSubmitter,
}

/// Spawn the dispatcher worker and return handles to it.
///
/// Must be called from within a tokio runtime. The worker exits once every
/// submitter clone has been dropped.
pub fn start(config: &LedgerConfig) -> Ledger {
    let store = Arc::new(AccountStore::new());
    let dispatcher = Arc::new(Dispatcher::new(store.clone(), config));
    let (queue, requests) = mpsc::channel(config.queue_depth);

    tokio::spawn(dispatcher::run(
        dispatcher.clone(),
        requests,
        config.max_in_flight,
    ));

    let submitter = TransactionSubmitter::new(queue, config.confirmation_timeout);
    Ledger {
        store,
        dispatcher,
        submitter,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future::join_all;

    use super::*;
    use crate::ledger::error::LedgerError;
    use crate::ledger::instruction::Instruction;
    use crate::ledger::types::{Address, Transaction};

    fn initialize_tx(target: Address) -> Transaction {
        Transaction::new(
            vec![Instruction::Initialize { target }.pack()],
            Address::new_unique(),
        )
    }

    #[tokio::test]
    async fn test_initialize_confirms_and_stores() {
        let ledger = start(&LedgerConfig::default());
        let target = Address::new_unique();

        let signature = ledger.submitter.submit(initialize_tx(target)).await.unwrap();
        assert!(!signature.to_string().is_empty());

        let record = ledger.store.get(&target).unwrap();
        assert!(record.initialized);
        assert!(record.payload.is_empty());
    }

    #[tokio::test]
    async fn test_second_initialize_fails_and_preserves_state() {
        let ledger = start(&LedgerConfig::default());
        let target = Address::new_unique();

        ledger.submitter.submit(initialize_tx(target)).await.unwrap();
        let snapshot = ledger.store.get(&target).unwrap();

        assert_eq!(
            ledger.submitter.submit(initialize_tx(target)).await,
            Err(LedgerError::AlreadyInitialized(target))
        );
        assert_eq!(ledger.store.get(&target).unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_concurrent_distinct_addresses_both_succeed() {
        let ledger = start(&LedgerConfig::default());
        let (a, b) = (Address::new_unique(), Address::new_unique());

        let (first, second) = tokio::join!(
            ledger.submitter.submit(initialize_tx(a)),
            ledger.submitter.submit(initialize_tx(b)),
        );

        first.unwrap();
        second.unwrap();
        assert!(ledger.store.get(&a).unwrap().initialized);
        assert!(ledger.store.get(&b).unwrap().initialized);
    }

    #[tokio::test]
    async fn test_concurrent_same_address_has_single_winner() {
        let ledger = start(&LedgerConfig::default());
        let target = Address::new_unique();

        let submissions = (0..8).map(|_| {
            let submitter = ledger.submitter.clone();
            async move { submitter.submit(initialize_tx(target)).await }
        });
        let outcomes = join_all(submissions).await;

        let wins = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        let losses = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Err(LedgerError::AlreadyInitialized(_))))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(losses, 7);
        assert_eq!(ledger.store.len(), 1);
    }

    #[tokio::test]
    async fn test_replayed_nonce_is_rejected_end_to_end() {
        let ledger = start(&LedgerConfig::default());
        let transaction = initialize_tx(Address::new_unique());

        ledger.submitter.submit(transaction.clone()).await.unwrap();
        assert!(matches!(
            ledger.submitter.submit(transaction).await,
            Err(LedgerError::SubmissionRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_leaves_fate_unknown() {
        let config = LedgerConfig {
            confirmation_timeout: Duration::from_millis(50),
            dispatch_delay: Some(Duration::from_millis(200)),
            ..LedgerConfig::default()
        };
        let ledger = start(&config);
        let target = Address::new_unique();

        let outcome = ledger.submitter.submit(initialize_tx(target)).await;
        assert!(matches!(outcome, Err(LedgerError::Timeout(_))));

        // the abandoned transaction still lands after the client gave up
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(ledger.store.get(&target).unwrap().initialized);
        assert_eq!(ledger.dispatcher.stats().accepted, 1);
    }

    #[tokio::test]
    async fn test_submitter_metrics_track_outcomes() {
        let ledger = start(&LedgerConfig::default());
        let target = Address::new_unique();

        ledger.submitter.submit(initialize_tx(target)).await.unwrap();
        let _ = ledger.submitter.submit(initialize_tx(target)).await;

        let metrics = ledger.submitter.metrics().await;
        assert_eq!(metrics.submitted, 2);
        assert_eq!(metrics.accepted, 1);
        assert_eq!(metrics.rejected, 1);
        assert_eq!(metrics.timed_out, 0);
    }
}

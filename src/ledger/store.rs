//! Account state store: a concurrent map from address to account record.
//!
//! The store is the only shared mutable state in the ledger. Per-address
//! decisions are settled by the map's entry API: `create_if_absent` admits at
//! most one writer per address, which is the compare-and-set the dispatcher
//! relies on for concurrent initializations.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;

use crate::ledger::types::Address;

/// Persistent state held for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Set once, on creation; never cleared.
    pub initialized: bool,
    /// Program-defined payload bytes, opaque to the store.
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("account already exists")]
    AlreadyExists,
}

/// Durable mapping from address to account record, shared across the
/// dispatcher and any readers.
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: DashMap<Address, AccountRecord>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Snapshot of the record at `address`, if one was ever created.
    pub fn get(&self, address: &Address) -> Option<AccountRecord> {
        self.accounts.get(address).map(|record| record.clone())
    }

    /// Atomically create the record at `address`, marked initialized.
    ///
    /// With concurrent callers on the same address exactly one succeeds;
    /// every other caller observes `AlreadyExists` and the stored record is
    /// untouched.
    pub fn create_if_absent(
        &self,
        address: Address,
        payload: Vec<u8>,
    ) -> Result<AccountRecord, StoreError> {
        match self.accounts.entry(address) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            Entry::Vacant(slot) => {
                let record = AccountRecord {
                    initialized: true,
                    payload,
                    created_at: Utc::now(),
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// Remove the record at `address`. Only the dispatcher calls this, to
    /// unwind creations made by a transaction that failed part-way.
    pub(crate) fn remove(&self, address: &Address) -> Option<AccountRecord> {
        self.accounts.remove(address).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_create_then_get() {
        let store = AccountStore::new();
        let address = Address::new_unique();

        let record = store.create_if_absent(address, b"hello".to_vec()).unwrap();
        assert!(record.initialized);
        assert_eq!(store.get(&address).unwrap(), record);
    }

    #[test]
    fn test_get_unknown_address_is_none() {
        let store = AccountStore::new();
        assert!(store.get(&Address::new_unique()).is_none());
    }

    #[test]
    fn test_second_create_fails_and_preserves_record() {
        let store = AccountStore::new();
        let address = Address::new_unique();

        store.create_if_absent(address, b"first".to_vec()).unwrap();
        assert_eq!(
            store.create_if_absent(address, b"second".to_vec()),
            Err(StoreError::AlreadyExists)
        );
        // the losing call must not disturb the stored payload
        assert_eq!(store.get(&address).unwrap().payload, b"first".to_vec());
    }

    #[test]
    fn test_concurrent_create_has_single_winner() {
        let store = Arc::new(AccountStore::new());
        let address = Address::new_unique();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = store.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    store.create_if_absent(address, vec![i]).is_ok()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(store.len(), 1);
    }
}

//! Core value types: addresses, signatures, nonces and the transaction
//! envelope.
//!
//! All identifiers are opaque fixed-length byte strings rendered as base58 in
//! text form, the way Solana tooling renders pubkeys and signatures. API
//! boundaries carry the base58 strings; everything past the parsing boundary
//! works with the typed forms.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;

use crate::ledger::error::LedgerError;
use crate::ledger::instruction::InstructionData;

pub const ADDRESS_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
pub const NONCE_LEN: usize = 32;

/// Opaque 32-byte identifier naming an account record.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// A random address, for payer identities and tests.
    pub fn new_unique() -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| LedgerError::InvalidAccount(s.to_string()))?;
        let bytes: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| LedgerError::InvalidAccount(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// Unique opaque identifier returned for every accepted transaction.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    /// Mint a fresh signature for an accepted transaction.
    pub fn new_unique() -> Self {
        let mut bytes = [0u8; SIGNATURE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

/// Recent-blockhash analogue: a random value that makes a (submitter, nonce)
/// pair unique. The dispatcher rejects a pair it has already seen.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    pub fn new_unique() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl FromStr for Nonce {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| LedgerError::SubmissionRejected(format!("malformed nonce: {s}")))?;
        let bytes: [u8; NONCE_LEN] = bytes
            .try_into()
            .map_err(|_| LedgerError::SubmissionRejected(format!("malformed nonce: {s}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({self})")
    }
}

/// An ordered batch of packed instructions submitted as one unit.
///
/// Transactions are ephemeral: built per call, discarded once confirmed or
/// rejected.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Packed instruction datas, executed in order.
    pub instructions: Vec<InstructionData>,
    /// Identity the submission is attributed to.
    pub submitter: Address,
    /// Uniqueness nonce guarding against replay.
    pub nonce: Nonce,
}

impl Transaction {
    /// Build a transaction with a fresh random nonce.
    pub fn new(instructions: Vec<InstructionData>, submitter: Address) -> Self {
        Self::with_nonce(instructions, submitter, Nonce::new_unique())
    }

    /// Build a transaction with a caller-supplied nonce, as the raw
    /// submission API does.
    pub fn with_nonce(instructions: Vec<InstructionData>, submitter: Address, nonce: Nonce) -> Self {
        Self {
            instructions,
            submitter,
            nonce,
        }
    }
}

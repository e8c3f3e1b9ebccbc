//! Instruction kinds and their wire encoding.
//!
//! An instruction travels as raw bytes: an 8-byte interface discriminator,
//! the first 8 bytes of `sha256("<namespace>:<name>")`, followed by the
//! variant's fixed-layout fields. Clients pack, the dispatcher unpacks and
//! matches on the typed kind. There is no dynamic method lookup: the set of
//! instructions is this enum.

use sha2::{Digest, Sha256};

use crate::ledger::error::LedgerError;
use crate::ledger::types::{ADDRESS_LEN, Address};

/// Namespace prefixed to every instruction name before hashing.
pub const PROGRAM_NAMESPACE: &str = "sandbox";

pub const DISCRIMINATOR_LEN: usize = 8;

/// Packed form of a single instruction as it appears in a transaction.
pub type InstructionData = Vec<u8>;

/// First 8 bytes of `sha256("<namespace>:<name>")`.
fn discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::digest(format!("{PROGRAM_NAMESPACE}:{name}").as_bytes());
    let mut disc = [0u8; DISCRIMINATOR_LEN];
    disc.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    disc
}

/// A single typed operation requested against one or more accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Create the record at `target` and mark it initialized with the
    /// default payload. Fails if the record already exists.
    Initialize { target: Address },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Initialize { .. } => "initialize",
        }
    }

    /// Serialize to the wire form: discriminator, then fields.
    pub fn pack(&self) -> InstructionData {
        match self {
            Instruction::Initialize { target } => {
                let mut data = Vec::with_capacity(DISCRIMINATOR_LEN + ADDRESS_LEN);
                data.extend_from_slice(&discriminator("initialize"));
                data.extend_from_slice(target.as_bytes());
                data
            }
        }
    }

    /// Deserialize from the wire form.
    ///
    /// Unknown discriminators and truncated data are `InvalidInstruction`; a
    /// target field of the wrong length is `InvalidAccount`.
    pub fn unpack(data: &[u8]) -> Result<Self, LedgerError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(LedgerError::InvalidInstruction(
                "data shorter than a discriminator".to_string(),
            ));
        }
        let (disc, fields) = data.split_at(DISCRIMINATOR_LEN);
        if disc == discriminator("initialize") {
            let target: [u8; ADDRESS_LEN] = fields.try_into().map_err(|_| {
                LedgerError::InvalidAccount(format!(
                    "initialize expects a {ADDRESS_LEN}-byte target, got {} bytes",
                    fields.len()
                ))
            })?;
            Ok(Instruction::Initialize {
                target: Address::new(target),
            })
        } else {
            Err(LedgerError::InvalidInstruction(format!(
                "unknown discriminator {}",
                bs58::encode(disc).into_string()
            )))
        }
    }
}

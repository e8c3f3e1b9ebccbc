//! Error taxonomy for the sandbox ledger.
//!
//! Every failure a caller can observe from a submission is one of these
//! variants. The dispatcher produces them and the submitter hands them to the
//! caller verbatim; retry policy, if any, belongs to the caller.

use std::time::Duration;

use thiserror::Error;

use crate::ledger::types::Address;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The supplied account address is malformed.
    #[error("invalid account address: {0}")]
    InvalidAccount(String),

    /// Precondition violation: the target account was already initialized.
    #[error("account {0} is already initialized")]
    AlreadyInitialized(Address),

    /// Instruction data could not be unpacked into a known instruction.
    #[error("invalid instruction data: {0}")]
    InvalidInstruction(String),

    /// Transaction-level rejection, e.g. a replayed nonce or an empty
    /// instruction list.
    #[error("transaction rejected: {0}")]
    SubmissionRejected(String),

    /// No terminal decision was observed within the allowed wait. The
    /// transaction may still land; its fate is unknown to the caller.
    #[error("no confirmation within {0:?}, transaction fate unknown")]
    Timeout(Duration),
}

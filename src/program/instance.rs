//! Typed client handle over the sandbox program's instruction set.

use crate::ledger::error::LedgerError;
use crate::ledger::instruction::Instruction;
use crate::ledger::submitter::TransactionSubmitter;
use crate::ledger::types::{Address, Signature, Transaction};

/// Sandbox program client instance for building and submitting transactions.
///
/// One method per instruction kind, each packing its instruction, wrapping it
/// in a fresh-nonce transaction attributed to the payer, and waiting for
/// confirmation. This is the explicit replacement for a generated,
/// dynamically bound program handle.
pub struct SandboxProgramInstance {
    submitter: TransactionSubmitter,
    payer: Address,
}

impl SandboxProgramInstance {
    pub fn new(submitter: TransactionSubmitter, payer: Address) -> Self {
        Self { submitter, payer }
    }

    pub fn payer(&self) -> Address {
        self.payer
    }

    /// Invoke `initialize` on `target` and wait for the transaction
    /// signature.
    pub async fn initialize(&self, target: Address) -> Result<Signature, LedgerError> {
        let instruction = Instruction::Initialize { target };
        let transaction = Transaction::new(vec![instruction.pack()], self.payer);
        self.submitter.submit(transaction).await
    }
}

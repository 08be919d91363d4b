use mp_common::Paise;
use serde::Serialize;

use crate::db_types::Transaction;

/// The result of settling a captured payment: the fee split and the payee's balance after the credit.
/// `platform_fee + payee_amount == transaction.amount` always holds exactly.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub transaction: Transaction,
    pub platform_fee: Paise,
    pub payee_amount: Paise,
    pub wallet_balance: Paise,
}

/// Outcome of the created → captured compare-and-set.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// This caller won the transition and performed the wallet credit.
    Settled(Settlement),
    /// Another signal captured the order first; the stored breakdown is replayed and nothing was mutated.
    AlreadyCaptured(Settlement),
}

impl CaptureOutcome {
    pub fn settlement(&self) -> &Settlement {
        match self {
            CaptureOutcome::Settled(s) | CaptureOutcome::AlreadyCaptured(s) => s,
        }
    }

    pub fn into_settlement(self) -> Settlement {
        match self {
            CaptureOutcome::Settled(s) | CaptureOutcome::AlreadyCaptured(s) => s,
        }
    }

    pub fn is_first_capture(&self) -> bool {
        matches!(self, CaptureOutcome::Settled(_))
    }
}

/// Outcome of the created → failed compare-and-set.
#[derive(Debug, Clone)]
pub enum FailureOutcome {
    Failed(Transaction),
    /// The failure report arrived after the transaction had already failed; nothing changed.
    AlreadyFailed(Transaction),
    /// The transaction was already captured. Captured always wins; the row is untouched.
    CapturedWins(Transaction),
}

impl FailureOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            FailureOutcome::Failed(t) | FailureOutcome::AlreadyFailed(t) | FailureOutcome::CapturedWins(t) => t,
        }
    }
}

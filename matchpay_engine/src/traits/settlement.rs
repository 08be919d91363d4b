use mp_common::Paise;
use thiserror::Error;

use crate::{
    db_types::{NewPaymentOrder, OrderId, Payout, PayoutStatus, Transaction, TransactionStatus, UserId, Wallet},
    traits::{
        data_objects::{CaptureOutcome, FailureOutcome},
        GatewayError,
    },
};

/// Storage contract for the payment settlement pipeline.
///
/// The central requirement is that every status transition is *conditional*: "set to captured only if currently
/// created", expressed as a single compare-and-set statement. Two racing completion signals (client callback and
/// gateway webhook) may both call [`settle_capture`] in any order, any number of times; exactly one caller wins the
/// transition and performs the wallet credit, all others observe an idempotent no-op. Wallet mutations are likewise
/// single atomic statements — never read-balance-then-write.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts the `created` ledger entry for a freshly created gateway order.
    ///
    /// The external order id carries a uniqueness constraint; re-inserting the same order returns
    /// [`SettlementError::DuplicateOrder`].
    async fn insert_payment_order(
        &self,
        order: &NewPaymentOrder,
        order_id: &OrderId,
    ) -> Result<Transaction, SettlementError>;

    async fn fetch_transaction(&self, id: i64) -> Result<Option<Transaction>, SettlementError>;

    async fn fetch_transaction_by_order_id(&self, order_id: &OrderId) -> Result<Option<Transaction>, SettlementError>;

    /// Drives the idempotent created → captured transition and, for the winner only, settles the funds.
    ///
    /// In one database transaction: compare-and-set the status (stamping the external payment id and the computed
    /// platform fee), credit the payee wallet with a single atomic increment, and insert the `fee` ledger entry
    /// linked back to the settled payment. Losers that find the row already `captured` receive
    /// [`CaptureOutcome::AlreadyCaptured`] with the previously settled breakdown; a row already `failed` is a
    /// [`SettlementError::ReconciliationConflict`].
    async fn settle_capture(
        &self,
        order_id: &OrderId,
        payment_id: &str,
        fee_bps: i64,
    ) -> Result<CaptureOutcome, SettlementError>;

    /// Compare-and-set created → failed. A row already `captured` is never downgraded; the outcome reports which
    /// terminal state was found so callers can log the reconciliation conflict.
    async fn mark_payment_failed(&self, order_id: &OrderId) -> Result<FailureOutcome, SettlementError>;

    /// Fetches the wallet for this user, creating a zero-balance one on first touch.
    async fn fetch_or_create_wallet(&self, user: &UserId) -> Result<Wallet, SettlementError>;

    /// Atomically increments the wallet balance. Used for settlement credits and payout reversals.
    async fn credit_wallet(&self, user: &UserId, amount: Paise) -> Result<Wallet, SettlementError>;

    /// Atomic conditional debit: `balance = balance - amount` only where `balance >= amount`, as one statement.
    /// Zero affected rows means insufficient funds and leaves the wallet untouched.
    async fn debit_wallet(&self, user: &UserId, amount: Paise) -> Result<Wallet, SettlementError>;

    /// Inserts a `created` payout record.
    async fn insert_payout(&self, user: &UserId, amount: Paise) -> Result<Payout, SettlementError>;

    /// Marks the payout `processed`, stamps the gateway payout id, and appends the `payout` ledger entry, atomically.
    async fn finalize_payout(&self, payout_id: i64, rail_payout_id: &str) -> Result<Payout, SettlementError>;

    /// Marks the payout `failed` and reverses the reserved debit with an atomic credit, atomically.
    async fn fail_payout(&self, payout_id: i64) -> Result<Payout, SettlementError>;

    /// Recent ledger entries involving this user (as payer or payee), newest first.
    async fn ledger_for_user(&self, user: &UserId, limit: i64) -> Result<Vec<Transaction>, SettlementError>;
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("No transaction exists for order {0}")]
    OrderNotFound(OrderId),
    #[error("No transaction exists with id {0}")]
    TransactionNotFound(i64),
    #[error("A transaction already exists for order {0}")]
    DuplicateOrder(OrderId),
    #[error("The payment signature is invalid")]
    InvalidSignature,
    #[error("Order {order_id} is already {status}; the conflicting report was ignored")]
    ReconciliationConflict { order_id: OrderId, status: TransactionStatus },
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Paise, available: Paise },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("No payout exists with id {0}")]
    PayoutNotFound(i64),
    #[error("Payout {0} is not in the expected state: {1}")]
    IllegalPayoutTransition(i64, PayoutStatus),
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}

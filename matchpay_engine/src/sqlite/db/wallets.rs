use log::trace;
use mp_common::Paise;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Transaction, UserId, Wallet, WalletLedgerEntry},
    traits::SettlementError,
};

pub async fn fetch_wallet(user: &UserId, conn: &mut SqliteConnection) -> Result<Option<Wallet>, SettlementError> {
    let wallet = sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(wallet)
}

/// Fetches the user's wallet, creating a zero-balance one if this is the first time we've seen them. The insert
/// is a no-op when the wallet already exists, so concurrent callers converge on the same row.
pub async fn fetch_or_create_wallet(
    user: &UserId,
    currency: &str,
    conn: &mut SqliteConnection,
) -> Result<Wallet, SettlementError> {
    sqlx::query("INSERT INTO wallets (user_id, currency) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
        .bind(user.as_str())
        .bind(currency)
        .execute(&mut *conn)
        .await?;
    let wallet = sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user.as_str())
        .fetch_one(conn)
        .await?;
    Ok(wallet)
}

/// Increments the wallet balance in a single statement. The upsert form means a payee who has never been paid
/// before gets a wallet and their first credit atomically.
pub async fn credit(
    user: &UserId,
    amount: Paise,
    currency: &str,
    conn: &mut SqliteConnection,
) -> Result<Wallet, SettlementError> {
    let wallet: Wallet = sqlx::query_as(
        r#"
            INSERT INTO wallets (user_id, balance, currency)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET balance = balance + excluded.balance, updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(user.as_str())
    .bind(amount)
    .bind(currency)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Credited {amount} to wallet of {user}. New balance: {}", wallet.balance);
    Ok(wallet)
}

/// Appends the wallet → transaction linkage for a settled mutation. `wallet` must be the row as the mutation
/// left it, so `balance_after` records the running balance.
pub async fn link_ledger_entry(
    wallet: &Wallet,
    transaction: &Transaction,
    amount: Paise,
    conn: &mut SqliteConnection,
) -> Result<WalletLedgerEntry, SettlementError> {
    let entry = sqlx::query_as(
        r#"
            INSERT INTO wallet_ledger (wallet_id, transaction_id, amount, balance_after)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(wallet.id)
    .bind(transaction.id)
    .bind(amount)
    .bind(wallet.balance)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

/// Debits the wallet only if the balance covers the amount, in one conditional statement. `None` means the funds
/// were not there (or the wallet does not exist) and nothing was written.
pub async fn debit_if_sufficient(
    user: &UserId,
    amount: Paise,
    conn: &mut SqliteConnection,
) -> Result<Option<Wallet>, SettlementError> {
    let wallet = sqlx::query_as(
        r#"
            UPDATE wallets
            SET balance = balance - $2, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $1 AND balance >= $2
            RETURNING *;
        "#,
    )
    .bind(user.as_str())
    .bind(amount)
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Debit of {amount} for {user}: applied={}", wallet.is_some());
    Ok(wallet)
}

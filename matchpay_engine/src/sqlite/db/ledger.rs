use log::{debug, trace};
use mp_common::Paise;
use serde_json::json;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewPaymentOrder, OrderId, Payout, Transaction, UserId},
    traits::SettlementError,
};

/// Inserts the `created` ledger entry for a new gateway order. The unique constraint on `order_id` turns a repeat
/// insert into a typed [`SettlementError::DuplicateOrder`].
pub async fn insert_payment_order(
    order: &NewPaymentOrder,
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Transaction, SettlementError> {
    let transaction: Transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (tx_type, user_id, related_user_id, order_id, amount, currency, meta)
            VALUES ('payment', $1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order.payer_id.as_str())
    .bind(order.payee_id.as_str())
    .bind(order_id.as_str())
    .bind(order.amount)
    .bind(order.currency.as_str())
    .bind(order.meta.clone().map(Json))
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => SettlementError::DuplicateOrder(order_id.clone()),
        _ => SettlementError::from(e),
    })?;
    debug!("📝️ Ledger entry {} recorded for order {order_id}", transaction.id);
    Ok(transaction)
}

pub async fn fetch_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Transaction>, SettlementError> {
    let transaction =
        sqlx::query_as("SELECT * FROM transactions WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(transaction)
}

pub async fn fetch_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, SettlementError> {
    let transaction = sqlx::query_as("SELECT * FROM transactions WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(transaction)
}

/// The created → captured compare-and-set. Returns the updated row only when this call won the transition; a
/// `None` means the row was no longer in `created` (or does not exist) and nothing was written.
///
/// The fee is computed inside the statement (integer division floors it), which keeps this the *first* statement
/// of the settlement transaction. Write-first transactions queue on the sqlite write lock instead of failing with
/// a stale snapshot when two capture signals race.
pub async fn capture_if_created(
    order_id: &OrderId,
    payment_id: &str,
    fee_bps: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, SettlementError> {
    let transaction = sqlx::query_as(
        r#"
            UPDATE transactions
            SET status = 'captured', payment_id = $2, platform_fee = amount * $3 / 10000,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND status = 'created'
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(payment_id)
    .bind(fee_bps)
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Capture CAS for order {order_id}: won={}", transaction.is_some());
    Ok(transaction)
}

/// The created → failed compare-and-set. `None` means the row had already reached a terminal state (or does not
/// exist); a captured row is never downgraded here.
pub async fn fail_if_created(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, SettlementError> {
    let transaction = sqlx::query_as(
        r#"
            UPDATE transactions
            SET status = 'failed', updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND status = 'created'
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(transaction)
}

/// Appends the platform's `fee` entry for a settled payment. Fee entries belong to the platform, so `user_id` is
/// NULL; meta points back at the settled transaction for reporting.
pub async fn insert_fee_entry(
    original: &Transaction,
    fee: Paise,
    conn: &mut SqliteConnection,
) -> Result<Transaction, SettlementError> {
    let meta = json!({ "original_tx": original.id });
    let transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (tx_type, related_user_id, amount, currency, status, meta)
            VALUES ('fee', $1, $2, $3, 'captured', $4)
            RETURNING *;
        "#,
    )
    .bind(original.related_user_id.as_ref().map(|u| u.as_str().to_string()))
    .bind(fee)
    .bind(original.currency.as_str())
    .bind(Json(meta))
    .fetch_one(conn)
    .await?;
    Ok(transaction)
}

/// Appends the `payout` ledger entry for a processed withdrawal.
pub async fn insert_payout_entry(payout: &Payout, conn: &mut SqliteConnection) -> Result<Transaction, SettlementError> {
    let meta = json!({ "payout_id": payout.id });
    let transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (tx_type, user_id, amount, currency, status, payment_id, meta)
            VALUES ('payout', $1, $2, $3, 'paid_out', $4, $5)
            RETURNING *;
        "#,
    )
    .bind(payout.user_id.as_str())
    .bind(payout.amount)
    .bind(payout.currency.as_str())
    .bind(payout.payrail_payout_id.clone())
    .bind(Json(meta))
    .fetch_one(conn)
    .await?;
    Ok(transaction)
}

pub async fn ledger_for_user(
    user: &UserId,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, SettlementError> {
    let transactions = sqlx::query_as(
        "SELECT * FROM transactions WHERE user_id = $1 OR related_user_id = $1 ORDER BY id DESC LIMIT $2",
    )
    .bind(user.as_str())
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(transactions)
}

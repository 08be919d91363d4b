use log::debug;
use mp_common::Paise;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Payout, UserId},
    traits::SettlementError,
};

pub async fn insert_payout(
    user: &UserId,
    amount: Paise,
    currency: &str,
    conn: &mut SqliteConnection,
) -> Result<Payout, SettlementError> {
    let payout: Payout = sqlx::query_as(
        r#"
            INSERT INTO payouts (user_id, amount, currency)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(user.as_str())
    .bind(amount)
    .bind(currency)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Payout {} of {amount} requested by {user}", payout.id);
    Ok(payout)
}

pub async fn fetch_payout(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payout>, SettlementError> {
    let payout = sqlx::query_as("SELECT * FROM payouts WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(payout)
}

/// The created → processed compare-and-set, stamping the rail's payout id. `None` means the payout was not in
/// `created` and nothing was written.
pub async fn mark_processed(
    id: i64,
    rail_payout_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payout>, SettlementError> {
    let payout = sqlx::query_as(
        r#"
            UPDATE payouts
            SET status = 'processed', payrail_payout_id = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'created'
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(rail_payout_id)
    .fetch_optional(conn)
    .await?;
    Ok(payout)
}

/// The created → failed compare-and-set, for when the rail rejects the transfer.
pub async fn mark_failed(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payout>, SettlementError> {
    let payout = sqlx::query_as(
        r#"
            UPDATE payouts
            SET status = 'failed', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'created'
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(payout)
}

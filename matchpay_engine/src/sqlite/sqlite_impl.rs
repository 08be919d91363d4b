//! `SqliteDatabase` is a concrete implementation of a Matchpay engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use log::*;
use mp_common::{Paise, INR_CURRENCY_CODE};
use sqlx::SqlitePool;

use super::db::{db_url, ledger, matches, messages, new_pool, notifications, payouts, swipes, users, wallets};
use crate::{
    db_types::{
        ExploreCandidate,
        MatchRecord,
        Message,
        NewMessage,
        NewNotification,
        NewPaymentOrder,
        NewSwipe,
        Notification,
        OrderId,
        Payout,
        SwipeAction,
        SwipeOutcome,
        SwipeRecord,
        Transaction,
        TransactionStatus,
        UndoOutcome,
        UserId,
        UserProfile,
        Wallet,
    },
    helpers::new_chat_room_id,
    traits::{
        CaptureOutcome,
        ChatApiError,
        ExploreApiError,
        ExploreManagement,
        FailureOutcome,
        MatchmakingDatabase,
        MatchmakingError,
        MessageManagement,
        NotificationApiError,
        NotificationManagement,
        Settlement,
        SettlementDatabase,
        SettlementError,
    },
};

/// Notification fetches return at most this many rows.
const NOTIFICATION_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MatchmakingDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Records the swipe and resolves the match state machine in one transaction.
    ///
    /// The swipe upsert and the reciprocal lookup run under the same write lock, so two users completing the
    /// same pair serialize; the unique index on the canonical pair is the final arbiter and the loser re-reads
    /// the winner's row instead of surfacing a conflict.
    async fn upsert_swipe(&self, swipe: NewSwipe) -> Result<SwipeOutcome, MatchmakingError> {
        if swipe.swiper_id == swipe.swiped_id {
            return Err(MatchmakingError::SelfSwipe);
        }
        let mut tx = self.pool.begin().await?;
        let record = swipes::upsert(swipe, &mut tx).await?;
        debug!("🗃️ Swipe saved: {} {} on {}", record.swiper_id, record.action, record.swiped_id);
        let outcome = match record.action {
            SwipeAction::Left => SwipeOutcome::Recorded(record),
            SwipeAction::Right => {
                match swipes::fetch_reciprocal_right(&record.swiper_id, &record.swiped_id, &mut tx).await? {
                    None => SwipeOutcome::Recorded(record),
                    Some(_) => {
                        let room = new_chat_room_id();
                        match matches::try_insert_match(&record.swiper_id, &record.swiped_id, &room, &mut tx).await? {
                            Some(match_record) => {
                                debug!("💘️ It's a match: {} and {}", match_record.user_a, match_record.user_b);
                                SwipeOutcome::NewMatch { swipe: record, match_record }
                            },
                            None => {
                                let match_record =
                                    matches::fetch_match_for_pair(&record.swiper_id, &record.swiped_id, &mut tx)
                                        .await?
                                        .ok_or_else(|| {
                                            MatchmakingError::DatabaseError(format!(
                                                "Match insert for ({}, {}) hit the uniqueness guard but no row was \
                                                 found on re-read",
                                                record.swiper_id, record.swiped_id
                                            ))
                                        })?;
                                SwipeOutcome::AlreadyMatched { swipe: record, match_record }
                            },
                        }
                    },
                }
            },
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn last_swipe(&self, swiper: &UserId) -> Result<Option<SwipeRecord>, MatchmakingError> {
        let mut conn = self.pool.acquire().await?;
        swipes::last_swipe_for(swiper, &mut conn).await
    }

    /// Deletes the user's most recent swipe and, when that swipe was a right with a still-standing reciprocal
    /// right, dissolves the pair's match in the same transaction.
    async fn undo_last_swipe(&self, swiper: &UserId) -> Result<UndoOutcome, MatchmakingError> {
        let mut tx = self.pool.begin().await?;
        let last = swipes::last_swipe_for(swiper, &mut tx)
            .await?
            .ok_or_else(|| MatchmakingError::NothingToUndo(swiper.clone()))?;
        let mut deleted_match = None;
        if last.action == SwipeAction::Right &&
            swipes::fetch_reciprocal_right(&last.swiper_id, &last.swiped_id, &mut tx).await?.is_some()
        {
            deleted_match = matches::delete_match_for_pair(&last.swiper_id, &last.swiped_id, &mut tx).await?;
            if let Some(m) = &deleted_match {
                debug!("💘️ Match between {} and {} dissolved by undo", m.user_a, m.user_b);
            }
        }
        swipes::delete_swipe(last.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Undid swipe: {} {} on {}", last.swiper_id, last.action, last.swiped_id);
        Ok(UndoOutcome { undone: last, deleted_match })
    }

    async fn swipes_by(&self, swiper: &UserId) -> Result<Vec<SwipeRecord>, MatchmakingError> {
        let mut conn = self.pool.acquire().await?;
        swipes::swipes_by(swiper, &mut conn).await
    }

    async fn swiped_ids_of(&self, swiper: &UserId) -> Result<Vec<UserId>, MatchmakingError> {
        let mut conn = self.pool.acquire().await?;
        swipes::swiped_ids(swiper, &mut conn).await
    }

    async fn match_for_pair(&self, x: &UserId, y: &UserId) -> Result<Option<MatchRecord>, MatchmakingError> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_match_for_pair(x, y, &mut conn).await
    }

    async fn matches_for_user(&self, user: &UserId) -> Result<Vec<MatchRecord>, MatchmakingError> {
        let mut conn = self.pool.acquire().await?;
        matches::matches_for_user(user, &mut conn).await
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_payment_order(
        &self,
        order: &NewPaymentOrder,
        order_id: &OrderId,
    ) -> Result<Transaction, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        ledger::insert_payment_order(order, order_id, &mut conn).await
    }

    async fn fetch_transaction(&self, id: i64) -> Result<Option<Transaction>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_by_id(id, &mut conn).await
    }

    async fn fetch_transaction_by_order_id(&self, order_id: &OrderId) -> Result<Option<Transaction>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_by_order_id(order_id, &mut conn).await
    }

    /// Runs the created → captured transition. In a single transaction:
    /// * the status compare-and-set stamps the payment id and the platform fee;
    /// * the winner credits the payee's wallet with one atomic increment and appends the `fee` ledger entry;
    /// * a loser replays the stored breakdown without touching anything.
    ///
    /// The completion callback and the gateway webhook can both land here, in any order, any number of times.
    /// Exactly one caller takes the winner branch.
    async fn settle_capture(
        &self,
        order_id: &OrderId,
        payment_id: &str,
        fee_bps: i64,
    ) -> Result<CaptureOutcome, SettlementError> {
        // The CAS is the first statement of the transaction, so racing signals queue on the write lock and the
        // loser lands in the replay branch instead of aborting on a stale snapshot.
        let mut tx = self.pool.begin().await?;
        match ledger::capture_if_created(order_id, payment_id, fee_bps, &mut tx).await? {
            Some(captured) => {
                let fee = captured.platform_fee;
                let payee_amount = captured.amount - fee;
                let payee = captured
                    .related_user_id
                    .clone()
                    .ok_or_else(|| SettlementError::DatabaseError(format!("Payment {order_id} has no payee")))?;
                let wallet = wallets::credit(&payee, payee_amount, &captured.currency, &mut tx).await?;
                wallets::link_ledger_entry(&wallet, &captured, payee_amount, &mut tx).await?;
                ledger::insert_fee_entry(&captured, fee, &mut tx).await?;
                tx.commit().await?;
                info!("💰️ Order {order_id} captured. {payee} credited with {payee_amount} (fee {fee})");
                Ok(CaptureOutcome::Settled(Settlement {
                    transaction: captured,
                    platform_fee: fee,
                    payee_amount,
                    wallet_balance: wallet.balance,
                }))
            },
            None => {
                let existing = ledger::fetch_by_order_id(order_id, &mut tx)
                    .await?
                    .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))?;
                match existing.status {
                    TransactionStatus::Captured => {
                        let payee = existing
                            .related_user_id
                            .clone()
                            .ok_or_else(|| SettlementError::DatabaseError(format!("Payment {order_id} has no payee")))?;
                        let wallet = wallets::fetch_or_create_wallet(&payee, &existing.currency, &mut tx).await?;
                        tx.commit().await?;
                        debug!("💰️ Order {order_id} was already captured. Replaying the stored settlement.");
                        let fee = existing.platform_fee;
                        let payee_amount = existing.amount - fee;
                        Ok(CaptureOutcome::AlreadyCaptured(Settlement {
                            platform_fee: fee,
                            payee_amount,
                            wallet_balance: wallet.balance,
                            transaction: existing,
                        }))
                    },
                    status => {
                        tx.rollback().await?;
                        warn!("💰️ Capture signal for order {order_id} ignored: transaction is already {status}");
                        Err(SettlementError::ReconciliationConflict { order_id: order_id.clone(), status })
                    },
                }
            },
        }
    }

    async fn mark_payment_failed(&self, order_id: &OrderId) -> Result<FailureOutcome, SettlementError> {
        let mut tx = self.pool.begin().await?;
        match ledger::fail_if_created(order_id, &mut tx).await? {
            Some(failed) => {
                tx.commit().await?;
                info!("💰️ Order {order_id} marked as failed");
                Ok(FailureOutcome::Failed(failed))
            },
            None => {
                let existing = ledger::fetch_by_order_id(order_id, &mut tx)
                    .await?
                    .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))?;
                tx.rollback().await?;
                match existing.status {
                    TransactionStatus::Failed => Ok(FailureOutcome::AlreadyFailed(existing)),
                    TransactionStatus::Captured => {
                        warn!("💰️ Failure report for order {order_id} ignored: the capture stands");
                        Ok(FailureOutcome::CapturedWins(existing))
                    },
                    status => Err(SettlementError::ReconciliationConflict { order_id: order_id.clone(), status }),
                }
            },
        }
    }

    async fn fetch_or_create_wallet(&self, user: &UserId) -> Result<Wallet, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        wallets::fetch_or_create_wallet(user, INR_CURRENCY_CODE, &mut conn).await
    }

    async fn credit_wallet(&self, user: &UserId, amount: Paise) -> Result<Wallet, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        wallets::credit(user, amount, INR_CURRENCY_CODE, &mut conn).await
    }

    async fn debit_wallet(&self, user: &UserId, amount: Paise) -> Result<Wallet, SettlementError> {
        let mut tx = self.pool.begin().await?;
        match wallets::debit_if_sufficient(user, amount, &mut tx).await? {
            Some(wallet) => {
                tx.commit().await?;
                Ok(wallet)
            },
            None => {
                let available = wallets::fetch_wallet(user, &mut tx).await?.map(|w| w.balance).unwrap_or_default();
                tx.rollback().await?;
                debug!("💰️ Debit of {amount} refused for {user}: only {available} available");
                Err(SettlementError::InsufficientFunds { requested: amount, available })
            },
        }
    }

    async fn insert_payout(&self, user: &UserId, amount: Paise) -> Result<Payout, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payouts::insert_payout(user, amount, INR_CURRENCY_CODE, &mut conn).await
    }

    async fn finalize_payout(&self, payout_id: i64, rail_payout_id: &str) -> Result<Payout, SettlementError> {
        let mut tx = self.pool.begin().await?;
        match payouts::mark_processed(payout_id, rail_payout_id, &mut tx).await? {
            Some(payout) => {
                let entry = ledger::insert_payout_entry(&payout, &mut tx).await?;
                // The debit itself happened when the payout was requested; the linkage lands once the rail
                // confirms, so a reversed payout never appears in the wallet ledger at all.
                let wallet = wallets::fetch_or_create_wallet(&payout.user_id, &payout.currency, &mut tx).await?;
                wallets::link_ledger_entry(&wallet, &entry, -payout.amount, &mut tx).await?;
                tx.commit().await?;
                info!("💰️ Payout {payout_id} processed by the rail as {rail_payout_id}");
                Ok(payout)
            },
            None => {
                let existing = payouts::fetch_payout(payout_id, &mut tx)
                    .await?
                    .ok_or(SettlementError::PayoutNotFound(payout_id))?;
                tx.rollback().await?;
                Err(SettlementError::IllegalPayoutTransition(payout_id, existing.status))
            },
        }
    }

    async fn fail_payout(&self, payout_id: i64) -> Result<Payout, SettlementError> {
        let mut tx = self.pool.begin().await?;
        match payouts::mark_failed(payout_id, &mut tx).await? {
            Some(payout) => {
                // The reserved debit comes back in the same transaction
                wallets::credit(&payout.user_id, payout.amount, &payout.currency, &mut tx).await?;
                tx.commit().await?;
                info!("💰️ Payout {payout_id} failed. {} returned to {}", payout.amount, payout.user_id);
                Ok(payout)
            },
            None => {
                let existing = payouts::fetch_payout(payout_id, &mut tx)
                    .await?
                    .ok_or(SettlementError::PayoutNotFound(payout_id))?;
                tx.rollback().await?;
                Err(SettlementError::IllegalPayoutTransition(payout_id, existing.status))
            },
        }
    }

    async fn ledger_for_user(&self, user: &UserId, limit: i64) -> Result<Vec<Transaction>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        ledger::ledger_for_user(user, limit, &mut conn).await
    }
}

impl MessageManagement for SqliteDatabase {
    async fn save_message(&self, message: NewMessage) -> Result<Message, ChatApiError> {
        let mut conn = self.pool.acquire().await?;
        messages::insert_message(&message, &mut conn).await
    }

    async fn chat_history(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, ChatApiError> {
        let mut conn = self.pool.acquire().await?;
        messages::chat_history(a, b, &mut conn).await
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        notifications::insert_notification(&notification, &mut conn).await
    }

    async fn notifications_for(&self, user: &UserId) -> Result<Vec<Notification>, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        notifications::notifications_for(user, NOTIFICATION_PAGE_SIZE, &mut conn).await
    }

    async fn mark_as_read(&self, id: i64) -> Result<Notification, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_as_read(id, &mut conn).await?.ok_or(NotificationApiError::NotFound(id))
    }

    async fn clear_notifications(&self, user: &UserId) -> Result<u64, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        notifications::clear_notifications(user, &mut conn).await
    }
}

impl ExploreManagement for SqliteDatabase {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), ExploreApiError> {
        let mut conn = self.pool.acquire().await?;
        users::upsert_profile(profile, &mut conn).await?;
        Ok(())
    }

    async fn fetch_profile(&self, id: &UserId) -> Result<Option<UserProfile>, ExploreApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_profile(id, &mut conn).await
    }

    async fn candidates_for(&self, user: &UserId, limit: i64) -> Result<Vec<ExploreCandidate>, ExploreApiError> {
        let mut conn = self.pool.acquire().await?;
        users::candidates_for(user, limit.max(0) as usize, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

use thiserror::Error;

use crate::db_types::{MatchRecord, NewSwipe, SwipeOutcome, SwipeRecord, UndoOutcome, UserId};

/// Storage contract for the swipe → match state machine.
///
/// Implementations must guarantee, at the store level:
/// * at most one swipe row per ordered (swiper, swiped) pair, with upsert semantics;
/// * at most one match row per canonical (unordered) user pair, enforced by a uniqueness constraint — two concurrent
///   right-swipes completing the same pair must yield exactly one match, with the loser observing "already matched";
/// * the undo flow removes the swipe and any match it completed in one atomic operation.
#[allow(async_fn_in_trait)]
pub trait MatchmakingDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Records a swipe decision and evaluates the match state machine in a single atomic transaction.
    ///
    /// The swipe is upserted by (swiper, swiped); a repeat swipe replaces the previous action and refreshes the
    /// decision timestamp. On a right-swipe the reciprocal right is looked up and, if present, a match is created
    /// under the canonical-pair uniqueness guard. A duplicate-key race is resolved by re-reading and returning the
    /// existing match, never surfaced as an error.
    async fn upsert_swipe(&self, swipe: NewSwipe) -> Result<SwipeOutcome, MatchmakingError>;

    /// The most recent swipe *decision* by this user (re-swiping an old pair makes it the most recent), or `None`
    /// when the user has never swiped.
    async fn last_swipe(&self, swiper: &UserId) -> Result<Option<SwipeRecord>, MatchmakingError>;

    /// Rolls back exactly one step: deletes the user's most recent swipe, and when that swipe is a right with a
    /// still-standing reciprocal right, dissolves the match for the pair in the same transaction.
    async fn undo_last_swipe(&self, swiper: &UserId) -> Result<UndoOutcome, MatchmakingError>;

    /// All swipes made by this user, most recent decision first.
    async fn swipes_by(&self, swiper: &UserId) -> Result<Vec<SwipeRecord>, MatchmakingError>;

    /// The ids this user has already swiped on, used as the explore exclusion set.
    async fn swiped_ids_of(&self, swiper: &UserId) -> Result<Vec<UserId>, MatchmakingError>;

    /// The match for the unordered pair {x, y}, if any.
    async fn match_for_pair(&self, x: &UserId, y: &UserId) -> Result<Option<MatchRecord>, MatchmakingError>;

    /// All matches this user participates in, newest first.
    async fn matches_for_user(&self, user: &UserId) -> Result<Vec<MatchRecord>, MatchmakingError>;
}

#[derive(Debug, Clone, Error)]
pub enum MatchmakingError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Users cannot swipe on themselves")]
    SelfSwipe,
    #[error("No swipe found to undo for user {0}")]
    NothingToUndo(UserId),
}

impl From<sqlx::Error> for MatchmakingError {
    fn from(e: sqlx::Error) -> Self {
        MatchmakingError::DatabaseError(e.to_string())
    }
}

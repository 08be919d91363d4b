use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{MatchRecord, UserId},
    traits::MatchmakingError,
};

/// Inserts the match for the canonical pair. The unique index on (user_a, user_b) is the arbiter under
/// concurrent double-completion: the loser gets `Ok(None)` and must re-read the winner's row.
pub async fn try_insert_match(
    x: &UserId,
    y: &UserId,
    chat_room_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<MatchRecord>, MatchmakingError> {
    let (a, b) = MatchRecord::canonical_pair(x, y);
    let result = sqlx::query_as(
        r#"
            INSERT INTO matches (user_a, user_b, chat_room_id) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(a.as_str())
    .bind(b.as_str())
    .bind(chat_room_id)
    .fetch_one(conn)
    .await;
    match result {
        Ok(record) => {
            debug!("📝️ Match created for pair ({a}, {b})");
            Ok(Some(record))
        },
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_match_for_pair(
    x: &UserId,
    y: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<MatchRecord>, MatchmakingError> {
    let (a, b) = MatchRecord::canonical_pair(x, y);
    let record = sqlx::query_as("SELECT * FROM matches WHERE user_a = $1 AND user_b = $2")
        .bind(a.as_str())
        .bind(b.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

/// Deletes the match for the unordered pair, returning the dissolved record if one existed.
pub async fn delete_match_for_pair(
    x: &UserId,
    y: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<MatchRecord>, MatchmakingError> {
    let (a, b) = MatchRecord::canonical_pair(x, y);
    let record = sqlx::query_as("DELETE FROM matches WHERE user_a = $1 AND user_b = $2 RETURNING *")
        .bind(a.as_str())
        .bind(b.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

pub async fn matches_for_user(
    user: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<MatchRecord>, MatchmakingError> {
    let records =
        sqlx::query_as("SELECT * FROM matches WHERE user_a = $1 OR user_b = $1 ORDER BY matched_at DESC, id DESC")
            .bind(user.as_str())
            .fetch_all(conn)
            .await?;
    Ok(records)
}

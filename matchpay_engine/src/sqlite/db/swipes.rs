use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewSwipe, SwipeRecord, UserId},
    traits::MatchmakingError,
};

/// Upserts the swipe decision for the ordered (swiper, swiped) pair. A repeat swipe replaces the action and
/// refreshes `updated_at`, which is the ordering the undo flow relies on.
pub async fn upsert(swipe: NewSwipe, conn: &mut SqliteConnection) -> Result<SwipeRecord, MatchmakingError> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO swipes (swiper_id, swiped_id, action, match_score)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (swiper_id, swiped_id)
            DO UPDATE SET action = excluded.action, match_score = excluded.match_score,
                          updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(swipe.swiper_id)
    .bind(swipe.swiped_id)
    .bind(swipe.action)
    .bind(swipe.match_score)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_swipe(
    swiper: &UserId,
    swiped: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<SwipeRecord>, MatchmakingError> {
    let record = sqlx::query_as("SELECT * FROM swipes WHERE swiper_id = $1 AND swiped_id = $2")
        .bind(swiper.as_str())
        .bind(swiped.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

/// The standing right-swipe in the opposite direction, if any. This is the lookup that decides whether a
/// right-swipe completes a match.
pub async fn fetch_reciprocal_right(
    swiper: &UserId,
    swiped: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<SwipeRecord>, MatchmakingError> {
    let record =
        sqlx::query_as("SELECT * FROM swipes WHERE swiper_id = $1 AND swiped_id = $2 AND action = 'right'")
            .bind(swiped.as_str())
            .bind(swiper.as_str())
            .fetch_optional(conn)
            .await?;
    Ok(record)
}

/// The most recent swipe decision by this user. Ordered by decision time, so re-swiping an old pair makes that
/// pair the undo target.
pub async fn last_swipe_for(
    swiper: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<SwipeRecord>, MatchmakingError> {
    let record =
        sqlx::query_as("SELECT * FROM swipes WHERE swiper_id = $1 ORDER BY updated_at DESC, id DESC LIMIT 1")
            .bind(swiper.as_str())
            .fetch_optional(conn)
            .await?;
    Ok(record)
}

pub async fn delete_swipe(id: i64, conn: &mut SqliteConnection) -> Result<(), MatchmakingError> {
    let result = sqlx::query("DELETE FROM swipes WHERE id = $1").bind(id).execute(conn).await?;
    trace!("🗃️ Deleted {} swipe row(s) for id {id}", result.rows_affected());
    Ok(())
}

pub async fn swipes_by(swiper: &UserId, conn: &mut SqliteConnection) -> Result<Vec<SwipeRecord>, MatchmakingError> {
    let records = sqlx::query_as("SELECT * FROM swipes WHERE swiper_id = $1 ORDER BY updated_at DESC, id DESC")
        .bind(swiper.as_str())
        .fetch_all(conn)
        .await?;
    Ok(records)
}

pub async fn swiped_ids(swiper: &UserId, conn: &mut SqliteConnection) -> Result<Vec<UserId>, MatchmakingError> {
    let ids: Vec<String> = sqlx::query_scalar("SELECT swiped_id FROM swipes WHERE swiper_id = $1")
        .bind(swiper.as_str())
        .fetch_all(conn)
        .await?;
    Ok(ids.into_iter().map(UserId::from).collect())
}

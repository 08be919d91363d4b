use log::trace;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewNotification, Notification, UserId},
    traits::NotificationApiError,
};

pub async fn insert_notification(
    new: &NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, NotificationApiError> {
    let notification = sqlx::query_as(
        r#"
            INSERT INTO notifications (user_id, sender_id, kind, body, meta)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(new.user_id.as_str())
    .bind(new.sender_id.as_ref().map(|u| u.as_str().to_string()))
    .bind(new.kind)
    .bind(new.body.clone())
    .bind(new.meta.clone().map(Json))
    .fetch_one(conn)
    .await?;
    Ok(notification)
}

pub async fn notifications_for(
    user: &UserId,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, NotificationApiError> {
    let notifications =
        sqlx::query_as("SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2")
            .bind(user.as_str())
            .bind(limit)
            .fetch_all(conn)
            .await?;
    Ok(notifications)
}

pub async fn mark_as_read(id: i64, conn: &mut SqliteConnection) -> Result<Option<Notification>, NotificationApiError> {
    let notification = sqlx::query_as(
        "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(notification)
}

/// Deletes every notification for the user, returning how many rows went away.
pub async fn clear_notifications(user: &UserId, conn: &mut SqliteConnection) -> Result<u64, NotificationApiError> {
    let res = sqlx::query("DELETE FROM notifications WHERE user_id = $1").bind(user.as_str()).execute(conn).await?;
    trace!("🗃️ Cleared {} notifications for {user}", res.rows_affected());
    Ok(res.rows_affected())
}

use sqlx::SqliteConnection;

use crate::{
    db_types::{Message, NewMessage, UserId},
    traits::ChatApiError,
};

pub async fn insert_message(msg: &NewMessage, conn: &mut SqliteConnection) -> Result<Message, ChatApiError> {
    let message = sqlx::query_as(
        r#"
            INSERT INTO messages (match_id, sender_id, receiver_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(msg.match_id)
    .bind(msg.sender_id.as_str())
    .bind(msg.receiver_id.as_str())
    .bind(msg.body.as_str())
    .fetch_one(conn)
    .await?;
    Ok(message)
}

/// Full history between two users, both directions, oldest first.
pub async fn chat_history(a: &UserId, b: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Message>, ChatApiError> {
    let messages = sqlx::query_as(
        r#"
            SELECT * FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC, id ASC;
        "#,
    )
    .bind(a.as_str())
    .bind(b.as_str())
    .fetch_all(conn)
    .await?;
    Ok(messages)
}

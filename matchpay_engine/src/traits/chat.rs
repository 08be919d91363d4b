use thiserror::Error;

use crate::db_types::{Message, NewMessage, UserId};

/// Storage contract for chat messages. Messages are append-only; there is no edit or delete surface.
#[allow(async_fn_in_trait)]
pub trait MessageManagement: Clone {
    async fn save_message(&self, message: NewMessage) -> Result<Message, ChatApiError>;

    /// Every message between the two users, in both directions, oldest first.
    async fn chat_history(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, ChatApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum ChatApiError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Message body cannot be empty")]
    EmptyMessage,
    #[error("{0} and {1} are not matched, so no messages can flow between them")]
    NotMatched(UserId, UserId),
}

impl From<sqlx::Error> for ChatApiError {
    fn from(e: sqlx::Error) -> Self {
        ChatApiError::DatabaseError(e.to_string())
    }
}

impl From<crate::traits::MatchmakingError> for ChatApiError {
    fn from(e: crate::traits::MatchmakingError) -> Self {
        ChatApiError::DatabaseError(e.to_string())
    }
}

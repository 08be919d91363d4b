use thiserror::Error;

use crate::db_types::{NewNotification, Notification, UserId};

/// Storage contract for the notification inbox. Rows are created by whichever component produced the event,
/// mutated only to flip the read flag, and deleted in bulk on a user-initiated clear.
#[allow(async_fn_in_trait)]
pub trait NotificationManagement: Clone {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, NotificationApiError>;

    /// Recent notifications for this user, newest first.
    async fn notifications_for(&self, user: &UserId) -> Result<Vec<Notification>, NotificationApiError>;

    async fn mark_as_read(&self, id: i64) -> Result<Notification, NotificationApiError>;

    /// Deletes every notification for this user. Returns the number removed.
    async fn clear_notifications(&self, user: &UserId) -> Result<u64, NotificationApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum NotificationApiError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("No notification exists with id {0}")]
    NotFound(i64),
}

impl From<sqlx::Error> for NotificationApiError {
    fn from(e: sqlx::Error) -> Self {
        NotificationApiError::DatabaseError(e.to_string())
    }
}

use std::fmt::Debug;

use crate::{
    db_types::{NewNotification, Notification, UserId},
    traits::{NotificationApiError, NotificationManagement},
};

/// `NotificationsApi` is the read/ack surface over the notification inbox.
pub struct NotificationsApi<B> {
    db: B,
}

impl<B: Debug> Debug for NotificationsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationsApi ({:?})", self.db)
    }
}

impl<B> NotificationsApi<B>
where B: NotificationManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn record(&self, notification: NewNotification) -> Result<Notification, NotificationApiError> {
        self.db.insert_notification(notification).await
    }

    pub async fn inbox(&self, user: &UserId) -> Result<Vec<Notification>, NotificationApiError> {
        self.db.notifications_for(user).await
    }

    pub async fn mark_as_read(&self, id: i64) -> Result<Notification, NotificationApiError> {
        self.db.mark_as_read(id).await
    }

    pub async fn clear(&self, user: &UserId) -> Result<u64, NotificationApiError> {
        self.db.clear_notifications(user).await
    }
}

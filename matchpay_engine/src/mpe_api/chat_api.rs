use std::fmt::Debug;

use log::*;
use serde_json::json;

use crate::{
    db_types::{Message, NewMessage, NewNotification, NotificationKind, UserId},
    events::{EventProducers, MessageSentEvent},
    traits::{ChatApiError, MatchmakingDatabase, MessageManagement, NotificationManagement},
};

/// `ChatApi` handles messaging between matched users.
pub struct ChatApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ChatApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChatApi")
    }
}

impl<B> ChatApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ChatApi<B>
where B: MessageManagement + MatchmakingDatabase + NotificationManagement
{
    /// Sends a message from `sender` to `receiver`.
    ///
    /// Messages only flow between matched users, so the pair's match is looked up first and its id stamped on
    /// the stored message. The receiver gets an inbox entry; live delivery is the caller's hook to wire up.
    pub async fn send_message(&self, sender: &UserId, receiver: &UserId, body: &str) -> Result<Message, ChatApiError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatApiError::EmptyMessage);
        }
        let m = self
            .db
            .match_for_pair(sender, receiver)
            .await?
            .ok_or_else(|| ChatApiError::NotMatched(sender.clone(), receiver.clone()))?;
        let new_message = NewMessage {
            sender_id: sender.clone(),
            receiver_id: receiver.clone(),
            body: body.to_string(),
            match_id: Some(m.id),
        };
        let message = self.db.save_message(new_message).await?;
        debug!("🔄️💬️ Message {} sent from {sender} to {receiver}", message.id);
        self.record_message_notification(&message).await;
        self.call_message_sent_hook(&message).await;
        Ok(message)
    }

    /// Every message between the two users, oldest first.
    pub async fn history(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, ChatApiError> {
        self.db.chat_history(a, b).await
    }

    async fn record_message_notification(&self, message: &Message) {
        let notification = NewNotification::new(message.receiver_id.clone(), NotificationKind::Message)
            .from_sender(message.sender_id.clone())
            .with_body(format!("New message from {}", message.sender_id))
            .with_meta(json!({ "message_id": message.id }));
        if let Err(e) = self.db.insert_notification(notification).await {
            error!("📬️ Could not record message notification for {}: {e}", message.receiver_id);
        }
    }

    async fn call_message_sent_hook(&self, message: &Message) {
        for emitter in &self.producers.message_sent_producer {
            debug!("🔄️💬️ Notifying message sent hook subscribers");
            let event = MessageSentEvent::new(message.clone());
            emitter.publish_event(event).await;
        }
    }
}

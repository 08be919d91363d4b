use std::fmt::Debug;

use log::*;
use serde_json::json;

use crate::{
    db_types::{MatchRecord, NewNotification, NewSwipe, NotificationKind, SwipeOutcome, SwipeRecord, UndoOutcome, UserId},
    events::{EventProducers, MatchCreatedEvent},
    traits::{MatchmakingDatabase, MatchmakingError, NotificationManagement},
};

/// `MatchmakingApi` drives the swipe → match flow: recording decisions, resolving mutual right-swipes into
/// matches, and rolling decisions back.
pub struct MatchmakingApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for MatchmakingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchmakingApi")
    }
}

impl<B> MatchmakingApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> MatchmakingApi<B>
where B: MatchmakingDatabase + NotificationManagement
{
    /// Records one swipe decision.
    ///
    /// A right-swipe that completes a mutual pair creates the match, writes a match notification into both
    /// users' inboxes, and fires the match-created hook. The hook fires only for a genuinely new match — the
    /// idempotent replay of an already-matched pair stays silent.
    pub async fn process_swipe(&self, swipe: NewSwipe) -> Result<SwipeOutcome, MatchmakingError> {
        let outcome = self.db.upsert_swipe(swipe).await?;
        if let SwipeOutcome::NewMatch { match_record, .. } = &outcome {
            self.record_match_notifications(match_record).await;
            self.call_match_created_hook(match_record).await;
        }
        Ok(outcome)
    }

    /// Rolls back the user's most recent swipe decision. If that swipe had completed a match, the match is
    /// dissolved with it.
    pub async fn undo_last_swipe(&self, user: &UserId) -> Result<UndoOutcome, MatchmakingError> {
        let outcome = self.db.undo_last_swipe(user).await?;
        debug!("🔄️💘️ {user} undid their swipe on {}", outcome.undone.swiped_id);
        Ok(outcome)
    }

    pub async fn last_swipe(&self, user: &UserId) -> Result<Option<SwipeRecord>, MatchmakingError> {
        self.db.last_swipe(user).await
    }

    pub async fn swipes_by(&self, user: &UserId) -> Result<Vec<SwipeRecord>, MatchmakingError> {
        self.db.swipes_by(user).await
    }

    pub async fn matches_for(&self, user: &UserId) -> Result<Vec<MatchRecord>, MatchmakingError> {
        self.db.matches_for_user(user).await
    }

    pub async fn match_for_pair(&self, x: &UserId, y: &UserId) -> Result<Option<MatchRecord>, MatchmakingError> {
        self.db.match_for_pair(x, y).await
    }

    /// Inbox entries for both halves of a fresh match. The match itself has committed; a failed notification
    /// write is logged and swallowed rather than unwinding the swipe.
    async fn record_match_notifications(&self, m: &MatchRecord) {
        for (user, other) in [(&m.user_a, &m.user_b), (&m.user_b, &m.user_a)] {
            let notification = NewNotification::new(user.clone(), NotificationKind::Match)
                .from_sender(other.clone())
                .with_body(format!("You matched with {other}!"))
                .with_meta(json!({ "match_id": m.id, "chat_room_id": m.chat_room_id }));
            if let Err(e) = self.db.insert_notification(notification).await {
                error!("📬️ Could not record match notification for {user}: {e}");
            }
        }
    }

    async fn call_match_created_hook(&self, m: &MatchRecord) {
        for emitter in &self.producers.match_created_producer {
            debug!("🔄️💘️ Notifying match created hook subscribers");
            let event = MatchCreatedEvent::new(m.clone());
            emitter.publish_event(event).await;
        }
    }
}

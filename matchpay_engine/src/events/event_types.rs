use crate::{
    db_types::{MatchRecord, Message},
    traits::Settlement,
};

/// Emitted exactly once per match, by the swipe that completed the pair. The idempotent replay of an
/// already-matched pair does not fire this.
#[derive(Debug, Clone)]
pub struct MatchCreatedEvent {
    pub match_record: MatchRecord,
}

impl MatchCreatedEvent {
    pub fn new(match_record: MatchRecord) -> Self {
        Self { match_record }
    }
}

#[derive(Debug, Clone)]
pub struct MessageSentEvent {
    pub message: Message,
}

impl MessageSentEvent {
    pub fn new(message: Message) -> Self {
        Self { message }
    }
}

/// Emitted once per payment, by whichever signal won the capture race.
#[derive(Debug, Clone)]
pub struct PaymentSettledEvent {
    pub settlement: Settlement,
}

impl PaymentSettledEvent {
    pub fn new(settlement: Settlement) -> Self {
        Self { settlement }
    }
}

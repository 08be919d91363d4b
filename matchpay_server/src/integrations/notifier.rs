//! Wires engine events to the presence relay.
//!
//! The engine persists matches, messages and settlement notifications itself; these hooks only get the news
//! onto an open `/live` stream faster. Delivery is best-effort by design: an offline user reads the durable
//! inbox on their next fetch, so a dropped frame loses nothing.
use std::sync::Arc;

use log::*;
use matchpay_engine::{
    events::{EventHooks, MatchCreatedEvent, MessageSentEvent, PaymentSettledEvent},
    relay::{PresenceRelay, RelayFrame},
};

/// Buffer size for the event dispatch channels.
pub const RELAY_EVENT_BUFFER_SIZE: usize = 25;

pub fn live_delivery_hooks(relay: Arc<PresenceRelay>) -> EventHooks {
    let mut hooks = EventHooks::default();
    let on_match = Arc::clone(&relay);
    hooks.on_match_created(move |ev: MatchCreatedEvent| {
        let relay = Arc::clone(&on_match);
        Box::pin(async move {
            let m = ev.match_record;
            debug!("📬️💘️ Pushing match {} to {} and {}", m.id, m.user_a, m.user_b);
            for user in [m.user_a.clone(), m.user_b.clone()] {
                relay.deliver(&user, RelayFrame::MatchCreated { match_record: m.clone() });
            }
        })
    });
    let on_message = Arc::clone(&relay);
    hooks.on_message_sent(move |ev: MessageSentEvent| {
        let relay = Arc::clone(&on_message);
        Box::pin(async move {
            let message = ev.message;
            trace!("📬️💬️ Pushing message {} to {}", message.id, message.receiver_id);
            let receiver = message.receiver_id.clone();
            relay.deliver(&receiver, RelayFrame::Message { message });
        })
    });
    hooks.on_payment_settled(move |ev: PaymentSettledEvent| {
        let relay = Arc::clone(&relay);
        Box::pin(async move {
            let settlement = ev.settlement;
            // Fee entries carry no payee; nothing to push in that case
            let Some(payee) = settlement.transaction.related_user_id.clone() else {
                return;
            };
            info!("📬️💰️ {payee} was credited {}", settlement.payee_amount);
            relay.deliver(&payee, RelayFrame::PaymentSettled { settlement });
        })
    });
    hooks
}

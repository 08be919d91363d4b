use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, MatchCreatedEvent, MessageSentEvent, PaymentSettledEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub match_created_producer: Vec<EventProducer<MatchCreatedEvent>>,
    pub message_sent_producer: Vec<EventProducer<MessageSentEvent>>,
    pub payment_settled_producer: Vec<EventProducer<PaymentSettledEvent>>,
}

pub struct EventHandlers {
    pub on_match_created: Option<EventHandler<MatchCreatedEvent>>,
    pub on_message_sent: Option<EventHandler<MessageSentEvent>>,
    pub on_payment_settled: Option<EventHandler<PaymentSettledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_match_created = hooks.on_match_created.map(|f| EventHandler::new(buffer_size, f));
        let on_message_sent = hooks.on_message_sent.map(|f| EventHandler::new(buffer_size, f));
        let on_payment_settled = hooks.on_payment_settled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_match_created, on_message_sent, on_payment_settled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_match_created {
            result.match_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_message_sent {
            result.message_sent_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_settled {
            result.payment_settled_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_match_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_message_sent {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_payment_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_match_created: Option<Handler<MatchCreatedEvent>>,
    pub on_message_sent: Option<Handler<MessageSentEvent>>,
    pub on_payment_settled: Option<Handler<PaymentSettledEvent>>,
}

impl EventHooks {
    pub fn on_match_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MatchCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_match_created = Some(Arc::new(f));
        self
    }

    pub fn on_message_sent<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MessageSentEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_message_sent = Some(Arc::new(f));
        self
    }

    pub fn on_payment_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_settled = Some(Arc::new(f));
        self
    }
}

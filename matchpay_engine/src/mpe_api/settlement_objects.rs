use mp_common::Paise;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OrderId, Transaction},
    traits::{CaptureOutcome, FailureOutcome, RailOrder},
};

/// Returned by order creation: the local `created` ledger entry plus the gateway's view of the order. The
/// client needs the gateway order id to open the checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreated {
    pub transaction: Transaction,
    pub rail_order: RailOrder,
}

/// The webhook envelope the gateway posts to us. The payment entity is nested two levels deep in the payload,
/// mirroring the gateway's own schema, so the deserializer tracks that shape rather than flattening it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhookEvent {
    pub event: String,
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub payment: WebhookPaymentWrapper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPaymentWrapper {
    pub entity: WebhookPaymentEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPaymentEntity {
    pub id: String,
    pub order_id: OrderId,
    #[serde(default)]
    pub amount: Option<Paise>,
    #[serde(default)]
    pub status: Option<String>,
}

impl PaymentWebhookEvent {
    pub fn order_id(&self) -> &OrderId {
        &self.payload.payment.entity.order_id
    }

    pub fn payment_id(&self) -> &str {
        &self.payload.payment.entity.id
    }
}

/// What a (signature-verified) webhook delivery amounted to. Everything here is acknowledged to the gateway;
/// `Ignored` records deliveries that changed nothing, with the reason that goes to the reconciliation log.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    Captured(CaptureOutcome),
    Failed(FailureOutcome),
    Ignored(String),
}

impl WebhookOutcome {
    pub fn describe(&self) -> String {
        match self {
            WebhookOutcome::Captured(outcome) if outcome.is_first_capture() => "captured".to_string(),
            WebhookOutcome::Captured(_) => "already captured".to_string(),
            WebhookOutcome::Failed(FailureOutcome::Failed(_)) => "failed".to_string(),
            WebhookOutcome::Failed(_) => "failure ignored".to_string(),
            WebhookOutcome::Ignored(reason) => reason.clone(),
        }
    }
}

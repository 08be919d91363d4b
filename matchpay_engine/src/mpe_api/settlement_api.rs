use std::fmt::Debug;

use log::*;
use mp_common::{Paise, Secret, INR_CURRENCY_CODE};
use serde_json::json;

use crate::{
    db_types::{NewNotification, NewPaymentOrder, NotificationKind, OrderId, Payout, Transaction, UserId, Wallet},
    events::{EventProducers, PaymentSettledEvent},
    helpers::{new_receipt_id, verify_payment_signature},
    mpe_api::settlement_objects::{OrderCreated, PaymentWebhookEvent, WebhookOutcome},
    traits::{CaptureOutcome, NotificationManagement, PaymentRail, Settlement, SettlementDatabase, SettlementError},
};

pub const WEBHOOK_PAYMENT_CAPTURED: &str = "payment.captured";
pub const WEBHOOK_PAYMENT_FAILED: &str = "payment.failed";

/// `SettlementApi` is the primary API for the payment pipeline: opening orders on the gateway, settling
/// capture signals from the client and from webhooks, and paying accumulated balances out.
pub struct SettlementApi<B, R> {
    db: B,
    rail: R,
    api_secret: Secret<String>,
    fee_bps: i64,
    producers: EventProducers,
}

impl<B, R> Debug for SettlementApi<B, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B, R> SettlementApi<B, R> {
    pub fn new(db: B, rail: R, api_secret: Secret<String>, fee_bps: i64, producers: EventProducers) -> Self {
        Self { db, rail, api_secret, fee_bps, producers }
    }
}

impl<B, R> SettlementApi<B, R>
where
    B: SettlementDatabase + NotificationManagement,
    R: PaymentRail,
{
    /// Opens a payment order.
    ///
    /// The gateway is asked first; only once it has handed back an order id does the `created` ledger entry go
    /// in. A gateway refusal therefore leaves no local state at all, and a crash between the two steps leaves
    /// an orphaned gateway order that simply expires unpaid.
    pub async fn create_order(&self, order: NewPaymentOrder) -> Result<OrderCreated, SettlementError> {
        if order.amount.value() <= 0 {
            return Err(SettlementError::InvalidAmount(format!(
                "Payment amount must be positive, got {}",
                order.amount
            )));
        }
        let receipt = new_receipt_id();
        let rail_order = self.rail.create_order(order.amount, &order.currency, &receipt).await?;
        debug!("🔄️💳️ Gateway order {} opened for {} paying {}", rail_order.id, order.payer_id, order.payee_id);
        let transaction = self.db.insert_payment_order(&order, &rail_order.id).await?;
        info!("🔄️💳️ Order {} recorded: {} from {} to {}", rail_order.id, order.amount, order.payer_id, order.payee_id);
        Ok(OrderCreated { transaction, rail_order })
    }

    /// Settles a client-reported payment completion.
    ///
    /// The signature over `order_id|payment_id` is checked first. A mismatch marks the payment failed (the
    /// capture may still arrive later by webhook, but this claim was not genuine) and returns
    /// [`SettlementError::InvalidSignature`]. A valid signature drives the idempotent capture transition.
    pub async fn verify_and_capture(
        &self,
        order_id: &OrderId,
        payment_id: &str,
        signature: &str,
    ) -> Result<CaptureOutcome, SettlementError> {
        if !verify_payment_signature(self.api_secret.reveal(), order_id, payment_id, signature) {
            warn!("🔄️💳️ Signature mismatch on completion report for order {order_id}");
            match self.db.mark_payment_failed(order_id).await {
                Ok(outcome) => trace!("🔄️💳️ Order {order_id} is now {}", outcome.transaction().status),
                Err(e) => warn!("🔄️💳️ Could not mark order {order_id} failed after bad signature: {e}"),
            }
            return Err(SettlementError::InvalidSignature);
        }
        let outcome = self.db.settle_capture(order_id, payment_id, self.fee_bps).await?;
        if outcome.is_first_capture() {
            self.record_settlement_notification(outcome.settlement()).await;
            self.call_payment_settled_hook(outcome.settlement()).await;
        }
        Ok(outcome)
    }

    /// Applies one verified webhook delivery.
    ///
    /// Capture and failure events drive the same idempotent transitions as the client path, so duplicates and
    /// out-of-order deliveries are harmless. Events we don't act on, unknown orders, and conflicting reports
    /// are all acknowledged with a log line — the gateway retries anything else forever.
    pub async fn handle_webhook(&self, event: PaymentWebhookEvent) -> Result<WebhookOutcome, SettlementError> {
        match event.event.as_str() {
            WEBHOOK_PAYMENT_CAPTURED => {
                let order_id = event.order_id().clone();
                match self.db.settle_capture(&order_id, event.payment_id(), self.fee_bps).await {
                    Ok(outcome) => {
                        if outcome.is_first_capture() {
                            self.record_settlement_notification(outcome.settlement()).await;
                            self.call_payment_settled_hook(outcome.settlement()).await;
                        }
                        Ok(WebhookOutcome::Captured(outcome))
                    },
                    Err(SettlementError::OrderNotFound(id)) => {
                        warn!("📬️💳️ Webhook captured unknown order {id}. Acknowledging; flagged for reconciliation.");
                        Ok(WebhookOutcome::Ignored(format!("unknown order {id}")))
                    },
                    Err(SettlementError::ReconciliationConflict { order_id, status }) => {
                        warn!("📬️💳️ Webhook capture for order {order_id} conflicts with status {status}");
                        Ok(WebhookOutcome::Ignored(format!("order {order_id} already {status}")))
                    },
                    Err(e) => Err(e),
                }
            },
            WEBHOOK_PAYMENT_FAILED => {
                let order_id = event.order_id().clone();
                match self.db.mark_payment_failed(&order_id).await {
                    Ok(outcome) => Ok(WebhookOutcome::Failed(outcome)),
                    Err(SettlementError::OrderNotFound(id)) => {
                        warn!("📬️💳️ Webhook failed unknown order {id}. Acknowledging; flagged for reconciliation.");
                        Ok(WebhookOutcome::Ignored(format!("unknown order {id}")))
                    },
                    Err(e) => Err(e),
                }
            },
            other => {
                debug!("📬️💳️ Ignoring webhook event type '{other}'");
                Ok(WebhookOutcome::Ignored(format!("unhandled event type '{other}'")))
            },
        }
    }

    /// Pays out a user's settled balance.
    ///
    /// The wallet is debited up front with the conditional atomic decrement — insufficient funds fail here,
    /// before anything else happens. Then the payout record goes in, the rail is asked to transfer, and the
    /// payout finishes `processed`, or `failed` with the debit reversed.
    pub async fn request_payout(&self, user: &UserId, amount: Paise) -> Result<Payout, SettlementError> {
        if amount.value() <= 0 {
            return Err(SettlementError::InvalidAmount(format!("Payout amount must be positive, got {amount}")));
        }
        self.db.debit_wallet(user, amount).await?;
        let payout = match self.db.insert_payout(user, amount).await {
            Ok(p) => p,
            Err(e) => {
                error!("🔄️💸️ Could not record payout for {user} after debiting. Returning the funds. {e}");
                if let Err(credit_err) = self.db.credit_wallet(user, amount).await {
                    error!("🔄️💸️ Reversal credit of {amount} for {user} ALSO failed: {credit_err}. Fix this by hand.");
                }
                return Err(e);
            },
        };
        let reference = format!("payout_{}", payout.id);
        match self.rail.send_payout(amount, INR_CURRENCY_CODE, &reference).await {
            Ok(rail_payout) => {
                let payout = self.db.finalize_payout(payout.id, &rail_payout.id).await?;
                info!("🔄️💸️ Payout {} of {amount} for {user} processed", payout.id);
                Ok(payout)
            },
            Err(e) => {
                warn!("🔄️💸️ Rail rejected payout {} for {user}: {e}. Reversing the debit.", payout.id);
                self.db.fail_payout(payout.id).await?;
                Err(SettlementError::Gateway(e))
            },
        }
    }

    pub async fn wallet(&self, user: &UserId) -> Result<Wallet, SettlementError> {
        self.db.fetch_or_create_wallet(user).await
    }

    pub async fn ledger(&self, user: &UserId, limit: i64) -> Result<Vec<Transaction>, SettlementError> {
        self.db.ledger_for_user(user, limit).await
    }

    pub async fn transaction_for_order(&self, order_id: &OrderId) -> Result<Option<Transaction>, SettlementError> {
        self.db.fetch_transaction_by_order_id(order_id).await
    }

    /// Inbox entry for the payee. The settlement has committed; a failed write here is logged and swallowed.
    async fn record_settlement_notification(&self, settlement: &Settlement) {
        let Some(payee) = settlement.transaction.related_user_id.clone() else {
            return;
        };
        let notification = NewNotification::new(payee.clone(), NotificationKind::System)
            .with_body(format!("You received {}", settlement.payee_amount))
            .with_meta(json!({
                "order_id": settlement.transaction.order_id,
                "amount": settlement.payee_amount,
            }));
        if let Err(e) = self.db.insert_notification(notification).await {
            error!("📬️ Could not record settlement notification for {payee}: {e}");
        }
    }

    async fn call_payment_settled_hook(&self, settlement: &Settlement) {
        for emitter in &self.producers.payment_settled_producer {
            debug!("🔄️💳️ Notifying payment settled hook subscribers");
            let event = PaymentSettledEvent::new(settlement.clone());
            emitter.publish_event(event).await;
        }
    }
}

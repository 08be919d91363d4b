use std::fmt::Display;

use matchpay_engine::{
    db_types::{MatchRecord, OrderId, SwipeAction, SwipeOutcome, SwipeRecord, Transaction, UndoOutcome, UserId, Wallet},
    traits::CaptureOutcome,
};
use mp_common::Paise;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//----------------------------------------------   Swipes   ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SwipeRequest {
    pub swiped_user_id: UserId,
    pub action: SwipeAction,
    #[serde(default)]
    pub match_score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwipeResponse {
    /// "recorded", "new_match" or "already_matched"
    pub outcome: &'static str,
    pub swipe: SwipeRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_record: Option<MatchRecord>,
}

impl From<SwipeOutcome> for SwipeResponse {
    fn from(outcome: SwipeOutcome) -> Self {
        match outcome {
            SwipeOutcome::Recorded(swipe) => Self { outcome: "recorded", swipe, match_record: None },
            SwipeOutcome::NewMatch { swipe, match_record } => {
                Self { outcome: "new_match", swipe, match_record: Some(match_record) }
            },
            SwipeOutcome::AlreadyMatched { swipe, match_record } => {
                Self { outcome: "already_matched", swipe, match_record: Some(match_record) }
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UndoResponse {
    pub undone: SwipeRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_match: Option<MatchRecord>,
}

impl From<UndoOutcome> for UndoResponse {
    fn from(outcome: UndoOutcome) -> Self {
        Self { undone: outcome.undone, deleted_match: outcome.deleted_match }
    }
}

//----------------------------------------------    Chat    ----------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

//----------------------------------------------   Explore  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ExploreParams {
    #[serde(default)]
    pub limit: Option<i64>,
}

//----------------------------------------------  Payments  ----------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub amount: Paise,
    pub payee_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: OrderId,
    pub payment_id: String,
    pub signature: String,
}

/// What the payer sees after a successful completion report: where their money went.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentBreakdown {
    /// "settled" on the winning report, "already_captured" on an idempotent replay.
    pub status: &'static str,
    pub order_id: Option<OrderId>,
    pub amount: Paise,
    pub platform_fee: Paise,
    pub payee_amount: Paise,
}

impl From<CaptureOutcome> for PaymentBreakdown {
    fn from(outcome: CaptureOutcome) -> Self {
        let status = if outcome.is_first_capture() { "settled" } else { "already_captured" };
        let settlement = outcome.into_settlement();
        Self {
            status,
            order_id: settlement.transaction.order_id.clone(),
            amount: settlement.transaction.amount,
            platform_fee: settlement.platform_fee,
            payee_amount: settlement.payee_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub amount: Paise,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletResponse {
    pub user_id: UserId,
    pub wallet: Wallet,
    pub ledger: Vec<Transaction>,
}

use mp_common::Paise;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `POST /v1/orders`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPayrailOrder {
    pub amount: Paise,
    pub currency: String,
    pub receipt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Value>,
}

/// An order as the gateway reports it. All amounts are integer paise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrailOrder {
    pub id: String,
    pub amount: Paise,
    #[serde(default)]
    pub amount_paid: Paise,
    #[serde(default)]
    pub amount_due: Paise,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub created_at: i64,
}

/// Request body for `POST /v1/payouts`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPayrailPayout {
    pub amount: Paise,
    pub currency: String,
    pub reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

/// A payout as the gateway reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrailPayout {
    pub id: String,
    #[serde(default)]
    pub amount: Paise,
    #[serde(default)]
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub reference_id: String,
    #[serde(default)]
    pub created_at: i64,
}

use mp_common::Paise;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::OrderId;

/// The narrow collaborator interface to the external payment gateway. The engine calls it to open orders and to
/// push payouts; everything else about the gateway (checkout, capture) reaches us through webhooks and the
/// client-reported completion call.
#[allow(async_fn_in_trait)]
pub trait PaymentRail {
    /// Creates an order on the gateway. A failure here must leave no local state behind.
    async fn create_order(&self, amount: Paise, currency: &str, receipt: &str) -> Result<RailOrder, GatewayError>;

    /// Initiates a payout of already-settled funds to the user's registered account.
    async fn send_payout(&self, amount: Paise, currency: &str, reference: &str) -> Result<RailPayout, GatewayError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailOrder {
    pub id: OrderId,
    pub amount: Paise,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailPayout {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Could not initialize gateway client: {0}")]
    Initialization(String),
    #[error("Invalid gateway response: {0}")]
    Response(String),
    #[error("Gateway rejected the call. Error {status}. {message}")]
    Rejected { status: u16, message: String },
}

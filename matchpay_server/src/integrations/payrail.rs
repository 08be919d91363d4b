//! Bridges the engine's [`PaymentRail`] collaborator trait onto the real Payrail REST client.
//!
//! The engine stays ignorant of HTTP and of gateway error envelopes; this adapter translates both ways:
//! requests go out through [`PayrailApi`], and client errors come back as [`GatewayError`]s the settlement
//! pipeline knows how to classify.
use matchpay_engine::{
    db_types::OrderId,
    traits::{GatewayError, PaymentRail, RailOrder, RailPayout},
};
use mp_common::Paise;
use payrail_tools::{PayrailApi, PayrailApiError, PayrailConfig};

#[derive(Clone)]
pub struct PayrailRail {
    api: PayrailApi,
}

impl PayrailRail {
    pub fn try_new(config: PayrailConfig) -> Result<Self, GatewayError> {
        let api = PayrailApi::new(config).map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { api })
    }
}

impl PaymentRail for PayrailRail {
    async fn create_order(&self, amount: Paise, currency: &str, receipt: &str) -> Result<RailOrder, GatewayError> {
        let order = self.api.create_order(amount, currency, receipt).await.map_err(convert_err)?;
        Ok(RailOrder {
            id: OrderId::from(order.id),
            amount: order.amount,
            currency: order.currency,
            status: order.status,
        })
    }

    async fn send_payout(&self, amount: Paise, currency: &str, reference: &str) -> Result<RailPayout, GatewayError> {
        let payout = self.api.create_payout(amount, currency, reference).await.map_err(convert_err)?;
        Ok(RailPayout { id: payout.id, status: payout.status })
    }
}

fn convert_err(e: PayrailApiError) -> GatewayError {
    match e {
        PayrailApiError::Initialization(s) => GatewayError::Initialization(s),
        PayrailApiError::RestResponse(s) | PayrailApiError::Json(s) => GatewayError::Response(s),
        PayrailApiError::Query { status, message } => GatewayError::Rejected { status, message },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gateway_rejections_keep_their_status() {
        let err = convert_err(PayrailApiError::Query { status: 422, message: "amount too small".into() });
        match err {
            GatewayError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "amount too small");
            },
            other => panic!("Unexpected conversion: {other:?}"),
        }
    }
}

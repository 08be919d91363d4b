//----------------------------------------------   Payrail webhooks  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use log::{info, trace, warn};
use matchpay_engine::{
    settlement_objects::PaymentWebhookEvent,
    traits::{NotificationManagement, PaymentRail, SettlementDatabase, SettlementError},
    SettlementApi,
};

use crate::{config::ServerOptions, data_objects::JsonResponse, errors::ServerError, helpers::get_remote_ip, route};

/// The header carrying the gateway's HMAC signature over the raw delivery body.
pub const PAYRAIL_SIGNATURE_HEADER: &str = "X-Payrail-Signature";

route!(payrail_webhook => Post "/payrail" impl SettlementDatabase, NotificationManagement where rail PaymentRail);
/// Receives payment lifecycle events from Payrail.
///
/// The HMAC middleware has already verified the delivery signature by the time this handler runs. Responses
/// must stay in the 200 range — the gateway retries anything else forever — so processing failures are reported
/// in the body and logged for reconciliation, never surfaced as HTTP errors.
pub async fn payrail_webhook<B, R>(
    req: HttpRequest,
    body: web::Json<PaymentWebhookEvent>,
    opts: web::Data<ServerOptions>,
    api: web::Data<SettlementApi<B, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + NotificationManagement,
    R: PaymentRail,
{
    let ip =
        get_remote_ip(&req, &opts).map(|ip| ip.to_string()).unwrap_or_else(|| "unknown peer".to_string());
    trace!("📬️💳️ Received webhook delivery from {ip}: {}", req.uri());
    let event = body.into_inner();
    let event_type = event.event.clone();
    let order_id = event.order_id().clone();
    let result = match api.handle_webhook(event).await {
        Ok(outcome) => {
            info!("📬️💳️ Webhook '{event_type}' for order {order_id}: {}", outcome.describe());
            JsonResponse::success(outcome.describe())
        },
        Err(SettlementError::DatabaseError(e)) => {
            warn!("📬️💳️ Could not process webhook '{event_type}' for order {order_id}. {e}");
            JsonResponse::failure("Could not process event.")
        },
        Err(e) => {
            warn!("📬️💳️ Unexpected error while handling webhook '{event_type}' for order {order_id}. {e}");
            JsonResponse::failure("Unexpected error handling event.")
        },
    };
    Ok(HttpResponse::Ok().json(result))
}

use actix_web::{
    body::MessageBody,
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use matchpay_engine::{
    db_types::TransactionStatus,
    events::EventProducers,
    helpers::sign_payload,
    traits::{CaptureOutcome, FailureOutcome, SettlementError},
    SettlementApi,
};
use mp_common::Secret;

use super::mocks::{failed_transaction, notification_from, settlement_for, MockLedgerDb, MockRail};
use crate::{
    config::ServerOptions,
    middleware::HmacMiddlewareFactory,
    webhook_routes::{PayrailWebhookRoute, PAYRAIL_SIGNATURE_HEADER},
};

/// The webhook secret shared with the gateway. Deliveries are signed over the raw body with this value.
const WEBHOOK_SECRET: &str = "test-webhook-delivery-secret";

const CAPTURED_EVENT: &str = r#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_29QQoUBi66xm2f","order_id":"order_EZb1i7Ts9GkcrT","amount":50000,"status":"captured"}}}}"#;
const FAILED_EVENT: &str = r#"{"event":"payment.failed","payload":{"payment":{"entity":{"id":"pay_29QQoUBi66xm2f","order_id":"order_EZb1i7Ts9GkcrT","status":"failed"}}}}"#;
const UNHANDLED_EVENT: &str = r#"{"event":"payment.authorized","payload":{"payment":{"entity":{"id":"pay_29QQoUBi66xm2f","order_id":"order_EZb1i7Ts9GkcrT"}}}}"#;

#[actix_web::test]
async fn a_signed_capture_event_is_settled_and_acknowledged() -> anyhow::Result<()> {
    let _ = env_logger::try_init().ok();
    let signature = sign_payload(WEBHOOK_SECRET, CAPTURED_EVENT.as_bytes());
    let (status, body) =
        webhook_request(CAPTURED_EVENT, Some(signature), configure_capture).await.map_err(anyhow::Error::msg)?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "was: {body}");
    assert!(body.contains("captured"), "was: {body}");
    Ok(())
}

#[actix_web::test]
async fn a_tampered_body_fails_the_signature_check() {
    let _ = env_logger::try_init().ok();
    // Signature computed over the capture body, delivered with a different one
    let signature = sign_payload(WEBHOOK_SECRET, CAPTURED_EVENT.as_bytes());
    let err = webhook_request(FAILED_EVENT, Some(signature), configure_untouched).await.expect_err("Expected error");
    assert_eq!(err, "Invalid HMAC signature.");
}

#[actix_web::test]
async fn a_delivery_without_a_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let err = webhook_request(CAPTURED_EVENT, None, configure_untouched).await.expect_err("Expected error");
    assert_eq!(err, "No HMAC signature found.");
}

#[actix_web::test]
async fn unknown_event_types_are_acknowledged() -> anyhow::Result<()> {
    let _ = env_logger::try_init().ok();
    let signature = sign_payload(WEBHOOK_SECRET, UNHANDLED_EVENT.as_bytes());
    let (status, body) =
        webhook_request(UNHANDLED_EVENT, Some(signature), configure_untouched).await.map_err(anyhow::Error::msg)?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("unhandled event type"), "was: {body}");
    Ok(())
}

#[actix_web::test]
async fn an_unknown_order_is_acknowledged_for_reconciliation() {
    let _ = env_logger::try_init().ok();
    let signature = sign_payload(WEBHOOK_SECRET, CAPTURED_EVENT.as_bytes());
    let (status, body) =
        webhook_request(CAPTURED_EVENT, Some(signature), configure_unknown_order).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("unknown order"), "was: {body}");
}

#[actix_web::test]
async fn a_failure_report_never_downgrades_a_captured_order() {
    let _ = env_logger::try_init().ok();
    let signature = sign_payload(WEBHOOK_SECRET, FAILED_EVENT.as_bytes());
    let (status, body) =
        webhook_request(FAILED_EVENT, Some(signature), configure_captured_wins).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("failure ignored"), "was: {body}");
}

async fn webhook_request(
    body: &'static str,
    signature: Option<String>,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::post().uri("/webhook/payrail").insert_header(ContentType::json()).set_payload(body);
    if let Some(signature) = signature {
        req = req.insert_header((PAYRAIL_SIGNATURE_HEADER, signature));
    }
    let hmac_checks =
        HmacMiddlewareFactory::new(PAYRAIL_SIGNATURE_HEADER, Secret::new(WEBHOOK_SECRET.to_string()), true);
    let app = App::new()
        .app_data(web::Data::new(ServerOptions { use_x_forwarded_for: false, use_forwarded: false }))
        .configure(configure)
        .service(
            web::scope("/webhook").wrap(hmac_checks).service(PayrailWebhookRoute::<MockLedgerDb, MockRail>::new()),
        );
    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

fn configure_capture(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_settle_capture().returning(|order_id, payment_id, _| {
        Ok(CaptureOutcome::Settled(settlement_for(order_id, payment_id, 50_000)))
    });
    db.expect_insert_notification().times(1).returning(|n| Ok(notification_from(n)));
    register_webhook_api(cfg, db);
}

// For deliveries that must bounce off the middleware or change nothing.
fn configure_untouched(cfg: &mut ServiceConfig) {
    register_webhook_api(cfg, MockLedgerDb::new());
}

fn configure_unknown_order(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_settle_capture().returning(|order_id, _, _| Err(SettlementError::OrderNotFound(order_id.clone())));
    register_webhook_api(cfg, db);
}

fn configure_captured_wins(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_mark_payment_failed().returning(|order_id| {
        let mut transaction = failed_transaction(order_id);
        transaction.status = TransactionStatus::Captured;
        Ok(FailureOutcome::CapturedWins(transaction))
    });
    register_webhook_api(cfg, db);
}

fn register_webhook_api(cfg: &mut ServiceConfig, db: MockLedgerDb) {
    let settlement_api = SettlementApi::new(
        db,
        MockRail::new(),
        Secret::new("unused-completion-secret".to_string()),
        250,
        EventProducers::default(),
    );
    cfg.app_data(web::Data::new(settlement_api));
}

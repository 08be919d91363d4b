use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Duration;
use matchpay_engine::{
    db_types::{OrderId, PayoutStatus, UserId},
    events::EventProducers,
    helpers::sign_payment,
    traits::{CaptureOutcome, FailureOutcome, GatewayError, RailOrder, SettlementError},
    SettlementApi,
};
use mp_common::{Paise, Secret};
use serde_json::json;

use super::{
    helpers::{get_request, issue_token, post_request},
    mocks::{
        created_transaction,
        failed_transaction,
        notification_from,
        payout_for,
        settlement_for,
        wallet_for,
        MockLedgerDb,
        MockRail,
    },
};
use crate::routes::{CreatePaymentOrderRoute, MyWalletRoute, RequestPayoutRoute, VerifyPaymentRoute};

/// The completion-report secret shared with the gateway. Tests sign with the same value the API verifies with.
const CLIENT_API_SECRET: &str = "test-completion-report-secret";

#[actix_web::test]
async fn creating_an_order_records_the_ledger_entry() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let body = json!({ "amount": 50_000, "payee_id": "bob" });
    let (status, body) =
        post_request(&token, "/payments/order", &body, configure_create_order).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("order_EZb1i7Ts9GkcrT"), "was: {body}");
    assert!(body.contains(r#""status":"created""#), "was: {body}");
}

#[actix_web::test]
async fn gateway_refusal_leaves_no_local_state() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let body = json!({ "amount": 50_000, "payee_id": "bob" });
    let (status, body) =
        post_request(&token, "/payments/order", &body, configure_gateway_refusal).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("Payment gateway error."), "was: {body}");
}

#[actix_web::test]
async fn a_forged_completion_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let body = json!({
        "order_id": "order_EZb1i7Ts9GkcrT",
        "payment_id": "pay_29QQoUBi66xm2f",
        "signature": "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
    });
    let (status, body) =
        post_request(&token, "/payments/verify", &body, configure_forged_signature).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("The payment signature is invalid."), "was: {body}");
}

#[actix_web::test]
async fn a_genuine_completion_report_settles_the_payment() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let order_id = OrderId::from("order_EZb1i7Ts9GkcrT".to_string());
    let signature = sign_payment(CLIENT_API_SECRET, &order_id, "pay_29QQoUBi66xm2f");
    let body = json!({
        "order_id": "order_EZb1i7Ts9GkcrT",
        "payment_id": "pay_29QQoUBi66xm2f",
        "signature": signature,
    });
    let (status, body) =
        post_request(&token, "/payments/verify", &body, configure_first_capture).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"settled""#), "was: {body}");
    assert!(body.contains(r#""platform_fee":1250"#), "was: {body}");
    assert!(body.contains(r#""payee_amount":48750"#), "was: {body}");
}

#[actix_web::test]
async fn replaying_a_completion_report_is_idempotent() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let order_id = OrderId::from("order_EZb1i7Ts9GkcrT".to_string());
    let signature = sign_payment(CLIENT_API_SECRET, &order_id, "pay_29QQoUBi66xm2f");
    let body = json!({
        "order_id": "order_EZb1i7Ts9GkcrT",
        "payment_id": "pay_29QQoUBi66xm2f",
        "signature": signature,
    });
    let (status, body) =
        post_request(&token, "/payments/verify", &body, configure_replayed_capture).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"already_captured""#), "was: {body}");
}

#[actix_web::test]
async fn payout_with_insufficient_funds_is_refused() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let body = json!({ "amount": 50_000 });
    let (status, body) =
        post_request(&token, "/payments/payout", &body, configure_insufficient_funds).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Insufficient funds"), "was: {body}");
}

#[actix_web::test]
async fn rail_rejection_reverses_the_payout_debit() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let body = json!({ "amount": 25_000 });
    let (status, body) =
        post_request(&token, "/payments/payout", &body, configure_rail_rejection).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("beneficiary not onboarded"), "was: {body}");
}

#[actix_web::test]
async fn wallet_reports_balance_and_recent_ledger() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("bob", Duration::hours(1));
    let (status, body) = get_request(&token, "/wallet", configure_wallet).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""balance":48750"#), "was: {body}");
    assert!(body.contains(r#""status":"captured""#), "was: {body}");
}

fn configure_create_order(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_insert_payment_order().returning(|order, order_id| Ok(created_transaction(1, order, order_id)));
    let mut rail = MockRail::new();
    rail.expect_create_order().returning(|amount, currency, _receipt| {
        Ok(RailOrder {
            id: OrderId::from("order_EZb1i7Ts9GkcrT".to_string()),
            amount,
            currency: currency.to_string(),
            status: "created".to_string(),
        })
    });
    register_settlement(cfg, db, rail);
}

fn configure_gateway_refusal(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_insert_payment_order().times(0);
    let mut rail = MockRail::new();
    rail.expect_create_order()
        .returning(|_, _, _| Err(GatewayError::Rejected { status: 503, message: "gateway maintenance".to_string() }));
    register_settlement(cfg, db, rail);
}

fn configure_forged_signature(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_settle_capture().times(0);
    db.expect_mark_payment_failed()
        .times(1)
        .returning(|order_id| Ok(FailureOutcome::Failed(failed_transaction(order_id))));
    register_settlement(cfg, db, MockRail::new());
}

fn configure_first_capture(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_settle_capture()
        .withf(|_, _, fee_bps| *fee_bps == 250)
        .returning(|order_id, payment_id, _| Ok(CaptureOutcome::Settled(settlement_for(order_id, payment_id, 50_000))));
    db.expect_insert_notification().times(1).returning(|n| Ok(notification_from(n)));
    register_settlement(cfg, db, MockRail::new());
}

fn configure_replayed_capture(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_settle_capture().returning(|order_id, payment_id, _| {
        Ok(CaptureOutcome::AlreadyCaptured(settlement_for(order_id, payment_id, 50_000)))
    });
    // The replay does not notify the payee a second time
    db.expect_insert_notification().times(0);
    register_settlement(cfg, db, MockRail::new());
}

fn configure_insufficient_funds(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_debit_wallet().returning(|_, amount| {
        Err(SettlementError::InsufficientFunds { requested: amount, available: Paise::from(1_000) })
    });
    register_settlement(cfg, db, MockRail::new());
}

fn configure_rail_rejection(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_debit_wallet().returning(|user, _| Ok(wallet_for(user, 0)));
    db.expect_insert_payout().returning(|user, amount| Ok(payout_for(9, user, amount, PayoutStatus::Created)));
    db.expect_fail_payout()
        .times(1)
        .returning(|id| Ok(payout_for(id, &UserId::from("alice"), Paise::from(25_000), PayoutStatus::Failed)));
    let mut rail = MockRail::new();
    rail.expect_send_payout().returning(|_, _, _| {
        Err(GatewayError::Rejected { status: 400, message: "beneficiary not onboarded".to_string() })
    });
    register_settlement(cfg, db, rail);
}

fn configure_wallet(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_fetch_or_create_wallet().returning(|user| Ok(wallet_for(user, 48_750)));
    db.expect_ledger_for_user().withf(|_, limit| *limit == 50).returning(|user, _| {
        let order_id = OrderId::from("order_EZb1i7Ts9GkcrT".to_string());
        let mut settled = settlement_for(&order_id, "pay_29QQoUBi66xm2f", 50_000).transaction;
        settled.related_user_id = Some(user.clone());
        Ok(vec![settled])
    });
    register_settlement(cfg, db, MockRail::new());
}

fn register_settlement(cfg: &mut ServiceConfig, db: MockLedgerDb, rail: MockRail) {
    let settlement_api =
        SettlementApi::new(db, rail, Secret::new(CLIENT_API_SECRET.to_string()), 250, EventProducers::default());
    cfg.service(CreatePaymentOrderRoute::<MockLedgerDb, MockRail>::new())
        .service(VerifyPaymentRoute::<MockLedgerDb, MockRail>::new())
        .service(RequestPayoutRoute::<MockLedgerDb, MockRail>::new())
        .service(MyWalletRoute::<MockLedgerDb, MockRail>::new())
        .app_data(web::Data::new(settlement_api));
}

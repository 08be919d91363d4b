use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::Duration;
use log::debug;
use matchpay_engine::{events::EventProducers, MatchmakingApi};

use super::{
    helpers::{get_request, issue_token, test_auth_config},
    mocks::MockSocialDb,
};
use crate::{auth::TokenIssuer, routes::MySwipesRoute};

#[actix_web::test]
async fn request_without_a_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/swipes", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token was provided."), "was: {body}");
}

#[actix_web::test]
async fn expired_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::minutes(-5));
    let (status, body) = get_request(&token, "/swipes", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token is invalid."), "was: {body}");
}

#[actix_web::test]
async fn tampered_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token("alice", Duration::hours(1));
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    debug!("Calling /swipes with tampered token {token}");
    let (status, body) = get_request(&token, "/swipes", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token is invalid."), "was: {body}");
}

#[actix_web::test]
async fn non_bearer_scheme_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/swipes").insert_header(("Authorization", "Token abcdef")).to_request();
    let issuer = TokenIssuer::new(&test_auth_config());
    let app = App::new().app_data(web::Data::new(issuer)).configure(configure);
    let service = test::init_service(app).await;
    let (_req, res) = test::call_service(&service, req).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Access token is not in the correct format."), "was: {body}");
}

// None of these requests make it past the extractor, so the mock carries no expectations.
fn configure(cfg: &mut ServiceConfig) {
    let db = MockSocialDb::new();
    let matchmaking_api = MatchmakingApi::new(db, EventProducers::default());
    cfg.service(MySwipesRoute::<MockSocialDb>::new()).app_data(web::Data::new(matchmaking_api));
}

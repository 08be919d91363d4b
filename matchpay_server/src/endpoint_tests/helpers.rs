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
use matchpay_engine::db_types::UserId;
use mp_common::Secret;
use serde::Serialize;

use crate::{auth::TokenIssuer, config::AuthConfig};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this key anywhere.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig { jwt_signing_key: Secret::new("e11914fdd0c9a2ab8a38dac9de57b3e392372cde".into()) }
}

pub fn issue_token(user: &str, validity: Duration) -> String {
    let issuer = TokenIssuer::new(&test_auth_config());
    issuer.issue_token(UserId::from(user), Some(validity)).expect("Failed to sign token")
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::get().uri(path);
    send_request(req, token, configure).await
}

pub async fn post_request<T: Serialize>(
    token: &str,
    path: &str,
    body: &T,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::post().uri(path).set_json(body);
    send_request(req, token, configure).await
}

async fn send_request(
    mut req: TestRequest,
    token: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let issuer = TokenIssuer::new(&test_auth_config());
    let app = App::new().app_data(web::Data::new(issuer)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

//! Access token handling.
//!
//! Matchpay uses short-lived JWTs signed with a symmetric key (HS256). Tokens are issued at login by the auth
//! collaborator, which shares the signing secret with this server; the server only ever *verifies* them, except
//! in tests, where [`TokenIssuer::issue_token`] mints tokens directly.
//!
//! Handlers opt into authentication by taking a [`JwtClaims`] parameter. The extractor reads the
//! `Authorization: Bearer <token>` header and rejects missing, malformed, expired or tampered tokens before the
//! handler body runs.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use matchpay_engine::db_types::UserId;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// Tokens are valid for 24 hours by default. They do NOT refresh.
const DEFAULT_TOKEN_VALIDITY: Duration = Duration::hours(24);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user this token belongs to.
    pub sub: UserId,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies access tokens with the configured symmetric secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_signing_key.reveal().as_bytes();
        Self { encoding_key: EncodingKey::from_secret(secret), decoding_key: DecodingKey::from_secret(secret) }
    }

    pub fn issue_token(&self, user: UserId, duration: Option<Duration>) -> Result<String, ServerError> {
        let duration = duration.unwrap_or(DEFAULT_TOKEN_VALIDITY);
        let now = Utc::now();
        let claims = JwtClaims { sub: user, iat: now.timestamp(), exp: (now + duration).timestamp() };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))
    }

    /// Verifies the signature and expiry and returns the claims.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::default();
        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        Ok(data.claims)
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::InitializeError("No token verifier has been configured".to_string()))?;
    let header = req.headers().get("Authorization").ok_or(AuthError::MissingToken)?;
    let header = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".to_string()))?;
    let claims = issuer.validate_token(token.trim())?;
    trace!("🔐️ Request authenticated for {}", claims.sub);
    Ok(claims)
}

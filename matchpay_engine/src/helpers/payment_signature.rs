//! # Payment completion signature format
//!
//! When a checkout completes in the payer's app, the gateway hands the client a signature over the order and
//! payment identifiers, computed with the platform's API secret:
//!
//! ```text
//!     signature = hex( HMAC-SHA256( api_secret, "{order_id}|{payment_id}" ) )
//! ```
//!
//! The client forwards the triple to us verbatim. The signature is the only proof that the capture claim
//! actually originated at the gateway, so a mismatch marks the payment failed and the request is rejected.
//!
//! Webhook deliveries carry a second signature in the `X-Payrail-Signature` header, computed with the dedicated
//! webhook secret over the **raw request body**. It must be verified against the bytes as received; any
//! re-serialization of the JSON changes the digest.
//!
//! Both checks run in constant time via the MAC's own verifier.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::db_types::OrderId;

type HmacSha256 = Hmac<Sha256>;

/// The string the gateway signs when a payment is captured.
pub fn payment_signature_message(order_id: &OrderId, payment_id: &str) -> String {
    format!("{}|{payment_id}", order_id.as_str())
}

/// Hex-encoded HMAC-SHA256 of `data` under `secret`.
pub fn sign_payload(secret: &str, data: &[u8]) -> String {
    let mut mac = new_mac(secret);
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// The signature the gateway attaches to a successful capture of `payment_id` against `order_id`.
pub fn sign_payment(secret: &str, order_id: &OrderId, payment_id: &str) -> String {
    sign_payload(secret, payment_signature_message(order_id, payment_id).as_bytes())
}

/// Constant-time check of a hex-encoded signature over `data`. Malformed hex fails the check rather than
/// erroring; a forged signature and a mangled one get the same answer.
pub fn verify_payload(secret: &str, data: &[u8], signature: &str) -> bool {
    let Ok(provided) = hex::decode(signature) else {
        return false;
    };
    let mut mac = new_mac(secret);
    mac.update(data);
    mac.verify_slice(&provided).is_ok()
}

/// Constant-time check of a client-reported payment completion signature.
pub fn verify_payment_signature(secret: &str, order_id: &OrderId, payment_id: &str, signature: &str) -> bool {
    verify_payload(secret, payment_signature_message(order_id, payment_id).as_bytes(), signature)
}

fn new_mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length")
}

//! # Matchpay server
//!
//! The HTTP front-end for the Matchpay engine. It is responsible for:
//! * authenticating callers via short-lived JWTs and mapping them onto engine user ids,
//! * exposing the swipe/match/chat/explore surface under `/api`,
//! * driving the payment settlement pipeline (order creation, client completion reports, payouts),
//! * receiving and HMAC-verifying webhook deliveries from the Payrail gateway, and
//! * streaming live events (matches, messages, settlements) to connected clients over `/live`.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! All business routes live under `/api` and require a bearer token. `/health` and `/webhook/payrail` are open;
//! the webhook is protected by the gateway HMAC signature instead.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;

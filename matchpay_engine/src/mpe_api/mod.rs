//! # Matchpay engine public API
//!
//! The `mpe_api` module exposes the programmatic API for the Matchpay engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//! Different parts (e.g. matchmaking and settlement) could even be configured on different machines, or use
//! different database backends.
//!
//! * [`matchmaking_api`] drives the swipe → match flow, including the undo path.
//! * [`settlement_api`] is the primary API for the payment pipeline: gateway orders, capture signals (from the
//!   client and from webhooks) and payouts.
//! * [`chat_api`] carries messages between matched users.
//! * [`notifications_api`] is the read/ack surface over the notification inbox.
//! * [`explore_api`] serves the swipe deck.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend
//! that implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use matchpay_engine::{ExploreApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements ExploreManagement
//! let api = ExploreApi::new(db);
//! let deck = api.candidates(&user_id, None).await?;
//! ```

pub mod chat_api;
pub mod explore_api;
pub mod matchmaking_api;
pub mod notifications_api;
pub mod settlement_api;
pub mod settlement_objects;

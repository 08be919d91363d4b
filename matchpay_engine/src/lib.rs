//! Matchpay Engine
//!
//! The Matchpay engine is the backend for a skill-exchange platform where users discover each other, match by
//! mutual right-swipe, chat, and settle payments for completed sessions. This library contains the core logic;
//! it is HTTP-framework agnostic and knows nothing about the payment gateway's REST surface.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the database directly.
//!    Instead, use the public API provided by the engine. The exception is the data types used in the database.
//!    These are defined in the [`mod@db_types`] module and are public.
//! 2. The engine public API ([`mod@mpe_api`]). This provides the public-facing functionality of the engine:
//!    swipes and matches, the payment settlement pipeline, chat, notifications and the explore feed. Specific
//!    backends need to implement the traits in the [`mod@traits`] module in order to act as a backend for the
//!    Matchpay server.
//! 3. Live plumbing: the [`mod@relay`] tracks which users hold an open event stream and pushes frames to them
//!    best-effort, and [`mod@events`] provides a simple hook system so that components can subscribe to engine
//!    events (a match created, a message sent, a payment settled) and react to them.
pub mod db_types;
pub mod events;
pub mod helpers;
mod mpe_api;
pub mod relay;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use mpe_api::{
    chat_api::ChatApi,
    explore_api::ExploreApi,
    matchmaking_api::MatchmakingApi,
    notifications_api::NotificationsApi,
    settlement_api::SettlementApi,
    settlement_objects,
};

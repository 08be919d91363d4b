//! # Storage and collaborator contracts.
//!
//! This module defines the interface contracts that database *backends* and external collaborators must satisfy to
//! drive the matchmaking and settlement engines.
//!
//! ## Matchmaking
//! The [`MatchmakingDatabase`] trait owns the swipe → match state machine at the storage level: the atomic upsert of
//! swipe decisions, the uniqueness guarantee on the canonical match pair, and the undo flow that dissolves a match
//! together with the swipe that completed it.
//!
//! ## Settlement
//! The [`SettlementDatabase`] trait owns the ledger: transaction inserts, the conditional (compare-and-set) status
//! transitions that make the client-callback/webhook race safe, atomic wallet credits and conditional debits, and the
//! payout lifecycle. The [`PaymentRail`] trait is the narrow interface to the external payment gateway; the engine
//! never talks HTTP itself.
//!
//! ## Social surface
//! [`MessageManagement`], [`NotificationManagement`] and [`ExploreManagement`] cover chat history, the notification
//! inbox and the explore feed respectively. They carry no cross-record invariants and exist so the server can stay
//! backend-agnostic.
mod chat;
mod data_objects;
mod explore;
mod matchmaking;
mod notifications;
mod payment_rail;
mod settlement;

pub use chat::{ChatApiError, MessageManagement};
pub use data_objects::{CaptureOutcome, FailureOutcome, Settlement};
pub use explore::{ExploreApiError, ExploreManagement};
pub use matchmaking::{MatchmakingDatabase, MatchmakingError};
pub use notifications::{NotificationApiError, NotificationManagement};
pub use payment_rail::{GatewayError, PaymentRail, RailOrder, RailPayout};
pub use settlement::{SettlementDatabase, SettlementError};

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use mp_common::{Paise, INR_CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------       UserId        ---------------------------------------------------------
/// A lightweight wrapper around the opaque user identifier issued by the auth
/// collaborator. The engine never interprets it beyond equality and ordering.
#[derive(Clone, Debug, Type, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       OrderId       ---------------------------------------------------------
/// The order identifier assigned by the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     SwipeAction     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SwipeAction {
    Left,
    Right,
}

impl Display for SwipeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwipeAction::Left => write!(f, "left"),
            SwipeAction::Right => write!(f, "right"),
        }
    }
}

impl FromStr for SwipeAction {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            s => Err(ConversionError(format!("Invalid swipe action: {s}"))),
        }
    }
}

//--------------------------------------     SwipeRecord     ---------------------------------------------------------
/// The current decision of one user about another. At most one row exists per
/// ordered (swiper, swiped) pair; re-swiping replaces the action in place.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SwipeRecord {
    pub id: i64,
    pub swiper_id: UserId,
    pub swiped_id: UserId,
    pub action: SwipeAction,
    pub match_score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSwipe {
    pub swiper_id: UserId,
    pub swiped_id: UserId,
    pub action: SwipeAction,
    pub match_score: i64,
}

impl NewSwipe {
    pub fn new(swiper_id: UserId, swiped_id: UserId, action: SwipeAction) -> Self {
        Self { swiper_id, swiped_id, action, match_score: 0 }
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.match_score = score;
        self
    }
}

//--------------------------------------     MatchRecord     ---------------------------------------------------------
/// A mutual right-swipe resolved into a single durable record. The pair is
/// stored canonically (`user_a < user_b`) so (A,B) and (B,A) hit the same
/// uniqueness constraint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MatchRecord {
    pub id: i64,
    pub user_a: UserId,
    pub user_b: UserId,
    pub chat_room_id: String,
    pub matched_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Orders two user ids into the canonical (a, b) form used as the pair key.
    pub fn canonical_pair(x: &UserId, y: &UserId) -> (UserId, UserId) {
        if x <= y {
            (x.clone(), y.clone())
        } else {
            (y.clone(), x.clone())
        }
    }

    pub fn involves(&self, user: &UserId) -> bool {
        &self.user_a == user || &self.user_b == user
    }

    /// The other party of the match, if `user` is one of the pair.
    pub fn counterpart(&self, user: &UserId) -> Option<&UserId> {
        if &self.user_a == user {
            Some(&self.user_b)
        } else if &self.user_b == user {
            Some(&self.user_a)
        } else {
            None
        }
    }
}

//--------------------------------------     SwipeOutcome    ---------------------------------------------------------
/// Result of evaluating one swipe. Only [`SwipeOutcome::NewMatch`] should
/// trigger live delivery; `AlreadyMatched` is the idempotent replay of an
/// earlier result.
#[derive(Debug, Clone)]
pub enum SwipeOutcome {
    Recorded(SwipeRecord),
    NewMatch { swipe: SwipeRecord, match_record: MatchRecord },
    AlreadyMatched { swipe: SwipeRecord, match_record: MatchRecord },
}

impl SwipeOutcome {
    pub fn is_match(&self) -> bool {
        !matches!(self, SwipeOutcome::Recorded(_))
    }

    pub fn match_record(&self) -> Option<&MatchRecord> {
        match self {
            SwipeOutcome::Recorded(_) => None,
            SwipeOutcome::NewMatch { match_record, .. } | SwipeOutcome::AlreadyMatched { match_record, .. } => {
                Some(match_record)
            },
        }
    }

    pub fn swipe(&self) -> &SwipeRecord {
        match self {
            SwipeOutcome::Recorded(swipe) |
            SwipeOutcome::NewMatch { swipe, .. } |
            SwipeOutcome::AlreadyMatched { swipe, .. } => swipe,
        }
    }
}

//--------------------------------------    UndoOutcome      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct UndoOutcome {
    pub undone: SwipeRecord,
    /// Set when removing the swipe also dissolved a match.
    pub deleted_match: Option<MatchRecord>,
}

//--------------------------------------  TransactionType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Payment,
    Refund,
    Payout,
    Fee,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Payment => write!(f, "payment"),
            TransactionType::Refund => write!(f, "refund"),
            TransactionType::Payout => write!(f, "payout"),
            TransactionType::Fee => write!(f, "fee"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment" => Ok(Self::Payment),
            "refund" => Ok(Self::Refund),
            "payout" => Ok(Self::Payout),
            "fee" => Ok(Self::Fee),
            s => Err(ConversionError(format!("Invalid transaction type: {s}"))),
        }
    }
}

//--------------------------------------  TransactionStatus  ---------------------------------------------------------
/// Ledger entry lifecycle. Transitions are monotonic: `created` may move to
/// `captured` or `failed` exactly once; terminal states never change again
/// except for the reserved captured → refunded annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Created,
    Captured,
    Failed,
    Refunded,
    PaidOut,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Created => write!(f, "created"),
            TransactionStatus::Captured => write!(f, "captured"),
            TransactionStatus::Failed => write!(f, "failed"),
            TransactionStatus::Refunded => write!(f, "refunded"),
            TransactionStatus::PaidOut => write!(f, "paid_out"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "captured" => Ok(Self::Captured),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            "paid_out" => Ok(Self::PaidOut),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Created)
    }
}

//--------------------------------------     Transaction     ---------------------------------------------------------
/// One ledger entry. `amount` and `tx_type` never change after insertion;
/// `status` advances through the one-way machine above.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub tx_type: TransactionType,
    /// The paying user. Fee entries belong to the platform and carry no user.
    pub user_id: Option<UserId>,
    /// The counterparty being paid (or paid out).
    pub related_user_id: Option<UserId>,
    pub order_id: Option<OrderId>,
    pub payment_id: Option<String>,
    pub amount: Paise,
    pub currency: String,
    pub platform_fee: Paise,
    pub status: TransactionStatus,
    pub meta: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   NewPaymentOrder   ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPaymentOrder {
    pub payer_id: UserId,
    pub payee_id: UserId,
    pub amount: Paise,
    pub currency: String,
    pub meta: Option<Value>,
}

impl NewPaymentOrder {
    pub fn new(payer_id: UserId, payee_id: UserId, amount: Paise) -> Self {
        Self { payer_id, payee_id, amount, currency: INR_CURRENCY_CODE.to_string(), meta: None }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

//--------------------------------------       Wallet        ---------------------------------------------------------
/// Per-user balance. Only ever mutated through atomic increments and
/// conditional decrements, so the balance always equals the sum of its ledger.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Wallet {
    pub id: i64,
    pub user_id: UserId,
    pub balance: Paise,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------  WalletLedgerEntry  ---------------------------------------------------------
/// Append-only linkage of a wallet mutation to the ledger entry that caused it. Credits are positive paise,
/// debits negative; the running sum over a wallet's entries equals its balance whenever no payout is in flight.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WalletLedgerEntry {
    pub id: i64,
    pub wallet_id: i64,
    pub transaction_id: i64,
    pub amount: Paise,
    pub balance_after: Paise,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     PayoutStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Created,
    Processed,
    Failed,
}

impl Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::Created => write!(f, "created"),
            PayoutStatus::Processed => write!(f, "processed"),
            PayoutStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PayoutStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payout status: {s}"))),
        }
    }
}

//--------------------------------------       Payout        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payout {
    pub id: i64,
    pub user_id: UserId,
    pub amount: Paise,
    pub currency: String,
    pub status: PayoutStatus,
    pub payrail_payout_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Message       ---------------------------------------------------------
/// Append-only chat message. Never mutated once stored.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: i64,
    pub match_id: Option<i64>,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: String,
    pub match_id: Option<i64>,
}

//--------------------------------------  NotificationKind   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Match,
    Message,
    SwipeLike,
    System,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Match => write!(f, "match"),
            NotificationKind::Message => write!(f, "message"),
            NotificationKind::SwipeLike => write!(f, "swipe_like"),
            NotificationKind::System => write!(f, "system"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "match" => Ok(Self::Match),
            "message" => Ok(Self::Message),
            "swipe_like" => Ok(Self::SwipeLike),
            "system" => Ok(Self::System),
            s => Err(ConversionError(format!("Invalid notification kind: {s}"))),
        }
    }
}

//--------------------------------------    Notification     ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: UserId,
    pub sender_id: Option<UserId>,
    pub kind: NotificationKind,
    pub body: Option<String>,
    pub meta: Option<Json<Value>>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub sender_id: Option<UserId>,
    pub kind: NotificationKind,
    pub body: Option<String>,
    pub meta: Option<Value>,
}

impl NewNotification {
    pub fn new(user_id: UserId, kind: NotificationKind) -> Self {
        Self { user_id, sender_id: None, kind, body: None, meta: None }
    }

    pub fn from_sender(mut self, sender_id: UserId) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    pub fn with_body<S: Into<String>>(mut self, body: S) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

//--------------------------------------     UserProfile     ---------------------------------------------------------
/// The slice of a profile the explore feed needs. Skills are stored as
/// comma-separated lowercase tags.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub skills_offered: String,
    pub skills_wanted: String,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn offered_tags(&self) -> Vec<&str> {
        split_tags(&self.skills_offered)
    }

    pub fn wanted_tags(&self) -> Vec<&str> {
        split_tags(&self.skills_wanted)
    }
}

fn split_tags(s: &str) -> Vec<&str> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty()).collect()
}

//--------------------------------------  ExploreCandidate   ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct ExploreCandidate {
    pub profile: UserProfile,
    /// Number of reciprocal skill overlaps with the requesting user.
    pub shared_skills: i64,
}

use chrono::{DateTime, TimeZone, Utc};
use matchpay_engine::{
    db_types::{
        ExploreCandidate,
        MatchRecord,
        Message,
        NewMessage,
        NewNotification,
        NewPaymentOrder,
        NewSwipe,
        Notification,
        OrderId,
        Payout,
        PayoutStatus,
        SwipeAction,
        SwipeOutcome,
        SwipeRecord,
        Transaction,
        TransactionStatus,
        TransactionType,
        UndoOutcome,
        UserId,
        UserProfile,
        Wallet,
    },
    traits::{
        CaptureOutcome,
        ChatApiError,
        ExploreApiError,
        ExploreManagement,
        FailureOutcome,
        GatewayError,
        MatchmakingDatabase,
        MatchmakingError,
        MessageManagement,
        NotificationApiError,
        NotificationManagement,
        PaymentRail,
        RailOrder,
        RailPayout,
        Settlement,
        SettlementDatabase,
        SettlementError,
    },
};
use mockall::mock;
use mp_common::{Paise, INR_CURRENCY_CODE};

mock! {
    pub SocialDb {}

    impl Clone for SocialDb {
        fn clone(&self) -> Self;
    }

    impl MatchmakingDatabase for SocialDb {
        fn url(&self) -> &str;
        async fn upsert_swipe(&self, swipe: NewSwipe) -> Result<SwipeOutcome, MatchmakingError>;
        async fn last_swipe(&self, swiper: &UserId) -> Result<Option<SwipeRecord>, MatchmakingError>;
        async fn undo_last_swipe(&self, swiper: &UserId) -> Result<UndoOutcome, MatchmakingError>;
        async fn swipes_by(&self, swiper: &UserId) -> Result<Vec<SwipeRecord>, MatchmakingError>;
        async fn swiped_ids_of(&self, swiper: &UserId) -> Result<Vec<UserId>, MatchmakingError>;
        async fn match_for_pair(&self, x: &UserId, y: &UserId) -> Result<Option<MatchRecord>, MatchmakingError>;
        async fn matches_for_user(&self, user: &UserId) -> Result<Vec<MatchRecord>, MatchmakingError>;
    }

    impl MessageManagement for SocialDb {
        async fn save_message(&self, message: NewMessage) -> Result<Message, ChatApiError>;
        async fn chat_history(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, ChatApiError>;
    }

    impl NotificationManagement for SocialDb {
        async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, NotificationApiError>;
        async fn notifications_for(&self, user: &UserId) -> Result<Vec<Notification>, NotificationApiError>;
        async fn mark_as_read(&self, id: i64) -> Result<Notification, NotificationApiError>;
        async fn clear_notifications(&self, user: &UserId) -> Result<u64, NotificationApiError>;
    }

    impl ExploreManagement for SocialDb {
        async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), ExploreApiError>;
        async fn fetch_profile(&self, id: &UserId) -> Result<Option<UserProfile>, ExploreApiError>;
        async fn candidates_for(&self, user: &UserId, limit: i64) -> Result<Vec<ExploreCandidate>, ExploreApiError>;
    }
}

mock! {
    pub LedgerDb {}

    impl Clone for LedgerDb {
        fn clone(&self) -> Self;
    }

    impl SettlementDatabase for LedgerDb {
        fn url(&self) -> &str;
        async fn insert_payment_order(&self, order: &NewPaymentOrder, order_id: &OrderId) -> Result<Transaction, SettlementError>;
        async fn fetch_transaction(&self, id: i64) -> Result<Option<Transaction>, SettlementError>;
        async fn fetch_transaction_by_order_id(&self, order_id: &OrderId) -> Result<Option<Transaction>, SettlementError>;
        async fn settle_capture(&self, order_id: &OrderId, payment_id: &str, fee_bps: i64) -> Result<CaptureOutcome, SettlementError>;
        async fn mark_payment_failed(&self, order_id: &OrderId) -> Result<FailureOutcome, SettlementError>;
        async fn fetch_or_create_wallet(&self, user: &UserId) -> Result<Wallet, SettlementError>;
        async fn credit_wallet(&self, user: &UserId, amount: Paise) -> Result<Wallet, SettlementError>;
        async fn debit_wallet(&self, user: &UserId, amount: Paise) -> Result<Wallet, SettlementError>;
        async fn insert_payout(&self, user: &UserId, amount: Paise) -> Result<Payout, SettlementError>;
        async fn finalize_payout(&self, payout_id: i64, rail_payout_id: &str) -> Result<Payout, SettlementError>;
        async fn fail_payout(&self, payout_id: i64) -> Result<Payout, SettlementError>;
        async fn ledger_for_user(&self, user: &UserId, limit: i64) -> Result<Vec<Transaction>, SettlementError>;
    }

    impl NotificationManagement for LedgerDb {
        async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, NotificationApiError>;
        async fn notifications_for(&self, user: &UserId) -> Result<Vec<Notification>, NotificationApiError>;
        async fn mark_as_read(&self, id: i64) -> Result<Notification, NotificationApiError>;
        async fn clear_notifications(&self, user: &UserId) -> Result<u64, NotificationApiError>;
    }
}

mock! {
    pub Rail {}

    impl PaymentRail for Rail {
        async fn create_order(&self, amount: Paise, currency: &str, receipt: &str) -> Result<RailOrder, GatewayError>;
        async fn send_payout(&self, amount: Paise, currency: &str, reference: &str) -> Result<RailPayout, GatewayError>;
    }
}

//------------------------------------------  Fixture builders  ------------------------------------------------

pub fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 7, 10, 30, 0).unwrap()
}

pub fn swipe_record(id: i64, swiper: &UserId, swiped: &UserId, action: SwipeAction) -> SwipeRecord {
    SwipeRecord {
        id,
        swiper_id: swiper.clone(),
        swiped_id: swiped.clone(),
        action,
        match_score: 0,
        created_at: test_time(),
        updated_at: test_time(),
    }
}

pub fn match_record(id: i64, a: &str, b: &str) -> MatchRecord {
    MatchRecord {
        id,
        user_a: UserId::from(a),
        user_b: UserId::from(b),
        chat_room_id: format!("room_9f3aa3dd{id:04}"),
        matched_at: test_time(),
    }
}

pub fn notification_from(n: NewNotification) -> Notification {
    Notification {
        id: 1,
        user_id: n.user_id,
        sender_id: n.sender_id,
        kind: n.kind,
        body: n.body,
        meta: None,
        is_read: false,
        created_at: test_time(),
    }
}

pub fn created_transaction(id: i64, order: &NewPaymentOrder, order_id: &OrderId) -> Transaction {
    Transaction {
        id,
        tx_type: TransactionType::Payment,
        user_id: Some(order.payer_id.clone()),
        related_user_id: Some(order.payee_id.clone()),
        order_id: Some(order_id.clone()),
        payment_id: None,
        amount: order.amount,
        currency: order.currency.clone(),
        platform_fee: Paise::from(0),
        status: TransactionStatus::Created,
        meta: None,
        created_at: test_time(),
        updated_at: test_time(),
    }
}

/// A `payment.captured` settlement at 250 bps, the fee rate the payment tests configure.
pub fn settlement_for(order_id: &OrderId, payment_id: &str, amount: i64) -> Settlement {
    let fee = amount * 250 / 10_000;
    let transaction = Transaction {
        id: 1,
        tx_type: TransactionType::Payment,
        user_id: Some(UserId::from("alice")),
        related_user_id: Some(UserId::from("bob")),
        order_id: Some(order_id.clone()),
        payment_id: Some(payment_id.to_string()),
        amount: Paise::from(amount),
        currency: INR_CURRENCY_CODE.to_string(),
        platform_fee: Paise::from(fee),
        status: TransactionStatus::Captured,
        meta: None,
        created_at: test_time(),
        updated_at: test_time(),
    };
    Settlement {
        transaction,
        platform_fee: Paise::from(fee),
        payee_amount: Paise::from(amount - fee),
        wallet_balance: Paise::from(amount - fee),
    }
}

pub fn failed_transaction(order_id: &OrderId) -> Transaction {
    Transaction {
        id: 1,
        tx_type: TransactionType::Payment,
        user_id: Some(UserId::from("alice")),
        related_user_id: Some(UserId::from("bob")),
        order_id: Some(order_id.clone()),
        payment_id: None,
        amount: Paise::from(50_000),
        currency: INR_CURRENCY_CODE.to_string(),
        platform_fee: Paise::from(0),
        status: TransactionStatus::Failed,
        meta: None,
        created_at: test_time(),
        updated_at: test_time(),
    }
}

pub fn wallet_for(user: &UserId, balance: i64) -> Wallet {
    Wallet {
        id: 1,
        user_id: user.clone(),
        balance: Paise::from(balance),
        currency: INR_CURRENCY_CODE.to_string(),
        created_at: test_time(),
        updated_at: test_time(),
    }
}

pub fn payout_for(id: i64, user: &UserId, amount: Paise, status: PayoutStatus) -> Payout {
    let payrail_payout_id = match status {
        PayoutStatus::Processed => Some(format!("pout_Fz9T{id:04}")),
        _ => None,
    };
    Payout {
        id,
        user_id: user.clone(),
        amount,
        currency: INR_CURRENCY_CODE.to_string(),
        status,
        payrail_payout_id,
        created_at: test_time(),
        updated_at: test_time(),
    }
}

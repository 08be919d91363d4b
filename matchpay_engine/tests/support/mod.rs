use log::*;
use matchpay_engine::{
    db_types::{NewSwipe, SwipeAction, UserId, UserProfile},
    traits::{ExploreManagement, GatewayError, MatchmakingDatabase, PaymentRail, RailOrder, RailPayout},
    SqliteDatabase,
};
use mp_common::Paise;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    format!("sqlite://../data/test_store_{}", rand::random::<u64>())
}

/// Drops, recreates and migrates a scratch database, returning a connected backend.
pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database")
}

async fn create_database(path: &str) {
    if let Err(e) = Sqlite::drop_database(path).await {
        warn!("Error dropping database {path}: {e:?}");
    }
    Sqlite::create_database(path).await.expect("Error creating database");
    info!("Created Sqlite database {path}");
}

async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

#[allow(dead_code)]
pub fn right(swiper: &str, swiped: &str) -> NewSwipe {
    NewSwipe::new(UserId::from(swiper), UserId::from(swiped), SwipeAction::Right)
}

#[allow(dead_code)]
pub fn left(swiper: &str, swiped: &str) -> NewSwipe {
    NewSwipe::new(UserId::from(swiper), UserId::from(swiped), SwipeAction::Left)
}

#[allow(dead_code)]
pub async fn seed_profile(db: &SqliteDatabase, id: &str, name: &str, offered: &str, wanted: &str) {
    let profile = UserProfile {
        id: UserId::from(id),
        display_name: name.to_string(),
        skills_offered: offered.to_string(),
        skills_wanted: wanted.to_string(),
        created_at: chrono::Utc::now(),
    };
    db.upsert_profile(&profile).await.expect("Error seeding profile");
}

/// Completes the (a, b) pair so that the second swipe creates the match.
#[allow(dead_code)]
pub async fn make_match(db: &SqliteDatabase, a: &str, b: &str) {
    db.upsert_swipe(right(a, b)).await.expect("Error recording first swipe");
    let outcome = db.upsert_swipe(right(b, a)).await.expect("Error recording second swipe");
    assert!(outcome.is_match(), "Pair ({a}, {b}) should have matched");
}

/// A scripted stand-in for the payment gateway. Order and payout ids are deterministic per instance, and
/// payouts can be told to bounce.
#[allow(dead_code)]
#[derive(Clone, Debug, Default)]
pub struct TestRail {
    pub fail_payouts: bool,
    counter: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

#[allow(dead_code)]
impl TestRail {
    pub fn rejecting_payouts() -> Self {
        Self { fail_payouts: true, ..Self::default() }
    }
}

impl PaymentRail for TestRail {
    async fn create_order(&self, amount: Paise, currency: &str, _receipt: &str) -> Result<RailOrder, GatewayError> {
        let n = self.counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(RailOrder {
            id: format!("order_test{n:04}").parse().unwrap(),
            amount,
            currency: currency.to_string(),
            status: "created".to_string(),
        })
    }

    async fn send_payout(&self, _amount: Paise, _currency: &str, reference: &str) -> Result<RailPayout, GatewayError> {
        if self.fail_payouts {
            return Err(GatewayError::Rejected { status: 400, message: "payout rejected by test rail".to_string() });
        }
        Ok(RailPayout { id: format!("pout_{reference}"), status: "processed".to_string() })
    }
}

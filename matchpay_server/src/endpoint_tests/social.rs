use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Duration;
use matchpay_engine::{
    db_types::{Message, SwipeAction, SwipeOutcome, UndoOutcome, UserId},
    events::EventProducers,
    traits::MatchmakingError,
    ChatApi,
    MatchmakingApi,
};
use serde_json::json;

use super::{
    helpers::{issue_token, post_request},
    mocks::{match_record, notification_from, swipe_record, test_time, MockSocialDb},
};
use crate::routes::{SendChatMessageRoute, SwipeRoute, UndoSwipeRoute};

#[actix_web::test]
async fn mutual_right_swipe_reports_the_match() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let body = json!({ "swiped_user_id": "bob", "action": "right" });
    let (status, body) = post_request(&token, "/swipe", &body, configure_new_match).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""outcome":"new_match""#), "was: {body}");
    assert!(body.contains("room_9f3aa3dd0007"), "was: {body}");
}

#[actix_web::test]
async fn left_swipe_is_just_recorded() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let body = json!({ "swiped_user_id": "bob", "action": "left" });
    let (status, body) = post_request(&token, "/swipe", &body, configure_recorded).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""outcome":"recorded""#), "was: {body}");
    assert!(!body.contains("match_record"), "was: {body}");
}

#[actix_web::test]
async fn swiping_yourself_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let body = json!({ "swiped_user_id": "alice", "action": "right" });
    let (status, body) = post_request(&token, "/swipe", &body, configure_self_swipe).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Users cannot swipe on themselves"), "was: {body}");
}

#[actix_web::test]
async fn undo_with_no_swipes_is_a_404() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let (status, body) =
        post_request(&token, "/swipe/undo", &json!({}), configure_nothing_to_undo).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No swipe found to undo"), "was: {body}");
}

#[actix_web::test]
async fn undo_dissolves_the_match_the_swipe_completed() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let (status, body) =
        post_request(&token, "/swipe/undo", &json!({}), configure_undo_match).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("deleted_match"), "was: {body}");
    assert!(body.contains("room_9f3aa3dd0007"), "was: {body}");
}

#[actix_web::test]
async fn chat_requires_a_match() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let body = json!({ "body": "hey there" });
    let (status, body) =
        post_request(&token, "/chat/bob", &body, configure_unmatched_chat).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("are not matched"), "was: {body}");
}

#[actix_web::test]
async fn chat_between_matched_users_delivers() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Duration::hours(1));
    let body = json!({ "body": "see you at the session" });
    let (status, body) =
        post_request(&token, "/chat/bob", &body, configure_matched_chat).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("see you at the session"), "was: {body}");
    assert!(body.contains(r#""match_id":7"#), "was: {body}");
}

fn configure_new_match(cfg: &mut ServiceConfig) {
    let mut db = MockSocialDb::new();
    db.expect_upsert_swipe().returning(|swipe| {
        let record = swipe_record(1, &swipe.swiper_id, &swipe.swiped_id, swipe.action);
        let m = match_record(7, swipe.swiper_id.as_str(), swipe.swiped_id.as_str());
        Ok(SwipeOutcome::NewMatch { swipe: record, match_record: m })
    });
    // One inbox entry per half of the pair
    db.expect_insert_notification().times(2).returning(|n| Ok(notification_from(n)));
    register_matchmaking(cfg, db);
}

fn configure_recorded(cfg: &mut ServiceConfig) {
    let mut db = MockSocialDb::new();
    db.expect_upsert_swipe().returning(|swipe| {
        Ok(SwipeOutcome::Recorded(swipe_record(1, &swipe.swiper_id, &swipe.swiped_id, swipe.action)))
    });
    register_matchmaking(cfg, db);
}

fn configure_self_swipe(cfg: &mut ServiceConfig) {
    let mut db = MockSocialDb::new();
    db.expect_upsert_swipe().returning(|_| Err(MatchmakingError::SelfSwipe));
    register_matchmaking(cfg, db);
}

fn configure_nothing_to_undo(cfg: &mut ServiceConfig) {
    let mut db = MockSocialDb::new();
    db.expect_undo_last_swipe().returning(|user| Err(MatchmakingError::NothingToUndo(user.clone())));
    register_matchmaking(cfg, db);
}

fn configure_undo_match(cfg: &mut ServiceConfig) {
    let mut db = MockSocialDb::new();
    db.expect_undo_last_swipe().returning(|user| {
        let undone = swipe_record(1, user, &UserId::from("bob"), SwipeAction::Right);
        Ok(UndoOutcome { undone, deleted_match: Some(match_record(7, user.as_str(), "bob")) })
    });
    register_matchmaking(cfg, db);
}

fn configure_unmatched_chat(cfg: &mut ServiceConfig) {
    let mut db = MockSocialDb::new();
    db.expect_match_for_pair().returning(|_, _| Ok(None));
    register_chat(cfg, db);
}

fn configure_matched_chat(cfg: &mut ServiceConfig) {
    let mut db = MockSocialDb::new();
    db.expect_match_for_pair().returning(|a, b| Ok(Some(match_record(7, a.as_str(), b.as_str()))));
    db.expect_save_message().returning(|m| {
        Ok(Message {
            id: 11,
            match_id: m.match_id,
            sender_id: m.sender_id,
            receiver_id: m.receiver_id,
            body: m.body,
            created_at: test_time(),
        })
    });
    db.expect_insert_notification().times(1).returning(|n| Ok(notification_from(n)));
    register_chat(cfg, db);
}

fn register_matchmaking(cfg: &mut ServiceConfig, db: MockSocialDb) {
    let matchmaking_api = MatchmakingApi::new(db, EventProducers::default());
    cfg.service(SwipeRoute::<MockSocialDb>::new())
        .service(UndoSwipeRoute::<MockSocialDb>::new())
        .app_data(web::Data::new(matchmaking_api));
}

fn register_chat(cfg: &mut ServiceConfig, db: MockSocialDb) {
    let chat_api = ChatApi::new(db, EventProducers::default());
    cfg.service(SendChatMessageRoute::<MockSocialDb>::new()).app_data(web::Data::new(chat_api));
}

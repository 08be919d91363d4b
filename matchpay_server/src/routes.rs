//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers must never block the worker thread: anything long and non-cpu-bound (I/O, database calls, the
//! payment gateway) has to be awaited, so that the worker can interleave other requests while it waits.
use std::sync::Arc;

use actix_web::{get, web, HttpResponse, Responder};
use futures::stream;
use log::*;
use matchpay_engine::{
    db_types::{NewPaymentOrder, NewSwipe, UserId},
    relay::{ConnectionId, PresenceRelay},
    traits::{
        ExploreManagement,
        MatchmakingDatabase,
        MessageManagement,
        NotificationManagement,
        PaymentRail,
        SettlementDatabase,
    },
    ChatApi,
    ExploreApi,
    MatchmakingApi,
    NotificationsApi,
    SettlementApi,
};

use crate::{
    auth::JwtClaims,
    data_objects::{
        ExploreParams,
        JsonResponse,
        NewOrderRequest,
        PaymentBreakdown,
        PayoutRequest,
        SendMessageRequest,
        SwipeRequest,
        SwipeResponse,
        UndoResponse,
        VerifyPaymentRequest,
        WalletResponse,
    },
    errors::ServerError,
};

/// How many ledger entries the wallet endpoint returns.
const WALLET_LEDGER_PAGE_SIZE: i64 = 50;

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where rail $rail:ty) => {
        paste::paste! { pub struct [<$name:camel Route>]<B, R>(core::marker::PhantomData<fn() -> (B, R)>);}
        paste::paste! { impl<B, R> [<$name:camel Route>]<B, R> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> (B, R)>)
            }
        }}
        paste::paste! { impl<B, R> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B, R>
        where
            B: $($bounds +)+ 'static,
            R: $rail + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B, R>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Swipes  ----------------------------------------------------
route!(swipe => Post "/swipe" impl MatchmakingDatabase, NotificationManagement);
/// Records a swipe decision for the caller and reports whether it completed a match.
///
/// Swiping the same user again replaces the previous decision. A mutual right-swipe returns the match record;
/// replaying it returns the same record with an `already_matched` outcome.
pub async fn swipe<B>(
    claims: JwtClaims,
    body: web::Json<SwipeRequest>,
    api: web::Data<MatchmakingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MatchmakingDatabase + NotificationManagement,
{
    let SwipeRequest { swiped_user_id, action, match_score } = body.into_inner();
    debug!("💻️ POST swipe: {} swipes {action} on {swiped_user_id}", claims.sub);
    let swipe = NewSwipe::new(claims.sub, swiped_user_id, action).with_score(match_score);
    let outcome = api.process_swipe(swipe).await?;
    Ok(HttpResponse::Ok().json(SwipeResponse::from(outcome)))
}

route!(undo_swipe => Post "/swipe/undo" impl MatchmakingDatabase, NotificationManagement);
pub async fn undo_swipe<B>(
    claims: JwtClaims,
    api: web::Data<MatchmakingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MatchmakingDatabase + NotificationManagement,
{
    debug!("💻️ POST undo_swipe for {}", claims.sub);
    let outcome = api.undo_last_swipe(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(UndoResponse::from(outcome)))
}

route!(my_swipes => Get "/swipes" impl MatchmakingDatabase, NotificationManagement);
pub async fn my_swipes<B>(
    claims: JwtClaims,
    api: web::Data<MatchmakingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MatchmakingDatabase + NotificationManagement,
{
    debug!("💻️ GET my_swipes for {}", claims.sub);
    let swipes = api.swipes_by(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(swipes))
}

route!(my_matches => Get "/matches" impl MatchmakingDatabase, NotificationManagement);
pub async fn my_matches<B>(
    claims: JwtClaims,
    api: web::Data<MatchmakingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MatchmakingDatabase + NotificationManagement,
{
    debug!("💻️ GET my_matches for {}", claims.sub);
    let matches = api.matches_for(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(matches))
}

//----------------------------------------------   Explore  ----------------------------------------------------
route!(explore => Get "/explore" impl ExploreManagement);
/// Candidate profiles for the caller: everyone they haven't swiped on yet whose skill tags overlap with theirs.
pub async fn explore<B: ExploreManagement>(
    claims: JwtClaims,
    params: web::Query<ExploreParams>,
    api: web::Data<ExploreApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET explore for {}", claims.sub);
    let candidates = api.candidates(&claims.sub, params.limit).await?;
    Ok(HttpResponse::Ok().json(candidates))
}

//----------------------------------------------    Chat    ----------------------------------------------------
route!(chat_history => Get "/chat/{user_id}" impl MessageManagement, MatchmakingDatabase, NotificationManagement);
pub async fn chat_history<B>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MessageManagement + MatchmakingDatabase + NotificationManagement,
{
    let other = UserId::from(path.into_inner());
    debug!("💻️ GET chat_history between {} and {other}", claims.sub);
    let messages = api.history(&claims.sub, &other).await?;
    Ok(HttpResponse::Ok().json(messages))
}

route!(send_chat_message => Post "/chat/{user_id}" impl MessageManagement, MatchmakingDatabase, NotificationManagement);
/// Sends a message to a matched user. Messages between unmatched pairs are refused.
pub async fn send_chat_message<B>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<SendMessageRequest>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MessageManagement + MatchmakingDatabase + NotificationManagement,
{
    let receiver = UserId::from(path.into_inner());
    debug!("💻️ POST send_chat_message from {} to {receiver}", claims.sub);
    let message = api.send_message(&claims.sub, &receiver, &body.body).await?;
    Ok(HttpResponse::Ok().json(message))
}

//-------------------------------------------  Notifications  -------------------------------------------------
route!(my_notifications => Get "/notifications" impl NotificationManagement);
pub async fn my_notifications<B: NotificationManagement>(
    claims: JwtClaims,
    api: web::Data<NotificationsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_notifications for {}", claims.sub);
    let notifications = api.inbox(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

route!(mark_notification_read => Post "/notifications/{id}/read" impl NotificationManagement);
// TODO: scope the read flip to the caller once NotificationManagement can filter by user
pub async fn mark_notification_read<B: NotificationManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<NotificationsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST mark_notification_read {id} for {}", claims.sub);
    let notification = api.mark_as_read(id).await?;
    Ok(HttpResponse::Ok().json(notification))
}

route!(clear_notifications => Delete "/notifications" impl NotificationManagement);
pub async fn clear_notifications<B: NotificationManagement>(
    claims: JwtClaims,
    api: web::Data<NotificationsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ DELETE clear_notifications for {}", claims.sub);
    let removed = api.clear(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Cleared {removed} notifications."))))
}

//----------------------------------------------  Payments  ----------------------------------------------------
route!(create_payment_order => Post "/payments/order" impl SettlementDatabase, NotificationManagement where rail PaymentRail);
/// Creates a payment order on the gateway and records the `created` ledger entry.
///
/// The gateway call comes first; if it fails, no local state is left behind and the client sees a 502.
pub async fn create_payment_order<B, R>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<SettlementApi<B, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + NotificationManagement,
    R: PaymentRail,
{
    let NewOrderRequest { amount, payee_id, meta } = body.into_inner();
    debug!("💻️ POST create_payment_order: {} pays {amount} to {payee_id}", claims.sub);
    let mut order = NewPaymentOrder::new(claims.sub, payee_id, amount);
    if let Some(meta) = meta {
        order = order.with_meta(meta);
    }
    let created = api.create_order(order).await?;
    Ok(HttpResponse::Ok().json(created))
}

route!(verify_payment => Post "/payments/verify" impl SettlementDatabase, NotificationManagement where rail PaymentRail);
/// Settles a client-reported payment completion.
///
/// The request carries the gateway's signature over `order_id|payment_id`; a bad signature marks the payment
/// failed and returns 400. A valid one drives the idempotent capture, so replays are safe.
pub async fn verify_payment<B, R>(
    claims: JwtClaims,
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<SettlementApi<B, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + NotificationManagement,
    R: PaymentRail,
{
    let VerifyPaymentRequest { order_id, payment_id, signature } = body.into_inner();
    debug!("💻️ POST verify_payment for order {order_id} by {}", claims.sub);
    let outcome = api.verify_and_capture(&order_id, &payment_id, &signature).await?;
    Ok(HttpResponse::Ok().json(PaymentBreakdown::from(outcome)))
}

route!(request_payout => Post "/payments/payout" impl SettlementDatabase, NotificationManagement where rail PaymentRail);
/// Pays out settled funds to the caller. The amount is debited up front (conditionally, so an overdraw is a
/// clean 400) and reversed if the gateway rejects the payout.
pub async fn request_payout<B, R>(
    claims: JwtClaims,
    body: web::Json<PayoutRequest>,
    api: web::Data<SettlementApi<B, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + NotificationManagement,
    R: PaymentRail,
{
    let amount = body.into_inner().amount;
    debug!("💻️ POST request_payout of {amount} for {}", claims.sub);
    let payout = api.request_payout(&claims.sub, amount).await?;
    Ok(HttpResponse::Ok().json(payout))
}

route!(my_wallet => Get "/wallet" impl SettlementDatabase, NotificationManagement where rail PaymentRail);
pub async fn my_wallet<B, R>(
    claims: JwtClaims,
    api: web::Data<SettlementApi<B, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + NotificationManagement,
    R: PaymentRail,
{
    debug!("💻️ GET my_wallet for {}", claims.sub);
    let wallet = api.wallet(&claims.sub).await?;
    let ledger = api.ledger(&claims.sub, WALLET_LEDGER_PAGE_SIZE).await?;
    Ok(HttpResponse::Ok().json(WalletResponse { user_id: claims.sub, wallet, ledger }))
}

//----------------------------------------------    Live    ----------------------------------------------------
/// Opens a server-sent-events stream of the caller's live frames (matches, messages, settlements).
///
/// Joining registers the caller with the presence relay; a second connection from the same user replaces the
/// first. The relay session ends when the client disconnects and the stream is dropped.
#[get("/live")]
pub async fn live(claims: JwtClaims, relay: web::Data<PresenceRelay>) -> HttpResponse {
    let user = claims.sub;
    info!("🔌️ {user} opened a live event stream");
    let relay = relay.into_inner();
    let session = relay.join(user);
    let guard = SessionGuard { relay, conn_id: session.conn_id };
    let stream = stream::unfold((session.frames, guard), |(mut frames, guard)| async move {
        let frame = frames.recv().await?;
        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                warn!("🔌️ Could not serialize live frame. {e}");
                return None;
            },
        };
        let bytes = web::Bytes::from(format!("data: {json}\n\n"));
        Some((Ok::<_, ServerError>(bytes), (frames, guard)))
    });
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

/// Leaves the relay when the response stream is dropped, however the connection ended.
struct SessionGuard {
    relay: Arc<PresenceRelay>,
    conn_id: ConnectionId,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(user) = self.relay.leave(self.conn_id) {
            info!("🔌️ {user} closed their live event stream");
        }
    }
}

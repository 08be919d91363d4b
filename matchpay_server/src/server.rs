use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use matchpay_engine::{
    events::EventHandlers,
    relay::PresenceRelay,
    ChatApi,
    ExploreApi,
    MatchmakingApi,
    NotificationsApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::{
        notifier::{live_delivery_hooks, RELAY_EVENT_BUFFER_SIZE},
        payrail::PayrailRail,
    },
    middleware::HmacMiddlewareFactory,
    routes::{
        health,
        live,
        ChatHistoryRoute,
        ClearNotificationsRoute,
        CreatePaymentOrderRoute,
        ExploreRoute,
        MarkNotificationReadRoute,
        MyMatchesRoute,
        MyNotificationsRoute,
        MySwipesRoute,
        MyWalletRoute,
        RequestPayoutRoute,
        SendChatMessageRoute,
        SwipeRoute,
        UndoSwipeRoute,
        VerifyPaymentRoute,
    },
    webhook_routes::{PayrailWebhookRoute, PAYRAIL_SIGNATURE_HEADER},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    // The relay and the event dispatchers are shared across all workers; the per-worker closures only clone
    // handles to them.
    let relay = Arc::new(PresenceRelay::new());
    let handlers = EventHandlers::new(RELAY_EVENT_BUFFER_SIZE, live_delivery_hooks(Arc::clone(&relay)));
    let producers = handlers.producers();
    tokio::spawn(handlers.start_handlers());
    let rail = PayrailRail::try_new(config.payrail.payrail_api_config())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let options = ServerOptions::from_config(&config);
    let shutdown_grace = config.shutdown_grace.num_seconds().max(0) as u64;
    let srv = HttpServer::new(move || {
        let matchmaking_api = MatchmakingApi::new(db.clone(), producers.clone());
        let chat_api = ChatApi::new(db.clone(), producers.clone());
        let explore_api = ExploreApi::new(db.clone());
        let notifications_api = NotificationsApi::new(db.clone());
        let settlement_api = SettlementApi::new(
            db.clone(),
            rail.clone(),
            config.payrail.key_secret.clone(),
            config.fee_bps,
            producers.clone(),
        );
        let token_issuer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mps::access_log"))
            .app_data(web::Data::new(matchmaking_api))
            .app_data(web::Data::new(chat_api))
            .app_data(web::Data::new(explore_api))
            .app_data(web::Data::new(notifications_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(token_issuer))
            .app_data(web::Data::new(options))
            .app_data(web::Data::from(Arc::clone(&relay)));
        // Routes that require authentication
        let api_scope = web::scope("/api")
            .service(SwipeRoute::<SqliteDatabase>::new())
            .service(UndoSwipeRoute::<SqliteDatabase>::new())
            .service(MySwipesRoute::<SqliteDatabase>::new())
            .service(MyMatchesRoute::<SqliteDatabase>::new())
            .service(ExploreRoute::<SqliteDatabase>::new())
            .service(ChatHistoryRoute::<SqliteDatabase>::new())
            .service(SendChatMessageRoute::<SqliteDatabase>::new())
            .service(MyNotificationsRoute::<SqliteDatabase>::new())
            .service(MarkNotificationReadRoute::<SqliteDatabase>::new())
            .service(ClearNotificationsRoute::<SqliteDatabase>::new())
            .service(CreatePaymentOrderRoute::<SqliteDatabase, PayrailRail>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, PayrailRail>::new())
            .service(RequestPayoutRoute::<SqliteDatabase, PayrailRail>::new())
            .service(MyWalletRoute::<SqliteDatabase, PayrailRail>::new());
        // The webhook endpoint is open but every delivery must carry a valid gateway signature
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(
                PAYRAIL_SIGNATURE_HEADER,
                config.payrail.webhook_secret.clone(),
                config.payrail.hmac_checks,
            ))
            .service(PayrailWebhookRoute::<SqliteDatabase, PayrailRail>::new());
        app.service(health).service(live).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .shutdown_timeout(shutdown_grace)
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

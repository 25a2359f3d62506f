use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post, put};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::services::notify::{ChatProvider, NoopChatProvider, TelegramChatProvider};
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let chat: Box<dyn ChatProvider> =
        if config.telegram_bot_token.is_empty() || config.telegram_chat_id.is_empty() {
            tracing::info!("telegram credentials not set, chat notifications disabled");
            Box::new(NoopChatProvider)
        } else {
            tracing::info!("using Telegram chat notifications");
            Box::new(TelegramChatProvider::new(
                config.telegram_bot_token.clone(),
                config.telegram_chat_id.clone(),
            ))
        };

    let (notify_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        chat,
        notify_tx,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/slots", get(handlers::public::get_available_slots))
        .route("/api/services", get(handlers::public::get_services))
        .route("/api/offers/active", get(handlers::public::get_active_offer))
        .route("/api/bookings", post(handlers::public::create_booking))
        .route("/api/visits", post(handlers::public::record_visit))
        .route(
            "/api/admin/slots",
            get(handlers::admin::get_slots).post(handlers::admin::create_slot),
        )
        .route("/api/admin/slots/:id", delete(handlers::admin::delete_slot))
        .route(
            "/api/admin/bookings",
            get(handlers::admin::get_bookings).post(handlers::admin::create_booking),
        )
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .route("/api/admin/dashboard", get(handlers::admin::get_dashboard))
        .route("/api/admin/traffic", get(handlers::admin::get_traffic))
        .route(
            "/api/admin/services",
            get(handlers::admin::get_services).post(handlers::admin::create_service),
        )
        .route(
            "/api/admin/services/:id",
            put(handlers::admin::update_service).delete(handlers::admin::delete_service),
        )
        .route(
            "/api/admin/offers",
            get(handlers::admin::get_offers).post(handlers::admin::create_offer),
        )
        .route(
            "/api/admin/offers/:id/activate",
            post(handlers::admin::activate_offer),
        )
        .route(
            "/api/admin/offers/:id",
            delete(handlers::admin::delete_offer),
        )
        .route(
            "/api/admin/portfolio",
            get(handlers::admin::get_portfolio).post(handlers::admin::create_portfolio_item),
        )
        .route(
            "/api/admin/portfolio/:id",
            delete(handlers::admin::delete_portfolio_item),
        )
        .route(
            "/api/admin/settings",
            get(handlers::admin::get_settings).post(handlers::admin::update_settings),
        )
        .route(
            "/api/admin/notifications",
            get(handlers::notifications::get_notifications),
        )
        .route(
            "/api/admin/notifications/read-all",
            post(handlers::notifications::mark_all_read),
        )
        .route(
            "/api/admin/notifications/:id/read",
            post(handlers::notifications::mark_read),
        )
        .route(
            "/api/admin/notifications/stream",
            get(handlers::notifications::notifications_stream),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

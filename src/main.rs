//! tradeyard server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tradeyard::api;
use tradeyard::app_state::AppState;
use tradeyard::auth::AuthService;
use tradeyard::config::MarketConfig;
use tradeyard::domain::{EventBus, MarketStore};
use tradeyard::persistence::postgres::PostgresEventLog;
use tradeyard::service::{
    IdempotencyCache, ListingService, MessageService, TradeService, VehicleService,
};
use tradeyard::ws::ConnectionRegistry;
use tradeyard::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = MarketConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting tradeyard");

    // Build domain layer
    let store = Arc::new(MarketStore::new());
    let event_bus = EventBus::new(config.event_bus_capacity);
    let idempotency = Arc::new(IdempotencyCache::new(config.idempotency_window_secs));

    // Build service layer
    let trade_service = Arc::new(TradeService::new(
        Arc::clone(&store),
        event_bus.clone(),
        idempotency,
    ));
    let listing_service = Arc::new(ListingService::new(
        Arc::clone(&store),
        event_bus.clone(),
        config.renewal_cooldown_hours,
    ));
    let vehicle_service = Arc::new(VehicleService::new(Arc::clone(&store), event_bus.clone()));
    let message_service = Arc::new(MessageService::new(Arc::clone(&store), event_bus.clone()));
    let auth_service = Arc::new(AuthService::new());
    let connections = Arc::new(ConnectionRegistry::new());

    // Durable event log (optional)
    let mut event_log = None;
    if config.persistence_enabled {
        match connect_event_log(&config).await {
            Ok(log) => {
                spawn_event_log_tasks(log.clone(), &event_bus, &config);
                event_log = Some(Arc::new(log));
            }
            Err(err) => {
                tracing::warn!(%err, "event log unavailable, continuing without persistence");
            }
        }
    }

    // Build application state
    let app_state = AppState {
        store,
        trade_service,
        listing_service,
        vehicle_service,
        message_service,
        auth_service,
        event_bus,
        connections,
        event_log,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Connects the PostgreSQL pool for the durable event log.
async fn connect_event_log(config: &MarketConfig) -> Result<PostgresEventLog, sqlx::Error> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database_connect_timeout_secs,
        ))
        .connect(&config.database_url)
        .await?;
    Ok(PostgresEventLog::new(pool))
}

/// Spawns the event-log appender and the retention cleanup task.
fn spawn_event_log_tasks(event_log: PostgresEventLog, event_bus: &EventBus, config: &MarketConfig) {
    let mut rx = event_bus.subscribe();
    let appender_log = event_log.clone();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Some(subject_id) = event.subject_id() else {
                        continue;
                    };
                    let payload = match serde_json::to_value(&event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            tracing::warn!(%err, "event serialization failed, skipping");
                            continue;
                        }
                    };
                    if let Err(err) = appender_log
                        .save_event(subject_id, event.event_type_str(), &payload)
                        .await
                    {
                        tracing::warn!(%err, "event log append failed");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event log appender lagged behind bus");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let cleanup_after_days = config.cleanup_after_days;
    if cleanup_after_days > 0 {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
            loop {
                interval.tick().await;
                match event_log.delete_old_events(cleanup_after_days).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "old events cleaned up");
                    }
                    Ok(_) => {}
                    Err(err) => tracing::warn!(%err, "event cleanup failed"),
                }
            }
        });
    }
}

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{info, messages, tickets, tokens, users};
use crate::middleware::identity_middleware;

pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(info::root))
        .route("/health", get(health))
        // Token issuance
        .route(
            "/tokens/obtain/",
            post(tokens::obtain).fallback(info::unrecognized_method),
        )
        .route(
            "/tokens/refresh/",
            post(tokens::refresh).fallback(info::unrecognized_method),
        )
        // Users
        .route(
            "/users/",
            get(users::list)
                .post(users::create)
                .fallback(info::unrecognized_method),
        )
        .route(
            "/users/:user_id/",
            get(users::detail)
                .patch(users::update)
                .put(users::update)
                .delete(users::delete)
                .fallback(info::unrecognized_method),
        )
        // Tickets
        .route(
            "/tickets/",
            get(tickets::list)
                .post(tickets::create)
                .fallback(info::unrecognized_method),
        )
        .route(
            "/tickets/my/",
            get(tickets::list_own).fallback(info::unrecognized_method),
        )
        .route(
            "/tickets/:ticket_id/",
            get(tickets::detail)
                .patch(tickets::update)
                .put(tickets::update)
                .delete(tickets::delete)
                .fallback(info::unrecognized_method),
        )
        // Messages
        .route(
            "/tickets/:ticket_id/messages/",
            get(messages::list)
                .post(messages::create)
                .fallback(info::unrecognized_method),
        )
        .route(
            "/tickets/:ticket_id/messages/:message_id/",
            get(messages::detail)
                .patch(messages::update)
                .put(messages::update)
                .delete(messages::delete)
                .fallback(info::unrecognized_method),
        )
        // Unknown paths
        .fallback(info::unknown_route)
        // Global middleware
        .layer(axum_middleware::from_fn(identity_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve() {
    let config = crate::config::config();
    tracing::info!("Starting Support Desk API in {:?} mode", config.environment);

    // Collector resolution is a startup concern; deferred deletions are
    // dropped (and logged) until it succeeds.
    match crate::services::deletion::init_collector().await {
        Ok(id) => tracing::info!("collector account ready (id {id})"),
        Err(e) => tracing::warn!("collector resolution failed, retry via restart: {e}"),
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("DESK_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("Support Desk API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

use axum::{middleware, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use watch_pros_api::database;
use watch_pros_api::handlers;
use watch_pros_api::middleware as mw;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT secret, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = watch_pros_api::config::config();
    tracing::info!("Starting Watch Pros API in {:?} mode", config.environment);

    tracing_subscriber::fmt::init();

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("WATCHPROS_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("Watch Pros API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(browse_routes())
        // Protected API (any authenticated user)
        .merge(account_routes())
        // Seller-gated listing mutations
        .merge(seller_listing_routes())
        // Webhook receivers
        .merge(webhook_routes())
        // Global middleware
        .layer(axum::extract::DefaultBodyLimit::max(
            watch_pros_api::config::config().api.max_request_size_bytes,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn browse_routes() -> Router {
    use handlers::public::{listings, sellers};

    Router::new()
        // Marketplace browsing is public
        .route("/api/listings", get(listings::listing_list))
        .route("/api/listings/:id", get(listings::listing_get))
        .route("/api/sellers/:username", get(sellers::profile_get))
        .route("/api/sellers/:username/reviews", get(sellers::reviews_get))
}

fn account_routes() -> Router {
    use axum::routing::{delete, post};
    use handlers::protected::{
        billing, conversations, favorites, notifications, offers, reviews, searches, sellers,
        subscriptions,
    };

    Router::new()
        // Seller onboarding and profile
        .route("/api/sellers/register", post(sellers::register))
        .route(
            "/api/sellers/me",
            get(sellers::me_get).patch(sellers::me_patch),
        )
        // Favorites
        .route(
            "/api/favorites",
            get(favorites::favorite_list).post(favorites::favorite_post),
        )
        .route(
            "/api/favorites/:listing_id",
            delete(favorites::favorite_delete),
        )
        // Alert subscriptions (per listing or per model)
        .route(
            "/api/subscriptions",
            get(subscriptions::subscription_list).post(subscriptions::subscription_post),
        )
        .route(
            "/api/subscriptions/:id",
            delete(subscriptions::subscription_delete),
        )
        // Active searches
        .route(
            "/api/searches",
            get(searches::search_list).post(searches::search_post),
        )
        .route("/api/searches/:id", delete(searches::search_delete))
        // Messaging
        .route(
            "/api/conversations",
            get(conversations::conversation_list).post(conversations::conversation_post),
        )
        .route(
            "/api/conversations/:id/messages",
            get(conversations::message_list).post(conversations::message_post),
        )
        // Offers
        .route(
            "/api/offers",
            get(offers::offer_list).post(offers::offer_post),
        )
        .route("/api/offers/:id/accept", post(offers::offer_accept))
        .route("/api/offers/:id/decline", post(offers::offer_decline))
        // Reviews
        .route("/api/sellers/:username/reviews", post(reviews::review_post))
        // Notifications
        .route("/api/notifications", get(notifications::notification_list))
        .route(
            "/api/notifications/:id/read",
            post(notifications::notification_read),
        )
        // Billing state (read-only; written by the billing webhook)
        .route("/api/billing/subscription", get(billing::subscription_get))
        .route_layer(middleware::from_fn(mw::auth::jwt_auth_middleware))
}

fn seller_listing_routes() -> Router {
    use axum::routing::{patch, post};
    use handlers::protected::listings;

    Router::new()
        .route("/api/listings", post(listings::listing_post))
        .route(
            "/api/listings/:id",
            patch(listings::listing_patch).delete(listings::listing_delete),
        )
        // route_layer order: the layer added last runs first, so JWT auth
        // precedes the seller access chain
        .route_layer(middleware::from_fn(mw::access::seller_access_middleware))
        .route_layer(middleware::from_fn(mw::auth::jwt_auth_middleware))
}

fn webhook_routes() -> Router {
    use axum::routing::post;
    use handlers::webhooks;

    Router::new()
        .route("/webhooks/billing", post(webhooks::billing::billing_webhook))
        .route(
            "/webhooks/listings/created",
            post(webhooks::listings::listing_created),
        )
        .route(
            "/webhooks/listings/updated",
            post(webhooks::listings::listing_updated),
        )
        .route(
            "/webhooks/messages/created",
            post(webhooks::messages::message_created),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "data": {
            "name": "Watch Pros API",
            "version": version,
            "description": "B2B marketplace backend for professional watch dealers",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/register, /auth/login (public)",
                "listings": "/api/listings[/:id] (public read, seller write)",
                "sellers": "/api/sellers/:username (public), /api/sellers/me, /api/sellers/register (protected)",
                "favorites": "/api/favorites (protected)",
                "subscriptions": "/api/subscriptions (protected)",
                "searches": "/api/searches (protected)",
                "conversations": "/api/conversations (protected)",
                "offers": "/api/offers (protected)",
                "notifications": "/api/notifications (protected)",
                "billing": "/api/billing/subscription (protected)",
                "webhooks": "/webhooks/* (secret-authenticated)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
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

//! BookSwap Server - peer-to-peer book swapping marketplace
//!
//! REST API server for listing, exploring and swapping books.

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookswap_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{redis::RedisService, storage::UploadKind, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bookswap_server={},tower_http=debug", config.logging.level).into());
    let json_logs = config.logging.format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting BookSwap Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    // Redis only backs the geocoding cache; run without it when unreachable
    let redis_service = if config.redis.enabled {
        match RedisService::new(&config.redis.url).await {
            Ok(service) => {
                tracing::info!("Connected to Redis");
                Some(service)
            }
            Err(e) => {
                tracing::warn!("Redis unavailable, geocoding cache disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    if config.geocoding.api_key.is_empty() {
        tracing::warn!("No geocoding API key configured, location names will be unknown");
    }

    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config, redis_service)
        .await
        .context("Failed to create services")?;

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state)?;

    let addr = SocketAddr::new(
        server_host.parse().context("Invalid host address")?,
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins = origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid CORS origin")?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Create the application router with all routes
fn create_router(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.server.cors_origins)?;
    let storage = &state.services.storage;

    let api_routes = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/signup", post(api::auth::signup))
        .route("/auth/login", post(api::auth::login))
        // Profile
        .route(
            "/users/profile",
            get(api::users::get_profile).put(api::users::update_profile),
        )
        // Books
        .route("/books", post(api::books::add_book))
        .route("/books/my-books", get(api::books::my_books))
        .route("/books/explore", get(api::books::explore_books))
        .route(
            "/books/:id",
            get(api::books::get_book)
                .put(api::books::update_book)
                .delete(api::books::delete_book),
        )
        // Swap requests
        .route(
            "/swap-requests/book/:book_id",
            post(api::swap_requests::create_swap_request),
        )
        .route(
            "/swap-requests/:request_id",
            put(api::swap_requests::update_swap_request_status),
        )
        .route("/swap-requests/outgoing", get(api::swap_requests::outgoing_requests))
        .route("/swap-requests/incoming", get(api::swap_requests::incoming_requests))
        // Notifications
        .route("/notifications", get(api::notifications::list_notifications))
        .route("/notifications/unread-count", get(api::notifications::unread_count))
        .route("/notifications/:id/read", put(api::notifications::mark_as_read))
        .route("/notifications/mark-all-read", put(api::notifications::mark_all_as_read))
        // Files
        .route("/files/upload/book-photo", post(api::files::upload_book_photo))
        .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes))
        .with_state(state.clone());

    let uploads = [UploadKind::ProfilePicture, UploadKind::BookPhoto]
        .into_iter()
        .fold(Router::new(), |router, kind| {
            router.nest_service(
                &format!("/uploads/{}", kind.route_segment()),
                ServeDir::new(storage.dir(kind)),
            )
        });

    let openapi = api::openapi::create_openapi_router();

    Ok(Router::new()
        .nest("/api", api_routes)
        .merge(uploads)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

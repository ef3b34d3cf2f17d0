use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use parkbook::config::AppConfig;
use parkbook::db;
use parkbook::handlers;
use parkbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    db::seed_default_admin(
        &conn,
        &config.default_admin_username,
        &config.default_admin_password,
    )?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/signup", post(handlers::user::signup))
        .route("/api/login", post(handlers::user::login))
        .route("/api/user/dashboard", get(handlers::user::get_dashboard))
        .route("/api/user/reservations", post(handlers::user::book_spot))
        .route(
            "/api/user/reservations/:id/vacate",
            post(handlers::user::vacate_spot),
        )
        .route("/api/user/summary", get(handlers::user::get_summary))
        .route("/api/admin/dashboard", get(handlers::admin::get_dashboard))
        .route(
            "/api/admin/lots",
            post(handlers::admin::create_lot).get(handlers::admin::list_lots),
        )
        .route(
            "/api/admin/lots/:id",
            put(handlers::admin::update_lot).delete(handlers::admin::delete_lot),
        )
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route("/api/admin/summary", get(handlers::admin::get_summary))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

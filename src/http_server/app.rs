use std::sync::Arc;

use axum::{Router, http::HeaderValue, routing::get};
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    database::Database,
    http_server::{http_routes, state::AppState},
};

pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub database: Arc<Database>,
    /// Empty means any origin is allowed
    pub allowed_origins: Vec<String>,
}

async fn root() -> &'static str {
    "Music Library API"
}

fn cors_layer(allowed_origins: &[String]) -> color_eyre::Result<CorsLayer> {
    if allowed_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .wrap_err_with(|| eyre!("Invalid allowed origin: {}", origin))
        })
        .collect::<color_eyre::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Build the application router around an already opened database.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(http_routes::catalog_routes())
        .with_state(app_state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    log::info!("Shutdown signal received");
}

pub async fn start(config: HttpServerConfig) -> color_eyre::Result<()> {
    let app_state = Arc::new(AppState {
        db: config.database,
    });

    let app = router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.allowed_origins)?),
    );

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .wrap_err_with(|| eyre!("Failed to bind to {}", address))?;
    log::info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}

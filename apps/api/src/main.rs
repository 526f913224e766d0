mod auth;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod profile;
mod rate_limit;
mod reference;
mod resume;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::llm_client::LlmClient;
use crate::rate_limit::{InMemoryRateLimiter, RateLimiter, RedisRateLimiter};
use crate::resume::extract::PdfExtract;
use crate::resume::pipeline::ResumeNormalizer;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting LockedIn API v{}", env!("CARGO_PKG_VERSION"));

    // SQLite: schema + reference seed
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    let resume = ResumeNormalizer::new(Arc::new(llm), Arc::new(PdfExtract), config.max_file_mb);
    let rate_limiter = build_rate_limiter(&config).await;

    let state = AppState {
        db,
        resume,
        rate_limiter,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Redis when `REDIS_URL` is set and reachable, otherwise the in-process map.
async fn build_rate_limiter(config: &Config) -> Arc<dyn RateLimiter> {
    let window = config.rate_limit_window_secs;

    if let Some(url) = &config.redis_url {
        let connected = match redis::Client::open(url.as_str()) {
            Ok(client) => RedisRateLimiter::connect(&client, config.rate_limit_max, window).await,
            Err(e) => Err(e.into()),
        };
        match connected {
            Ok(limiter) => {
                info!("Rate limiter backed by Redis");
                return Arc::new(limiter);
            }
            Err(e) => warn!("Redis unavailable, using in-process rate limiter: {e:?}"),
        }
    }

    info!(
        max = config.rate_limit_max,
        window_secs = window,
        "Rate limiter backed by in-process map"
    );
    Arc::new(InMemoryRateLimiter::new(
        config.rate_limit_max,
        Duration::from_secs(window),
    ))
}

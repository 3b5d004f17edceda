mod auth;
mod codec;
mod config;
mod cvs;
mod db;
mod errors;
mod generation;
mod models;
mod policy;
mod ratelimit;
mod routes;
mod state;
mod stats;
mod store;
mod upgrade;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::generation::client::HttpCvGenerator;
use crate::ratelimit::RateLimiter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::stats::StatsCache;
use crate::store::postgres::PgStore;

/// Upgrade submissions allowed per client IP per window.
const UPGRADE_SUBMISSIONS_PER_HOUR: u32 = 5;

/// Freshness window for the public stats cache.
const STATS_CACHE_TTL_MINUTES: i64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("cvforge_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CVForge API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and the record store
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(pool));

    // External generation service
    let generator = Arc::new(HttpCvGenerator::new(config.ai_api_key.clone()));
    info!("Generation client initialized");

    // Process-lifetime caches, constructed here and injected — lost on
    // restart, which is acceptable for both.
    let stats = Arc::new(StatsCache::new(chrono::Duration::minutes(
        STATS_CACHE_TTL_MINUTES,
    )));
    let rate_limiter = Arc::new(RateLimiter::new(
        UPGRADE_SUBMISSIONS_PER_HOUR,
        std::time::Duration::from_secs(3600),
    ));

    let state = AppState {
        store,
        generator,
        config: config.clone(),
        stats,
        rate_limiter,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

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

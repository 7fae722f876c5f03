mod auth;
mod cache;
mod companies;
mod config;
mod db;
mod errors;
mod jobs;
mod matching;
mod models;
mod routes;
mod state;
mod users;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::TokenAuthority;
use crate::cache::RedisJobCache;
use crate::config::{Config, JwtKeys};
use crate::db::create_pool;
use crate::jobs::repository::PgJobStore;
use crate::matching::dispatcher::{ApplicationMatcher, MatcherConfig};
use crate::matching::resolver::CriteriaResolver;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "job_portal_api={},tower_http={}",
                &config.rust_log, &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job portal API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis (connects lazily on first cache access)
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    let tokens = build_token_authority(&config.jwt_keys)?
        .with_ttl(chrono::Duration::from_std(config.jwt_ttl)?);

    // Screening engine: Redis cache in front of the job tables
    let resolver = CriteriaResolver::new(
        Arc::new(RedisJobCache::new(redis)),
        Arc::new(PgJobStore::new(db.clone())),
        config.job_cache_ttl,
    );
    let matcher = ApplicationMatcher::new(
        resolver,
        MatcherConfig {
            max_concurrency: config.match_max_concurrency,
            deadline: config.match_deadline,
        },
    );
    info!(
        cache_ttl_secs = config.job_cache_ttl.as_secs(),
        max_concurrency = ?config.match_max_concurrency,
        deadline_ms = ?config.match_deadline.map(|d| d.as_millis()),
        "Application matcher initialized"
    );

    let state = AppState {
        db,
        tokens: Arc::new(tokens),
        matcher: Arc::new(matcher),
    };

    // Build router
    let app = build_router(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn build_token_authority(keys: &JwtKeys) -> Result<TokenAuthority> {
    match keys {
        JwtKeys::Secret(secret) => {
            info!("Signing tokens with HS256 shared secret");
            Ok(TokenAuthority::from_secret(secret))
        }
        JwtKeys::RsaPem {
            private_key_path,
            public_key_path,
        } => {
            let private_pem = std::fs::read(private_key_path)
                .with_context(|| format!("failed to read JWT private key '{private_key_path}'"))?;
            let public_pem = std::fs::read(public_key_path)
                .with_context(|| format!("failed to read JWT public key '{public_key_path}'"))?;
            info!("Signing tokens with RS256 key pair");
            Ok(TokenAuthority::from_rsa_pem(&private_pem, &public_pem)?)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

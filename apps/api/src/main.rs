mod audit;
mod config;
mod errors;
mod llm_client;
mod proxy;
mod repair;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::audit::activity::ActivityMonitor;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::proxy::limiter::{MemoryCounter, RateLimiter, RedisCounter, UsageCounter};
use crate::proxy::GeminiRelay;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::LocalStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerFry API v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(LocalStore::open(&config.data_dir).await?);

    let limiter = RateLimiter::new(usage_counter(&config).await, config.daily_limit);

    let relay = GeminiRelay::new(config.gemini_base_url.clone(), config.gemini_api_key.clone());
    if !relay.has_key() {
        warn!("GEMINI_API_KEY not set; /api/analyze will answer 500");
    }

    let llm = LlmClient::new(config.app_url.clone());
    info!("LLM client initialized");

    let state = AppState {
        config: config.clone(),
        llm,
        store,
        limiter,
        relay,
        activity: Arc::new(ActivityMonitor::default()),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

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

/// Redis when configured and reachable at startup, otherwise a per-process map.
async fn usage_counter(config: &Config) -> Arc<dyn UsageCounter> {
    match config.redis_url.as_deref().map(redis::Client::open) {
        Some(Ok(client)) => match RedisCounter::connect(client).await {
            Ok(counter) => {
                info!("Rate limit counters in Redis");
                Arc::new(counter)
            }
            Err(e) => {
                warn!("Redis unreachable ({e}); using in-memory rate limit counters");
                Arc::new(MemoryCounter::default())
            }
        },
        Some(Err(e)) => {
            warn!("Invalid REDIS_URL ({e}); using in-memory rate limit counters");
            Arc::new(MemoryCounter::default())
        }
        None => {
            info!("REDIS_URL not set; using in-memory rate limit counters");
            Arc::new(MemoryCounter::default())
        }
    }
}

use std::sync::Arc;

use crate::audit::activity::ActivityMonitor;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::proxy::limiter::RateLimiter;
use crate::proxy::GeminiRelay;
use crate::store::LocalStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: LlmClient,
    /// Settings and history. Read fresh on every request so edits apply immediately.
    pub store: Arc<LocalStore>,
    /// Per-IP daily counter for the relay endpoint.
    pub limiter: RateLimiter,
    pub relay: GeminiRelay,
    /// Busy flags and the last error, shared by all audit actions.
    pub activity: Arc<ActivityMonitor>,
}

#[cfg(test)]
impl AppState {
    /// Defaults over a throwaway data directory; no server relay key.
    pub async fn for_tests(data_dir: &std::path::Path) -> Self {
        use crate::proxy::limiter::MemoryCounter;

        let config = Config {
            data_dir: data_dir.to_path_buf(),
            ..Config::default()
        };
        AppState {
            llm: LlmClient::new(config.app_url.clone()),
            store: Arc::new(
                LocalStore::open(data_dir)
                    .await
                    .expect("test data dir should be writable"),
            ),
            limiter: RateLimiter::new(Arc::new(MemoryCounter::default()), config.daily_limit),
            relay: GeminiRelay::new(config.gemini_base_url.clone(), None),
            activity: Arc::new(ActivityMonitor::default()),
            config,
        }
    }
}

use cf_core::FeedStore;
use cf_feed::StoreFeedFetcher;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// `limit` used when the query string has none
    pub default_limit: usize,
    /// Larger requested limits are rejected with a 400
    pub max_limit: usize,
    /// Bound on each concept lookup while hydrating `/api/feed`
    pub concept_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            default_limit: 10,
            max_limit: 100,
            concept_timeout: Duration::from_secs(5),
        }
    }
}

pub struct AppState {
    pub store: Arc<dyn FeedStore>,
    pub fetcher: StoreFeedFetcher,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn FeedStore>, config: ServerConfig) -> Self {
        Self {
            fetcher: StoreFeedFetcher::new(store.clone()),
            store,
            config,
        }
    }
}

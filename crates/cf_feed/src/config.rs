use cf_core::{Error, Result};
use std::time::Duration;

/// Pagination policy. Only the relationship between the values matters for
/// correctness: a fetch must be triggered while `lookahead` unseen items are
/// still buffered, not at true exhaustion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Articles requested by the first load
    pub initial_page_size: usize,
    /// Articles requested by each pagination step
    pub batch_size: usize,
    /// Remaining unseen items at or below which the next batch is requested
    pub lookahead: usize,
    /// Upper bound on every store request, concept lookups included
    pub request_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            initial_page_size: 10,
            batch_size: 5,
            lookahead: 5,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_page_size == 0 {
            return Err(Error::Config("initial_page_size must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.lookahead == 0 {
            return Err(Error::Config("lookahead must be at least 1".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request_timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

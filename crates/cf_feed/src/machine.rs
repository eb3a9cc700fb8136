use cf_core::{Article, Error, HydratedArticle, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::fetcher::FeedFetcher;
use crate::hydrate::{hydrate_batch, hydrate_missing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedPhase {
    #[default]
    Empty,
    LoadingInitial,
    Ready,
}

/// Snapshot of the feed as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedState {
    /// Arrival order, which is also newest-first order
    pub items: Vec<HydratedArticle>,
    pub phase: FeedPhase,
    pub loading_more: bool,
    pub has_more: bool,
    /// Last failure; never clears `items`
    pub error: Option<String>,
}

impl FeedState {
    pub fn loading_initial(&self) -> bool {
        self.phase == FeedPhase::LoadingInitial
    }

    /// Offset of the next page. Derived from what was actually appended.
    pub fn cursor(&self) -> usize {
        self.items.len()
    }

    pub fn is_ready(&self) -> bool {
        self.phase == FeedPhase::Ready
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AtFirstItem,
    NotReady,
    FetchInFlight,
    Exhausted,
    BufferSufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Skipped(SkipReason),
    Appended(usize),
    Failed,
}

/// Owns the feed state and mediates between advance events and the fetcher.
///
/// The state lives in a `watch` channel: the sender is the only writer, and
/// every check-and-set happens inside a single `send_if_modified` call, so
/// at most one pagination fetch is in flight no matter how many `advance`
/// futures are polled concurrently. Events arriving during a fetch are
/// dropped rather than queued.
pub struct FeedStateMachine {
    fetcher: Arc<dyn FeedFetcher>,
    config: FeedConfig,
    state: watch::Sender<FeedState>,
}

impl FeedStateMachine {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, config: FeedConfig) -> Result<Self> {
        config.validate()?;
        let (state, _) = watch::channel(FeedState::default());
        Ok(Self {
            fetcher,
            config,
            state,
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// First load. A non-empty `prefetched` page is hydrated and shown
    /// without a loading phase; otherwise the first page is fetched.
    /// Only the first call on a fresh machine has any effect.
    pub async fn initialize(&self, prefetched: Option<Vec<Article>>) {
        let prefetched = prefetched.unwrap_or_default();
        self.initialize_hydrated(prefetched.into_iter().map(HydratedArticle::from).collect())
            .await;
    }

    /// Same as `initialize`, for a page that may already carry concepts
    /// (for example one rendered by the server). Unfetched entries are
    /// hydrated; populated ones are kept as they are.
    pub async fn initialize_hydrated(&self, prefetched: Vec<HydratedArticle>) {
        if self.state.borrow().phase != FeedPhase::Empty {
            debug!("Feed already initialized, ignoring");
            return;
        }

        if !prefetched.is_empty() {
            let has_more = prefetched.len() == self.config.initial_page_size;
            let items =
                hydrate_missing(self.fetcher.as_ref(), prefetched, self.config.request_timeout).await;
            let count = items.len();
            let applied = self.state.send_if_modified(|state| {
                if state.phase != FeedPhase::Empty {
                    return false;
                }
                state.items = items;
                state.has_more = has_more;
                state.phase = FeedPhase::Ready;
                true
            });
            if applied {
                info!("📰 Feed ready with {} prefetched articles", count);
            }
            return;
        }

        let started = self.state.send_if_modified(|state| {
            if state.phase != FeedPhase::Empty {
                return false;
            }
            state.phase = FeedPhase::LoadingInitial;
            true
        });
        if !started {
            debug!("Feed already initializing, ignoring");
            return;
        }

        let page_size = self.config.initial_page_size;
        match self.fetch_page(page_size, 0).await {
            Ok(articles) => {
                let has_more = articles.len() == page_size;
                let items =
                    hydrate_batch(self.fetcher.as_ref(), articles, self.config.request_timeout).await;
                info!("📰 Feed ready with {} articles", items.len());
                self.state.send_modify(|state| {
                    state.items = items;
                    state.has_more = has_more;
                    state.error = None;
                    state.phase = FeedPhase::Ready;
                });
            }
            Err(e) => {
                warn!("Initial feed load failed: {}", e);
                self.state.send_modify(|state| {
                    state.items.clear();
                    state.has_more = false;
                    state.error = Some(e.to_string());
                    state.phase = FeedPhase::Ready;
                });
            }
        }
    }

    /// Reports the user's position. Requests the next batch once the unseen
    /// buffer is down to `lookahead` items.
    pub async fn advance(&self, current_index: usize) -> AdvanceOutcome {
        let mut decision = Err(SkipReason::NotReady);
        self.state.send_if_modified(|state| {
            decision = self.should_fetch(state, current_index);
            if decision.is_ok() {
                state.loading_more = true;
                true
            } else {
                false
            }
        });

        let offset = match decision {
            Ok(offset) => offset,
            Err(reason) => {
                debug!("advance({}) skipped: {:?}", current_index, reason);
                return AdvanceOutcome::Skipped(reason);
            }
        };

        let in_flight = InFlight {
            state: &self.state,
            settled: false,
        };
        let batch_size = self.config.batch_size;
        debug!("advance({}) fetching {} articles at offset {}", current_index, batch_size, offset);
        match self.fetch_page(batch_size, offset).await {
            Ok(articles) => {
                if articles.len() < batch_size {
                    self.state.send_modify(|state| state.has_more = false);
                }
                let batch =
                    hydrate_batch(self.fetcher.as_ref(), articles, self.config.request_timeout).await;
                let appended = batch.len();
                in_flight.settle(|state| {
                    state.items.extend(batch);
                    state.error = None;
                });
                AdvanceOutcome::Appended(appended)
            }
            Err(e) => {
                warn!("Loading more articles failed, pagination stopped: {}", e);
                in_flight.settle(|state| {
                    state.has_more = false;
                    state.error = Some(e.to_string());
                });
                AdvanceOutcome::Failed
            }
        }
    }

    fn should_fetch(&self, state: &FeedState, current_index: usize) -> std::result::Result<usize, SkipReason> {
        if current_index == 0 {
            return Err(SkipReason::AtFirstItem);
        }
        if state.phase != FeedPhase::Ready {
            return Err(SkipReason::NotReady);
        }
        if state.loading_more {
            return Err(SkipReason::FetchInFlight);
        }
        if !state.has_more {
            return Err(SkipReason::Exhausted);
        }
        if state.items.len() > current_index + self.config.lookahead {
            return Err(SkipReason::BufferSufficient);
        }
        Ok(state.cursor())
    }

    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<Article>> {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.fetcher.fetch_articles_page(limit, offset)).await {
            Ok(Ok(mut articles)) => {
                articles.truncate(limit);
                Ok(articles)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::Timeout(timeout)),
        }
    }
}

/// Held while a pagination fetch is outstanding. Dropping it unsettled
/// (the `advance` future was cancelled) counts as a failed fetch, so
/// `loading_more` is always cleared.
struct InFlight<'a> {
    state: &'a watch::Sender<FeedState>,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, update: impl FnOnce(&mut FeedState)) {
        self.settled = true;
        self.state.send_modify(|state| {
            update(state);
            state.loading_more = false;
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!("Loading more articles was cancelled, pagination stopped");
        self.state.send_modify(|state| {
            state.has_more = false;
            state.error = Some("Loading more articles was cancelled".to_string());
            state.loading_more = false;
        });
    }
}

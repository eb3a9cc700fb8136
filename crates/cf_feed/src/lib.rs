//! Client side of the card feed: fetching pages from the API or a store,
//! hydrating them with concepts, and the pagination state machine that the
//! presentation layer drives.

pub mod config;
pub mod disclosure;
pub mod fetcher;
pub mod hydrate;
pub mod machine;
pub mod theme;

pub use config::FeedConfig;
pub use disclosure::ConceptDisclosure;
pub use fetcher::{FeedFetcher, HttpFeedFetcher, StoreFeedFetcher};
pub use hydrate::{hydrate_batch, hydrate_missing};
pub use machine::{AdvanceOutcome, FeedPhase, FeedState, FeedStateMachine, SkipReason};
pub use theme::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Theme, ThemePreference};

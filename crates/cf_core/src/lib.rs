pub mod concepts;
pub mod error;
pub mod logging;
pub mod storage;
pub mod types;

pub use concepts::{dedupe_concepts, normalize_concept_links, ConceptLink, ConceptRef};
pub use error::{Error, Result};
pub use storage::{ArticleStore, ConceptStore, FeedStore};
pub use types::{Article, ArticleId, Concept, ConceptId, HydratedArticle, PageRequest};

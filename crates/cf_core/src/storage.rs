use async_trait::async_trait;
use crate::concepts::ConceptLink;
use crate::types::{Article, ArticleId, PageRequest};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Articles ordered by `published_at` descending, ties broken by id descending
    async fn list_recent(&self, page: PageRequest) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait ConceptStore: Send + Sync {
    /// Raw association rows for an article; callers normalize them
    async fn links_for_article(&self, article_id: ArticleId) -> Result<Vec<ConceptLink>>;
}

/// A backend that can answer both article and concept queries.
pub trait FeedStore: ArticleStore + ConceptStore {
    fn backend_name(&self) -> &'static str;
}

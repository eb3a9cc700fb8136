use async_trait::async_trait;
use cf_core::{
    Article, ArticleId, ArticleStore, Concept, ConceptId, ConceptLink, ConceptStore, FeedStore,
    PageRequest, Result,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::seed::Seed;

#[derive(Debug, Default)]
struct MemoryTables {
    articles: Vec<Article>,
    concepts: HashMap<ConceptId, Concept>,
    links: Vec<(ArticleId, ConceptId)>,
}

impl MemoryTables {
    fn upsert_article(&mut self, article: Article) {
        if let Some(existing) = self.articles.iter_mut().find(|a| a.id == article.id) {
            *existing = article;
        } else {
            self.articles.push(article);
        }
        self.articles
            .sort_by(|a, b| b.published_at.cmp(&a.published_at).then(b.id.cmp(&a.id)));
    }
}

/// Process-local store. Association rows pointing at unknown concepts are
/// kept and reported as dangling links, like a LEFT JOIN would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<MemoryTables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn from_seed(seed: Seed) -> Self {
        let store = Self::new();
        store.load_seed(seed).await;
        store
    }

    pub async fn load_seed(&self, seed: Seed) {
        let mut tables = self.tables.write().await;
        for article in seed.articles {
            tables.upsert_article(article);
        }
        for concept in seed.concepts {
            tables.concepts.insert(concept.id, concept);
        }
        for link in seed.links {
            tables.links.push((link.article_id, link.concept_id));
        }
    }

    pub async fn insert_article(&self, article: Article) {
        self.tables.write().await.upsert_article(article);
    }

    pub async fn insert_concept(&self, concept: Concept) {
        self.tables.write().await.concepts.insert(concept.id, concept);
    }

    pub async fn link(&self, article_id: ArticleId, concept_id: ConceptId) {
        self.tables.write().await.links.push((article_id, concept_id));
    }

    pub async fn article_count(&self) -> usize {
        self.tables.read().await.articles.len()
    }
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn list_recent(&self, page: PageRequest) -> Result<Vec<Article>> {
        let tables = self.tables.read().await;
        Ok(tables
            .articles
            .iter()
            .skip(page.offset())
            .take(page.limit())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConceptStore for InMemoryStore {
    async fn links_for_article(&self, article_id: ArticleId) -> Result<Vec<ConceptLink>> {
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .iter()
            .filter(|(article, _)| *article == article_id)
            .map(|(_, concept_id)| match tables.concepts.get(concept_id) {
                Some(concept) => ConceptLink::to(concept.clone()),
                None => ConceptLink::dangling(),
            })
            .collect())
    }
}

impl FeedStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

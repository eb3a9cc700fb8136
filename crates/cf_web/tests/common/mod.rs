#![allow(dead_code)]

use cf_core::{
    Article, ArticleId, ArticleStore, Concept, ConceptId, ConceptLink, ConceptStore, Error,
    FeedStore, PageRequest, Result,
};
use cf_storage::{InMemoryStore, Seed, SeedLink};
use cf_web::{create_app, AppState, ServerConfig};
use chrono::{Duration, TimeZone, Utc};
use std::net::SocketAddr;
use std::sync::Arc;

/// A store whose every query fails, for the 500 paths.
pub struct FailingStore;

#[async_trait::async_trait]
impl ArticleStore for FailingStore {
    async fn list_recent(&self, _page: PageRequest) -> Result<Vec<Article>> {
        Err(Error::Store("relation \"articles\" does not exist".to_string()))
    }
}

#[async_trait::async_trait]
impl ConceptStore for FailingStore {
    async fn links_for_article(&self, _article_id: ArticleId) -> Result<Vec<ConceptLink>> {
        Err(Error::Store("connection refused".to_string()))
    }
}

impl FeedStore for FailingStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Article `id` is published `id` hours before noon, so id 1 is newest.
pub fn article(id: i64) -> Article {
    Article {
        id: ArticleId(id),
        title: format!("Article {}", id),
        quick_summary: format!("**Summary** {}", id),
        content: format!("Full text of article {}", id),
        image_url: format!("https://img.example.com/{}.jpg", id),
        published_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() - Duration::hours(id),
    }
}

/// `count` articles. Article 1 links concept 1 twice and a missing concept,
/// article 2 links concept 2, the rest have none.
pub async fn seeded_store(count: i64) -> Arc<dyn FeedStore> {
    let seed = Seed {
        articles: (1..=count).map(article).collect(),
        concepts: vec![
            Concept {
                id: ConceptId(1),
                name: "Monetary policy".to_string(),
                info: "How central banks steer the economy".to_string(),
            },
            Concept {
                id: ConceptId(2),
                name: "Yield curve".to_string(),
                info: "Rates across maturities".to_string(),
            },
        ],
        links: vec![
            SeedLink { article_id: ArticleId(1), concept_id: ConceptId(1) },
            SeedLink { article_id: ArticleId(1), concept_id: ConceptId(99) },
            SeedLink { article_id: ArticleId(1), concept_id: ConceptId(1) },
            SeedLink { article_id: ArticleId(2), concept_id: ConceptId(2) },
        ],
    };
    Arc::new(InMemoryStore::from_seed(seed).await)
}

/// Serves the API on an ephemeral local port and returns its base URL.
pub async fn spawn_server(store: Arc<dyn FeedStore>, config: ServerConfig) -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_app(AppState::new(store, config));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

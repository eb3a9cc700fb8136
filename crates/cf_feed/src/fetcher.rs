use async_trait::async_trait;
use cf_core::{
    dedupe_concepts, normalize_concept_links, Article, ArticleId, Concept, Error, FeedStore,
    HydratedArticle, PageRequest, Result,
};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// Stateless page and concept lookups. Every call is a fresh request.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Up to `limit` articles, newest first, starting at `offset`.
    /// Fewer than `limit` results means the store is exhausted.
    async fn fetch_articles_page(&self, limit: usize, offset: usize) -> Result<Vec<Article>>;

    /// De-duplicated concepts for one article, `[]` if none.
    async fn fetch_concepts_for_article(&self, article_id: ArticleId) -> Result<Vec<Concept>>;
}

/// Reads straight from a store. Used server-side, where the store is local.
pub struct StoreFeedFetcher {
    store: Arc<dyn FeedStore>,
}

impl StoreFeedFetcher {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FeedFetcher for StoreFeedFetcher {
    async fn fetch_articles_page(&self, limit: usize, offset: usize) -> Result<Vec<Article>> {
        let page = PageRequest::new(limit, offset)?;
        let mut articles = self.store.list_recent(page).await?;
        articles.truncate(limit);
        Ok(articles)
    }

    async fn fetch_concepts_for_article(&self, article_id: ArticleId) -> Result<Vec<Concept>> {
        let links = self.store.links_for_article(article_id).await?;
        Ok(normalize_concept_links(links))
    }
}

/// Talks to the `cf_web` JSON API.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpFeedFetcher {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid API URL {}: {}", base_url, e)))?;
        // endpoints join relative to the base, keeping any path prefix
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid API path {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Store(format!("API unreachable: {}", e)))?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Store(format!("Malformed API response: {}", e)))
    }

    /// A server-hydrated page from `/api/feed`, suitable for
    /// `FeedStateMachine::initialize_hydrated`.
    pub async fn fetch_hydrated_page(&self, limit: usize, offset: usize) -> Result<Vec<HydratedArticle>> {
        let page = PageRequest::new(limit, offset)?;
        let mut items: Vec<HydratedArticle> = self
            .get_json(
                "api/feed",
                &[("limit", page.limit().to_string()), ("offset", page.offset().to_string())],
            )
            .await?;
        items.truncate(limit);
        Ok(items)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    if status == StatusCode::BAD_REQUEST {
        Err(Error::Validation(message))
    } else {
        Err(Error::Store(format!("{} ({})", message, status)))
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch_articles_page(&self, limit: usize, offset: usize) -> Result<Vec<Article>> {
        let page = PageRequest::new(limit, offset)?;
        let mut articles: Vec<Article> = self
            .get_json(
                "api/articles",
                &[("limit", page.limit().to_string()), ("offset", page.offset().to_string())],
            )
            .await?;
        articles.truncate(limit);
        Ok(articles)
    }

    async fn fetch_concepts_for_article(&self, article_id: ArticleId) -> Result<Vec<Concept>> {
        let concepts: Vec<Option<Concept>> = self
            .get_json("api/concepts", &[("article_id", article_id.to_string())])
            .await?;
        Ok(dedupe_concepts(concepts.into_iter().flatten()))
    }
}

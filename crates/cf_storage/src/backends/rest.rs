use async_trait::async_trait;
use cf_core::{
    Article, ArticleId, ArticleStore, ConceptLink, ConceptStore, FeedStore, PageRequest, Result,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use url::Url;

const ARTICLE_COLUMNS: &str = "id,title,quick_summary,content,image_url,published_at";
const CONCEPT_PROJECTION: &str = "concepts(id,name,info)";

/// Client for a managed database exposing a PostgREST-style query API
/// (`select`, `order`, `limit`/`offset`, `eq` filters).
pub struct RestStore {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl fmt::Debug for RestStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Deserialize)]
struct RestErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| cf_core::Error::Config(format!("Invalid backend URL {}: {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.base_url
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| cf_core::Error::Config(format!("Invalid table path {}: {}", table, e)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| cf_core::Error::Store(format!("Store unreachable: {}", e)))?;
        let response = check_status(response).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| cf_core::Error::Store(format!("Malformed store response: {}", e)))
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<RestErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or(body);
    Err(cf_core::Error::Store(format!("Store rejected query ({}): {}", status, message)))
}

#[async_trait]
impl ArticleStore for RestStore {
    async fn list_recent(&self, page: PageRequest) -> Result<Vec<Article>> {
        let url = self.table_url("articles")?;
        let request = self.client.get(url).query(&[
            ("select", ARTICLE_COLUMNS.to_string()),
            ("order", "published_at.desc,id.desc".to_string()),
            ("limit", page.limit().to_string()),
            ("offset", page.offset().to_string()),
        ]);
        self.fetch_rows(request).await
    }
}

#[async_trait]
impl ConceptStore for RestStore {
    async fn links_for_article(&self, article_id: ArticleId) -> Result<Vec<ConceptLink>> {
        let url = self.table_url("articles_concepts")?;
        let request = self.client.get(url).query(&[
            ("select", CONCEPT_PROJECTION.to_string()),
            ("article_id", format!("eq.{}", article_id)),
        ]);
        self.fetch_rows(request).await
    }
}

impl FeedStore for RestStore {
    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

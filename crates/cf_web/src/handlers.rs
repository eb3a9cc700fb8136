use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cf_core::{normalize_concept_links, ArticleId, Error, PageRequest};
use cf_feed::hydrate_batch;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

use crate::state::{AppState, ServerConfig};

/// Query parameters are taken as raw strings so malformed numbers produce
/// the JSON error body instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConceptParams {
    pub article_id: Option<String>,
}

/// `{ "error": message }` with 400 for validation failures, 500 otherwise.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_validation() {
            warn!("Rejected request: {}", self.0);
            StatusCode::BAD_REQUEST
        } else {
            error!("Store query failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl PageParams {
    pub fn to_page(&self, config: &ServerConfig) -> Result<PageRequest, Error> {
        let limit = match non_blank(&self.limit) {
            None => config.default_limit,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| Error::Validation(format!("limit must be a positive integer, got {:?}", raw)))?,
        };
        let offset = match non_blank(&self.offset) {
            None => 0,
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                Error::Validation(format!("offset must be a non-negative integer, got {:?}", raw))
            })?,
        };
        if limit > config.max_limit {
            return Err(Error::Validation(format!(
                "limit must be at most {}, got {}",
                config.max_limit, limit
            )));
        }
        PageRequest::new(limit, offset)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = params.to_page(&state.config)?;
    let articles = state.store.list_recent(page).await?;
    Ok(Json(articles))
}

pub async fn list_concepts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConceptParams>,
) -> Result<impl IntoResponse, ApiError> {
    let article_id: ArticleId = non_blank(&params.article_id)
        .ok_or_else(|| Error::Validation("Missing article_id query parameter".to_string()))?
        .parse()?;
    let links = state.store.links_for_article(article_id).await?;
    Ok(Json(normalize_concept_links(links)))
}

/// A page of articles with concepts attached, for clients that want the
/// first screen in one round trip.
pub async fn feed_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = params.to_page(&state.config)?;
    let articles = state.store.list_recent(page).await?;
    let hydrated = hydrate_batch(&state.fetcher, articles, state.config.concept_timeout).await;
    Ok(Json(hydrated))
}

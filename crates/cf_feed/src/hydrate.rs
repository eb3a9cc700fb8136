use cf_core::{Article, ArticleId, Concept, HydratedArticle};
use futures::future::join_all;
use std::time::Duration;
use tracing::warn;

use crate::fetcher::FeedFetcher;

/// Attaches concepts to every article in the batch. Lookups run concurrently
/// and all settle before this returns; output order matches input order.
/// A failed or timed-out lookup leaves that article with `[]`.
pub async fn hydrate_batch(
    fetcher: &dyn FeedFetcher,
    articles: Vec<Article>,
    timeout: Duration,
) -> Vec<HydratedArticle> {
    let lookups = articles
        .iter()
        .map(|article| concepts_or_empty(fetcher, article.id, timeout));
    let concepts = join_all(lookups).await;

    articles
        .into_iter()
        .zip(concepts)
        .map(|(article, concepts)| HydratedArticle::new(article, concepts))
        .collect()
}

/// Like `hydrate_batch`, but keeps concepts that are already attached and
/// only looks up the entries still unfetched.
pub async fn hydrate_missing(
    fetcher: &dyn FeedFetcher,
    items: Vec<HydratedArticle>,
    timeout: Duration,
) -> Vec<HydratedArticle> {
    let lookups = items.iter().map(|item| async move {
        match &item.concepts {
            Some(_) => None,
            None => Some(concepts_or_empty(fetcher, item.id(), timeout).await),
        }
    });
    let fetched = join_all(lookups).await;

    items
        .into_iter()
        .zip(fetched)
        .map(|(mut item, fetched)| {
            if let Some(concepts) = fetched {
                item.concepts = Some(concepts);
            }
            item
        })
        .collect()
}

async fn concepts_or_empty(
    fetcher: &dyn FeedFetcher,
    article_id: ArticleId,
    timeout: Duration,
) -> Vec<Concept> {
    match tokio::time::timeout(timeout, fetcher.fetch_concepts_for_article(article_id)).await {
        Ok(Ok(concepts)) => concepts,
        Ok(Err(e)) => {
            warn!("Concepts unavailable for article {}: {}", article_id, e);
            Vec::new()
        }
        Err(_) => {
            warn!("Concept lookup for article {} timed out after {:?}", article_id, timeout);
            Vec::new()
        }
    }
}

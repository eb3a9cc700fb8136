use cf_core::{ArticleId, ConceptId, Error};
use cf_feed::{AdvanceOutcome, FeedConfig, FeedFetcher, FeedStateMachine, HttpFeedFetcher};
use cf_web::ServerConfig;
use std::sync::Arc;

mod common;

use common::{seeded_store, spawn_server, FailingStore};

async fn client_for(count: i64) -> HttpFeedFetcher {
    let base = spawn_server(seeded_store(count).await, ServerConfig::default()).await;
    HttpFeedFetcher::new(&base).unwrap()
}

#[tokio::test]
async fn test_pages_over_http_are_bounded_and_newest_first() {
    let client = client_for(12).await;

    let first = client.fetch_articles_page(10, 0).await.unwrap();
    let ids: Vec<i64> = first.iter().map(|a| a.id.0).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());

    let tail = client.fetch_articles_page(5, 10).await.unwrap();
    assert_eq!(tail.len(), 2);
    assert!(client.fetch_articles_page(5, 20).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_rejections_map_to_validation_errors() {
    let client = client_for(3).await;

    let err = client.fetch_articles_page(101, 0).await.unwrap_err();
    assert!(err.is_validation(), "unexpected error: {}", err);
    assert!(err.to_string().contains("at most 100"));

    let err = client.fetch_hydrated_page(500, 0).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_store_failures_map_to_store_errors_with_message() {
    let base = spawn_server(Arc::new(FailingStore), ServerConfig::default()).await;
    let client = HttpFeedFetcher::new(&base).unwrap();

    match client.fetch_articles_page(5, 0).await {
        Err(Error::Store(message)) => {
            assert!(message.contains("does not exist"));
            assert!(message.contains("500"));
        }
        other => panic!("expected a store error, got {:?}", other),
    }
    assert!(matches!(
        client.fetch_concepts_for_article(ArticleId(1)).await,
        Err(Error::Store(_))
    ));
}

#[tokio::test]
async fn test_concepts_over_http_are_deduplicated() {
    let client = client_for(3).await;

    let concepts = client.fetch_concepts_for_article(ArticleId(1)).await.unwrap();
    assert_eq!(concepts.len(), 1);
    assert_eq!(concepts[0].id, ConceptId(1));

    assert!(client.fetch_concepts_for_article(ArticleId(3)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_hydrated_page_is_bounded_and_carries_concepts() {
    let client = client_for(12).await;

    let page = client.fetch_hydrated_page(3, 0).await.unwrap();
    assert_eq!(page.len(), 3);
    assert!(page.iter().all(|item| item.is_hydrated()));
    assert_eq!(page[1].concepts.as_ref().unwrap()[0].name, "Yield curve");
    assert_eq!(page[2].concepts, Some(vec![]));
}

#[tokio::test]
async fn test_feed_paginates_end_to_end() {
    let client = Arc::new(client_for(12).await);
    let prefetched = client.fetch_hydrated_page(10, 0).await.unwrap();
    let feed = FeedStateMachine::new(client, FeedConfig::default()).unwrap();

    feed.initialize_hydrated(prefetched).await;
    assert_eq!(feed.snapshot().items.len(), 10);
    assert!(feed.snapshot().has_more);

    assert_eq!(feed.advance(5).await, AdvanceOutcome::Appended(2));
    let state = feed.snapshot();
    let ids: Vec<i64> = state.items.iter().map(|item| item.id().0).collect();
    assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    assert!(!state.has_more);
    assert!(state.items.iter().all(|item| item.is_hydrated()));
}

#[tokio::test]
async fn test_oversized_page_is_an_error_not_false_exhaustion() {
    let client = Arc::new(client_for(300).await);
    let feed = FeedStateMachine::new(
        client,
        FeedConfig {
            initial_page_size: 150,
            ..FeedConfig::default()
        },
    )
    .unwrap();

    feed.initialize(None).await;
    let state = feed.snapshot();
    assert!(state.items.is_empty());
    assert!(state.error.as_deref().unwrap().contains("at most 100"));
}

#[tokio::test]
async fn test_raised_server_limit_serves_large_pages() {
    let config = ServerConfig {
        max_limit: 200,
        ..ServerConfig::default()
    };
    let base = spawn_server(seeded_store(300).await, config).await;
    let client = Arc::new(HttpFeedFetcher::new(&base).unwrap());
    let feed = FeedStateMachine::new(
        client,
        FeedConfig {
            initial_page_size: 150,
            ..FeedConfig::default()
        },
    )
    .unwrap();

    feed.initialize(None).await;
    let state = feed.snapshot();
    assert_eq!(state.items.len(), 150);
    assert!(state.has_more);
    assert!(state.error.is_none());
}

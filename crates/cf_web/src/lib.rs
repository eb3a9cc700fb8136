use axum::{routing::get, Router};
use cf_core::FeedStore;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod handlers;
pub mod state;

pub use state::{AppState, ServerConfig};

pub fn create_app(state: AppState) -> Router {
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/concepts", get(handlers::list_concepts))
        .route("/api/feed", get(handlers::feed_page))
        .layer(layers)
        .with_state(Arc::new(state))
}

/// Binds `config.bind` and serves the API until the task is cancelled.
pub async fn serve(store: Arc<dyn FeedStore>, config: ServerConfig) -> cf_core::Result<()> {
    let bind = config.bind;
    let app = create_app(AppState::new(store, config));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("🌐 Serving card feed API on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState, ServerConfig};
    pub use cf_core::{Error, Result};
}

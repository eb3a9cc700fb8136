use cf_core::{FeedStore, PageRequest, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub mod backends;
pub mod seed;

pub use backends::*;
pub use seed::{Seed, SeedLink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Memory,
    Sqlite,
    Rest,
}

impl StorageKind {
    pub fn get_error_message(&self) -> &'static str {
        match self {
            Self::Memory => "Memory storage should always be available",
            Self::Sqlite => "SQLite database should be writable at the configured path",
            Self::Rest => "Managed store should be reachable at --backend-url",
        }
    }
}

impl FromStr for StorageKind {
    type Err = cf_core::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "rest" | "supabase" | "postgrest" => Ok(Self::Rest),
            other => Err(cf_core::Error::Config(format!(
                "Unknown storage backend: {} (expected memory, sqlite or rest)",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Rest => "rest",
        };
        f.write_str(name)
    }
}

/// Builds a store for `kind`. `backend_url` is the database path for SQLite
/// and the project URL for the REST store. A seed, when given, is loaded into
/// local backends and ignored for the REST store.
pub async fn create_store(
    kind: StorageKind,
    backend_url: Option<&str>,
    api_key: Option<String>,
    seed: Option<Seed>,
) -> Result<Arc<dyn FeedStore>> {
    match kind {
        StorageKind::Memory => {
            let store = InMemoryStore::from_seed(seed.unwrap_or_default()).await;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let path = backend_url.unwrap_or(SQLiteStore::DEFAULT_PATH);
            let store = SQLiteStore::new_with_path(std::path::Path::new(path)).await?;
            if let Some(seed) = seed {
                store.load_seed(&seed).await?;
            }
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => Err(cf_core::Error::Config(
            "SQLite support not compiled in (enable the `sqlite` feature)".to_string(),
        )),
        StorageKind::Rest => {
            if seed.is_some() {
                tracing::warn!("Ignoring seed document for the managed REST store");
            }
            let url = backend_url.ok_or_else(|| {
                cf_core::Error::Config("--backend-url is required for the rest backend".to_string())
            })?;
            Ok(Arc::new(RestStore::new(url, api_key)?))
        }
    }
}

/// Issues a one-row query to prove the store answers within `timeout`.
pub async fn check_store(store: &Arc<dyn FeedStore>, timeout: Duration) -> Result<()> {
    let probe = PageRequest::new(1, 0)?;
    match tokio::time::timeout(timeout, store.list_recent(probe)).await {
        Ok(Ok(_)) => {
            info!("🏦 Store backend ready (using {})", store.backend_name());
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(cf_core::Error::Timeout(timeout)),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{check_store, create_store, Seed, StorageKind};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_kind_parsing() {
        assert_eq!("memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert_eq!("Supabase".parse::<StorageKind>().unwrap(), StorageKind::Rest);
        assert!("qdrant".parse::<StorageKind>().is_err());
        assert_eq!(StorageKind::Sqlite.to_string(), "sqlite");
    }

    #[tokio::test]
    async fn test_memory_store_passes_health_check() {
        let store = create_store(StorageKind::Memory, None, None, None).await.unwrap();
        check_store(&store, Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_rest_store_requires_url() {
        let err = create_store(StorageKind::Rest, None, None, None).await.err().unwrap();
        assert!(matches!(err, cf_core::Error::Config(_)));
    }
}

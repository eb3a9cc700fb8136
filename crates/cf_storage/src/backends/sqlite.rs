use async_trait::async_trait;
use cf_core::{
    Article, ArticleId, ArticleStore, Concept, ConceptId, ConceptLink, ConceptStore, FeedStore,
    PageRequest, Result,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePool}, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::seed::Seed;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        quick_summary TEXT,
        content TEXT NOT NULL,
        image_url TEXT,
        published_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS concepts (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        info TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles_concepts (
        article_id INTEGER NOT NULL,
        concept_id INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_articles_recency ON articles (published_at DESC, id DESC)
    "#,
];

pub struct SQLiteStore {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl SQLiteStore {
    pub const DEFAULT_PATH: &'static str = "cardfeed.db";

    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| store_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| store_error(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    pub async fn store_article(&self, article: &Article) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO articles
            (id, title, quick_summary, content, image_url, published_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article.id.0)
        .bind(&article.title)
        .bind(&article.quick_summary)
        .bind(&article.content)
        .bind(&article.image_url)
        .bind(article.published_at.to_rfc3339())
        .execute(&*self.pool)
        .await
        .map_err(|e| store_error("Failed to store article", e))?;
        Ok(())
    }

    pub async fn store_concept(&self, concept: &Concept) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO concepts (id, name, info) VALUES (?, ?, ?)")
            .bind(concept.id.0)
            .bind(&concept.name)
            .bind(&concept.info)
            .execute(&*self.pool)
            .await
            .map_err(|e| store_error("Failed to store concept", e))?;
        Ok(())
    }

    pub async fn link(&self, article_id: ArticleId, concept_id: ConceptId) -> Result<()> {
        sqlx::query("INSERT INTO articles_concepts (article_id, concept_id) VALUES (?, ?)")
            .bind(article_id.0)
            .bind(concept_id.0)
            .execute(&*self.pool)
            .await
            .map_err(|e| store_error("Failed to link concept", e))?;
        Ok(())
    }

    pub async fn load_seed(&self, seed: &Seed) -> Result<()> {
        for article in &seed.articles {
            self.store_article(article).await?;
        }
        for concept in &seed.concepts {
            self.store_concept(concept).await?;
        }
        for link in &seed.links {
            self.link(link.article_id, link.concept_id).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for SQLiteStore {
    async fn list_recent(&self, page: PageRequest) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, quick_summary, content, image_url, published_at
            FROM articles
            ORDER BY published_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| store_error("Failed to list articles", e))?;

        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            let published_at: String = row.get("published_at");
            articles.push(Article {
                id: ArticleId(row.get("id")),
                title: row.get("title"),
                quick_summary: row.get::<Option<String>, _>("quick_summary").unwrap_or_default(),
                content: row.get("content"),
                image_url: row.get::<Option<String>, _>("image_url").unwrap_or_default(),
                published_at: chrono::DateTime::parse_from_rfc3339(&published_at)
                    .map_err(|e| cf_core::Error::Store(format!("Failed to parse date: {}", e)))?
                    .with_timezone(&chrono::Utc),
            });
        }

        Ok(articles)
    }
}

#[async_trait]
impl ConceptStore for SQLiteStore {
    async fn links_for_article(&self, article_id: ArticleId) -> Result<Vec<ConceptLink>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id AS id, c.name AS name, c.info AS info
            FROM articles_concepts ac
            LEFT JOIN concepts c ON c.id = ac.concept_id
            WHERE ac.article_id = ?
            ORDER BY ac.rowid
            "#,
        )
        .bind(article_id.0)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| store_error("Failed to load concepts", e))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id: Option<i64> = row.get("id");
                let name: Option<String> = row.get("name");
                match (id, name) {
                    (Some(id), Some(name)) => ConceptLink::to(Concept {
                        id: ConceptId(id),
                        name,
                        info: row.get::<Option<String>, _>("info").unwrap_or_default(),
                    }),
                    _ => ConceptLink::dangling(),
                }
            })
            .collect())
    }
}

impl FeedStore for SQLiteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

fn store_error(context: &str, e: sqlx::Error) -> cf_core::Error {
    cf_core::Error::Store(format!("{}: {}", context, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::normalize_concept_links;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn article(id: i64, day: u32) -> Article {
        Article {
            id: ArticleId(id),
            title: format!("Article {}", id),
            quick_summary: "summary".to_string(),
            content: "content".to_string(),
            image_url: String::new(),
            published_at: Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_paging_and_concepts() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let store = SQLiteStore::new_with_path(&db_path).await.unwrap();

        for (id, day) in [(1, 1), (2, 3), (3, 2)] {
            store.store_article(&article(id, day)).await.unwrap();
        }
        store
            .store_concept(&Concept {
                id: ConceptId(1),
                name: "Liquidity".to_string(),
                info: "How easily assets convert to cash".to_string(),
            })
            .await
            .unwrap();
        store.link(ArticleId(2), ConceptId(1)).await.unwrap();
        store.link(ArticleId(2), ConceptId(7)).await.unwrap();
        store.link(ArticleId(2), ConceptId(1)).await.unwrap();

        let first = store.list_recent(PageRequest::new(2, 0).unwrap()).await.unwrap();
        let ids: Vec<i64> = first.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![2, 3]);

        let rest = store.list_recent(PageRequest::new(2, 2).unwrap()).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, ArticleId(1));

        let links = store.links_for_article(ArticleId(2)).await.unwrap();
        assert_eq!(links.len(), 3);
        let concepts = normalize_concept_links(links);
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0].name, "Liquidity");
    }
}

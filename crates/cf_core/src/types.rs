use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(pub i64);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArticleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("article id must not be empty".to_string()));
        }
        trimmed
            .parse::<i64>()
            .map(ArticleId)
            .map_err(|_| Error::Validation(format!("invalid article id: {}", s)))
    }
}

/// A single content item. Read-only from the application's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub quick_summary: String,
    pub content: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub image_url: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Concept {
    pub id: ConceptId,
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub info: String,
}

/// An article plus its concepts. `concepts` is `None` until fetched,
/// `Some(vec![])` when fetched with no results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydratedArticle {
    #[serde(flatten)]
    pub article: Article,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concepts: Option<Vec<Concept>>,
}

impl HydratedArticle {
    pub fn new(article: Article, concepts: Vec<Concept>) -> Self {
        Self {
            article,
            concepts: Some(concepts),
        }
    }

    pub fn id(&self) -> ArticleId {
        self.article.id
    }

    pub fn is_hydrated(&self) -> bool {
        self.concepts.is_some()
    }
}

impl From<Article> for HydratedArticle {
    fn from(article: Article) -> Self {
        Self {
            article,
            concepts: None,
        }
    }
}

/// A validated `(limit, offset)` window over the recency-ordered article list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: usize,
    offset: usize,
}

impl PageRequest {
    pub fn new(limit: usize, offset: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::Validation("limit must be at least 1".to_string()));
        }
        Ok(Self { limit, offset })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Inclusive index of the last row in the window, as range-based query APIs expect.
    pub fn last_index(&self) -> usize {
        self.offset + self.limit - 1
    }
}

fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

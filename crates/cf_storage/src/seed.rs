use cf_core::{Article, ArticleId, Concept, ConceptId, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A JSON document describing a store's initial contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub links: Vec<SeedLink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedLink {
    pub article_id: ArticleId,
    pub concept_id: ConceptId,
}

impl Seed {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_from_json() {
        let seed = Seed::from_json(
            r#"{
                "articles": [{
                    "id": 1, "title": "Hello", "quick_summary": "hi",
                    "content": "body", "image_url": "",
                    "published_at": "2024-01-01T00:00:00Z"
                }],
                "concepts": [{ "id": 9, "name": "Greeting", "info": "A salutation" }],
                "links": [{ "article_id": 1, "concept_id": 9 }]
            }"#,
        )
        .unwrap();
        assert_eq!(seed.articles.len(), 1);
        assert_eq!(seed.links[0].concept_id, ConceptId(9));
    }

    #[test]
    fn test_seed_sections_are_optional() {
        let seed = Seed::from_json("{}").unwrap();
        assert!(seed.articles.is_empty());
        assert!(seed.links.is_empty());
    }
}

//! Normalization of the article/concept association projection.
//!
//! Stores return one row per `articles_concepts` link with the joined concept
//! nested under `concepts`. Depending on the backend that nested value is
//! `null` (dangling link), a single object, or an array of possibly-null
//! objects. Everything downstream wants a flat, de-duplicated list, and this
//! module is the only place that shape is handled.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::{Concept, ConceptId};

/// One association row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptLink {
    #[serde(default, alias = "concept")]
    pub concepts: Option<ConceptRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConceptRef {
    One(Concept),
    Many(Vec<Option<Concept>>),
}

impl ConceptLink {
    pub fn to(concept: Concept) -> Self {
        Self {
            concepts: Some(ConceptRef::One(concept)),
        }
    }

    pub fn dangling() -> Self {
        Self { concepts: None }
    }
}

/// Flattens association rows into concepts, dropping nulls and keeping the
/// first occurrence of each id. Input order is otherwise preserved.
pub fn normalize_concept_links(rows: impl IntoIterator<Item = ConceptLink>) -> Vec<Concept> {
    let flat = rows.into_iter().flat_map(|row| match row.concepts {
        None => Vec::new(),
        Some(ConceptRef::One(concept)) => vec![concept],
        Some(ConceptRef::Many(many)) => many.into_iter().flatten().collect(),
    });
    dedupe_concepts(flat)
}

pub fn dedupe_concepts(concepts: impl IntoIterator<Item = Concept>) -> Vec<Concept> {
    let mut seen: HashSet<ConceptId> = HashSet::new();
    concepts
        .into_iter()
        .filter(|concept| seen.insert(concept.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn concept(id: i64, name: &str) -> Concept {
        Concept {
            id: ConceptId(id),
            name: name.to_string(),
            info: format!("About {}", name),
        }
    }

    #[test]
    fn test_duplicate_and_null_rows_collapse_to_one() {
        let rows: Vec<ConceptLink> = serde_json::from_value(json!([
            { "concept": { "id": 1, "name": "Inflation", "info": "..." } },
            { "concept": null },
            { "concept": { "id": 1, "name": "Inflation", "info": "..." } }
        ]))
        .unwrap();

        let concepts = normalize_concept_links(rows);
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0].id, ConceptId(1));
    }

    #[test]
    fn test_nested_arrays_are_flattened() {
        let rows: Vec<ConceptLink> = serde_json::from_value(json!([
            { "concepts": [ { "id": 2, "name": "Bond", "info": "" }, null ] },
            { "concepts": { "id": 3, "name": "Yield", "info": null } },
            { "concepts": [ { "id": 2, "name": "Bond", "info": "" } ] },
            {}
        ]))
        .unwrap();

        let ids: Vec<i64> = normalize_concept_links(rows).iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let concepts = dedupe_concepts(vec![concept(5, "first"), concept(6, "b"), concept(5, "second")]);
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].name, "first");
    }

    #[test]
    fn test_no_links_means_no_concepts() {
        assert!(normalize_concept_links(Vec::new()).is_empty());
        assert!(normalize_concept_links(vec![ConceptLink::dangling()]).is_empty());
    }
}

use cf_core::{ArticleId, ConceptId};
use std::collections::HashSet;

/// Per-card view state: which concepts are expanded and which cards show
/// full content instead of the quick summary. Everything starts collapsed and
/// toggles are independent of each other, not accordion-style.
#[derive(Debug, Clone, Default)]
pub struct ConceptDisclosure {
    expanded: HashSet<(ArticleId, ConceptId)>,
    full_content: HashSet<ArticleId>,
}

impl ConceptDisclosure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, article: ArticleId, concept: ConceptId) -> bool {
        self.expanded.contains(&(article, concept))
    }

    /// Flips one concept and returns its new state.
    pub fn toggle(&mut self, article: ArticleId, concept: ConceptId) -> bool {
        if !self.expanded.remove(&(article, concept)) {
            self.expanded.insert((article, concept));
            return true;
        }
        false
    }

    pub fn expand(&mut self, article: ArticleId, concept: ConceptId) {
        self.expanded.insert((article, concept));
    }

    pub fn collapse(&mut self, article: ArticleId, concept: ConceptId) {
        self.expanded.remove(&(article, concept));
    }

    pub fn shows_full_content(&self, article: ArticleId) -> bool {
        self.full_content.contains(&article)
    }

    pub fn toggle_content(&mut self, article: ArticleId) -> bool {
        if !self.full_content.remove(&article) {
            self.full_content.insert(article);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ArticleId = ArticleId(1);

    #[test]
    fn test_starts_collapsed() {
        let disclosure = ConceptDisclosure::new();
        assert!(!disclosure.is_expanded(A, ConceptId(1)));
        assert!(!disclosure.shows_full_content(A));
    }

    #[test]
    fn test_toggles_are_independent() {
        let mut disclosure = ConceptDisclosure::new();
        assert!(disclosure.toggle(A, ConceptId(1)));
        assert!(disclosure.toggle(A, ConceptId(2)));
        assert!(disclosure.is_expanded(A, ConceptId(1)));
        assert!(disclosure.is_expanded(A, ConceptId(2)));
        assert!(!disclosure.is_expanded(ArticleId(2), ConceptId(1)));

        assert!(!disclosure.toggle(A, ConceptId(1)));
        assert!(!disclosure.is_expanded(A, ConceptId(1)));
        assert!(disclosure.is_expanded(A, ConceptId(2)));
    }

    #[test]
    fn test_expand_and_collapse_are_idempotent() {
        let mut disclosure = ConceptDisclosure::new();
        disclosure.expand(A, ConceptId(3));
        disclosure.expand(A, ConceptId(3));
        assert!(disclosure.is_expanded(A, ConceptId(3)));
        disclosure.collapse(A, ConceptId(3));
        disclosure.collapse(A, ConceptId(3));
        assert!(!disclosure.is_expanded(A, ConceptId(3)));
    }

    #[test]
    fn test_full_content_toggle() {
        let mut disclosure = ConceptDisclosure::new();
        assert!(disclosure.toggle_content(A));
        assert!(disclosure.shows_full_content(A));
        assert!(!disclosure.toggle_content(A));
    }
}

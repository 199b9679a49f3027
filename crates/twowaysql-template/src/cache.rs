//! Parsed-template cache keyed by exact template text.
//!
//! Parse failures are cached as well: a malformed template fails the same way
//! on every call.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::node::Node;
use crate::parser::{ParseOptions, parse_with};

/// Outcome of parsing one template text.
pub type ParseOutcome = Result<Arc<Node>, ParseError>;

/// Bounded concurrent cache of parse results.
#[derive(Debug)]
pub struct TemplateCache {
    entries: DashMap<String, ParseOutcome>,
    capacity: usize,
    options: ParseOptions,
}

impl TemplateCache {
    /// Create a cache holding at most `capacity` templates.
    #[must_use]
    pub fn new(capacity: usize, options: ParseOptions) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            options,
        }
    }

    /// Return the cached outcome for `text`, parsing on first use.
    ///
    /// # Errors
    ///
    /// Returns the (possibly cached) [`ParseError`] for a malformed template.
    pub fn get_or_parse(&self, text: &str) -> ParseOutcome {
        if let Some(entry) = self.entries.get(text) {
            return entry.value().clone();
        }

        debug!(template_len = text.len(), "template cache miss");
        let outcome = parse_with(text, self.options).map(Arc::new);
        if self.entries.len() >= self.capacity {
            warn!(
                capacity = self.capacity,
                "template cache is full, not caching template"
            );
            return outcome;
        }
        self.entries
            .entry(text.to_owned())
            .or_insert(outcome)
            .value()
            .clone()
    }

    /// Number of cached templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_reuse_parsed_tree() {
        let cache = TemplateCache::new(4, ParseOptions::default());
        let first = cache.get_or_parse("select 1").unwrap();
        let second = cache.get_or_parse("select 1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_should_cache_parse_failures() {
        let cache = TemplateCache::new(4, ParseOptions::default());
        let err = cache.get_or_parse("/*IF pmb.x").unwrap_err();
        assert_eq!(err, ParseError::UnclosedDirective { offset: 0 });
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_or_parse("/*IF pmb.x").unwrap_err(), err);
    }

    #[test]
    fn test_should_stop_caching_when_full() {
        let cache = TemplateCache::new(1, ParseOptions::default());
        cache.get_or_parse("a").unwrap();
        cache.get_or_parse("b").unwrap();
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}

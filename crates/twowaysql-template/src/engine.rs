//! The engine facade: configuration, dialect, template cache and evaluator.

use std::sync::Arc;

use twowaysql_core::{Dialect, EngineConfig, NullPolicy};
use twowaysql_model::{BoundSql, ParameterObject};

use crate::cache::TemplateCache;
use crate::error::{ParseError, TemplateError};
use crate::evaluator::TemplateEvaluator;
use crate::node::Node;
use crate::parser::ParseOptions;

/// Parses, caches and evaluates two-way SQL templates.
///
/// An engine is built once per configuration and shared; parsed trees are
/// reused across threads and calls, and each evaluation gets its own context.
///
/// # Examples
///
/// ```
/// use twowaysql_core::EngineConfig;
/// use twowaysql_model::ParameterObject;
/// use twowaysql_template::TwoWaySqlEngine;
///
/// let engine = TwoWaySqlEngine::new(EngineConfig::default());
/// let pmb = ParameterObject::new("MemberPmb").with("memberId", 3);
/// let bound = engine
///     .render("select * from MEMBER where MEMBER_ID = /*pmb.memberId*/1", &pmb)
///     .unwrap();
/// assert_eq!(bound.sql, "select * from MEMBER where MEMBER_ID = ?");
/// assert_eq!(bound.bound_values.len(), 1);
/// ```
#[derive(Debug)]
pub struct TwoWaySqlEngine {
    config: EngineConfig,
    cache: TemplateCache,
    evaluator: TemplateEvaluator,
}

impl TwoWaySqlEngine {
    /// Create an engine using the configured dialect.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let dialect = config.build_dialect();
        Self::with_dialect(config, dialect)
    }

    /// Create an engine with a custom dialect implementation.
    #[must_use]
    pub fn with_dialect(config: EngineConfig, dialect: Arc<dyn Dialect>) -> Self {
        let options = ParseOptions {
            null_disallowed: config.null_policy == NullPolicy::Reject,
        };
        let cache = TemplateCache::new(config.template_cache_capacity, options);
        let evaluator = TemplateEvaluator::new(dialect, config.root_alias.clone());
        Self {
            config,
            cache,
            evaluator,
        }
    }

    /// Parse `text`, reusing the cached tree or failure.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the template is malformed.
    pub fn parse(&self, text: &str) -> Result<Arc<Node>, ParseError> {
        self.cache.get_or_parse(text)
    }

    /// Evaluate a parsed tree against `parameters`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if evaluation fails.
    pub fn evaluate(
        &self,
        node: &Node,
        parameters: &ParameterObject,
    ) -> Result<BoundSql, TemplateError> {
        self.evaluator.evaluate(node, parameters)
    }

    /// Parse (cached) and evaluate in one step.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if parsing or evaluation fails.
    pub fn render(
        &self,
        text: &str,
        parameters: &ParameterObject,
    ) -> Result<BoundSql, TemplateError> {
        let node = self.parse(text)?;
        self.evaluate(&node, parameters)
    }

    /// The target dialect.
    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        self.evaluator.dialect()
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of cached templates.
    #[must_use]
    pub fn cached_templates(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached template.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for TwoWaySqlEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

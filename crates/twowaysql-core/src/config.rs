//! Engine configuration.
//!
//! All configuration is driven by environment variables; every field has a
//! default so an engine can be built without any environment at all.

use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::dialect::{Dialect, DialectKind};
use crate::error::TwoWaySqlError;

/// What a bind directive does when its value resolves to null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullPolicy {
    /// Emit nothing and record no bind value.
    #[default]
    Skip,
    /// Fail the evaluation with a null-bind error.
    Reject,
}

impl FromStr for NullPolicy {
    type Err = TwoWaySqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "reject" => Ok(Self::Reject),
            _ => Err(TwoWaySqlError::Config(format!(
                "invalid null policy: {s} (expected skip or reject)"
            ))),
        }
    }
}

/// Configuration for a template engine instance.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Target database dialect.
    pub dialect: DialectKind,
    /// Null handling for bind directives.
    pub null_policy: NullPolicy,
    /// Maximum number of parsed templates kept in the cache.
    pub template_cache_capacity: usize,
    /// Overrides the dialect's in-clause size limit when set.
    pub in_clause_max_size: Option<usize>,
    /// Expression root naming the parameter object (`pmb` in `pmb.memberId`).
    pub root_alias: String,
    /// Log level.
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::default(),
            null_policy: NullPolicy::default(),
            template_cache_capacity: 1024,
            in_clause_max_size: None,
            root_alias: "pmb".to_owned(),
            log_level: "info".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values are logged and replaced by their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("TWOWAYSQL_DIALECT") {
            match v.parse() {
                Ok(kind) => config.dialect = kind,
                Err(e) => warn!(error = %e, "ignoring TWOWAYSQL_DIALECT"),
            }
        }
        if let Ok(v) = std::env::var("TWOWAYSQL_NULL_POLICY") {
            match v.parse() {
                Ok(policy) => config.null_policy = policy,
                Err(e) => warn!(error = %e, "ignoring TWOWAYSQL_NULL_POLICY"),
            }
        }
        if let Ok(v) = std::env::var("TWOWAYSQL_TEMPLATE_CACHE_CAPACITY") {
            match v.parse() {
                Ok(n) => config.template_cache_capacity = n,
                Err(e) => warn!(error = %e, value = %v, "ignoring TWOWAYSQL_TEMPLATE_CACHE_CAPACITY"),
            }
        }
        if let Ok(v) = std::env::var("TWOWAYSQL_IN_CLAUSE_MAX_SIZE") {
            match v.parse::<usize>() {
                Ok(n) if n > 0 => config.in_clause_max_size = Some(n),
                _ => warn!(value = %v, "ignoring TWOWAYSQL_IN_CLAUSE_MAX_SIZE"),
            }
        }
        if let Ok(v) = std::env::var("TWOWAYSQL_ROOT_ALIAS") {
            if !v.trim().is_empty() {
                config.root_alias = v.trim().to_owned();
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Instantiate the configured dialect.
    #[must_use]
    pub fn build_dialect(&self) -> Arc<dyn Dialect> {
        self.dialect.build(self.in_clause_max_size)
    }
}

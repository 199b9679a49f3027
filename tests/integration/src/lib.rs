//! Cross-crate tests for the two-way SQL engine.
//!
//! Run with:
//! ```text
//! cargo test -p twowaysql-integration
//! ```

use std::sync::Once;

use twowaysql_core::EngineConfig;
use twowaysql_model::{BoundSql, ParameterObject};
use twowaysql_template::{TemplateError, TwoWaySqlEngine};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Engine with the given configuration.
#[must_use]
pub fn engine_with(config: EngineConfig) -> TwoWaySqlEngine {
    init_tracing();
    TwoWaySqlEngine::new(config)
}

/// Engine with the default configuration.
#[must_use]
pub fn engine() -> TwoWaySqlEngine {
    engine_with(EngineConfig::default())
}

/// Render `template` with a default engine.
pub fn render(template: &str, pmb: &ParameterObject) -> Result<BoundSql, TemplateError> {
    engine().render(template, pmb)
}

/// Placeholder/bind correspondence for `?`-style dialects.
pub fn assert_binds_match(bound: &BoundSql) {
    assert_eq!(
        bound.placeholder_count(),
        bound.bound_values.len(),
        "placeholder count mismatch in {bound}"
    );
}

mod test_condition;
mod test_dialect;
mod test_parameters;
mod test_template;

//! twowaysql-cli - render a two-way SQL template against JSON parameters.
//!
//! # Usage
//!
//! ```text
//! twowaysql-cli member.sql --params pmb.json --type-name MemberPmb --dialect postgres
//! ```
//!
//! Prints `{"sql": ..., "boundValues": [...]}` as pretty JSON on stdout.
//! Logs go to stderr.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TWOWAYSQL_DIALECT` | `standard` | Target dialect (`--dialect` wins) |
//! | `TWOWAYSQL_NULL_POLICY` | `skip` | Null bind handling (`--null-policy` wins) |
//! | `TWOWAYSQL_IN_CLAUSE_MAX_SIZE` | *(dialect)* | In-clause size limit |
//! | `TWOWAYSQL_ROOT_ALIAS` | `pmb` | Parameter object alias in expressions |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use twowaysql_core::{DialectKind, EngineConfig, NullPolicy};
use twowaysql_model::{BoundSql, ParameterObject};
use twowaysql_template::TwoWaySqlEngine;

#[derive(Debug, Parser)]
#[command(name = "twowaysql-cli")]
#[command(author, version, about = "Render a two-way SQL template", long_about = None)]
struct Cli {
    /// Template file
    template: PathBuf,

    /// JSON file holding the parameter object properties
    #[arg(long)]
    params: Option<PathBuf>,

    /// Parameter object type name used in error messages
    #[arg(long, default_value = twowaysql_model::parameter::DEFAULT_TYPE_NAME)]
    type_name: String,

    /// Target dialect: standard, postgres, mysql or oracle
    #[arg(long)]
    dialect: Option<DialectKind>,

    /// Null bind handling: skip or reject
    #[arg(long)]
    null_policy: Option<NullPolicy>,

    /// Also print the SQL with literals substituted (for reading only)
    #[arg(long)]
    inline: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    #[serde(flatten)]
    bound: BoundSql,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_sql: Option<String>,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn load_parameters(cli: &Cli) -> Result<ParameterObject> {
    let Some(path) = &cli.params else {
        return Ok(ParameterObject::new(cli.type_name.clone()));
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read parameters from {}", path.display()))?;
    ParameterObject::from_json_str(cli.type_name.clone(), &json)
        .with_context(|| format!("invalid parameter JSON in {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }
    if let Some(policy) = cli.null_policy {
        config.null_policy = policy;
    }
    init_tracing(&config.log_level)?;

    let template = std::fs::read_to_string(&cli.template)
        .with_context(|| format!("failed to read template {}", cli.template.display()))?;
    let parameters = load_parameters(&cli)?;
    debug!(
        properties = parameters.properties.len(),
        type_name = %parameters.type_name,
        "loaded parameters"
    );

    let engine = TwoWaySqlEngine::new(config);
    info!(dialect = engine.dialect().name(), template = %cli.template.display(), "rendering template");
    let bound = engine
        .render(&template, &parameters)
        .with_context(|| format!("failed to render {}", cli.template.display()))?;

    let inline_sql = cli.inline.then(|| engine.dialect().inline_sql(&bound));
    let output = Output { bound, inline_sql };
    let json = serde_json::to_string_pretty(&output).context("failed to serialize output")?;
    println!("{json}");

    Ok(())
}

//! Database dialect capabilities.
//!
//! The engine never hard-codes literal syntax. Everything that differs between
//! databases (placeholder markers, date literals, the in-clause size limit)
//! comes from a [`Dialect`] implementation chosen once per engine.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use twowaysql_model::{BoundSql, ParameterValue};

use crate::error::TwoWaySqlError;

/// Capability descriptor for a target database.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Short dialect name.
    fn name(&self) -> &'static str;

    /// Whether the driver accepts named bind markers.
    fn supports_named_binding(&self) -> bool {
        false
    }

    /// Maximum number of elements in one `IN (...)` list, if limited.
    fn in_clause_max_size(&self) -> Option<usize> {
        None
    }

    /// Placeholder text for the 1-based bind `position`.
    fn placeholder(&self, _position: usize) -> String {
        "?".to_owned()
    }

    /// Date literal in this dialect's syntax.
    fn date_literal(&self, date: NaiveDate) -> String {
        format!("'{}'", date.format("%Y-%m-%d"))
    }

    /// Timestamp literal in this dialect's syntax.
    fn timestamp_literal(&self, ts: NaiveDateTime) -> String {
        format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S%.3f"))
    }

    /// Quote a string as a SQL character literal, doubling embedded quotes.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// Render a scalar as literal SQL text.
    fn literal(&self, value: &ParameterValue) -> String {
        match value {
            ParameterValue::Null => "null".to_owned(),
            ParameterValue::String(s) => self.quote_string(s),
            ParameterValue::Date(d) => self.date_literal(*d),
            ParameterValue::Timestamp(t) => self.timestamp_literal(*t),
            ParameterValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| self.literal(v)).collect();
                format!("({})", rendered.join(", "))
            }
            other => other.to_string(),
        }
    }

    /// Substitute literals for placeholders. For log display only; never
    /// execute the result.
    fn inline_sql(&self, bound: &BoundSql) -> String {
        let mut out = String::with_capacity(bound.sql.len());
        let mut rest = bound.sql.as_str();
        for (i, value) in bound.values().enumerate() {
            let marker = self.placeholder(i + 1);
            let Some(pos) = rest.find(&marker) else {
                break;
            };
            out.push_str(&rest[..pos]);
            out.push_str(&self.literal(value));
            rest = &rest[pos + marker.len()..];
        }
        out.push_str(rest);
        out
    }
}

/// ANSI-flavoured default dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDialect;

impl Dialect for StandardDialect {
    fn name(&self) -> &'static str {
        "standard"
    }
}

/// PostgreSQL: numbered `$n` placeholders and typed date literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }

    fn date_literal(&self, date: NaiveDate) -> String {
        format!("DATE '{}'", date.format("%Y-%m-%d"))
    }

    fn timestamp_literal(&self, ts: NaiveDateTime) -> String {
        format!("TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// MySQL: backslash is an escape character inside string literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
    }
}

/// Oracle: named binding, typed literals and the 1000-element `IN` limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl OracleDialect {
    /// Oracle rejects `IN` lists longer than this.
    pub const IN_CLAUSE_MAX_SIZE: usize = 1000;
}

impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn supports_named_binding(&self) -> bool {
        true
    }

    fn in_clause_max_size(&self) -> Option<usize> {
        Some(Self::IN_CLAUSE_MAX_SIZE)
    }

    fn date_literal(&self, date: NaiveDate) -> String {
        format!("date '{}'", date.format("%Y-%m-%d"))
    }

    fn timestamp_literal(&self, ts: NaiveDateTime) -> String {
        format!("timestamp '{}'", ts.format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// A dialect wrapper overriding the in-clause limit of another dialect.
#[derive(Debug)]
struct InClauseLimited {
    inner: Arc<dyn Dialect>,
    max: usize,
}

impl Dialect for InClauseLimited {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn supports_named_binding(&self) -> bool {
        self.inner.supports_named_binding()
    }

    fn in_clause_max_size(&self) -> Option<usize> {
        Some(self.max)
    }

    fn placeholder(&self, position: usize) -> String {
        self.inner.placeholder(position)
    }

    fn date_literal(&self, date: NaiveDate) -> String {
        self.inner.date_literal(date)
    }

    fn timestamp_literal(&self, ts: NaiveDateTime) -> String {
        self.inner.timestamp_literal(ts)
    }

    fn quote_string(&self, s: &str) -> String {
        self.inner.quote_string(s)
    }
}

/// Selector for the built-in dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// [`StandardDialect`].
    #[default]
    Standard,
    /// [`PostgresDialect`].
    Postgres,
    /// [`MySqlDialect`].
    Mysql,
    /// [`OracleDialect`].
    Oracle,
}

impl DialectKind {
    /// Instantiate the dialect, optionally overriding its in-clause limit.
    #[must_use]
    pub fn build(self, in_clause_max_size: Option<usize>) -> Arc<dyn Dialect> {
        let dialect: Arc<dyn Dialect> = match self {
            Self::Standard => Arc::new(StandardDialect),
            Self::Postgres => Arc::new(PostgresDialect),
            Self::Mysql => Arc::new(MySqlDialect),
            Self::Oracle => Arc::new(OracleDialect),
        };
        match in_clause_max_size {
            Some(max) => Arc::new(InClauseLimited {
                inner: dialect,
                max,
            }),
            None => dialect,
        }
    }
}

impl FromStr for DialectKind {
    type Err = TwoWaySqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "ansi" => Ok(Self::Standard),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            "oracle" => Ok(Self::Oracle),
            _ => Err(TwoWaySqlError::UnknownDialect(s.to_owned())),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Postgres => f.write_str("postgres"),
            Self::Mysql => f.write_str("mysql"),
            Self::Oracle => f.write_str("oracle"),
        }
    }
}

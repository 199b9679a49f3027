//! Evaluation output: statement text plus ordered, type-tagged bind values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ParameterValue;

/// SQL type tag carried alongside each bind value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SqlType {
    /// Character data.
    String,
    /// Integral or fractional number.
    Numeric,
    /// Boolean flag.
    Boolean,
    /// Calendar date.
    Date,
    /// Date and time.
    Timestamp,
    /// Untyped value, left for the driver to interpret (including null).
    Raw,
}

impl SqlType {
    /// Infer the SQL type from a scalar parameter value.
    #[must_use]
    pub fn of(value: &ParameterValue) -> Self {
        match value {
            ParameterValue::String(_) => Self::String,
            ParameterValue::Integer(_) | ParameterValue::Decimal(_) => Self::Numeric,
            ParameterValue::Bool(_) => Self::Boolean,
            ParameterValue::Date(_) => Self::Date,
            ParameterValue::Timestamp(_) => Self::Timestamp,
            ParameterValue::Null | ParameterValue::List(_) | ParameterValue::Object(_) => Self::Raw,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("STRING"),
            Self::Numeric => f.write_str("NUMERIC"),
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::Date => f.write_str("DATE"),
            Self::Timestamp => f.write_str("TIMESTAMP"),
            Self::Raw => f.write_str("RAW"),
        }
    }
}

/// A single bind value, positionally matched to one placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundValue {
    /// The value handed to the driver.
    pub value: ParameterValue,
    /// Its SQL type.
    pub sql_type: SqlType,
    /// Expression path (or column) the value came from, for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl BoundValue {
    /// Bind a scalar, inferring its SQL type.
    #[must_use]
    pub fn new(value: ParameterValue) -> Self {
        let sql_type = SqlType::of(&value);
        Self {
            value,
            sql_type,
            source: None,
        }
    }

    /// Attach the originating expression path or column name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Executable statement text with its positional bind values.
///
/// The number of placeholders in `sql` always equals `bound_values.len()`,
/// and the n-th placeholder corresponds to the n-th bound value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundSql {
    /// Statement text with positional placeholders.
    pub sql: String,
    /// Bind values in placeholder order.
    pub bound_values: Vec<BoundValue>,
}

impl BoundSql {
    /// Create from parts.
    #[must_use]
    pub fn new(sql: impl Into<String>, bound_values: Vec<BoundValue>) -> Self {
        Self {
            sql: sql.into(),
            bound_values,
        }
    }

    /// Whether both the text and the bind list are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty() && self.bound_values.is_empty()
    }

    /// Count `?` placeholders outside single-quoted literals and comments.
    ///
    /// Only meaningful for `?`-style dialects; numbered markers such as
    /// Postgres `$1` are not counted.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    /// The raw bind values in placeholder order.
    pub fn values(&self) -> impl Iterator<Item = &ParameterValue> {
        self.bound_values.iter().map(|b| &b.value)
    }
}

impl fmt::Display for BoundSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        if !self.bound_values.is_empty() {
            f.write_str(" -- binds: [")?;
            for (i, b) in self.bound_values.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}:{}", b.value, b.sql_type)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// Count `?` markers that sit outside quoted literals and comments.
///
/// Numbered or named placeholder styles (`$1`, `:1`) are not recognized.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'\'' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'?' => count += 1,
            _ => {}
        }
        i += 1;
    }
    count
}

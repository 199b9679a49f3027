//! Condition keys: the closed set of comparison operators.

use std::fmt;

use serde::{Deserialize, Serialize};
use twowaysql_model::ParameterValue;

use crate::value::ConditionValue;

/// A comparison operator with fixed operand syntax and override policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKey {
    /// `col = ?`
    Equal,
    /// `col <> ?`
    NotEqual,
    /// `col > ?`
    GreaterThan,
    /// `col >= ?`
    GreaterEqual,
    /// `col < ?`
    LessThan,
    /// `col <= ?`
    LessEqual,
    /// `col in (?, ...)`
    InScope,
    /// `col not in (?, ...)`
    NotInScope,
    /// `col is null`
    IsNull,
    /// `col is not null`
    IsNotNull,
    /// `col like ? escape '|'`
    LikeSearch,
}

/// What registering a condition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "decision")]
pub enum Decision {
    /// Null or empty value: no effect.
    Ignore,
    /// Same value already registered for this key: no effect.
    Duplicate,
    /// Different value already registered: the clause at `location` now
    /// binds the new value.
    Override {
        /// Index of the rewritten clause fragment.
        location: usize,
    },
    /// First registration: a new clause fragment was appended.
    Emit,
}

impl ConditionKey {
    /// Every key, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Equal,
        Self::NotEqual,
        Self::GreaterThan,
        Self::GreaterEqual,
        Self::LessThan,
        Self::LessEqual,
        Self::InScope,
        Self::NotInScope,
        Self::IsNull,
        Self::IsNotNull,
        Self::LikeSearch,
    ];

    /// Condition-key name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::NotEqual => "notEqual",
            Self::GreaterThan => "greaterThan",
            Self::GreaterEqual => "greaterEqual",
            Self::LessThan => "lessThan",
            Self::LessEqual => "lessEqual",
            Self::InScope => "inScope",
            Self::NotInScope => "notInScope",
            Self::IsNull => "isNull",
            Self::IsNotNull => "isNotNull",
            Self::LikeSearch => "likeSearch",
        }
    }

    /// SQL operand symbol.
    #[must_use]
    pub fn operand(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::GreaterThan => ">",
            Self::GreaterEqual => ">=",
            Self::LessThan => "<",
            Self::LessEqual => "<=",
            Self::InScope => "in",
            Self::NotInScope => "not in",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
            Self::LikeSearch => "like",
        }
    }

    /// Whether the key compares against a value.
    #[must_use]
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }

    /// Whether the value is a list.
    #[must_use]
    pub fn takes_list(self) -> bool {
        matches!(self, Self::InScope | Self::NotInScope)
    }

    /// Whether `value` registers nothing for this key.
    fn ignores(self, value: &ParameterValue) -> bool {
        match value {
            ParameterValue::Null => true,
            ParameterValue::List(items) => self.takes_list() && items.is_empty(),
            ParameterValue::String(s) => self == Self::LikeSearch && s.is_empty(),
            _ => false,
        }
    }

    /// Decide what registering `value` does given the column's state.
    ///
    /// Value-less keys (`IsNull`, `IsNotNull`) ignore `value`.
    #[must_use]
    pub fn decide(self, current: &ConditionValue, value: &ParameterValue) -> Decision {
        if !self.takes_value() {
            return if current.has_fixed(self) {
                Decision::Duplicate
            } else {
                Decision::Emit
            };
        }
        if self.ignores(value) {
            return Decision::Ignore;
        }
        match current.fixed(self) {
            Some(fixed) if fixed.value == *value => Decision::Duplicate,
            Some(fixed) => Decision::Override {
                location: fixed.location,
            },
            None => Decision::Emit,
        }
    }
}

impl fmt::Display for ConditionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Error types for condition registration.

use crate::key::ConditionKey;

/// A condition value of the wrong shape for its condition key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    /// `in_scope` / `not_in_scope` with a non-list value.
    #[error("in-scope condition on {column} requires a list but got {type_name}")]
    InScopeNotList {
        /// Column the condition was registered for.
        column: String,
        /// Type of the value received.
        type_name: String,
    },

    /// `like_search` with a non-string value.
    #[error("like-search condition on {column} requires a string but got {type_name}")]
    LikeSearchNotString {
        /// Column the condition was registered for.
        column: String,
        /// Type of the value received.
        type_name: String,
    },

    /// A comparison key with a list or object value.
    #[error("{key} condition on {column} requires a scalar but got {type_name}")]
    ScalarRequired {
        /// Column the condition was registered for.
        column: String,
        /// Condition key used.
        key: ConditionKey,
        /// Type of the value received.
        type_name: String,
    },
}

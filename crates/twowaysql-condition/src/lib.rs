//! Condition-key query building.
//!
//! Structured queries register conditions per column through a
//! [`ConditionQuery`]. For each (column, operator) pair the first non-null
//! value emits a clause, an identical value is a duplicate (recorded with the
//! caller's source location), and a different value overrides the earlier
//! clause in place.
//!
//! ```
//! use std::sync::Arc;
//!
//! use twowaysql_condition::{ConditionQuery, Decision};
//! use twowaysql_core::StandardDialect;
//!
//! let mut cq = ConditionQuery::new(Arc::new(StandardDialect));
//! cq.greater_equal("PRICE", 10).unwrap();
//! assert_eq!(
//!     cq.greater_equal("PRICE", 20).unwrap(),
//!     Decision::Override { location: 0 }
//! );
//! assert_eq!(cq.to_bound_sql().sql, "where PRICE >= ?");
//! ```
#![allow(clippy::module_name_repetitions)]

mod error;
mod key;
mod like;
mod query;
mod value;

pub use error::ConditionError;
pub use key::{ConditionKey, Decision};
pub use like::{LikeSearchKind, LikeSearchOption};
pub use query::{ClauseFragment, ConditionQuery};
pub use value::{ConditionValue, FixedCondition};

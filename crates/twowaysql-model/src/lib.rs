//! Model types for the two-way SQL engine.
//!
//! This crate holds the values that flow in and out of the engine: the
//! caller-owned [`ParameterObject`] graph that templates read from, and the
//! [`BoundSql`] produced by evaluation (statement text plus the ordered,
//! type-tagged bind values).
#![allow(clippy::module_name_repetitions)]

pub mod bound;
pub mod parameter;
pub mod value;

pub use bound::{BoundSql, BoundValue, SqlType};
pub use parameter::ParameterObject;
pub use value::ParameterValue;

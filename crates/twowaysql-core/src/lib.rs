//! Core configuration and dialect capabilities for the two-way SQL engine.
//!
//! This crate provides the pieces shared by the template engine and the
//! condition-key query builder: the environment-driven [`EngineConfig`], the
//! [`Dialect`] capability trait with its built-in implementations, and the
//! common error type.

mod config;
mod dialect;
mod error;

pub use config::{EngineConfig, NullPolicy};
pub use dialect::{
    Dialect, DialectKind, MySqlDialect, OracleDialect, PostgresDialect, StandardDialect,
};
pub use error::{TwoWaySqlError, TwoWaySqlResult};

//! Per-evaluation state.
//!
//! [`CommandContext`] carries what a walk reads (the variable scope, the
//! dialect, dynamic-binding depth) and [`SqlBuffer`] is the accumulator it
//! writes. Both are created per call and dropped once the [`BoundSql`] is
//! produced.

use twowaysql_core::Dialect;
use twowaysql_model::{BoundSql, BoundValue};

use crate::expression::Scope;

/// Growing SQL text and its bind values, in placeholder order.
#[derive(Debug, Default)]
pub struct SqlBuffer {
    sql: String,
    binds: Vec<BoundValue>,
    /// Binds already emitted before this buffer was forked.
    bind_base: usize,
}

impl SqlBuffer {
    /// Empty top-level buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered text so far.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bind values so far.
    #[must_use]
    pub fn binds(&self) -> &[BoundValue] {
        &self.binds
    }

    /// Append SQL text verbatim.
    pub fn push_str(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    /// Append one placeholder and record its value.
    pub fn push_bind(&mut self, dialect: &dyn Dialect, value: BoundValue) {
        let position = self.bind_base + self.binds.len() + 1;
        self.sql.push_str(&dialect.placeholder(position));
        self.binds.push(value);
    }

    /// Empty buffer for a nested scope, continuing placeholder numbering.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            sql: String::new(),
            binds: Vec::new(),
            bind_base: self.bind_base + self.binds.len(),
        }
    }

    /// Append a forked scope's output, with `sql` replacing its text.
    pub fn merge(&mut self, child: Self, sql: &str) {
        self.sql.push_str(sql);
        self.binds.extend(child.binds);
    }

    /// Finish into the evaluation result.
    #[must_use]
    pub fn into_bound_sql(self) -> BoundSql {
        BoundSql::new(self.sql, self.binds)
    }
}

/// Read-side state of one evaluation.
#[derive(Debug)]
pub struct CommandContext<'a> {
    /// Variables visible to directives.
    pub scope: Scope<'a>,
    /// Target dialect.
    pub dialect: &'a dyn Dialect,
    /// Number of dynamically bound templates currently being walked.
    pub dynamic_depth: usize,
}

impl<'a> CommandContext<'a> {
    /// Fresh context for one call.
    #[must_use]
    pub fn new(scope: Scope<'a>, dialect: &'a dyn Dialect) -> Self {
        Self {
            scope,
            dialect,
            dynamic_depth: 0,
        }
    }
}

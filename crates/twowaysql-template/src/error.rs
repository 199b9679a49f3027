//! Error types for template parsing and evaluation.

use crate::expression::ExpressionError;

/// A malformed template. Deterministic for a given text, so it is cached
/// alongside successfully parsed trees and never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A `/*` with no matching `*/`.
    #[error("unclosed directive comment starting at offset {offset}")]
    UnclosedDirective {
        /// Byte offset of the opener.
        offset: usize,
    },
    /// A parenthesized test value whose `(` is never closed before the next
    /// comment or end of input.
    #[error("unbalanced parenthesized test value at offset {offset}")]
    UnbalancedTestValue {
        /// Byte offset of the `(`.
        offset: usize,
    },
    /// An `END` without an open block, or a block left open at end of input.
    #[error("unmatched {directive} directive at offset {offset}")]
    UnmatchedOpenClose {
        /// The directive text (`END`, `IF pmb.x != null`, ...).
        directive: String,
        /// Byte offset of the directive.
        offset: usize,
    },
    /// A directive payload that is not a valid expression or path.
    #[error("invalid expression '{source_text}' at offset {offset}: {message}")]
    InvalidExpression {
        /// The offending payload.
        source_text: String,
        /// Byte offset of the directive.
        offset: usize,
        /// Explanation.
        message: String,
    },
    /// `NEXT`, `FIRST` or `LAST` used outside a `FOR` block.
    #[error("{directive} directive at offset {offset} is not inside a FOR loop")]
    LoopDirectiveOutsideFor {
        /// The directive keyword.
        directive: String,
        /// Byte offset of the directive.
        offset: usize,
    },
}

/// Errors raised while evaluating a parsed template against parameters.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The template (or a dynamically bound fragment) failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An expression could not be evaluated.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A null-disallowed bind directive received null.
    #[error("bind variable {path} resolved to null")]
    NullBind {
        /// Expression path of the directive.
        path: String,
    },

    /// An in-clause directive received a non-list value.
    #[error("in-clause variable {path} must be a list but was {type_name}")]
    InScopeType {
        /// Expression path of the directive.
        path: String,
        /// Type of the value received.
        type_name: String,
    },

    /// A list value reached a directive that is not an in-clause context.
    #[error("variable {path} is a list but its directive is not followed by an in-clause test value")]
    ListOutsideInScope {
        /// Expression path of the directive.
        path: String,
    },

    /// An in-clause list is longer than the dialect allows.
    #[error("in-clause variable {path} has {size} elements, exceeding the limit of {max}")]
    InScopeLimitExceeded {
        /// Expression path of the directive.
        path: String,
        /// Number of elements received.
        size: usize,
        /// Dialect limit.
        max: usize,
    },

    /// A `FOR` directive over a value that is not a list.
    #[error("FOR variable {path} must be a list but was {type_name}")]
    LoopNotList {
        /// Expression path of the directive.
        path: String,
        /// Type of the value received.
        type_name: String,
    },

    /// Embedded values that keep expanding into further directives.
    #[error("dynamic binding through {path} nested deeper than {max} levels")]
    DynamicBindingTooDeep {
        /// Expression path of the directive.
        path: String,
        /// Depth limit.
        max: usize,
    },
}

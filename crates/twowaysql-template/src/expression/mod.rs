//! `IF` condition and variable path expressions.
//!
//! The pipeline mirrors the template itself:
//!
//! 1. **Lexing**: Tokenize the condition text.
//! 2. **Parsing**: Build an [`Expr`] by recursive descent.
//! 3. **Evaluation**: Resolve paths through a [`Scope`] and reduce to a boolean.

pub mod ast;
pub mod evaluator;
pub mod parser;

pub use ast::{CompareOp, Expr, Literal, LogicalOp, Method, Operand, PropertyPath};
pub use evaluator::{CURRENT_VARIABLE, LoopFrame, Scope};
pub use parser::{ExpressionError, parse_condition};

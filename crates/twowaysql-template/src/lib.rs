//! Two-way SQL templates.
//!
//! A two-way template is plain SQL whose directives live in comments, so it
//! runs unchanged in a SQL client and can also be evaluated with live
//! parameters:
//!
//! ```sql
//! select * from MEMBER
//! /*BEGIN*/where
//!   /*IF pmb.memberId != null*/MEMBER_ID = /*pmb.memberId*/3/*END*/
//!   /*IF pmb.memberName != null*/and MEMBER_NAME like /*pmb.memberName*/'S%'/*END*/
//! /*END*/
//! ```
//!
//! Text is tokenized, built into a [`Node`] tree once (cached by exact text),
//! and evaluated per call into a [`BoundSql`](twowaysql_model::BoundSql).
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod node;
pub mod parser;
pub mod pruning;
pub mod tokenizer;

mod engine;

pub use engine::TwoWaySqlEngine;
pub use error::{ParseError, TemplateError};
pub use evaluator::TemplateEvaluator;
pub use expression::ExpressionError;
pub use node::Node;
pub use parser::{ParseOptions, parse, parse_with};

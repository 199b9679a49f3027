//! Variable resolution and `IF` condition evaluation.
//!
//! A [`Scope`] resolves dotted paths against the parameter object and the
//! active loop elements, then evaluates conditions to booleans. Literals in a
//! comparison take the type of the value they are compared with, so
//! `pmb.code == 8` compares as a string when `code` is a string property.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use twowaysql_model::value::DATE_FORMAT;
use twowaysql_model::{ParameterObject, ParameterValue};

use super::ast::{CompareOp, Expr, Literal, LogicalOp, Method, Operand, PropertyPath};
use super::parser::ExpressionError;

/// Name of the loop variable inside `FOR` blocks.
pub const CURRENT_VARIABLE: &str = "#current";

static NULL: ParameterValue = ParameterValue::Null;

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// One active `FOR` iteration.
#[derive(Debug, Clone, Copy)]
pub struct LoopFrame<'a> {
    /// The element bound to `#current`.
    pub element: &'a ParameterValue,
    /// Zero-based position of the element.
    pub index: usize,
    /// Length of the list being iterated.
    pub len: usize,
}

impl LoopFrame<'_> {
    /// Whether this is the first element.
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Whether this is the last element.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.len
    }
}

/// Variable scope for one evaluation: the parameter object under its alias,
/// plus a stack of loop frames for `#current`.
#[derive(Debug)]
pub struct Scope<'a> {
    root_alias: &'a str,
    parameters: &'a ParameterObject,
    loops: Vec<LoopFrame<'a>>,
}

enum Cursor<'a> {
    Root,
    Value(&'a ParameterValue),
}

impl<'a> Scope<'a> {
    /// Create a scope exposing `parameters` under `root_alias`.
    #[must_use]
    pub fn new(root_alias: &'a str, parameters: &'a ParameterObject) -> Self {
        Self {
            root_alias,
            parameters,
            loops: Vec::new(),
        }
    }

    /// Enter a loop iteration.
    pub fn push_loop(&mut self, frame: LoopFrame<'a>) {
        self.loops.push(frame);
    }

    /// Leave the innermost loop iteration.
    pub fn pop_loop(&mut self) {
        self.loops.pop();
    }

    /// The innermost loop iteration, if inside a `FOR` block.
    #[must_use]
    pub fn current_loop(&self) -> Option<&LoopFrame<'a>> {
        self.loops.last()
    }

    fn not_found(&self, path: &PropertyPath) -> ExpressionError {
        ExpressionError::PropertyNotFound {
            path: path.to_string(),
            type_name: self.parameters.type_name.clone(),
        }
    }

    /// Resolve a dotted path to a value.
    ///
    /// The first segment is the root alias, `#current`, or a top-level
    /// property of the parameter object. A null anywhere along the path
    /// resolves the whole path to null.
    ///
    /// # Errors
    ///
    /// Returns `PropertyNotFound` if a segment does not exist, or
    /// `TypeMismatch` if the path names the parameter object itself.
    pub fn resolve(&self, path: &PropertyPath) -> Result<&'a ParameterValue, ExpressionError> {
        let root = path.root();
        let mut cursor = if root == self.root_alias {
            Cursor::Root
        } else if root == CURRENT_VARIABLE {
            let frame = self.loops.last().ok_or_else(|| self.not_found(path))?;
            Cursor::Value(frame.element)
        } else {
            Cursor::Value(self.parameters.get(root).ok_or_else(|| self.not_found(path))?)
        };

        for segment in path.segments.iter().skip(1) {
            cursor = match cursor {
                Cursor::Root => Cursor::Value(
                    self.parameters
                        .get(segment)
                        .ok_or_else(|| self.not_found(path))?,
                ),
                Cursor::Value(ParameterValue::Null) => return Ok(&NULL),
                Cursor::Value(value) => Cursor::Value(
                    value.property(segment).ok_or_else(|| self.not_found(path))?,
                ),
            };
        }

        match cursor {
            Cursor::Value(value) => Ok(value),
            Cursor::Root => Err(ExpressionError::TypeMismatch {
                message: format!(
                    "{path} is the {} parameter object itself, not a property",
                    self.parameters.type_name
                ),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Condition evaluation
    // -----------------------------------------------------------------------

    /// Evaluate a condition to `true` or `false`.
    ///
    /// # Errors
    ///
    /// Returns `ExpressionError` if a path does not resolve, operand types
    /// cannot be compared, or a bare operand is not a boolean.
    pub fn evaluate(&self, expr: &Expr) -> Result<bool, ExpressionError> {
        match expr {
            Expr::Compare { left, op, right } => self.eval_compare(left, *op, right),
            Expr::Logical { op, left, right } => self.eval_logical(*op, left, right),
            Expr::Not(inner) => self.evaluate(inner).map(|v| !v),
            Expr::Operand(operand) => match self.resolve_operand(operand)?.as_ref() {
                ParameterValue::Bool(b) => Ok(*b),
                _ => Err(ExpressionError::NotBoolean {
                    expression: operand.to_string(),
                }),
            },
        }
    }

    fn eval_logical(&self, op: LogicalOp, left: &Expr, right: &Expr) -> Result<bool, ExpressionError> {
        match op {
            LogicalOp::And => Ok(self.evaluate(left)? && self.evaluate(right)?),
            LogicalOp::Or => Ok(self.evaluate(left)? || self.evaluate(right)?),
        }
    }

    fn eval_compare(
        &self,
        left: &Operand,
        op: CompareOp,
        right: &Operand,
    ) -> Result<bool, ExpressionError> {
        let (lv, rv) = match (left, right) {
            (Operand::Literal(l), Operand::Literal(r)) => {
                (Cow::Owned(literal_value(l)?), Cow::Owned(literal_value(r)?))
            }
            (Operand::Literal(l), other) => {
                let rv = self.resolve_operand(other)?;
                (Cow::Owned(coerce_literal(l, &rv)?), rv)
            }
            (other, Operand::Literal(r)) => {
                let lv = self.resolve_operand(other)?;
                let rv = coerce_literal(r, &lv)?;
                (lv, Cow::Owned(rv))
            }
            (l, r) => (self.resolve_operand(l)?, self.resolve_operand(r)?),
        };
        compare_values(&lv, &rv, op)
    }

    fn resolve_operand(&self, operand: &Operand) -> Result<Cow<'a, ParameterValue>, ExpressionError> {
        match operand {
            Operand::Literal(lit) => literal_value(lit).map(Cow::Owned),
            Operand::Path(path) => self.resolve(path).map(Cow::Borrowed),
            Operand::Method { path, method } => {
                let value = self.resolve(path)?;
                apply_method(path, *method, value).map(Cow::Owned)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn apply_method(
    path: &PropertyPath,
    method: Method,
    value: &ParameterValue,
) -> Result<ParameterValue, ExpressionError> {
    let size = match value {
        ParameterValue::List(items) => Some(items.len()),
        ParameterValue::String(s) => Some(s.chars().count()),
        ParameterValue::Object(m) => Some(m.len()),
        ParameterValue::Null => None,
        other => {
            return Err(ExpressionError::TypeMismatch {
                message: format!("{method}() does not apply to {path} of type {}", other.type_name()),
            });
        }
    };
    match (method, size) {
        (Method::Size, Some(n)) => Ok(ParameterValue::Integer(
            i64::try_from(n).unwrap_or(i64::MAX),
        )),
        (Method::Size, None) => Err(ExpressionError::TypeMismatch {
            message: format!("size() called on null {path}"),
        }),
        (Method::IsEmpty, n) => Ok(ParameterValue::Bool(n.is_none_or(|n| n == 0))),
        (Method::IsNotEmpty, n) => Ok(ParameterValue::Bool(n.is_some_and(|n| n > 0))),
    }
}

fn parse_number(text: &str) -> Option<ParameterValue> {
    text.parse::<i64>()
        .map(ParameterValue::Integer)
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(ParameterValue::Decimal))
}

fn literal_value(lit: &Literal) -> Result<ParameterValue, ExpressionError> {
    match lit {
        Literal::Null => Ok(ParameterValue::Null),
        Literal::Bool(b) => Ok(ParameterValue::Bool(*b)),
        Literal::String(s) => Ok(ParameterValue::String(s.clone())),
        Literal::Number(n) => parse_number(n).ok_or_else(|| ExpressionError::TypeMismatch {
            message: format!("invalid number literal {n}"),
        }),
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Convert a literal to the type of the value it is compared with.
fn coerce_literal(lit: &Literal, target: &ParameterValue) -> Result<ParameterValue, ExpressionError> {
    let mismatch = || ExpressionError::TypeMismatch {
        message: format!("literal {lit} cannot be compared with {}", target.type_name()),
    };
    match (lit, target) {
        (Literal::Number(n), ParameterValue::String(_)) => Ok(ParameterValue::String(n.clone())),
        (Literal::String(s), ParameterValue::Integer(_) | ParameterValue::Decimal(_)) => {
            parse_number(s.trim()).ok_or_else(mismatch)
        }
        (Literal::String(s), ParameterValue::Date(_)) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(ParameterValue::Date)
            .map_err(|_| mismatch()),
        (Literal::String(s), ParameterValue::Timestamp(_)) => {
            parse_timestamp(s).map(ParameterValue::Timestamp).ok_or_else(mismatch)
        }
        (Literal::String(s), ParameterValue::Bool(_)) => {
            s.parse::<bool>().map(ParameterValue::Bool).map_err(|_| mismatch())
        }
        _ => literal_value(lit),
    }
}

fn ordering_of(a: &ParameterValue, b: &ParameterValue) -> Option<Ordering> {
    match (a, b) {
        (ParameterValue::String(x), ParameterValue::String(y)) => Some(x.cmp(y)),
        (ParameterValue::Integer(x), ParameterValue::Integer(y)) => Some(x.cmp(y)),
        (ParameterValue::Bool(x), ParameterValue::Bool(y)) => Some(x.cmp(y)),
        (ParameterValue::Date(x), ParameterValue::Date(y)) => Some(x.cmp(y)),
        (ParameterValue::Timestamp(x), ParameterValue::Timestamp(y)) => Some(x.cmp(y)),
        (ParameterValue::Date(x), ParameterValue::Timestamp(y)) => {
            x.and_hms_opt(0, 0, 0).map(|x| x.cmp(y))
        }
        (ParameterValue::Timestamp(x), ParameterValue::Date(y)) => {
            y.and_hms_opt(0, 0, 0).map(|y| x.cmp(&y))
        }
        _ if a.is_numeric() && b.is_numeric() => a.as_f64()?.partial_cmp(&b.as_f64()?),
        _ => None,
    }
}

/// Compare two resolved values. Null equals only null, and any ordering
/// comparison involving null is false.
fn compare_values(
    a: &ParameterValue,
    b: &ParameterValue,
    op: CompareOp,
) -> Result<bool, ExpressionError> {
    if a.is_null() || b.is_null() {
        let both = a.is_null() && b.is_null();
        return Ok(match op {
            CompareOp::Eq => both,
            CompareOp::Ne => !both,
            CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => false,
        });
    }

    if let Some(ord) = ordering_of(a, b) {
        return Ok(match op {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        });
    }

    match (a, b, op) {
        (ParameterValue::List(_), ParameterValue::List(_), CompareOp::Eq)
        | (ParameterValue::Object(_), ParameterValue::Object(_), CompareOp::Eq) => Ok(a == b),
        (ParameterValue::List(_), ParameterValue::List(_), CompareOp::Ne)
        | (ParameterValue::Object(_), ParameterValue::Object(_), CompareOp::Ne) => Ok(a != b),
        _ => Err(ExpressionError::TypeMismatch {
            message: format!("cannot apply {op} to {} and {}", a.type_name(), b.type_name()),
        }),
    }
}

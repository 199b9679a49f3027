//! AST types for `IF` conditions and variable paths.

use std::fmt;

/// Boolean expression inside an `IF` directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Comparison: `left op right`.
    Compare {
        /// Left-hand operand.
        left: Operand,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand operand.
        right: Operand,
    },
    /// `left && right` or `left || right`.
    Logical {
        /// Logical operator.
        op: LogicalOp,
        /// Left-hand expression.
        left: Box<Expr>,
        /// Right-hand expression.
        right: Box<Expr>,
    },
    /// `!expr`
    Not(Box<Expr>),
    /// A bare operand, which must evaluate to a boolean.
    Operand(Operand),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "=="),
            Self::Ne => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
        }
    }
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// A value producer inside a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal written in the template.
    Literal(Literal),
    /// A variable path (`pmb.memberName`, `#current`).
    Path(PropertyPath),
    /// A pseudo method applied to a path (`pmb.list.size()`).
    Method {
        /// Receiver path.
        path: PropertyPath,
        /// Method.
        method: Method,
    },
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Path(path) => write!(f, "{path}"),
            Self::Method { path, method } => write!(f, "{path}.{method}()"),
        }
    }
}

/// Literal written in a condition. Numbers keep their source text so they can
/// be coerced to the type of the value they are compared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Numeric literal, as written.
    Number(String),
    /// Single-quoted string, unescaped.
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(n),
            Self::String(s) => write!(f, "'{s}'"),
        }
    }
}

/// Pseudo methods available on lists and strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Element or character count.
    Size,
    /// `size() == 0`
    IsEmpty,
    /// `size() > 0`
    IsNotEmpty,
}

impl Method {
    /// Look up a method by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "size" | "length" => Some(Self::Size),
            "isEmpty" => Some(Self::IsEmpty),
            "isNotEmpty" => Some(Self::IsNotEmpty),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size => f.write_str("size"),
            Self::IsEmpty => f.write_str("isEmpty"),
            Self::IsNotEmpty => f.write_str("isNotEmpty"),
        }
    }
}

/// A dotted variable path. The first segment names a scope root (the
/// parameter-object alias or `#current`) or a top-level property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    /// Path segments in order.
    pub segments: Vec<String>,
}

impl PropertyPath {
    /// Split a dotted path. Returns `None` if any segment is empty.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let segments: Vec<String> = text.split('.').map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return None;
        }
        Some(Self { segments })
    }

    /// First segment.
    #[must_use]
    pub fn root(&self) -> &str {
        self.segments.first().map_or("", String::as_str)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

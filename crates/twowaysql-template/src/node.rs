//! The parsed template tree.
//!
//! A tree is immutable once built (the only interior mutability is the
//! per-node cache of dynamically bound sub-templates) and is shared across
//! threads and evaluations behind an `Arc`.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::expression::{Expr, PropertyPath};
use crate::tokenizer::TestValue;

/// A node of the template tree. Children keep source order.
#[derive(Debug)]
pub enum Node {
    /// The whole template.
    Root(Vec<Node>),
    /// SQL text copied verbatim.
    Literal(String),
    /// Bind variable: one placeholder per scalar, one per list element.
    Bind(BindNode),
    /// Embedded variable: rendered as SQL text, never bound.
    Embedded(EmbeddedNode),
    /// Conditional block with an optional `-- ELSE` branch.
    If(IfNode),
    /// Prunable scope.
    Begin(Vec<Node>),
    /// Loop over a list, binding each element to `#current`.
    For(ForNode),
    /// Connector emitted before every loop element but the first.
    Next(String),
    /// Emitted on the first loop element only.
    First(Vec<Node>),
    /// Emitted on the last loop element only.
    Last(Vec<Node>),
}

impl Node {
    /// Direct children of a container node; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Root(children)
            | Self::Begin(children)
            | Self::First(children)
            | Self::Last(children) => children,
            Self::For(node) => &node.children,
            Self::If(node) => &node.then_branch,
            Self::Literal(_) | Self::Bind(_) | Self::Embedded(_) | Self::Next(_) => &[],
        }
    }
}

/// `/*pmb.path*/test`
#[derive(Debug)]
pub struct BindNode {
    /// Variable path.
    pub path: PropertyPath,
    /// Discarded fallback; decides in-clause context.
    pub test_value: TestValue,
    /// Fail instead of skipping when the value is null.
    pub null_disallowed: bool,
}

/// `/*$pmb.path*/test`
#[derive(Debug)]
pub struct EmbeddedNode {
    /// Variable path.
    pub path: PropertyPath,
    /// Discarded fallback; decides quoting and in-clause context.
    pub test_value: TestValue,
    /// Fail instead of skipping when the value is null.
    pub null_disallowed: bool,
    /// Last dynamically bound text and its parsed tree.
    pub(crate) dynamic: RwLock<Option<(String, Arc<Node>)>>,
}

impl EmbeddedNode {
    /// Create an embedded node with an empty dynamic-binding cache.
    #[must_use]
    pub fn new(path: PropertyPath, test_value: TestValue, null_disallowed: bool) -> Self {
        Self {
            path,
            test_value,
            null_disallowed,
            dynamic: RwLock::new(None),
        }
    }

    /// The cached sub-tree for `text`, if the last dynamic value was `text`.
    pub(crate) fn cached_dynamic(&self, text: &str) -> Option<Arc<Node>> {
        self.dynamic
            .read()
            .as_ref()
            .filter(|(cached, _)| cached == text)
            .map(|(_, tree)| Arc::clone(tree))
    }

    pub(crate) fn store_dynamic(&self, text: &str, tree: Arc<Node>) {
        *self.dynamic.write() = Some((text.to_owned(), tree));
    }
}

/// `/*IF cond*/ ... -- ELSE ... /*END*/`
#[derive(Debug)]
pub struct IfNode {
    /// Parsed condition.
    pub condition: Expr,
    /// Condition source text, for diagnostics.
    pub source: String,
    /// Children walked when the condition holds.
    pub then_branch: Vec<Node>,
    /// Children walked otherwise.
    pub else_branch: Vec<Node>,
}

/// `/*FOR pmb.list*/ ... /*END*/`
#[derive(Debug)]
pub struct ForNode {
    /// Path of the list to iterate.
    pub path: PropertyPath,
    /// Loop body.
    pub children: Vec<Node>,
}

//! Node tree builder.
//!
//! Consumes the token stream and keeps an explicit stack of open containers
//! (`IF`, `BEGIN`, `FOR`, `FIRST`, `LAST`). An opening directive pushes a
//! frame and `END` pops it into its parent.

use tracing::debug;

use crate::error::ParseError;
use crate::expression::{PropertyPath, parse_condition};
use crate::node::{BindNode, EmbeddedNode, ForNode, IfNode, Node};
use crate::tokenizer::{Token, TokenKind, tokenize};

/// Options fixed at parse time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Mark every bind and embedded directive null-disallowed.
    pub null_disallowed: bool,
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

enum FrameKind {
    If {
        node: IfNode,
        in_else: bool,
    },
    Begin(Vec<Node>),
    For(ForNode),
    First(Vec<Node>),
    Last(Vec<Node>),
}

struct Frame {
    kind: FrameKind,
    /// Directive text for unmatched-block errors.
    directive: String,
    offset: usize,
}

impl Frame {
    fn children_mut(&mut self) -> &mut Vec<Node> {
        match &mut self.kind {
            FrameKind::If { node, in_else } => {
                if *in_else {
                    &mut node.else_branch
                } else {
                    &mut node.then_branch
                }
            }
            FrameKind::Begin(children) | FrameKind::First(children) | FrameKind::Last(children) => {
                children
            }
            FrameKind::For(node) => &mut node.children,
        }
    }

    fn into_node(self) -> Node {
        match self.kind {
            FrameKind::If { node, .. } => Node::If(node),
            FrameKind::Begin(children) => Node::Begin(children),
            FrameKind::For(node) => Node::For(node),
            FrameKind::First(children) => Node::First(children),
            FrameKind::Last(children) => Node::Last(children),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct TreeBuilder {
    options: ParseOptions,
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new(options: ParseOptions) -> Self {
        Self {
            options,
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => frame.children_mut(),
            None => &mut self.root,
        }
    }

    fn in_loop(&self) -> bool {
        self.stack
            .iter()
            .any(|f| matches!(f.kind, FrameKind::For(_)))
    }

    fn require_loop(&self, directive: &str, offset: usize) -> Result<(), ParseError> {
        if self.in_loop() {
            Ok(())
        } else {
            Err(ParseError::LoopDirectiveOutsideFor {
                directive: directive.to_owned(),
                offset,
            })
        }
    }

    fn open(&mut self, kind: FrameKind, directive: impl Into<String>, offset: usize) {
        self.stack.push(Frame {
            kind,
            directive: directive.into(),
            offset,
        });
    }

    fn accept(&mut self, token: Token) -> Result<(), ParseError> {
        let Token { kind, offset } = token;
        match kind {
            TokenKind::Sql(text) => self.current().push(Node::Literal(text)),
            TokenKind::Bind {
                expression,
                test_value,
            } => {
                let path = parse_path(&expression, offset)?;
                let node = Node::Bind(BindNode {
                    path,
                    test_value,
                    null_disallowed: self.options.null_disallowed,
                });
                self.current().push(node);
            }
            TokenKind::Embedded {
                expression,
                test_value,
            } => {
                let path = parse_path(&expression, offset)?;
                let node = Node::Embedded(EmbeddedNode::new(
                    path,
                    test_value,
                    self.options.null_disallowed,
                ));
                self.current().push(node);
            }
            TokenKind::If(source) => {
                let condition =
                    parse_condition(&source).map_err(|e| ParseError::InvalidExpression {
                        source_text: source.clone(),
                        offset,
                        message: e.to_string(),
                    })?;
                let directive = format!("IF {source}");
                let node = IfNode {
                    condition,
                    source,
                    then_branch: Vec::new(),
                    else_branch: Vec::new(),
                };
                self.open(
                    FrameKind::If {
                        node,
                        in_else: false,
                    },
                    directive,
                    offset,
                );
            }
            TokenKind::Else(raw) => {
                let switched = match self.stack.last_mut() {
                    Some(Frame {
                        kind: FrameKind::If { in_else, .. },
                        ..
                    }) if !*in_else => {
                        *in_else = true;
                        true
                    }
                    _ => false,
                };
                // Outside an IF this is an ordinary line comment.
                if !switched {
                    self.current().push(Node::Literal(raw));
                }
            }
            TokenKind::Begin => self.open(FrameKind::Begin(Vec::new()), "BEGIN", offset),
            TokenKind::For(source) => {
                let path = parse_path(&source, offset)?;
                self.open(
                    FrameKind::For(ForNode {
                        path,
                        children: Vec::new(),
                    }),
                    format!("FOR {source}"),
                    offset,
                );
            }
            TokenKind::Next(arg) => {
                self.require_loop("NEXT", offset)?;
                let connector = unquote(&arg).ok_or_else(|| ParseError::InvalidExpression {
                    source_text: arg.clone(),
                    offset,
                    message: "NEXT expects a quoted connector such as 'or '".to_owned(),
                })?;
                self.current().push(Node::Next(connector));
            }
            TokenKind::First => {
                self.require_loop("FIRST", offset)?;
                self.open(FrameKind::First(Vec::new()), "FIRST", offset);
            }
            TokenKind::Last => {
                self.require_loop("LAST", offset)?;
                self.open(FrameKind::Last(Vec::new()), "LAST", offset);
            }
            TokenKind::End => {
                let frame = self.stack.pop().ok_or(ParseError::UnmatchedOpenClose {
                    directive: "END".to_owned(),
                    offset,
                })?;
                let node = frame.into_node();
                self.current().push(node);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Node, ParseError> {
        if let Some(frame) = self.stack.pop() {
            return Err(ParseError::UnmatchedOpenClose {
                directive: frame.directive,
                offset: frame.offset,
            });
        }
        Ok(Node::Root(self.root))
    }
}

fn parse_path(source: &str, offset: usize) -> Result<PropertyPath, ParseError> {
    PropertyPath::parse(source).ok_or_else(|| ParseError::InvalidExpression {
        source_text: source.to_owned(),
        offset,
        message: "expected a dotted variable path".to_owned(),
    })
}

/// `'or '` -> `or `, with `''` unescaped.
fn unquote(arg: &str) -> Option<String> {
    let inner = arg.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

/// Parse a template with default options.
///
/// # Errors
///
/// Returns [`ParseError`] if the template is malformed.
pub fn parse(text: &str) -> Result<Node, ParseError> {
    parse_with(text, ParseOptions::default())
}

/// Parse a template into a [`Node::Root`] tree.
///
/// # Errors
///
/// Returns [`ParseError`] if a directive is unclosed or unmatched, an
/// expression is invalid, or a loop directive appears outside `FOR`.
pub fn parse_with(text: &str, options: ParseOptions) -> Result<Node, ParseError> {
    let tokens = tokenize(text)?;
    debug!(template_len = text.len(), tokens = tokens.len(), "parsing template");
    let mut builder = TreeBuilder::new(options);
    for token in tokens {
        builder.accept(token)?;
    }
    builder.finish()
}

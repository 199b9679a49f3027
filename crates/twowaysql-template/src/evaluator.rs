//! Tree-walk evaluator.
//!
//! Walks a parsed tree in document order against one parameter object,
//! threading a [`SqlBuffer`] through every node. Placeholders and bind values
//! are appended together, so their order always matches.

use std::sync::Arc;

use tracing::{debug, trace};
use twowaysql_core::Dialect;
use twowaysql_model::{BoundSql, BoundValue, ParameterObject, ParameterValue};

use crate::context::{CommandContext, SqlBuffer};
use crate::error::TemplateError;
use crate::expression::{ExpressionError, LoopFrame, PropertyPath, Scope};
use crate::node::{BindNode, EmbeddedNode, ForNode, IfNode, Node};
use crate::parser::{ParseOptions, parse_with};
use crate::pruning;
use crate::tokenizer::TestValue;

/// Embedded values may expand into templates that expand again; past this
/// depth evaluation fails.
pub const MAX_DYNAMIC_DEPTH: usize = 8;

/// Evaluates parsed templates for one engine configuration.
#[derive(Debug, Clone)]
pub struct TemplateEvaluator {
    dialect: Arc<dyn Dialect>,
    root_alias: String,
}

impl TemplateEvaluator {
    /// Create an evaluator for `dialect`, exposing parameter objects under
    /// `root_alias`.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>, root_alias: impl Into<String>) -> Self {
        Self {
            dialect,
            root_alias: root_alias.into(),
        }
    }

    /// The target dialect.
    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Evaluate `node` against `parameters`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if a variable cannot be resolved or rendered,
    /// or a dynamically bound fragment fails to parse.
    pub fn evaluate(
        &self,
        node: &Node,
        parameters: &ParameterObject,
    ) -> Result<BoundSql, TemplateError> {
        let scope = Scope::new(&self.root_alias, parameters);
        let mut ctx = CommandContext::new(scope, self.dialect.as_ref());
        let mut buf = SqlBuffer::new();
        walk(node, &mut ctx, &mut buf)?;
        let bound = buf.into_bound_sql();
        debug!(
            type_name = %parameters.type_name,
            binds = bound.bound_values.len(),
            "evaluated template"
        );
        Ok(bound)
    }
}

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

fn walk_all(
    nodes: &[Node],
    ctx: &mut CommandContext<'_>,
    buf: &mut SqlBuffer,
) -> Result<(), TemplateError> {
    for node in nodes {
        walk(node, ctx, buf)?;
    }
    Ok(())
}

fn walk(
    node: &Node,
    ctx: &mut CommandContext<'_>,
    buf: &mut SqlBuffer,
) -> Result<(), TemplateError> {
    match node {
        Node::Root(children) => walk_all(children, ctx, buf),
        Node::Literal(text) => {
            buf.push_str(text);
            Ok(())
        }
        Node::Bind(bind) => walk_bind(bind, ctx, buf),
        Node::Embedded(embedded) => walk_embedded(embedded, ctx, buf),
        Node::If(node) => walk_if(node, ctx, buf),
        Node::Begin(children) => {
            let mut scoped = buf.fork();
            walk_all(children, ctx, &mut scoped)?;
            match pruning::prune(scoped.sql()) {
                Some(text) => buf.merge(scoped, &text),
                None => trace!("pruned empty BEGIN scope"),
            }
            Ok(())
        }
        Node::For(node) => walk_for(node, ctx, buf),
        Node::Next(connector) => {
            if ctx.scope.current_loop().is_some_and(|f| !f.is_first()) {
                buf.push_str(connector);
            }
            Ok(())
        }
        Node::First(children) => {
            if ctx.scope.current_loop().is_some_and(LoopFrame::is_first) {
                walk_all(children, ctx, buf)?;
            }
            Ok(())
        }
        Node::Last(children) => {
            if ctx.scope.current_loop().is_some_and(LoopFrame::is_last) {
                walk_all(children, ctx, buf)?;
            }
            Ok(())
        }
    }
}

fn walk_if(
    node: &IfNode,
    ctx: &mut CommandContext<'_>,
    buf: &mut SqlBuffer,
) -> Result<(), TemplateError> {
    let holds = ctx.scope.evaluate(&node.condition)?;
    trace!(condition = %node.source, holds, "IF");
    if holds {
        walk_all(&node.then_branch, ctx, buf)
    } else {
        walk_all(&node.else_branch, ctx, buf)
    }
}

fn walk_for(
    node: &ForNode,
    ctx: &mut CommandContext<'_>,
    buf: &mut SqlBuffer,
) -> Result<(), TemplateError> {
    let value = ctx.scope.resolve(&node.path)?;
    let items = match value {
        ParameterValue::Null => return Ok(()),
        ParameterValue::List(items) => items,
        other => {
            return Err(TemplateError::LoopNotList {
                path: node.path.to_string(),
                type_name: other.type_name().to_owned(),
            });
        }
    };
    let len = items.len();
    for (index, element) in items.iter().enumerate() {
        ctx.scope.push_loop(LoopFrame {
            element,
            index,
            len,
        });
        let result = walk_all(&node.children, ctx, buf);
        ctx.scope.pop_loop();
        result?;
    }
    Ok(())
}

/// Check a list against the dialect's in-clause limit.
fn check_in_scope_size(
    path: &PropertyPath,
    items: &[ParameterValue],
    dialect: &dyn Dialect,
) -> Result<(), TemplateError> {
    match dialect.in_clause_max_size() {
        Some(max) if items.len() > max => Err(TemplateError::InScopeLimitExceeded {
            path: path.to_string(),
            size: items.len(),
            max,
        }),
        _ => Ok(()),
    }
}

fn list_value<'v>(
    path: &PropertyPath,
    test_value: &TestValue,
    value: &'v ParameterValue,
) -> Result<Option<&'v [ParameterValue]>, TemplateError> {
    match (value, test_value.in_scope) {
        (ParameterValue::List(items), true) => Ok(Some(items.as_slice())),
        (ParameterValue::List(_), false) => Err(TemplateError::ListOutsideInScope {
            path: path.to_string(),
        }),
        (ParameterValue::Object(_), _) => Err(ExpressionError::TypeMismatch {
            message: format!("{path} is an object and cannot be rendered"),
        }
        .into()),
        (other, true) => Err(TemplateError::InScopeType {
            path: path.to_string(),
            type_name: other.type_name().to_owned(),
        }),
        (_, false) => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Bind variables
// ---------------------------------------------------------------------------

fn walk_bind(
    node: &BindNode,
    ctx: &mut CommandContext<'_>,
    buf: &mut SqlBuffer,
) -> Result<(), TemplateError> {
    let value = ctx.scope.resolve(&node.path)?;
    if value.is_null() {
        if node.null_disallowed {
            return Err(TemplateError::NullBind {
                path: node.path.to_string(),
            });
        }
        trace!(path = %node.path, "skipping null bind");
        return Ok(());
    }

    let source = node.path.to_string();
    match list_value(&node.path, &node.test_value, value)? {
        None => buf.push_bind(ctx.dialect, BoundValue::new(value.clone()).with_source(source)),
        Some(items) => {
            check_in_scope_size(&node.path, items, ctx.dialect)?;
            if items.is_empty() {
                buf.push_str("(null)");
                return Ok(());
            }
            buf.push_str("(");
            for (i, item) in items.iter().enumerate() {
                if matches!(item, ParameterValue::List(_) | ParameterValue::Object(_)) {
                    return Err(ExpressionError::TypeMismatch {
                        message: format!("{source}[{i}] is a {} and cannot be bound", item.type_name()),
                    }
                    .into());
                }
                if i > 0 {
                    buf.push_str(", ");
                }
                buf.push_bind(
                    ctx.dialect,
                    BoundValue::new(item.clone()).with_source(source.clone()),
                );
            }
            buf.push_str(")");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Embedded variables
// ---------------------------------------------------------------------------

/// Literal SQL text for a scalar in embedded context.
fn embedded_text(
    path: &PropertyPath,
    value: &ParameterValue,
    quoted: bool,
    dialect: &dyn Dialect,
) -> Result<String, TemplateError> {
    if matches!(value, ParameterValue::List(_) | ParameterValue::Object(_)) {
        return Err(ExpressionError::TypeMismatch {
            message: format!("{path} element is a {} and cannot be embedded", value.type_name()),
        }
        .into());
    }
    if quoted {
        return Ok(dialect.quote_string(&value.to_string()));
    }
    Ok(match value {
        ParameterValue::Date(d) => dialect.date_literal(*d),
        ParameterValue::Timestamp(t) => dialect.timestamp_literal(*t),
        other => other.to_string(),
    })
}

fn walk_embedded(
    node: &EmbeddedNode,
    ctx: &mut CommandContext<'_>,
    buf: &mut SqlBuffer,
) -> Result<(), TemplateError> {
    let value = ctx.scope.resolve(&node.path)?;
    if value.is_null() {
        if node.null_disallowed {
            return Err(TemplateError::NullBind {
                path: node.path.to_string(),
            });
        }
        return Ok(());
    }

    match list_value(&node.path, &node.test_value, value)? {
        Some(items) => {
            check_in_scope_size(&node.path, items, ctx.dialect)?;
            if items.is_empty() {
                buf.push_str("(null)");
                return Ok(());
            }
            let rendered = items
                .iter()
                .map(|item| embedded_text(&node.path, item, node.test_value.quoted, ctx.dialect))
                .collect::<Result<Vec<_>, _>>()?;
            buf.push_str(&format!("({})", rendered.join(", ")));
        }
        None => match value {
            ParameterValue::String(text) if !node.test_value.quoted && text.contains("/*") => {
                walk_dynamic(node, text, ctx, buf)?;
            }
            _ => {
                let text = embedded_text(&node.path, value, node.test_value.quoted, ctx.dialect)?;
                buf.push_str(&text);
            }
        },
    }
    Ok(())
}

/// Parse an embedded value containing directives and walk it in place.
fn walk_dynamic(
    node: &EmbeddedNode,
    text: &str,
    ctx: &mut CommandContext<'_>,
    buf: &mut SqlBuffer,
) -> Result<(), TemplateError> {
    if ctx.dynamic_depth >= MAX_DYNAMIC_DEPTH {
        return Err(TemplateError::DynamicBindingTooDeep {
            path: node.path.to_string(),
            max: MAX_DYNAMIC_DEPTH,
        });
    }

    let tree = if let Some(tree) = node.cached_dynamic(text) {
        tree
    } else {
        debug!(path = %node.path, text_len = text.len(), "parsing dynamic binding");
        let options = ParseOptions {
            null_disallowed: node.null_disallowed,
        };
        let tree = Arc::new(parse_with(text, options)?);
        node.store_dynamic(text, Arc::clone(&tree));
        tree
    };

    ctx.dynamic_depth += 1;
    let result = walk(&tree, ctx, buf);
    ctx.dynamic_depth -= 1;
    result
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use twowaysql_core::{OracleDialect, PostgresDialect, StandardDialect};

    use super::*;
    use crate::parser::parse;

    fn evaluator() -> TemplateEvaluator {
        TemplateEvaluator::new(Arc::new(StandardDialect), "pmb")
    }

    fn render(template: &str, pmb: &ParameterObject) -> Result<BoundSql, TemplateError> {
        evaluator().evaluate(&parse(template).unwrap(), pmb)
    }

    fn values(bound: &BoundSql) -> Vec<ParameterValue> {
        bound.values().cloned().collect()
    }

    #[test]
    fn test_should_bind_scalar_and_discard_test_value() {
        let pmb = ParameterObject::new("MemberPmb").with("memberId", 3);
        let bound = render("select * from M where ID = /*pmb.memberId*/99", &pmb).unwrap();
        assert_eq!(bound.sql, "select * from M where ID = ?");
        assert_eq!(values(&bound), vec![ParameterValue::Integer(3)]);
        assert_eq!(bound.bound_values[0].source.as_deref(), Some("pmb.memberId"));
    }

    #[test]
    fn test_should_skip_null_bind() {
        let pmb = ParameterObject::new("MemberPmb").with("memberId", ParameterValue::Null);
        let bound = render("ID = /*pmb.memberId*/99", &pmb).unwrap();
        assert_eq!(bound.sql, "ID = ");
        assert!(bound.bound_values.is_empty());
    }

    #[test]
    fn test_should_reject_null_bind_when_disallowed() {
        let pmb = ParameterObject::new("MemberPmb").with("memberId", ParameterValue::Null);
        let tree = parse_with(
            "ID = /*pmb.memberId*/99",
            ParseOptions {
                null_disallowed: true,
            },
        )
        .unwrap();
        match evaluator().evaluate(&tree, &pmb) {
            Err(TemplateError::NullBind { path }) => assert_eq!(path, "pmb.memberId"),
            other => panic!("expected NullBind, got {other:?}"),
        }
    }

    #[test]
    fn test_should_prune_where_clause() {
        let template = "/*BEGIN*/where /*IF pmb.x != null*/X = /*pmb.x*/1/*END*//*END*/";
        let pmb = ParameterObject::new("Pmb").with("x", ParameterValue::Null);
        let bound = render(template, &pmb).unwrap();
        assert!(bound.is_empty());

        let pmb = ParameterObject::new("Pmb").with("x", 5);
        let bound = render(template, &pmb).unwrap();
        assert_eq!(bound.sql, "where X = ?");
        assert_eq!(values(&bound), vec![ParameterValue::Integer(5)]);
    }

    #[test]
    fn test_should_strip_connector_of_skipped_first_condition() {
        let template = "select * from M /*BEGIN*/where /*IF pmb.a != null*/A = /*pmb.a*/1/*END*//*IF pmb.b != null*/ and B = /*pmb.b*/2/*END*//*END*/";
        let pmb = ParameterObject::new("Pmb")
            .with("a", ParameterValue::Null)
            .with("b", "x");
        let bound = render(template, &pmb).unwrap();
        assert_eq!(bound.sql, "select * from M where B = ?");
        assert_eq!(bound.placeholder_count(), bound.bound_values.len());
    }

    #[test]
    fn test_should_render_else_branch() {
        let template = "/*IF pmb.paging*/limit 10\n-- ELSE\n/*END*/";
        let pmb = ParameterObject::new("Pmb").with("paging", false);
        assert_eq!(render(template, &pmb).unwrap().sql, "\n");
        let pmb = ParameterObject::new("Pmb").with("paging", true);
        assert_eq!(render(template, &pmb).unwrap().sql, "limit 10\n");
    }

    #[test]
    fn test_should_embed_quoted_string() {
        let pmb = ParameterObject::new("MemberPmb").with("memberName", "fo'o");
        let bound = render("= /*$pmb.memberName*/'TEST'", &pmb).unwrap();
        assert_eq!(bound.sql, "= 'fo''o'");
        assert!(bound.bound_values.is_empty());
    }

    #[test]
    fn test_should_embed_in_scope_list() {
        let pmb = ParameterObject::new("MemberPmb").with("nameList", vec!["x", "y"]);
        let bound = render("in /*$pmb.nameList*/('a','b')", &pmb).unwrap();
        assert_eq!(bound.sql, "in ('x', 'y')");

        let pmb = ParameterObject::new("MemberPmb").with("nameList", "x");
        assert!(matches!(
            render("in /*$pmb.nameList*/('a','b')", &pmb),
            Err(TemplateError::InScopeType { .. })
        ));
    }

    #[test]
    fn test_should_embed_dates_with_dialect_literal() {
        let pmb = ParameterObject::new("Pmb").with("d", NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let tree = parse("D = /*$pmb.d*/2000-01-01 and E = /*$pmb.d*/'2000-01-01'").unwrap();
        let bound = TemplateEvaluator::new(Arc::new(OracleDialect), "pmb")
            .evaluate(&tree, &pmb)
            .unwrap();
        assert_eq!(bound.sql, "D = date '2024-02-01' and E = '2024-02-01'");
    }

    #[test]
    fn test_should_expand_bind_in_scope_list() {
        let pmb = ParameterObject::new("Pmb").with("ids", vec![1, 2, 3]);
        let bound = render("ID in /*pmb.ids*/(9, 8)", &pmb).unwrap();
        assert_eq!(bound.sql, "ID in (?, ?, ?)");
        assert_eq!(bound.bound_values.len(), 3);

        let pmb = ParameterObject::new("Pmb").with("ids", Vec::<i64>::new());
        let bound = render("ID in /*pmb.ids*/(9, 8)", &pmb).unwrap();
        assert_eq!(bound.sql, "ID in (null)");
        assert!(bound.bound_values.is_empty());
    }

    #[test]
    fn test_should_reject_list_outside_in_scope() {
        let pmb = ParameterObject::new("Pmb").with("ids", vec![1, 2]);
        assert!(matches!(
            render("ID = /*pmb.ids*/1", &pmb),
            Err(TemplateError::ListOutsideInScope { .. })
        ));
    }

    #[test]
    fn test_should_enforce_in_clause_limit() {
        let pmb = ParameterObject::new("Pmb").with("ids", vec![1, 2, 3]);
        let tree = parse("ID in /*pmb.ids*/(1)").unwrap();
        let evaluator = TemplateEvaluator::new(twowaysql_core::DialectKind::Standard.build(Some(2)), "pmb");
        match evaluator.evaluate(&tree, &pmb) {
            Err(TemplateError::InScopeLimitExceeded { size, max, .. }) => {
                assert_eq!(size, 3);
                assert_eq!(max, 2);
            }
            other => panic!("expected InScopeLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_should_iterate_for_loop() {
        let template = "/*BEGIN*/where /*FOR pmb.names*//*FIRST*/(/*END*//*NEXT 'or '*/N like /*#current*/'a%' /*LAST*/)/*END*//*END*//*END*/";
        let pmb = ParameterObject::new("Pmb").with("names", vec!["a%", "b%"]);
        let bound = render(template, &pmb).unwrap();
        assert_eq!(bound.sql, "where (N like ? or N like ? )");
        assert_eq!(
            values(&bound),
            vec![ParameterValue::from("a%"), ParameterValue::from("b%")]
        );

        let pmb = ParameterObject::new("Pmb").with("names", Vec::<String>::new());
        assert!(render(template, &pmb).unwrap().is_empty());
    }

    #[test]
    fn test_should_reject_loop_over_scalar() {
        let pmb = ParameterObject::new("Pmb").with("names", "a");
        assert!(matches!(
            render("/*FOR pmb.names*/x/*END*/", &pmb),
            Err(TemplateError::LoopNotList { .. })
        ));
    }

    #[test]
    fn test_should_evaluate_dynamic_binding() {
        let pmb = ParameterObject::new("MemberPmb")
            .with(
                "memberName",
                "= /*IF pmb.memberId != null*/foo/*pmb.memberId*/99 bar/*END*/",
            )
            .with("memberId", 7);
        let template = parse("MEMBER_ID /*$pmb.memberName*/").unwrap();
        let evaluator = evaluator();
        for _ in 0..2 {
            let bound = evaluator.evaluate(&template, &pmb).unwrap();
            assert_eq!(bound.sql, "MEMBER_ID = foo? bar");
            assert_eq!(values(&bound), vec![ParameterValue::Integer(7)]);
        }
    }

    #[test]
    fn test_should_limit_dynamic_binding_depth() {
        let pmb = ParameterObject::new("Pmb").with("loop", "/*$pmb.loop*/");
        assert!(matches!(
            render("/*$pmb.loop*/", &pmb),
            Err(TemplateError::DynamicBindingTooDeep { .. })
        ));
    }

    #[test]
    fn test_should_number_placeholders_for_postgres() {
        let pmb = ParameterObject::new("Pmb").with("a", 1).with("ids", vec![2, 3]);
        let tree = parse("A = /*pmb.a*/0 and B in /*pmb.ids*/(0)").unwrap();
        let bound = TemplateEvaluator::new(Arc::new(PostgresDialect), "pmb")
            .evaluate(&tree, &pmb)
            .unwrap();
        assert_eq!(bound.sql, "A = $1 and B in ($2, $3)");
    }

    #[test]
    fn test_should_report_missing_property() {
        let pmb = ParameterObject::new("MemberPmb");
        match render("/*pmb.missing*/1", &pmb) {
            Err(TemplateError::Expression(ExpressionError::PropertyNotFound { path, type_name })) => {
                assert_eq!(path, "pmb.missing");
                assert_eq!(type_name, "MemberPmb");
            }
            other => panic!("expected PropertyNotFound, got {other:?}"),
        }
    }
}

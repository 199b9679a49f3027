//! The condition accumulator for one query-building session.
//!
//! Each registration goes through [`ConditionKey::decide`]: emitted conditions
//! append a clause fragment, overrides rewrite the fragment they first
//! created, and duplicates only leave a notice. The final statement binds
//! values in clause order.

use std::collections::BTreeMap;
use std::panic::Location;
use std::sync::Arc;

use tracing::{debug, trace};
use twowaysql_core::Dialect;
use twowaysql_model::{BoundSql, BoundValue, ParameterValue};

use crate::error::ConditionError;
use crate::key::{ConditionKey, Decision};
use crate::like::LikeSearchOption;
use crate::value::ConditionValue;

/// One rendered condition: SQL with `?` markers and its bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseFragment {
    /// Column the condition applies to.
    pub column: String,
    /// Condition key that produced it.
    pub key: ConditionKey,
    /// Clause text with one `?` per bind value.
    pub sql: String,
    /// Bind values in marker order.
    pub binds: Vec<BoundValue>,
}

/// Accumulates conditions for one query. Not shared across sessions; call
/// [`ConditionQuery::reset`] before reusing a pooled instance.
#[derive(Debug)]
pub struct ConditionQuery {
    dialect: Arc<dyn Dialect>,
    columns: BTreeMap<String, ConditionValue>,
    fragments: Vec<ClauseFragment>,
}

impl ConditionQuery {
    /// Create an empty query for `dialect`.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            columns: BTreeMap::new(),
            fragments: Vec::new(),
        }
    }

    /// `column = value`
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::ScalarRequired`] for a list or object value.
    #[track_caller]
    pub fn equal(
        &mut self,
        column: &str,
        value: impl Into<ParameterValue>,
    ) -> Result<Decision, ConditionError> {
        self.register(column, ConditionKey::Equal, value.into(), Location::caller())
    }

    /// `column <> value`
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::ScalarRequired`] for a list or object value.
    #[track_caller]
    pub fn not_equal(
        &mut self,
        column: &str,
        value: impl Into<ParameterValue>,
    ) -> Result<Decision, ConditionError> {
        self.register(column, ConditionKey::NotEqual, value.into(), Location::caller())
    }

    /// `column > value`
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::ScalarRequired`] for a list or object value.
    #[track_caller]
    pub fn greater_than(
        &mut self,
        column: &str,
        value: impl Into<ParameterValue>,
    ) -> Result<Decision, ConditionError> {
        self.register(column, ConditionKey::GreaterThan, value.into(), Location::caller())
    }

    /// `column >= value`
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::ScalarRequired`] for a list or object value.
    #[track_caller]
    pub fn greater_equal(
        &mut self,
        column: &str,
        value: impl Into<ParameterValue>,
    ) -> Result<Decision, ConditionError> {
        self.register(column, ConditionKey::GreaterEqual, value.into(), Location::caller())
    }

    /// `column < value`
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::ScalarRequired`] for a list or object value.
    #[track_caller]
    pub fn less_than(
        &mut self,
        column: &str,
        value: impl Into<ParameterValue>,
    ) -> Result<Decision, ConditionError> {
        self.register(column, ConditionKey::LessThan, value.into(), Location::caller())
    }

    /// `column <= value`
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::ScalarRequired`] for a list or object value.
    #[track_caller]
    pub fn less_equal(
        &mut self,
        column: &str,
        value: impl Into<ParameterValue>,
    ) -> Result<Decision, ConditionError> {
        self.register(column, ConditionKey::LessEqual, value.into(), Location::caller())
    }

    /// `column in (values...)`; an empty list is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::InScopeNotList`] for a non-list value.
    #[track_caller]
    pub fn in_scope(
        &mut self,
        column: &str,
        values: impl Into<ParameterValue>,
    ) -> Result<Decision, ConditionError> {
        self.register(column, ConditionKey::InScope, values.into(), Location::caller())
    }

    /// `column not in (values...)`; an empty list is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::InScopeNotList`] for a non-list value.
    #[track_caller]
    pub fn not_in_scope(
        &mut self,
        column: &str,
        values: impl Into<ParameterValue>,
    ) -> Result<Decision, ConditionError> {
        self.register(column, ConditionKey::NotInScope, values.into(), Location::caller())
    }

    /// `column is null`
    #[track_caller]
    pub fn is_null(&mut self, column: &str) -> Decision {
        self.register_valueless(column, ConditionKey::IsNull, Location::caller())
    }

    /// `column is not null`
    #[track_caller]
    pub fn is_not_null(&mut self, column: &str) -> Decision {
        self.register_valueless(column, ConditionKey::IsNotNull, Location::caller())
    }

    /// `column like value escape '|'`, with `value` escaped and wrapped per
    /// `option`. Null and empty text are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::LikeSearchNotString`] for a non-string value.
    #[track_caller]
    pub fn like_search(
        &mut self,
        column: &str,
        value: impl Into<ParameterValue>,
        option: LikeSearchOption,
    ) -> Result<Decision, ConditionError> {
        let caller = Location::caller();
        let value = match value.into() {
            ParameterValue::String(text) if !text.is_empty() => {
                ParameterValue::String(option.apply(&text))
            }
            ParameterValue::String(text) => ParameterValue::String(text),
            ParameterValue::Null => ParameterValue::Null,
            other => {
                return Err(ConditionError::LikeSearchNotString {
                    column: column.to_owned(),
                    type_name: other.type_name().to_owned(),
                });
            }
        };
        let key = ConditionKey::LikeSearch;
        let decision = key.decide(self.column_state(column), &value);
        self.apply(column, key, value, decision, caller, |_, bind| {
            (option.clause(column), vec![bind])
        });
        Ok(decision)
    }

    fn column_state(&mut self, column: &str) -> &ConditionValue {
        self.columns.entry(column.to_owned()).or_default()
    }

    fn register(
        &mut self,
        column: &str,
        key: ConditionKey,
        value: ParameterValue,
        caller: &'static Location<'static>,
    ) -> Result<Decision, ConditionError> {
        let compound = matches!(value, ParameterValue::List(_) | ParameterValue::Object(_));
        if key.takes_list() && !matches!(value, ParameterValue::List(_) | ParameterValue::Null) {
            return Err(ConditionError::InScopeNotList {
                column: column.to_owned(),
                type_name: value.type_name().to_owned(),
            });
        }
        if !key.takes_list() && compound {
            return Err(ConditionError::ScalarRequired {
                column: column.to_owned(),
                key,
                type_name: value.type_name().to_owned(),
            });
        }
        let decision = key.decide(self.column_state(column), &value);
        let max = self.dialect.in_clause_max_size();
        self.apply(column, key, value, decision, caller, |value, bind| {
            match value {
                ParameterValue::List(items) => in_scope_clause(column, key, items, max),
                _ => (format!("{column} {} ?", key.operand()), vec![bind]),
            }
        });
        Ok(decision)
    }

    fn register_valueless(
        &mut self,
        column: &str,
        key: ConditionKey,
        caller: &'static Location<'static>,
    ) -> Decision {
        let decision = key.decide(self.column_state(column), &ParameterValue::Null);
        self.apply(column, key, ParameterValue::Null, decision, caller, |_, _| {
            (format!("{column} {}", key.operand()), Vec::new())
        });
        decision
    }

    /// Carry out a decision. `render` builds the clause text and binds from
    /// the value and its scalar bind.
    fn apply(
        &mut self,
        column: &str,
        key: ConditionKey,
        value: ParameterValue,
        decision: Decision,
        caller: &'static Location<'static>,
        render: impl FnOnce(&ParameterValue, BoundValue) -> (String, Vec<BoundValue>),
    ) {
        let fragment = |value: &ParameterValue| {
            let bind = BoundValue::new(value.clone()).with_source(column);
            let (sql, binds) = render(value, bind);
            ClauseFragment {
                column: column.to_owned(),
                key,
                sql,
                binds,
            }
        };

        let state = self.columns.entry(column.to_owned()).or_default();
        match decision {
            Decision::Ignore => trace!(column, key = %key, "ignoring condition without value"),
            Decision::Duplicate => {
                debug!(column, key = %key, caller = %caller, "duplicate condition");
                state.register_duplicate(key, caller);
            }
            Decision::Override { location } => {
                debug!(column, key = %key, location, "overriding condition");
                let rewritten = fragment(&value);
                state.override_fixed(key, value);
                if let Some(slot) = self.fragments.get_mut(location) {
                    *slot = rewritten;
                }
            }
            Decision::Emit => {
                let location = self.fragments.len();
                self.fragments.push(fragment(&value));
                state.set_fixed(key, value, location);
            }
        }
    }

    /// Clause fragments in registration order.
    #[must_use]
    pub fn fragments(&self) -> &[ClauseFragment] {
        &self.fragments
    }

    /// State recorded for `column`.
    #[must_use]
    pub fn condition_value(&self, column: &str) -> Option<&ConditionValue> {
        self.columns.get(column)
    }

    /// Call sites that re-applied an identical value for `column` and `key`.
    #[must_use]
    pub fn duplicate_notices(
        &self,
        column: &str,
        key: ConditionKey,
    ) -> &[&'static Location<'static>] {
        self.columns
            .get(column)
            .map(|cv| cv.duplicate_notices(key))
            .unwrap_or_default()
    }

    /// The target dialect.
    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// `where a and b ...` with binds in clause order; empty without
    /// conditions.
    #[must_use]
    pub fn to_bound_sql(&self) -> BoundSql {
        if self.fragments.is_empty() {
            return BoundSql::default();
        }
        let mut sql = String::from("where ");
        let mut binds = Vec::new();
        for (i, fragment) in self.fragments.iter().enumerate() {
            if i > 0 {
                sql.push_str(" and ");
            }
            let mut rest = fragment.sql.as_str();
            for bind in &fragment.binds {
                let Some(pos) = rest.find('?') else {
                    break;
                };
                sql.push_str(&rest[..pos]);
                binds.push(bind.clone());
                sql.push_str(&self.dialect.placeholder(binds.len()));
                rest = &rest[pos + 1..];
            }
            sql.push_str(rest);
        }
        BoundSql::new(sql, binds)
    }

    /// Forget every condition, for reuse by another session.
    pub fn reset(&mut self) {
        self.columns.clear();
        self.fragments.clear();
    }
}

/// `col in (?, ?)`, split into `or`-joined groups (`and` for `not in`) when
/// the list exceeds the dialect's limit.
fn in_scope_clause(
    column: &str,
    key: ConditionKey,
    items: &[ParameterValue],
    max: Option<usize>,
) -> (String, Vec<BoundValue>) {
    let binds = items
        .iter()
        .map(|v| BoundValue::new(v.clone()).with_source(column))
        .collect();
    let group = |n: usize| {
        let markers = vec!["?"; n].join(", ");
        format!("{column} {} ({markers})", key.operand())
    };
    let chunk = max.unwrap_or(items.len()).max(1);
    if items.len() <= chunk {
        return (group(items.len()), binds);
    }
    let joiner = if key == ConditionKey::NotInScope {
        " and "
    } else {
        " or "
    };
    let groups: Vec<String> = items.chunks(chunk).map(|c| group(c.len())).collect();
    (format!("({})", groups.join(joiner)), binds)
}

#[cfg(test)]
mod tests {
    use twowaysql_core::{DialectKind, PostgresDialect, StandardDialect};

    use super::*;

    fn query() -> ConditionQuery {
        ConditionQuery::new(Arc::new(StandardDialect))
    }

    #[test]
    fn test_should_emit_clauses_in_registration_order() {
        let mut cq = query();
        assert_eq!(cq.equal("MEMBER_ID", 3).unwrap(), Decision::Emit);
        assert_eq!(cq.greater_equal("BIRTHDATE", "2000-01-01").unwrap(), Decision::Emit);
        let bound = cq.to_bound_sql();
        assert_eq!(bound.sql, "where MEMBER_ID = ? and BIRTHDATE >= ?");
        assert_eq!(bound.bound_values.len(), 2);
        assert_eq!(bound.bound_values[0].source.as_deref(), Some("MEMBER_ID"));
    }

    #[test]
    fn test_should_override_with_later_value() {
        let mut cq = query();
        cq.greater_equal("PRICE", 10).unwrap();
        cq.equal("STATUS", "A").unwrap();
        assert_eq!(
            cq.greater_equal("PRICE", 20).unwrap(),
            Decision::Override { location: 0 }
        );
        let bound = cq.to_bound_sql();
        assert_eq!(bound.sql, "where PRICE >= ? and STATUS = ?");
        assert_eq!(
            bound.values().cloned().collect::<Vec<_>>(),
            vec![ParameterValue::from(20), ParameterValue::from("A")]
        );
    }

    #[test]
    fn test_should_record_duplicate_call_sites() {
        let mut cq = query();
        cq.equal("MEMBER_ID", 3).unwrap();
        assert_eq!(cq.equal("MEMBER_ID", 3).unwrap(), Decision::Duplicate);
        let notices = cq.duplicate_notices("MEMBER_ID", ConditionKey::Equal);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].file(), file!());
        assert_eq!(cq.fragments().len(), 1);
    }

    #[test]
    fn test_should_ignore_null_values() {
        let mut cq = query();
        assert_eq!(cq.equal("MEMBER_ID", ParameterValue::Null).unwrap(), Decision::Ignore);
        assert!(cq.to_bound_sql().is_empty());
    }

    #[test]
    fn test_should_render_is_null_without_binds() {
        let mut cq = query();
        assert_eq!(cq.is_null("DELETED_AT"), Decision::Emit);
        assert_eq!(cq.is_null("DELETED_AT"), Decision::Duplicate);
        assert_eq!(cq.is_not_null("NAME"), Decision::Emit);
        let bound = cq.to_bound_sql();
        assert_eq!(bound.sql, "where DELETED_AT is null and NAME is not null");
        assert!(bound.bound_values.is_empty());
    }

    #[test]
    fn test_should_expand_in_scope() {
        let mut cq = query();
        cq.in_scope("STATUS", vec!["A", "B"]).unwrap();
        assert_eq!(cq.not_in_scope("ID", Vec::<i64>::new()).unwrap(), Decision::Ignore);
        let bound = cq.to_bound_sql();
        assert_eq!(bound.sql, "where STATUS in (?, ?)");
        assert_eq!(bound.bound_values.len(), 2);
    }

    #[test]
    fn test_should_reject_scalar_in_scope() {
        let mut cq = query();
        assert_eq!(
            cq.in_scope("STATUS", "A").unwrap_err(),
            ConditionError::InScopeNotList {
                column: "STATUS".to_owned(),
                type_name: "String".to_owned(),
            }
        );
    }

    #[test]
    fn test_should_reject_list_for_scalar_keys() {
        let mut cq = query();
        assert_eq!(
            cq.equal("A", vec![1, 2]).unwrap_err(),
            ConditionError::ScalarRequired {
                column: "A".to_owned(),
                key: ConditionKey::Equal,
                type_name: "List".to_owned(),
            }
        );
        assert!(matches!(
            cq.greater_than("A", ParameterValue::Object(BTreeMap::new())),
            Err(ConditionError::ScalarRequired { key: ConditionKey::GreaterThan, .. })
        ));
        assert!(cq.fragments().is_empty());
        assert!(cq.to_bound_sql().is_empty());
    }

    #[test]
    fn test_should_split_in_scope_over_dialect_limit() {
        let mut cq = ConditionQuery::new(DialectKind::Oracle.build(Some(2)));
        cq.in_scope("ID", vec![1, 2, 3]).unwrap();
        cq.not_in_scope("CODE", vec![4, 5, 6]).unwrap();
        let bound = cq.to_bound_sql();
        assert_eq!(
            bound.sql,
            "where (ID in (?, ?) or ID in (?)) and (CODE not in (?, ?) and CODE not in (?))"
        );
        assert_eq!(bound.bound_values.len(), 6);
    }

    #[test]
    fn test_should_escape_like_search() {
        let mut cq = query();
        cq.like_search("NAME", "100%", LikeSearchOption::prefix()).unwrap();
        let bound = cq.to_bound_sql();
        assert_eq!(bound.sql, "where NAME like ? escape '|'");
        assert_eq!(bound.bound_values[0].value, ParameterValue::from("100|%%"));
        assert!(matches!(
            cq.like_search("NAME", 1, LikeSearchOption::prefix()),
            Err(ConditionError::LikeSearchNotString { .. })
        ));
    }

    #[test]
    fn test_should_number_placeholders_for_dialect() {
        let mut cq = ConditionQuery::new(Arc::new(PostgresDialect));
        cq.equal("A", 1).unwrap();
        cq.in_scope("B", vec![2, 3]).unwrap();
        assert_eq!(cq.to_bound_sql().sql, "where A = $1 and B in ($2, $3)");
    }

    #[test]
    fn test_should_reset_state() {
        let mut cq = query();
        cq.equal("A", 1).unwrap();
        cq.reset();
        assert!(cq.fragments().is_empty());
        assert!(cq.condition_value("A").is_none());
        assert_eq!(cq.equal("A", 1).unwrap(), Decision::Emit);
    }
}

//! Condition-key registration across the model and dialect crates.

#[cfg(test)]
mod tests {
    use twowaysql_condition::{
        ConditionError, ConditionKey, ConditionQuery, Decision, LikeSearchOption,
    };
    use twowaysql_core::{Dialect, DialectKind};
    use twowaysql_model::ParameterValue;

    #[test]
    fn test_should_keep_single_clause_after_override() {
        let mut cq = ConditionQuery::new(DialectKind::Standard.build(None));
        assert_eq!(cq.greater_equal("PRICE", 10).unwrap(), Decision::Emit);
        assert_eq!(
            cq.greater_equal("PRICE", 20).unwrap(),
            Decision::Override { location: 0 }
        );
        let bound = cq.to_bound_sql();
        assert_eq!(bound.sql, "where PRICE >= ?");
        assert_eq!(
            bound.values().cloned().collect::<Vec<_>>(),
            vec![ParameterValue::Integer(20)]
        );
    }

    #[test]
    fn test_should_combine_keys_on_one_column() {
        let mut cq = ConditionQuery::new(DialectKind::Postgres.build(None));
        cq.greater_equal("BIRTHDATE", "1990-01-01").unwrap();
        cq.less_than("BIRTHDATE", "2000-01-01").unwrap();
        cq.like_search("NAME", "S", LikeSearchOption::prefix()).unwrap();
        cq.is_not_null("EMAIL");
        let bound = cq.to_bound_sql();
        assert_eq!(
            bound.sql,
            "where BIRTHDATE >= $1 and BIRTHDATE < $2 and NAME like $3 escape '|' and EMAIL is not null"
        );
        assert_eq!(bound.bound_values[2].value, ParameterValue::from("S%"));
    }

    #[test]
    fn test_should_leave_statement_untouched_by_duplicates() {
        let mut cq = ConditionQuery::new(DialectKind::Standard.build(None));
        cq.in_scope("STATUS", vec!["A", "B"]).unwrap();
        let before = cq.to_bound_sql();
        assert_eq!(cq.in_scope("STATUS", vec!["A", "B"]).unwrap(), Decision::Duplicate);
        assert_eq!(cq.to_bound_sql(), before);
        assert_eq!(cq.duplicate_notices("STATUS", ConditionKey::InScope).len(), 1);
    }

    #[test]
    fn test_should_inline_condition_query_for_display() {
        let dialect = DialectKind::Mysql.build(None);
        let mut cq = ConditionQuery::new(dialect.clone());
        cq.equal("NAME", "O'Brien").unwrap();
        cq.not_in_scope("ID", vec![1, 2]).unwrap();
        assert_eq!(
            dialect.inline_sql(&cq.to_bound_sql()),
            "where NAME = 'O''Brien' and ID not in (1, 2)"
        );
    }

    #[test]
    fn test_should_refuse_list_for_equal() {
        let mut cq = ConditionQuery::new(DialectKind::Standard.build(None));
        assert!(matches!(
            cq.equal("A", vec![1, 2]),
            Err(ConditionError::ScalarRequired { .. })
        ));
        assert!(cq.to_bound_sql().is_empty());
    }
}

//! Template evaluation through the engine facade.

#[cfg(test)]
mod tests {
    use twowaysql_model::{ParameterObject, ParameterValue, SqlType};
    use twowaysql_template::{ExpressionError, ParseError, TemplateError};

    use crate::{assert_binds_match, engine, render};

    const MEMBER_SQL: &str = "select * from MEMBER
/*BEGIN*/where
  /*IF pmb.memberId != null*/MEMBER_ID = /*pmb.memberId*/3/*END*/
  /*IF pmb.memberName != null*/and MEMBER_NAME like /*pmb.memberName*/'S%'/*END*/
  /*IF pmb.statusList.isNotEmpty()*/and STATUS in /*pmb.statusList*/('FML')/*END*/
/*END*/
order by MEMBER_ID";

    fn member_pmb(
        id: Option<i64>,
        name: Option<&str>,
        statuses: Vec<&str>,
    ) -> ParameterObject {
        ParameterObject::new("MemberPmb")
            .with("memberId", id)
            .with("memberName", name)
            .with("statusList", statuses)
    }

    #[test]
    fn test_should_keep_placeholders_and_binds_in_step() {
        let cases = [
            member_pmb(None, None, vec![]),
            member_pmb(Some(3), None, vec![]),
            member_pmb(None, Some("S%"), vec!["FML", "PRV"]),
            member_pmb(Some(3), Some("S%"), vec!["FML"]),
        ];
        for pmb in &cases {
            let bound = render(MEMBER_SQL, pmb).unwrap();
            assert_binds_match(&bound);
        }
    }

    #[test]
    fn test_should_drop_where_when_no_condition_holds() {
        let bound = render(MEMBER_SQL, &member_pmb(None, None, vec![])).unwrap();
        assert_eq!(bound.sql, "select * from MEMBER\n\norder by MEMBER_ID");
        assert!(bound.bound_values.is_empty());
    }

    #[test]
    fn test_should_strip_leading_connector_when_first_condition_is_skipped() {
        let bound = render(MEMBER_SQL, &member_pmb(None, Some("S%"), vec!["FML", "PRV"])).unwrap();
        assert_eq!(
            bound.sql,
            "select * from MEMBER\nwhere\n  \n  MEMBER_NAME like ?\n  and STATUS in (?, ?)\n\norder by MEMBER_ID"
        );
        let values: Vec<_> = bound.values().cloned().collect();
        assert_eq!(
            values,
            vec![
                ParameterValue::from("S%"),
                ParameterValue::from("FML"),
                ParameterValue::from("PRV"),
            ]
        );
        assert_eq!(bound.bound_values[0].sql_type, SqlType::String);
    }

    #[test]
    fn test_should_skip_null_bind_identically_on_repeat() {
        let engine = engine();
        let pmb = ParameterObject::new("Pmb").with("x", ParameterValue::Null);
        let first = engine.render("X = /*pmb.x*/1", &pmb).unwrap();
        let second = engine.render("X = /*pmb.x*/1", &pmb).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sql, "X = ");
        assert!(first.bound_values.is_empty());
    }

    #[test]
    fn test_should_prune_begin_scope_around_bind() {
        let template = "/*BEGIN*/where /*IF pmb.x != null*/X = /*pmb.x*/1/*END*//*END*/";
        let pmb = ParameterObject::new("Pmb").with("x", ParameterValue::Null);
        let bound = render(template, &pmb).unwrap();
        assert_eq!(bound.sql, "");
        assert!(bound.bound_values.is_empty());

        let pmb = ParameterObject::new("Pmb").with("x", 5);
        let bound = render(template, &pmb).unwrap();
        assert_eq!(bound.sql, "where X = ?");
        assert_eq!(bound.bound_values[0].value, ParameterValue::Integer(5));
    }

    #[test]
    fn test_should_embed_without_placeholders() {
        let pmb = ParameterObject::new("MemberPmb").with("memberName", "foo");
        let bound = render("= /*$pmb.memberName*/'TEST'", &pmb).unwrap();
        assert_eq!(bound.sql, "= 'foo'");
        assert!(bound.bound_values.is_empty());
    }

    #[test]
    fn test_should_expand_embedded_in_scope_list() {
        let pmb = ParameterObject::new("MemberPmb").with("nameList", vec!["x", "y"]);
        let bound = render("in /*$pmb.nameList*/('a','b')", &pmb).unwrap();
        assert_eq!(bound.sql, "in ('x', 'y')");
    }

    #[test]
    fn test_should_reject_scalar_for_in_scope() {
        let pmb = ParameterObject::new("MemberPmb").with("nameList", "x");
        match render("in /*$pmb.nameList*/('a','b')", &pmb) {
            Err(TemplateError::InScopeType { path, type_name }) => {
                assert_eq!(path, "pmb.nameList");
                assert_eq!(type_name, "String");
            }
            other => panic!("expected InScopeType, got {other:?}"),
        }
    }

    #[test]
    fn test_should_evaluate_nested_dynamic_binding() {
        let pmb = ParameterObject::new("MemberPmb")
            .with(
                "memberName",
                "= /*IF pmb.memberId != null*/foo/*pmb.memberId*/99 bar/*END*/",
            )
            .with("memberId", 3);
        let bound = render("MEMBER_ID /*$pmb.memberName*/", &pmb).unwrap();
        assert_eq!(bound.sql, "MEMBER_ID = foo? bar");
        assert_eq!(bound.values().cloned().collect::<Vec<_>>(), vec![ParameterValue::Integer(3)]);
        assert_binds_match(&bound);
    }

    #[test]
    fn test_should_render_loop_with_connectors() {
        let template = "select * from M /*BEGIN*/where /*FOR pmb.words*//*FIRST*/(/*END*//*NEXT 'or '*/NAME like /*#current*/'a%' /*LAST*/)/*END*//*END*//*END*/";
        let pmb = ParameterObject::new("Pmb").with("words", vec!["a%", "b%", "c%"]);
        let bound = render(template, &pmb).unwrap();
        assert_eq!(
            bound.sql,
            "select * from M where (NAME like ? or NAME like ? or NAME like ? )"
        );
        assert_binds_match(&bound);
    }

    #[test]
    fn test_should_cache_parse_failures() {
        let engine = engine();
        let pmb = ParameterObject::default();
        for _ in 0..2 {
            assert!(matches!(
                engine.render("select /*IF pmb.x != null*/1", &pmb),
                Err(TemplateError::Parse(ParseError::UnmatchedOpenClose { .. }))
            ));
        }
        assert_eq!(engine.cached_templates(), 1);
    }

    #[test]
    fn test_should_report_unclosed_directive_offset() {
        assert!(matches!(
            render("select * from M where /*pmb.x", &ParameterObject::default()),
            Err(TemplateError::Parse(ParseError::UnclosedDirective { offset: 22 }))
        ));
    }

    #[test]
    fn test_should_name_path_and_type_on_missing_property() {
        let pmb = ParameterObject::new("MemberPmb");
        match render("/*IF pmb.memberId != null*/x/*END*/", &pmb) {
            Err(TemplateError::Expression(ExpressionError::PropertyNotFound {
                path,
                type_name,
            })) => {
                assert_eq!(path, "pmb.memberId");
                assert_eq!(type_name, "MemberPmb");
            }
            other => panic!("expected PropertyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_should_share_parsed_tree_across_threads() {
        let engine = engine();
        let tree = engine.parse("ID = /*pmb.id*/0").unwrap();
        std::thread::scope(|s| {
            for id in 0..4_i64 {
                let engine = &engine;
                let tree = &tree;
                s.spawn(move || {
                    let pmb = ParameterObject::new("Pmb").with("id", id);
                    let bound = engine.evaluate(tree, &pmb).unwrap();
                    assert_eq!(bound.bound_values[0].value, ParameterValue::Integer(id));
                });
            }
        });
    }

    #[test]
    fn test_should_render_prose_comment_with_apostrophe() {
        let pmb = ParameterObject::new("Pmb").with("name", "x");
        let bound = render(
            "select /* don't use index */ * from M where NAME = /*pmb.name*/'a'",
            &pmb,
        )
        .unwrap();
        assert_eq!(bound.sql, "select /* don't use index */ * from M where NAME = ?");
        assert_binds_match(&bound);
    }

    #[test]
    fn test_should_branch_on_exact_large_integer() {
        let pmb = ParameterObject::new("Pmb").with("id", 9_007_199_254_740_992_i64);
        let bound = render("/*IF pmb.id == 9007199254740993*/HIT/*END*/", &pmb).unwrap();
        assert_eq!(bound.sql, "");
    }
}

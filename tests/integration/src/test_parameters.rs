//! Parameter objects loaded from JSON, as the CLI does.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use twowaysql_model::{ParameterObject, ParameterValue};

    use crate::{assert_binds_match, render};

    #[test]
    fn test_should_render_nested_json_parameters() {
        let pmb = ParameterObject::from_json_str(
            "SearchPmb",
            r#"{"member": {"name": "foo", "status": null}, "ids": [1, 2]}"#,
        )
        .unwrap();
        let template = "select * from M /*BEGIN*/where /*IF pmb.member.status != null*/STATUS = /*pmb.member.status*/'A'/*END*/ /*IF pmb.member.name != null*/and NAME = /*pmb.member.name*/'x'/*END*/ /*IF pmb.ids.size() > 1*/and ID in /*pmb.ids*/(0)/*END*//*END*/";
        let bound = render(template, &pmb).unwrap();
        assert_eq!(bound.sql, "select * from M where NAME = ? and ID in (?, ?)");
        assert_eq!(
            bound.values().cloned().collect::<Vec<_>>(),
            vec![
                ParameterValue::from("foo"),
                ParameterValue::Integer(1),
                ParameterValue::Integer(2),
            ]
        );
        assert_binds_match(&bound);
    }

    #[test]
    fn test_should_serialize_bound_sql_for_callers() {
        let pmb = ParameterObject::from_json_str("Pmb", r#"{"id": 7}"#).unwrap();
        let bound = render("ID = /*pmb.id*/0", &pmb).unwrap();
        assert_eq!(
            serde_json::to_value(&bound).unwrap(),
            json!({
                "sql": "ID = ?",
                "boundValues": [{"value": 7, "sqlType": "numeric", "source": "pmb.id"}]
            })
        );
    }
}

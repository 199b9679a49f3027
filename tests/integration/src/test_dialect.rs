//! Dialect-specific rendering through a configured engine.

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use twowaysql_core::{DialectKind, EngineConfig, NullPolicy};
    use twowaysql_model::ParameterObject;
    use twowaysql_template::TemplateError;

    use crate::engine_with;

    fn config(dialect: DialectKind) -> EngineConfig {
        EngineConfig {
            dialect,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_should_number_placeholders_for_postgres() {
        let engine = engine_with(config(DialectKind::Postgres));
        let pmb = ParameterObject::new("Pmb")
            .with("id", 1)
            .with("codes", vec!["a", "b"]);
        let bound = engine
            .render("ID = /*pmb.id*/0 and CODE in /*pmb.codes*/('x')", &pmb)
            .unwrap();
        assert_eq!(bound.sql, "ID = $1 and CODE in ($2, $3)");
        assert_eq!(bound.bound_values.len(), 3);
    }

    #[test]
    fn test_should_embed_dates_with_dialect_literals() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let pmb = ParameterObject::new("Pmb").with("day", day);
        let template = "D >= /*$pmb.day*/0";

        let standard = engine_with(config(DialectKind::Standard));
        assert_eq!(standard.render(template, &pmb).unwrap().sql, "D >= '2024-03-01'");

        let postgres = engine_with(config(DialectKind::Postgres));
        assert_eq!(
            postgres.render(template, &pmb).unwrap().sql,
            "D >= DATE '2024-03-01'"
        );
    }

    #[test]
    fn test_should_enforce_configured_in_clause_limit() {
        let engine = engine_with(EngineConfig {
            dialect: DialectKind::Oracle,
            in_clause_max_size: Some(2),
            ..EngineConfig::default()
        });
        let pmb = ParameterObject::new("Pmb").with("ids", vec![1, 2, 3]);
        match engine.render("ID in /*pmb.ids*/(0)", &pmb) {
            Err(TemplateError::InScopeLimitExceeded { path, size, max }) => {
                assert_eq!(path, "pmb.ids");
                assert_eq!(size, 3);
                assert_eq!(max, 2);
            }
            other => panic!("expected InScopeLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_should_reject_null_bind_under_reject_policy() {
        let engine = engine_with(EngineConfig {
            null_policy: NullPolicy::Reject,
            ..EngineConfig::default()
        });
        let pmb = ParameterObject::new("Pmb").with("x", Option::<i64>::None);
        assert!(matches!(
            engine.render("X = /*pmb.x*/1", &pmb),
            Err(TemplateError::NullBind { path }) if path == "pmb.x"
        ));
    }
}

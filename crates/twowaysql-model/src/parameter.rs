//! Parameter objects: the caller-owned graph a template is evaluated against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::ParameterValue;

/// Default type name reported in diagnostics when the caller gives none.
pub const DEFAULT_TYPE_NAME: &str = "ParameterObject";

/// A named, read-only key/value graph addressed by dotted paths.
///
/// The type name only feeds diagnostics: property lookup failures report it so
/// the offending parameter class can be found without re-running.
///
/// # Examples
///
/// ```
/// use twowaysql_model::{ParameterObject, ParameterValue};
///
/// let pmb = ParameterObject::new("MemberPmb")
///     .with("memberId", 3)
///     .with("memberName", "foo");
/// assert_eq!(pmb.get("memberId"), Some(&ParameterValue::Integer(3)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterObject {
    /// Type name used in error messages.
    pub type_name: String,
    /// Top-level properties.
    pub properties: BTreeMap<String, ParameterValue>,
}

impl ParameterObject {
    /// Create an empty parameter object with the given type name.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a top-level property, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Get a top-level property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.properties.get(name)
    }

    /// Build a parameter object from a JSON object document.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON or its top level is not
    /// an object.
    pub fn from_json_str(type_name: impl Into<String>, json: &str) -> serde_json::Result<Self> {
        let properties: BTreeMap<String, ParameterValue> = serde_json::from_str(json)?;
        Ok(Self {
            type_name: type_name.into(),
            properties,
        })
    }
}

impl Default for ParameterObject {
    fn default() -> Self {
        Self::new(DEFAULT_TYPE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_build_with_properties() {
        let pmb = ParameterObject::new("MemberPmb")
            .with("memberId", 3)
            .with("memberName", Option::<String>::None);
        assert_eq!(pmb.type_name, "MemberPmb");
        assert_eq!(pmb.get("memberId"), Some(&ParameterValue::Integer(3)));
        assert_eq!(pmb.get("memberName"), Some(&ParameterValue::Null));
        assert!(pmb.get("missing").is_none());
    }

    #[test]
    fn test_should_parse_from_json_object() {
        let pmb =
            ParameterObject::from_json_str("MemberPmb", r#"{"ids": [1, 2], "name": "x"}"#).unwrap();
        assert_eq!(pmb.get("ids").and_then(ParameterValue::as_list).map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_should_reject_non_object_json() {
        assert!(ParameterObject::from_json_str("MemberPmb", "[1, 2]").is_err());
    }

    #[test]
    fn test_should_use_default_type_name() {
        assert_eq!(ParameterObject::default().type_name, DEFAULT_TYPE_NAME);
    }
}

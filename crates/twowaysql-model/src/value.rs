//! `ParameterValue` type with custom serialization.
//!
//! Parameter values deserialize from plain JSON: `null`, booleans, numbers,
//! strings, arrays and objects map onto the obvious variants. Dates and
//! timestamps have no JSON form of their own, so they use single-key tagged
//! objects: `{"$date": "2024-01-31"}` and
//! `{"$timestamp": "2024-01-31T10:00:00"}`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Format used for `$date` tagged values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used for `$timestamp` tagged values.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A value inside a parameter object graph.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParameterValue {
    /// Absent or explicitly null.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integral number.
    Integer(i64),
    /// Fractional number.
    Decimal(f64),
    /// String value.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without zone.
    Timestamp(NaiveDateTime),
    /// Ordered list, expanded by in-clause and loop directives.
    List(Vec<ParameterValue>),
    /// Nested object addressed by dotted paths.
    Object(BTreeMap<String, ParameterValue>),
}

impl ParameterValue {
    /// Returns `true` if this is the null value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if this is a list value.
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns `true` for integral and fractional numbers.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Decimal(_))
    }

    /// Returns the string if this is a `String` variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool` variant.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the list if this is a `List` variant.
    #[must_use]
    pub fn as_list(&self) -> Option<&[ParameterValue]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the properties if this is an `Object` variant.
    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, ParameterValue>> {
        match self {
            Self::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Numeric view used by comparisons; integers widen to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Decimal(n) => Some(*n),
            _ => None,
        }
    }

    /// Short type name used in diagnostics (e.g. "String", "List").
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Decimal(_) => "Decimal",
            Self::String(_) => "String",
            Self::Date(_) => "Date",
            Self::Timestamp(_) => "Timestamp",
            Self::List(_) => "List",
            Self::Object(_) => "Object",
        }
    }

    /// Look up a direct property of an object value.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&ParameterValue> {
        self.as_object()?.get(name)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.3f")),
            Self::List(l) => write!(f, "[{} items]", l.len()),
            Self::Object(m) => write!(f, "{{{} keys}}", m.len()),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NaiveDate> for ParameterValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for ParameterValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<ParameterValue>> From<Vec<T>> for ParameterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParameterValue>> From<Option<T>> for ParameterValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Serialize for ParameterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Decimal(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Date(d) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$date", &d.format(DATE_FORMAT).to_string())?;
                map.end()
            }
            Self::Timestamp(t) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$timestamp", &t.format(TIMESTAMP_FORMAT).to_string())?;
                map.end()
            }
            Self::List(list) => list.serialize(serializer),
            Self::Object(m) => m.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ParameterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ParameterValueVisitor)
    }
}

struct ParameterValueVisitor;

impl<'de> Visitor<'de> for ParameterValueVisitor {
    type Value = ParameterValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON value or a {\"$date\"|\"$timestamp\": string} object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ParameterValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ParameterValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(ParameterValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(ParameterValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(ParameterValue::Integer)
            .map_err(|_| de::Error::custom(format!("integer {v} does not fit in i64")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(ParameterValue::Decimal(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ParameterValue::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(ParameterValue::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut list = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            list.push(item);
        }
        Ok(ParameterValue::List(list))
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let mut object = BTreeMap::new();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "$date" if object.is_empty() => {
                    let raw: String = map.next_value()?;
                    let date =
                        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(de::Error::custom)?;
                    return Ok(ParameterValue::Date(date));
                }
                "$timestamp" if object.is_empty() => {
                    let raw: String = map.next_value()?;
                    let ts = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
                        .map_err(de::Error::custom)?;
                    return Ok(ParameterValue::Timestamp(ts));
                }
                _ => {
                    let value: ParameterValue = map.next_value()?;
                    object.insert(key, value);
                }
            }
        }
        Ok(ParameterValue::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_deserialize_plain_json() {
        let val: ParameterValue =
            serde_json::from_str(r#"{"id": 3, "name": "foo", "tags": ["a", "b"], "x": null}"#)
                .unwrap();
        let obj = val.as_object().unwrap();
        assert_eq!(obj.get("id"), Some(&ParameterValue::Integer(3)));
        assert_eq!(obj.get("name"), Some(&ParameterValue::String("foo".to_owned())));
        assert!(obj.get("tags").unwrap().is_list());
        assert!(obj.get("x").unwrap().is_null());
    }

    #[test]
    fn test_should_deserialize_tagged_date() {
        let val: ParameterValue = serde_json::from_str(r#"{"$date": "2024-01-31"}"#).unwrap();
        assert_eq!(
            val,
            ParameterValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
    }

    #[test]
    fn test_should_deserialize_tagged_timestamp() {
        let val: ParameterValue =
            serde_json::from_str(r#"{"$timestamp": "2024-01-31T10:20:30"}"#).unwrap();
        assert!(matches!(val, ParameterValue::Timestamp(_)));
    }

    #[test]
    fn test_should_reject_malformed_date() {
        let result: Result<ParameterValue, _> = serde_json::from_str(r#"{"$date": "31/01/2024"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_should_serialize_date_as_tagged_object() {
        let val = ParameterValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(serde_json::to_string(&val).unwrap(), r#"{"$date":"2024-01-31"}"#);
    }

    #[test]
    fn test_should_convert_option_none_to_null() {
        let val: ParameterValue = Option::<i64>::None.into();
        assert!(val.is_null());
        let val: ParameterValue = Some(5_i64).into();
        assert_eq!(val, ParameterValue::Integer(5));
    }

    #[test]
    fn test_should_report_type_names() {
        assert_eq!(ParameterValue::from("x").type_name(), "String");
        assert_eq!(ParameterValue::from(vec![1, 2]).type_name(), "List");
        assert_eq!(ParameterValue::Null.type_name(), "Null");
    }
}

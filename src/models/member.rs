//! Member records with an open, ordered field set.
//!
//! The members table is schema-defined by the store, so a member is not a
//! fixed struct: it is an ordered list of `(column, value)` pairs whose order
//! follows the table's column order.

use std::fmt;

use jiff::Timestamp;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;
use validator::Validate;

/// Name of the store-assigned identity column.
pub const ID_FIELD: &str = "id";

/// A single column value of a member row.
///
/// JSON strings always deserialize as `Text`, so a caller's text reaches the
/// store unchanged. A `Timestamp` therefore equals the `Text` of its RFC 3339
/// rendering, which is how it reads back from the wire.
#[derive(Debug, Clone)]
pub enum MemberValue {
    Integer(i64),
    Text(String),
    Boolean(bool),
    Timestamp(Timestamp),
    Null,
}

impl MemberValue {
    /// Renders the value as the text bound to a statement parameter.
    ///
    /// `None` binds SQL `NULL`; every other value is cast by the store to the
    /// target column's declared type.
    pub fn to_bind_text(&self) -> Option<String> {
        match self {
            MemberValue::Integer(v) => Some(v.to_string()),
            MemberValue::Text(v) => Some(v.clone()),
            MemberValue::Boolean(v) => Some(v.to_string()),
            MemberValue::Timestamp(v) => Some(v.to_string()),
            MemberValue::Null => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MemberValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MemberValue::Null)
    }
}

impl PartialEq for MemberValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MemberValue::Integer(a), MemberValue::Integer(b)) => a == b,
            (MemberValue::Text(a), MemberValue::Text(b)) => a == b,
            (MemberValue::Boolean(a), MemberValue::Boolean(b)) => a == b,
            (MemberValue::Timestamp(a), MemberValue::Timestamp(b)) => a == b,
            (MemberValue::Null, MemberValue::Null) => true,
            (MemberValue::Timestamp(ts), MemberValue::Text(text))
            | (MemberValue::Text(text), MemberValue::Timestamp(ts)) => ts.to_string() == *text,
            _ => false,
        }
    }
}

impl From<i64> for MemberValue {
    fn from(value: i64) -> Self {
        MemberValue::Integer(value)
    }
}

impl From<&str> for MemberValue {
    fn from(value: &str) -> Self {
        MemberValue::Text(value.to_string())
    }
}

impl From<String> for MemberValue {
    fn from(value: String) -> Self {
        MemberValue::Text(value)
    }
}

impl From<bool> for MemberValue {
    fn from(value: bool) -> Self {
        MemberValue::Boolean(value)
    }
}

impl From<Timestamp> for MemberValue {
    fn from(value: Timestamp) -> Self {
        MemberValue::Timestamp(value)
    }
}

impl Serialize for MemberValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MemberValue::Integer(v) => serializer.serialize_i64(*v),
            MemberValue::Text(v) => serializer.serialize_str(v),
            MemberValue::Boolean(v) => serializer.serialize_bool(*v),
            MemberValue::Timestamp(v) => serializer.collect_str(v),
            MemberValue::Null => serializer.serialize_none(),
        }
    }
}

struct MemberValueVisitor;

impl<'de> Visitor<'de> for MemberValueVisitor {
    type Value = MemberValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer, string, boolean, timestamp or null")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<MemberValue, E> {
        Ok(MemberValue::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MemberValue, E> {
        Ok(MemberValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MemberValue, E> {
        i64::try_from(v)
            .map(MemberValue::Integer)
            .map_err(|_| E::custom(format!("integer {} is out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<MemberValue, E> {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            Ok(MemberValue::Integer(v as i64))
        } else {
            // Non-integral numbers are passed through as text; the store casts them.
            Ok(MemberValue::Text(v.to_string()))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MemberValue, E> {
        Ok(MemberValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MemberValue, E> {
        Ok(MemberValue::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<MemberValue, E> {
        Ok(MemberValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<MemberValue, E> {
        Ok(MemberValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<MemberValue, D::Error> {
        deserializer.deserialize_any(MemberValueVisitor)
    }
}

impl<'de> Deserialize<'de> for MemberValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MemberValueVisitor)
    }
}

/// Ordered `field -> value` pairs shared by [`Member`] and [`NewMemberRequest`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMap {
    entries: Vec<(String, MemberValue)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, keeping its original position when it already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<MemberValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MemberValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MemberValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<MemberValue>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct FieldMapVisitor;

impl<'de> Visitor<'de> for FieldMapVisitor {
    type Value = FieldMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object of member fields")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
        let mut map = FieldMap::new();
        while let Some((key, value)) = access.next_entry::<String, MemberValue>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FieldMapVisitor)
    }
}

/// One row of the members table, in the store's column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Member(FieldMap);

impl Member {
    pub fn new(fields: FieldMap) -> Self {
        Self(fields)
    }

    /// The store-assigned identifier, when the row carries an integer `id`.
    pub fn id(&self) -> Option<i64> {
        self.0.get(ID_FIELD).and_then(MemberValue::as_i64)
    }

    pub fn get(&self, name: &str) -> Option<&MemberValue> {
        self.0.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.names()
    }

    pub fn fields(&self) -> &FieldMap {
        &self.0
    }
}

/// Caller-supplied fields for a new member.
///
/// Keys must name columns of the members table; the repository checks them
/// against the live schema before building the insert.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewMemberRequest(FieldMap);

impl NewMemberRequest {
    pub fn new(fields: FieldMap) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<MemberValue>> FromIterator<(K, V)> for NewMemberRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fixed-shape record used by the bulk insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewMemberRecord {
    #[validate(length(min = 1, max = 255, message = "name must be between 1 and 255 characters"))]
    #[schema(example = "Kim")]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "grade must be between 1 and 255 characters"))]
    #[schema(example = "Manager")]
    pub grade: String,
    #[validate(length(min = 1, max = 255, message = "gender must be between 1 and 255 characters"))]
    #[schema(example = "male")]
    pub gender: String,
}

impl NewMemberRecord {
    /// Column names written by the bulk insert, in statement order.
    pub const COLUMNS: [&'static str; 3] = ["name", "grade", "gender"];

    pub fn values(&self) -> [&str; 3] {
        [&self.name, &self.grade, &self.gender]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_member_serializes_in_column_order() {
        let member = Member::new(
            [
                ("id", MemberValue::Integer(1)),
                ("name", MemberValue::from("Kim")),
                ("grade", MemberValue::from("Manager")),
                ("active", MemberValue::Boolean(true)),
                ("retired_at", MemberValue::Null),
            ]
            .into_iter()
            .collect(),
        );

        let json = serde_json::to_string(&member).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"name":"Kim","grade":"Manager","active":true,"retired_at":null}"#
        );
    }

    #[test]
    fn test_member_deserializes_preserving_key_order() {
        let member: Member =
            serde_json::from_str(r#"{"zeta":1,"alpha":"a","mid":false}"#).unwrap();
        let names: Vec<&str> = member.field_names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_member_round_trip_with_timestamp() {
        let ts: Timestamp = "2024-03-01T09:30:00.123456Z".parse().unwrap();
        let member = Member::new(
            [
                ("id", MemberValue::Integer(7)),
                ("created_at", MemberValue::Timestamp(ts)),
            ]
            .into_iter()
            .collect(),
        );

        let wire = serde_json::to_value(&member).unwrap();
        assert_eq!(wire["created_at"], json!("2024-03-01T09:30:00.123456Z"));

        let parsed: Member = serde_json::from_value(wire).unwrap();
        assert_eq!(parsed, member);
        assert_eq!(
            parsed.get("created_at"),
            Some(&MemberValue::from("2024-03-01T09:30:00.123456Z"))
        );
    }

    #[test]
    fn test_instant_shaped_text_is_bound_verbatim() {
        let sent = "2024-03-01T09:30:00.000+09:00";
        let req: NewMemberRequest =
            serde_json::from_value(json!({ "name": sent })).unwrap();

        let value = req.fields().get("name").unwrap();
        assert_eq!(value, &MemberValue::Text(sent.to_string()));
        assert_eq!(value.to_bind_text().as_deref(), Some(sent));
    }

    #[test]
    fn test_text_holding_instant_survives_round_trip() {
        let member = Member::new([("name", "2024-03-01T09:30:00Z")].into_iter().collect());
        let parsed: Member =
            serde_json::from_str(&serde_json::to_string(&member).unwrap()).unwrap();
        assert!(matches!(parsed.get("name"), Some(MemberValue::Text(_))));
        assert_eq!(parsed, member);
    }

    #[test]
    fn test_timestamp_equals_only_its_own_rendering() {
        let ts: Timestamp = "2024-03-01T00:30:00Z".parse().unwrap();
        assert_eq!(MemberValue::Timestamp(ts), MemberValue::from("2024-03-01T00:30:00Z"));
        assert_ne!(
            MemberValue::Timestamp(ts),
            MemberValue::from("2024-03-01T09:30:00+09:00")
        );
        assert_ne!(MemberValue::Integer(1), MemberValue::from("1"));
    }

    #[test]
    fn test_member_id() {
        let member: Member = serde_json::from_str(r#"{"id": 42, "name": "Lee"}"#).unwrap();
        assert_eq!(member.id(), Some(42));

        let no_id: Member = serde_json::from_str(r#"{"name": "Lee"}"#).unwrap();
        assert_eq!(no_id.id(), None);
    }

    #[test]
    fn test_value_rejects_nested_structures() {
        assert!(serde_json::from_str::<NewMemberRequest>(r#"{"name": ["a"]}"#).is_err());
        assert!(serde_json::from_str::<NewMemberRequest>(r#"{"name": {"a": 1}}"#).is_err());
    }

    #[test]
    fn test_value_number_handling() {
        let req: NewMemberRequest =
            serde_json::from_str(r#"{"a": 3, "b": 2.0, "c": 2.5}"#).unwrap();
        assert_eq!(req.fields().get("a"), Some(&MemberValue::Integer(3)));
        assert_eq!(req.fields().get("b"), Some(&MemberValue::Integer(2)));
        assert_eq!(req.fields().get("c"), Some(&MemberValue::Text("2.5".to_string())));
    }

    #[test]
    fn test_duplicate_keys_keep_first_position() {
        let req: NewMemberRequest =
            serde_json::from_str(r#"{"name": "a", "grade": "b", "name": "c"}"#).unwrap();
        let names: Vec<&str> = req.fields().names().collect();
        assert_eq!(names, vec!["name", "grade"]);
        assert_eq!(req.fields().get("name"), Some(&MemberValue::from("c")));
    }

    #[test]
    fn test_bind_text() {
        assert_eq!(MemberValue::Integer(5).to_bind_text().as_deref(), Some("5"));
        assert_eq!(MemberValue::Boolean(false).to_bind_text().as_deref(), Some("false"));
        assert_eq!(MemberValue::from("Kim").to_bind_text().as_deref(), Some("Kim"));
        assert_eq!(MemberValue::Null.to_bind_text(), None);
    }

    #[test]
    fn test_new_member_record_validation() {
        let valid = NewMemberRecord {
            name: "Kim".to_string(),
            grade: "Manager".to_string(),
            gender: "male".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = NewMemberRecord {
            name: String::new(),
            ..valid
        };
        let errors = invalid.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    proptest! {
        #[test]
        fn prop_field_order_survives_json(keys in prop::collection::btree_set("[a-z_]{1,12}", 1..12)) {
            // BTreeSet yields sorted keys; reverse them so order is not alphabetical.
            let keys: Vec<String> = keys.into_iter().rev().collect();
            let member = Member::new(
                keys.iter()
                    .enumerate()
                    .map(|(i, k)| (k.clone(), MemberValue::Integer(i as i64)))
                    .collect(),
            );

            let wire = serde_json::to_string(&member).unwrap();
            let parsed: Member = serde_json::from_str(&wire).unwrap();
            let names: Vec<String> = parsed.field_names().map(String::from).collect();
            prop_assert_eq!(names, keys);
            prop_assert_eq!(parsed, member);
        }
    }
}

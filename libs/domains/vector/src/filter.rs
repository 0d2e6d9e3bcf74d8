//! Search filter model
//!
//! A typed subset of Qdrant's filter language. The JSON shape mirrors the one
//! Qdrant's REST API accepts, so tool callers can pass filters written for
//! Qdrant directly:
//!
//! ```json
//! {
//!   "must": [{ "key": "category", "match": { "value": "AI" } }],
//!   "must_not": [{ "has_id": [3, 4] }],
//!   "should": [{ "key": "year", "range": { "gte": 2020 } }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{VectorError, VectorResult};
use crate::models::PointId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Condition>,
}

impl SearchFilter {
    pub fn must(conditions: Vec<Condition>) -> Self {
        Self {
            must: conditions,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }

    /// Reject conditions that deserialize but carry nothing to match on
    pub fn validate(&self) -> VectorResult<()> {
        self.must
            .iter()
            .chain(&self.should)
            .chain(&self.must_not)
            .try_for_each(Condition::validate)
    }
}

/// Single filter clause
///
/// Variant order matters: serde tries them top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    HasId { has_id: Vec<PointId> },
    IsEmpty { is_empty: FieldRef },
    IsNull { is_null: FieldRef },
    Field(FieldCondition),
}

impl Condition {
    pub fn matches(key: impl Into<String>, value: impl Into<MatchValue>) -> Self {
        Condition::Field(FieldCondition {
            key: key.into(),
            r#match: Some(MatchCondition::Value {
                value: value.into(),
            }),
            range: None,
        })
    }

    pub fn range(key: impl Into<String>, range: RangeCondition) -> Self {
        Condition::Field(FieldCondition {
            key: key.into(),
            r#match: None,
            range: Some(range),
        })
    }

    fn validate(&self) -> VectorResult<()> {
        match self {
            Condition::HasId { has_id } if has_id.is_empty() => Err(VectorError::Validation(
                "has_id condition needs at least one id".to_string(),
            )),
            Condition::Field(field) => field.validate(),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldCondition {
    pub key: String,
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub r#match: Option<MatchCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeCondition>,
}

impl FieldCondition {
    fn validate(&self) -> VectorResult<()> {
        match (&self.r#match, &self.range) {
            (None, None) => Err(VectorError::Validation(format!(
                "condition on '{}' needs either 'match' or 'range'",
                self.key
            ))),
            (Some(_), Some(_)) => Err(VectorError::Validation(format!(
                "condition on '{}' cannot combine 'match' and 'range'",
                self.key
            ))),
            (Some(MatchCondition::Any { any }), None) => MatchValue::homogeneous(any, &self.key),
            (_, Some(range)) if range.is_unbounded() => Err(VectorError::Validation(format!(
                "range on '{}' needs at least one bound",
                self.key
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchCondition {
    Value { value: MatchValue },
    Text { text: String },
    Any { any: Vec<MatchValue> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchValue {
    Bool(bool),
    Integer(i64),
    Keyword(String),
}

impl MatchValue {
    /// `any` lists must be all keywords or all integers
    fn homogeneous(values: &[MatchValue], key: &str) -> VectorResult<()> {
        let all_keywords = values.iter().all(|v| matches!(v, MatchValue::Keyword(_)));
        let all_integers = values.iter().all(|v| matches!(v, MatchValue::Integer(_)));
        if values.is_empty() || !(all_keywords || all_integers) {
            return Err(VectorError::Validation(format!(
                "'any' on '{}' must be a non-empty list of only strings or only integers",
                key
            )));
        }
        Ok(())
    }
}

impl From<bool> for MatchValue {
    fn from(v: bool) -> Self {
        MatchValue::Bool(v)
    }
}

impl From<i64> for MatchValue {
    fn from(v: i64) -> Self {
        MatchValue::Integer(v)
    }
}

impl From<&str> for MatchValue {
    fn from(v: &str) -> Self {
        MatchValue::Keyword(v.to_string())
    }
}

impl From<String> for MatchValue {
    fn from(v: String) -> Self {
        MatchValue::Keyword(v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<f64>,
}

impl RangeCondition {
    pub fn is_unbounded(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_qdrant_style_filter() {
        let filter: SearchFilter = serde_json::from_value(json!({
            "must": [
                { "key": "category", "match": { "value": "AI" } },
                { "key": "year", "range": { "gte": 2020 } }
            ],
            "must_not": [{ "has_id": [1, "abc"] }],
            "should": [{ "is_null": { "key": "deleted_at" } }]
        }))
        .unwrap();

        assert_eq!(filter.must.len(), 2);
        assert_eq!(filter.must[0], Condition::matches("category", "AI"));
        assert_eq!(
            filter.must[1],
            Condition::range(
                "year",
                RangeCondition {
                    gte: Some(2020.0),
                    ..Default::default()
                }
            )
        );
        assert_eq!(
            filter.must_not[0],
            Condition::HasId {
                has_id: vec![PointId::Num(1), PointId::Text("abc".to_string())]
            }
        );
        assert!(matches!(filter.should[0], Condition::IsNull { .. }));
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn test_match_value_kinds() {
        let cond: Condition =
            serde_json::from_value(json!({ "key": "n", "match": { "value": 3 } })).unwrap();
        assert_eq!(cond, Condition::matches("n", 3_i64));

        let cond: Condition =
            serde_json::from_value(json!({ "key": "flag", "match": { "value": true } })).unwrap();
        assert_eq!(cond, Condition::matches("flag", true));
    }

    #[test]
    fn test_validate_rejects_empty_field_condition() {
        let filter: SearchFilter =
            serde_json::from_value(json!({ "must": [{ "key": "category" }] })).unwrap();
        let err = filter.validate().unwrap_err();
        assert!(err.to_string().contains("category"));
    }

    #[test]
    fn test_validate_rejects_mixed_any() {
        let filter: SearchFilter = serde_json::from_value(json!({
            "must": [{ "key": "tag", "match": { "any": ["a", 1] } }]
        }))
        .unwrap();
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let result: Result<SearchFilter, _> = serde_json::from_value(json!({ "must_have": [] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_filter() {
        let filter: SearchFilter = serde_json::from_value(json!({})).unwrap();
        assert!(filter.is_empty());
    }
}

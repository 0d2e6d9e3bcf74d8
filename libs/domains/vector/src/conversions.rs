//! Domain ↔ Qdrant conversions
//!
//! Payload values are converted recursively so nested objects and lists survive
//! a write/read round trip unchanged.

use std::collections::HashMap;

use qdrant_client::qdrant::{
    self, Condition as QdrantCondition, Distance, Filter, ListValue, PointId as QdrantPointId,
    Range, Struct, Value as QdrantValue, value::Kind,
};

use crate::error::{VectorError, VectorResult};
use crate::filter::{Condition, MatchCondition, MatchValue, SearchFilter};
use crate::models::{DistanceMetric, Payload, PointId};

// ===== Distance Metric =====

impl From<DistanceMetric> for Distance {
    fn from(metric: DistanceMetric) -> Self {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclid => Distance::Euclid,
            DistanceMetric::Dot => Distance::Dot,
            DistanceMetric::Manhattan => Distance::Manhattan,
        }
    }
}

pub fn distance_from_qdrant(distance: Distance) -> DistanceMetric {
    match distance {
        Distance::Euclid => DistanceMetric::Euclid,
        Distance::Dot => DistanceMetric::Dot,
        Distance::Manhattan => DistanceMetric::Manhattan,
        _ => DistanceMetric::Cosine,
    }
}

// ===== Point IDs =====

impl From<PointId> for QdrantPointId {
    fn from(id: PointId) -> Self {
        match id {
            PointId::Num(num) => QdrantPointId::from(num),
            PointId::Text(text) => QdrantPointId::from(text),
        }
    }
}

pub fn point_id_from_qdrant(point_id: Option<QdrantPointId>) -> VectorResult<PointId> {
    match point_id.and_then(|id| id.point_id_options) {
        Some(qdrant::point_id::PointIdOptions::Num(num)) => Ok(PointId::Num(num)),
        Some(qdrant::point_id::PointIdOptions::Uuid(uuid)) => Ok(PointId::Text(uuid)),
        None => Err(VectorError::Internal("Missing point ID".to_string())),
    }
}

// ===== Payload =====

pub fn payload_to_qdrant(payload: Payload) -> HashMap<String, QdrantValue> {
    payload
        .into_iter()
        .map(|(key, val)| (key, json_to_qdrant_value(val)))
        .collect()
}

pub fn payload_from_qdrant(payload: HashMap<String, QdrantValue>) -> Payload {
    payload
        .into_iter()
        .map(|(key, val)| (key, qdrant_value_to_json(val)))
        .collect()
}

pub fn json_to_qdrant_value(val: serde_json::Value) -> QdrantValue {
    let kind = match val {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant_value).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(key, val)| (key, json_to_qdrant_value(val)))
                .collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

pub fn qdrant_value_to_json(val: QdrantValue) -> serde_json::Value {
    match val.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => serde_json::Value::Array(
            list.values.into_iter().map(qdrant_value_to_json).collect(),
        ),
        Some(Kind::StructValue(st)) => serde_json::Value::Object(
            st.fields
                .into_iter()
                .map(|(key, val)| (key, qdrant_value_to_json(val)))
                .collect(),
        ),
    }
}

// ===== Filters =====

impl TryFrom<SearchFilter> for Filter {
    type Error = VectorError;

    fn try_from(filter: SearchFilter) -> Result<Self, Self::Error> {
        filter.validate()?;

        let convert = |conditions: Vec<Condition>| -> VectorResult<Vec<QdrantCondition>> {
            conditions.into_iter().map(condition_to_qdrant).collect()
        };

        Ok(Filter {
            must: convert(filter.must)?,
            should: convert(filter.should)?,
            must_not: convert(filter.must_not)?,
            ..Default::default()
        })
    }
}

fn condition_to_qdrant(condition: Condition) -> VectorResult<QdrantCondition> {
    match condition {
        Condition::HasId { has_id } => Ok(QdrantCondition::has_id(
            has_id.into_iter().map(QdrantPointId::from),
        )),
        Condition::IsEmpty { is_empty } => Ok(QdrantCondition::is_empty(is_empty.key)),
        Condition::IsNull { is_null } => Ok(QdrantCondition::is_null(is_null.key)),
        Condition::Field(field) => match (field.r#match, field.range) {
            (Some(MatchCondition::Value { value }), None) => Ok(match value {
                MatchValue::Bool(b) => QdrantCondition::matches(field.key, b),
                MatchValue::Integer(i) => QdrantCondition::matches(field.key, i),
                MatchValue::Keyword(s) => QdrantCondition::matches(field.key, s),
            }),
            (Some(MatchCondition::Text { text }), None) => {
                Ok(QdrantCondition::matches_text(field.key, text))
            }
            (Some(MatchCondition::Any { any }), None) => any_to_qdrant(field.key, any),
            (None, Some(range)) => Ok(QdrantCondition::range(
                field.key,
                Range {
                    gt: range.gt,
                    gte: range.gte,
                    lt: range.lt,
                    lte: range.lte,
                },
            )),
            _ => Err(VectorError::Validation(format!(
                "invalid condition on '{}'",
                field.key
            ))),
        },
    }
}

fn any_to_qdrant(key: String, values: Vec<MatchValue>) -> VectorResult<QdrantCondition> {
    let keywords: Option<Vec<String>> = values
        .iter()
        .map(|v| match v {
            MatchValue::Keyword(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    if let Some(keywords) = keywords {
        return Ok(QdrantCondition::matches(key, keywords));
    }

    let integers: Option<Vec<i64>> = values
        .iter()
        .map(|v| match v {
            MatchValue::Integer(i) => Some(*i),
            _ => None,
        })
        .collect();
    match integers {
        Some(integers) => Ok(QdrantCondition::matches(key, integers)),
        None => Err(VectorError::Validation(format!(
            "'any' on '{}' mixes value types",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RangeCondition;
    use serde_json::json;

    #[test]
    fn test_payload_round_trip_nested() {
        let payload: Payload = serde_json::from_value(json!({
            "text": "x",
            "count": 3,
            "ratio": 0.5,
            "flag": true,
            "tags": ["a", "b"],
            "meta": { "source": "demo", "nested": [1, { "k": null }] }
        }))
        .unwrap();

        let back = payload_from_qdrant(payload_to_qdrant(payload.clone()));
        assert_eq!(back, payload);
    }

    #[test]
    fn test_point_id_conversion() {
        let num: QdrantPointId = PointId::Num(42).into();
        assert_eq!(point_id_from_qdrant(Some(num)).unwrap(), PointId::Num(42));

        let uuid = "5c56c793-69f3-4fbf-87e6-c4bf54c28c26".to_string();
        let text: QdrantPointId = PointId::Text(uuid.clone()).into();
        assert_eq!(point_id_from_qdrant(Some(text)).unwrap(), PointId::Text(uuid));

        assert!(point_id_from_qdrant(None).is_err());
    }

    #[test]
    fn test_distance_round_trip() {
        for metric in [
            DistanceMetric::Cosine,
            DistanceMetric::Euclid,
            DistanceMetric::Dot,
            DistanceMetric::Manhattan,
        ] {
            assert_eq!(distance_from_qdrant(Distance::from(metric)), metric);
        }
    }

    #[test]
    fn test_filter_conversion_counts_clauses() {
        let filter = SearchFilter {
            must: vec![
                Condition::matches("category", "AI"),
                Condition::range(
                    "year",
                    RangeCondition {
                        gte: Some(2020.0),
                        ..Default::default()
                    },
                ),
            ],
            should: vec![],
            must_not: vec![Condition::HasId {
                has_id: vec![PointId::Num(1)],
            }],
        };

        let qdrant_filter = Filter::try_from(filter).unwrap();
        assert_eq!(qdrant_filter.must.len(), 2);
        assert!(qdrant_filter.should.is_empty());
        assert_eq!(qdrant_filter.must_not.len(), 1);
    }

    #[test]
    fn test_filter_conversion_rejects_invalid() {
        let filter: SearchFilter =
            serde_json::from_value(json!({ "must": [{ "key": "x" }] })).unwrap();
        assert!(Filter::try_from(filter).is_err());
    }
}

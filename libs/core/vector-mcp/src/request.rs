//! Typed operation requests
//!
//! Arguments arrive as loose JSON. Once they pass the catalogue's schema check
//! they are converted into an [`Operation`], so handlers never touch raw
//! `serde_json::Value`s.

use std::str::FromStr;

use domain_vector::{Condition, DistanceMetric, Payload, Point, PointId, SearchFilter};
use serde_json::{Map, Value};

use crate::catalogue::{self, DEFAULT_SEARCH_LIMIT};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateCollectionArgs {
    pub name: String,
    pub vector_size: u64,
    pub distance: DistanceMetric,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionNameArgs {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpsertVectorsArgs {
    pub collection: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchVectorsArgs {
    pub collection: String,
    pub query_vector: Vec<f32>,
    pub limit: u64,
    /// `None` when the caller left it out; the router picks a default that
    /// suits the collection's metric.
    pub score_threshold: Option<f32>,
    pub filter: Option<SearchFilter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointIdsArgs {
    pub collection: String,
    pub ids: Vec<PointId>,
}

/// One validated call into the router
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    ListCollections,
    CreateCollection(CreateCollectionArgs),
    DeleteCollection(CollectionNameArgs),
    GetCollectionInfo(CollectionNameArgs),
    UpsertVectors(UpsertVectorsArgs),
    SearchVectors(SearchVectorsArgs),
    DeleteVectors(PointIdsArgs),
    GetVectors(PointIdsArgs),
    HealthCheck,
}

impl Operation {
    /// Resolve `name` in the catalogue, validate `arguments` against its
    /// schema and build the typed request.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self> {
        let descriptor = catalogue::lookup(name).ok_or_else(|| Error::UnknownOperation {
            name: name.to_string(),
        })?;
        descriptor.validate(arguments)?;

        let empty = Map::new();
        let args = Args(arguments.as_object().unwrap_or(&empty));

        let operation = match descriptor.name {
            catalogue::LIST_COLLECTIONS => Operation::ListCollections,
            catalogue::CREATE_COLLECTION => Operation::CreateCollection(CreateCollectionArgs {
                name: args.string("name")?,
                vector_size: args.positive("vector_size")?.unwrap_or_default(),
                distance: args.distance("distance")?,
            }),
            catalogue::DELETE_COLLECTION => Operation::DeleteCollection(CollectionNameArgs {
                name: args.string("name")?,
            }),
            catalogue::GET_COLLECTION_INFO => Operation::GetCollectionInfo(CollectionNameArgs {
                name: args.string("name")?,
            }),
            catalogue::UPSERT_VECTORS => Operation::UpsertVectors(UpsertVectorsArgs {
                collection: args.string("collection")?,
                points: args.points("vectors")?,
            }),
            catalogue::SEARCH_VECTORS => Operation::SearchVectors(SearchVectorsArgs {
                collection: args.string("collection")?,
                query_vector: args.numbers("query_vector")?,
                limit: args
                    .positive("limit")?
                    .unwrap_or(DEFAULT_SEARCH_LIMIT as u64),
                score_threshold: args.number("score_threshold"),
                filter: args.filter("filter")?,
            }),
            catalogue::DELETE_VECTORS => Operation::DeleteVectors(PointIdsArgs {
                collection: args.string("collection")?,
                ids: args.ids("ids")?,
            }),
            catalogue::GET_VECTORS => Operation::GetVectors(PointIdsArgs {
                collection: args.string("collection")?,
                ids: args.ids("ids")?,
            }),
            catalogue::HEALTH_CHECK => Operation::HealthCheck,
            other => {
                return Err(Error::UnknownOperation {
                    name: other.to_string(),
                });
            }
        };

        Ok(operation)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListCollections => catalogue::LIST_COLLECTIONS,
            Operation::CreateCollection(_) => catalogue::CREATE_COLLECTION,
            Operation::DeleteCollection(_) => catalogue::DELETE_COLLECTION,
            Operation::GetCollectionInfo(_) => catalogue::GET_COLLECTION_INFO,
            Operation::UpsertVectors(_) => catalogue::UPSERT_VECTORS,
            Operation::SearchVectors(_) => catalogue::SEARCH_VECTORS,
            Operation::DeleteVectors(_) => catalogue::DELETE_VECTORS,
            Operation::GetVectors(_) => catalogue::GET_VECTORS,
            Operation::HealthCheck => catalogue::HEALTH_CHECK,
        }
    }
}

/// Typed accessors over an argument object that already passed schema checks
struct Args<'a>(&'a Map<String, Value>);

impl Args<'_> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    fn string(&self, key: &str) -> Result<String> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::validation(key, "is required"))
    }

    fn number(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(Value::as_f64).map(|n| n as f32)
    }

    /// Optional integer that must be greater than zero when present
    fn positive(&self, key: &str) -> Result<Option<u64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => match value.as_u64() {
                Some(n) if n > 0 => Ok(Some(n)),
                _ => Err(Error::validation(key, "must be a positive integer")),
            },
        }
    }

    fn distance(&self, key: &str) -> Result<DistanceMetric> {
        match self.get(key).and_then(Value::as_str) {
            None => Ok(DistanceMetric::default()),
            Some(raw) => DistanceMetric::from_str(raw)
                .map_err(|_| Error::validation(key, format!("unsupported distance '{}'", raw))),
        }
    }

    fn numbers(&self, key: &str) -> Result<Vec<f32>> {
        let components = as_numbers(key, self.get(key))?;
        if components.is_empty() {
            return Err(Error::validation(key, "must not be empty"));
        }
        Ok(components)
    }

    fn ids(&self, key: &str) -> Result<Vec<PointId>> {
        let items = self
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| Error::validation(key, "is required"))?;
        if items.is_empty() {
            return Err(Error::validation(key, "must not be empty"));
        }
        items
            .iter()
            .enumerate()
            .map(|(index, id)| to_point_id(&format!("{}[{}]", key, index), id))
            .collect()
    }

    fn points(&self, key: &str) -> Result<Vec<Point>> {
        let items = self
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| Error::validation(key, "is required"))?;
        if items.is_empty() {
            return Err(Error::validation(key, "must not be empty"));
        }

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let path = format!("{}[{}]", key, index);
                let record = item
                    .as_object()
                    .ok_or_else(|| Error::validation(&path, "expected an object"))?;

                let id = record
                    .get("id")
                    .ok_or_else(|| Error::validation(format!("{}.id", path), "is required"))?;
                let vector_path = format!("{}.vector", path);
                let vector = as_numbers(&vector_path, record.get("vector"))?;
                if vector.is_empty() {
                    return Err(Error::validation(vector_path, "must not be empty"));
                }
                let payload = match record.get("payload") {
                    Some(Value::Object(payload)) => payload.clone(),
                    _ => Payload::new(),
                };

                Ok(Point::new(to_point_id(&format!("{}.id", path), id)?, vector)
                    .with_payload(payload))
            })
            .collect()
    }

    fn filter(&self, key: &str) -> Result<Option<SearchFilter>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        let mut filter: SearchFilter = serde_json::from_value(raw.clone())
            .map_err(|e| Error::validation(key, e.to_string()))?;
        filter
            .validate()
            .map_err(|e| Error::validation(key, e.to_string()))?;

        coerce_filter_ids(&mut filter);
        Ok((!filter.is_empty()).then_some(filter))
    }
}

/// `has_id` lists follow the same id rules as top-level `ids`
fn coerce_filter_ids(filter: &mut SearchFilter) {
    let conditions = filter
        .must
        .iter_mut()
        .chain(filter.should.iter_mut())
        .chain(filter.must_not.iter_mut());

    for condition in conditions {
        if let Condition::HasId { has_id } = condition {
            for id in has_id.iter_mut() {
                if let PointId::Text(raw) = id {
                    *id = PointId::coerce(std::mem::take(raw));
                }
            }
        }
    }
}

fn as_numbers(field: &str, value: Option<&Value>) -> Result<Vec<f32>> {
    let items = value
        .and_then(Value::as_array)
        .ok_or_else(|| Error::validation(field, "expected an array of numbers"))?;
    items
        .iter()
        .enumerate()
        .map(|(index, component)| {
            component
                .as_f64()
                .map(|n| n as f32)
                .ok_or_else(|| {
                    Error::validation(format!("{}[{}]", field, index), "expected a number")
                })
        })
        .collect()
}

fn to_point_id(field: &str, value: &Value) -> Result<PointId> {
    match value {
        Value::String(raw) => Ok(PointId::coerce(raw.as_str())),
        Value::Number(n) => n
            .as_u64()
            .map(PointId::Num)
            .ok_or_else(|| {
                Error::validation(field, "expected a string or a non-negative integer")
            }),
        _ => Err(Error::validation(
            field,
            "expected a string or a non-negative integer",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_vector::MatchValue;
    use serde_json::json;

    #[test]
    fn test_parse_unknown_operation() {
        let err = Operation::parse("drop_everything", &json!({})).unwrap_err();
        assert!(matches!(err, Error::UnknownOperation { .. }));
    }

    #[test]
    fn test_parse_parameterless_with_null_arguments() {
        assert_eq!(
            Operation::parse("list_collections", &Value::Null).unwrap(),
            Operation::ListCollections
        );
        assert_eq!(
            Operation::parse("health_check", &json!({})).unwrap(),
            Operation::HealthCheck
        );
    }

    #[test]
    fn test_parse_create_collection_defaults_to_cosine() {
        let op = Operation::parse(
            "create_collection",
            &json!({ "name": "docs", "vector_size": 384 }),
        )
        .unwrap();
        assert_eq!(
            op,
            Operation::CreateCollection(CreateCollectionArgs {
                name: "docs".to_string(),
                vector_size: 384,
                distance: DistanceMetric::Cosine,
            })
        );
    }

    #[test]
    fn test_parse_create_collection_distance_case_insensitive() {
        let op = Operation::parse(
            "create_collection",
            &json!({ "name": "docs", "vector_size": 3, "distance": "euclid" }),
        )
        .unwrap();
        let Operation::CreateCollection(args) = op else {
            panic!("expected create_collection");
        };
        assert_eq!(args.distance, DistanceMetric::Euclid);
    }

    #[test]
    fn test_parse_create_collection_rejects_non_positive_size() {
        for size in [0, -4] {
            let err = Operation::parse(
                "create_collection",
                &json!({ "name": "docs", "vector_size": size }),
            )
            .unwrap_err();
            assert!(err.is_validation());
            assert!(err.to_string().contains("vector_size"));
        }
    }

    #[test]
    fn test_parse_search_defaults() {
        let op = Operation::parse(
            "search_vectors",
            &json!({ "collection": "docs", "query_vector": [0.1, 0.2] }),
        )
        .unwrap();
        let Operation::SearchVectors(args) = op else {
            panic!("expected search_vectors");
        };
        assert_eq!(args.limit, 10);
        assert_eq!(args.score_threshold, None);
        assert_eq!(args.filter, None);
    }

    #[test]
    fn test_parse_search_rejects_zero_limit() {
        let err = Operation::parse(
            "search_vectors",
            &json!({ "collection": "docs", "query_vector": [0.1], "limit": 0 }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_parse_search_filter() {
        let op = Operation::parse(
            "search_vectors",
            &json!({
                "collection": "docs",
                "query_vector": [0.1],
                "filter": { "must": [{ "key": "lang", "match": { "value": "en" } }] }
            }),
        )
        .unwrap();
        let Operation::SearchVectors(args) = op else {
            panic!("expected search_vectors");
        };
        assert_eq!(
            args.filter,
            Some(SearchFilter::must(vec![Condition::matches(
                "lang",
                MatchValue::from("en")
            )]))
        );
    }

    #[test]
    fn test_parse_search_filter_coerces_has_id() {
        let op = Operation::parse(
            "search_vectors",
            &json!({
                "collection": "docs",
                "query_vector": [0.1],
                "filter": { "must_not": [{ "has_id": ["3", 4, "x"] }] }
            }),
        )
        .unwrap();
        let Operation::SearchVectors(args) = op else {
            panic!("expected search_vectors");
        };
        assert_eq!(
            args.filter.unwrap().must_not,
            vec![Condition::HasId {
                has_id: vec![PointId::Num(3), PointId::Num(4), PointId::from("x")]
            }]
        );
    }

    #[test]
    fn test_parse_search_invalid_filter() {
        let err = Operation::parse(
            "search_vectors",
            &json!({
                "collection": "docs",
                "query_vector": [0.1],
                "filter": { "must": [{ "key": "lang" }] }
            }),
        )
        .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("filter"));
    }

    #[test]
    fn test_parse_ids_are_coerced() {
        let op = Operation::parse(
            "get_vectors",
            &json!({ "collection": "docs", "ids": ["1", "2", "abc", 7] }),
        )
        .unwrap();
        let Operation::GetVectors(args) = op else {
            panic!("expected get_vectors");
        };
        assert_eq!(
            args.ids,
            vec![
                PointId::Num(1),
                PointId::Num(2),
                PointId::Text("abc".to_string()),
                PointId::Num(7)
            ]
        );
    }

    #[test]
    fn test_parse_empty_ids_rejected() {
        let err = Operation::parse("delete_vectors", &json!({ "collection": "docs", "ids": [] }))
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_parse_upsert_points() {
        let op = Operation::parse(
            "upsert_vectors",
            &json!({
                "collection": "docs",
                "vectors": [
                    { "id": "42", "vector": [0.5, 0.5], "payload": { "text": "x" } },
                    { "id": "doc-a", "vector": [0.1, 0.9] }
                ]
            }),
        )
        .unwrap();
        let Operation::UpsertVectors(args) = op else {
            panic!("expected upsert_vectors");
        };
        assert_eq!(args.points.len(), 2);
        assert_eq!(args.points[0].id, PointId::Num(42));
        assert_eq!(args.points[0].payload["text"], "x");
        assert_eq!(args.points[1].id, PointId::Text("doc-a".to_string()));
        assert!(args.points[1].payload.is_empty());
    }

    #[test]
    fn test_operation_name_round_trips() {
        for descriptor in catalogue::CATALOGUE {
            let args = match descriptor.name {
                "create_collection" => json!({ "name": "c", "vector_size": 2 }),
                "delete_collection" | "get_collection_info" => json!({ "name": "c" }),
                "upsert_vectors" => {
                    json!({ "collection": "c", "vectors": [{ "id": 1, "vector": [1.0] }] })
                }
                "search_vectors" => json!({ "collection": "c", "query_vector": [1.0] }),
                "delete_vectors" | "get_vectors" => json!({ "collection": "c", "ids": [1] }),
                _ => json!({}),
            };
            let op = Operation::parse(descriptor.name, &args).unwrap();
            assert_eq!(op.name(), descriptor.name);
        }
    }
}

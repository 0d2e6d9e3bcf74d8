//! Operation catalogue
//!
//! The fixed set of operations the router exposes, each with a declared input
//! schema. The catalogue is plain static data: it renders to JSON Schema for
//! `tools/list` and drives argument validation before anything reaches the
//! store.

use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

/// JSON type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }

    fn conforms(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }
}

/// Element shape of an array parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Items {
    /// Vector components
    Numbers,
    /// Point ids: strings or non-negative integers
    Ids,
    /// `{id, vector, payload?}` records
    Points,
}

impl Items {
    fn schema(&self) -> Value {
        match self {
            Items::Numbers => json!({ "type": "number" }),
            Items::Ids => json!({ "type": ["string", "integer"] }),
            Items::Points => json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": ["string", "integer"],
                        "description": "Unique identifier for the vector"
                    },
                    "vector": {
                        "type": "array",
                        "items": { "type": "number" },
                        "description": "Vector data"
                    },
                    "payload": {
                        "type": "object",
                        "description": "Metadata payload"
                    }
                },
                "required": ["id", "vector"]
            }),
        }
    }

    fn validate(&self, field: &str, items: &[Value]) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            let path = format!("{}[{}]", field, index);
            match self {
                Items::Numbers => {
                    if !item.is_number() {
                        return Err(Error::validation(path, "expected a number"));
                    }
                }
                Items::Ids => validate_id(&path, item)?,
                Items::Points => validate_point(&path, item)?,
            }
        }
        Ok(())
    }
}

fn validate_id(path: &str, value: &Value) -> Result<()> {
    if value.is_string() || value.is_u64() {
        Ok(())
    } else {
        Err(Error::validation(
            path,
            "expected a string or a non-negative integer",
        ))
    }
}

fn validate_point(path: &str, value: &Value) -> Result<()> {
    let Some(point) = value.as_object() else {
        return Err(Error::validation(path, "expected an object"));
    };

    match point.get("id") {
        None | Some(Value::Null) => {
            return Err(Error::validation(format!("{}.id", path), "is required"));
        }
        Some(id) => validate_id(&format!("{}.id", path), id)?,
    }

    match point.get("vector") {
        Some(Value::Array(components)) => {
            Items::Numbers.validate(&format!("{}.vector", path), components)?
        }
        None | Some(Value::Null) => {
            return Err(Error::validation(format!("{}.vector", path), "is required"));
        }
        Some(_) => {
            return Err(Error::validation(
                format!("{}.vector", path),
                "expected an array of numbers",
            ));
        }
    }

    match point.get("payload") {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(Error::validation(
            format!("{}.payload", path),
            "expected an object",
        )),
    }
}

/// Declared default of an optional parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Integer(i64),
    Str(&'static str),
}

impl DefaultValue {
    fn to_json(self) -> Value {
        match self {
            DefaultValue::Integer(i) => json!(i),
            DefaultValue::Str(s) => json!(s),
        }
    }
}

/// One input parameter of an operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<DefaultValue>,
    /// Allowed string values (compared ASCII case-insensitively); empty means any
    pub allowed: &'static [&'static str],
    pub items: Option<Items>,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
            default: None,
            allowed: &[],
            items: None,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamType, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub const fn with_default(self, default: DefaultValue) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub const fn one_of(self, allowed: &'static [&'static str]) -> Self {
        Self { allowed, ..self }
    }

    pub const fn items(self, items: Items) -> Self {
        Self {
            items: Some(items),
            ..self
        }
    }

    pub fn schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.kind.as_str()));
        schema.insert("description".into(), json!(self.description));
        if !self.allowed.is_empty() {
            schema.insert("enum".into(), json!(self.allowed));
        }
        if let Some(default) = self.default {
            schema.insert("default".into(), default.to_json());
        }
        if let Some(items) = self.items {
            schema.insert("items".into(), items.schema());
        }
        Value::Object(schema)
    }

    fn validate(&self, value: Option<&Value>) -> Result<()> {
        let value = match value {
            None | Some(Value::Null) if self.required => {
                return Err(Error::validation(self.name, "is required"));
            }
            None | Some(Value::Null) => return Ok(()),
            Some(value) => value,
        };

        if !self.kind.conforms(value) {
            return Err(Error::validation(
                self.name,
                format!("expected {}", self.kind.as_str()),
            ));
        }

        if !self.allowed.is_empty() {
            let matches = value
                .as_str()
                .is_some_and(|s| self.allowed.iter().any(|a| a.eq_ignore_ascii_case(s)));
            if !matches {
                return Err(Error::validation(
                    self.name,
                    format!("must be one of {}", self.allowed.join(", ")),
                ));
            }
        }

        if let (Some(items), Some(elements)) = (self.items, value.as_array()) {
            items.validate(self.name, elements)?;
        }

        Ok(())
    }
}

/// Name, description and input schema of one operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl OperationDescriptor {
    /// JSON Schema for the operation's arguments object
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|param| (param.name.to_string(), param.schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|param| param.required)
            .map(|param| param.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    /// Check presence and JSON types of declared parameters.
    ///
    /// `null` arguments count as an empty object. Undeclared keys are ignored.
    pub fn validate(&self, arguments: &Value) -> Result<()> {
        let empty = Map::new();
        let arguments = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => return Err(Error::validation("arguments", "expected an object")),
        };

        self.params
            .iter()
            .try_for_each(|param| param.validate(arguments.get(param.name)))
    }
}

pub const LIST_COLLECTIONS: &str = "list_collections";
pub const CREATE_COLLECTION: &str = "create_collection";
pub const DELETE_COLLECTION: &str = "delete_collection";
pub const GET_COLLECTION_INFO: &str = "get_collection_info";
pub const UPSERT_VECTORS: &str = "upsert_vectors";
pub const SEARCH_VECTORS: &str = "search_vectors";
pub const DELETE_VECTORS: &str = "delete_vectors";
pub const GET_VECTORS: &str = "get_vectors";
pub const HEALTH_CHECK: &str = "health_check";

pub const DEFAULT_DISTANCE: &str = "Cosine";
pub const DEFAULT_SEARCH_LIMIT: i64 = 10;
/// Applied only when searching a Cosine or Dot collection
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.0;

const DISTANCES: &[&str] = &["Cosine", "Euclid", "Dot"];

/// Every operation the router accepts, in `tools/list` order
pub static CATALOGUE: &[OperationDescriptor] = &[
    OperationDescriptor {
        name: LIST_COLLECTIONS,
        description: "List all collections in the Qdrant database",
        params: &[],
    },
    OperationDescriptor {
        name: CREATE_COLLECTION,
        description: "Create a new collection in Qdrant",
        params: &[
            ParamSpec::required(
                "name",
                ParamType::String,
                "Name of the collection to create",
            ),
            ParamSpec::required(
                "vector_size",
                ParamType::Integer,
                "Size of the vectors in this collection",
            ),
            ParamSpec::optional(
                "distance",
                ParamType::String,
                "Distance metric for vector similarity",
            )
            .one_of(DISTANCES)
            .with_default(DefaultValue::Str(DEFAULT_DISTANCE)),
        ],
    },
    OperationDescriptor {
        name: DELETE_COLLECTION,
        description: "Delete a collection from Qdrant",
        params: &[ParamSpec::required(
            "name",
            ParamType::String,
            "Name of the collection to delete",
        )],
    },
    OperationDescriptor {
        name: GET_COLLECTION_INFO,
        description: "Get information about a specific collection",
        params: &[ParamSpec::required(
            "name",
            ParamType::String,
            "Name of the collection",
        )],
    },
    OperationDescriptor {
        name: UPSERT_VECTORS,
        description: "Insert or update vectors in a collection",
        params: &[
            ParamSpec::required("collection", ParamType::String, "Name of the collection"),
            ParamSpec::required("vectors", ParamType::Array, "List of vectors to upsert")
                .items(Items::Points),
        ],
    },
    OperationDescriptor {
        name: SEARCH_VECTORS,
        description: "Search for similar vectors in a collection",
        params: &[
            ParamSpec::required(
                "collection",
                ParamType::String,
                "Name of the collection to search",
            ),
            ParamSpec::required(
                "query_vector",
                ParamType::Array,
                "Query vector for similarity search",
            )
            .items(Items::Numbers),
            ParamSpec::optional(
                "limit",
                ParamType::Integer,
                "Maximum number of results to return",
            )
            .with_default(DefaultValue::Integer(DEFAULT_SEARCH_LIMIT)),
            ParamSpec::optional(
                "score_threshold",
                ParamType::Number,
                "Minimum similarity score (Cosine and Dot collections default to 0.0); \
                 for Euclid collections the maximum distance, unbounded when omitted",
            ),
            ParamSpec::optional(
                "filter",
                ParamType::Object,
                "Filter conditions for the search (Qdrant filter syntax: must/should/must_not)",
            ),
        ],
    },
    OperationDescriptor {
        name: DELETE_VECTORS,
        description: "Delete vectors from a collection",
        params: &[
            ParamSpec::required("collection", ParamType::String, "Name of the collection"),
            ParamSpec::required("ids", ParamType::Array, "List of vector IDs to delete")
                .items(Items::Ids),
        ],
    },
    OperationDescriptor {
        name: GET_VECTORS,
        description: "Retrieve vectors by their IDs",
        params: &[
            ParamSpec::required("collection", ParamType::String, "Name of the collection"),
            ParamSpec::required("ids", ParamType::Array, "List of vector IDs to retrieve")
                .items(Items::Ids),
        ],
    },
    OperationDescriptor {
        name: HEALTH_CHECK,
        description: "Check the health status of the Qdrant connection",
        params: &[],
    },
];

/// Find an operation by exact, case-sensitive name
pub fn lookup(name: &str) -> Option<&'static OperationDescriptor> {
    CATALOGUE.iter().find(|descriptor| descriptor.name == name)
}

//! Query persistence
//!
//! Persisted queries are JSON documents with `requests` (ordered, each
//! element carrying its `name`), `outputSet`, `operations` (ordered, tagged
//! with `type`) and `configuration`. A `version` field is written
//! defensively; legacy documents without one load unchanged.
//!
//! Loading reconstructs the document's name allocator by reserving every
//! encountered name, so names allocated afterwards can never collide with
//! loaded ones.

use crate::{Comparison, ElementType, Filter, Query, Request, SetOp, Surround};
use osmql_diagnostics::QlError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

/// Current persisted-document format version.
pub const FORMAT_VERSION: u32 = 1;

/// Errors that can occur while persisting or loading a query
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document content violates a query invariant
    #[error(transparent)]
    Query(#[from] QlError),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(default)]
    requests: Vec<RequestDoc>,
    #[serde(default)]
    output_set: String,
    #[serde(default)]
    operations: Vec<OperationDoc>,
    #[serde(default)]
    configuration: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestDoc {
    name: String,
    #[serde(rename = "type")]
    element_type: ElementType,
    #[serde(default)]
    filters: Vec<FilterDoc>,
    #[serde(default)]
    surrounding: Surround,
    #[serde(default = "default_around_radius")]
    around_radius: u32,
    #[serde(default)]
    polygon: Vec<[f64; 2]>,
    #[serde(default)]
    ids: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    area: Option<i64>,
    #[serde(default)]
    location: String,
}

fn default_around_radius() -> u32 {
    crate::DEFAULT_AROUND_RADIUS
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterDoc {
    keys: Vec<String>,
    comparison: Comparison,
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    negated: bool,
    #[serde(default)]
    exact_value: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OperationDoc {
    name: String,
    #[serde(flatten)]
    op: SetOp,
}

fn query_to_doc(query: &Query) -> QueryDoc {
    QueryDoc {
        version: Some(FORMAT_VERSION),
        requests: query
            .requests()
            .map(|(name, request)| RequestDoc {
                name: name.to_string(),
                element_type: request.element_type(),
                filters: request
                    .filters()
                    .iter()
                    .map(|filter| FilterDoc {
                        keys: filter.keys().to_vec(),
                        comparison: filter.comparison(),
                        values: filter.values().to_vec(),
                        negated: filter.negated(),
                        exact_value: filter.exact_value(),
                    })
                    .collect(),
                surrounding: request.surround(),
                around_radius: request.around_radius(),
                polygon: request.polygon().to_vec(),
                ids: request.ids().to_vec(),
                area: request.area_id(),
                location: request.location_name().to_string(),
            })
            .collect(),
        output_set: query.output_set().to_string(),
        operations: query
            .operations()
            .map(|(name, op)| OperationDoc {
                name: name.to_string(),
                op: op.clone(),
            })
            .collect(),
        configuration: query.settings().clone(),
    }
}

fn doc_to_query(doc: QueryDoc) -> Result<Query, PersistError> {
    let mut query = Query::new();

    for request_doc in doc.requests {
        let mut request = Request::new(request_doc.element_type, request_doc.surrounding);
        if request_doc.around_radius > 0 {
            request.set_around_radius(request_doc.around_radius)?;
        }
        request.set_polygon(request_doc.polygon);
        request.set_ids(request_doc.ids);
        if let Some(area_id) = request_doc.area {
            request.set_area(area_id, request_doc.location);
        }
        for filter_doc in request_doc.filters {
            request.add_filter(Filter::from_parts(
                filter_doc.keys,
                filter_doc.comparison,
                filter_doc.values,
                filter_doc.negated,
                filter_doc.exact_value,
            )?);
        }
        query.add_named_request(request_doc.name, request)?;
    }

    for operation_doc in doc.operations {
        query.add_named_operation(operation_doc.name, operation_doc.op)?;
    }

    for (key, value) in doc.configuration {
        query.set_setting(key, value);
    }

    // Restored verbatim, even when it no longer resolves: a stale output
    // set fails at compile time, where the caller can react.
    query.restore_output_set(doc.output_set);
    Ok(query)
}

/// JSON serializer for query documents
#[derive(Debug, Default, Clone)]
pub struct JsonSerializer {
    /// Whether to produce pretty-printed output
    pub pretty: bool,
}

impl JsonSerializer {
    /// Create a new JSON serializer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new JSON serializer with pretty-printing enabled
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Serialize a query to a string
    pub fn serialize(&self, query: &Query) -> Result<String, PersistError> {
        let doc = query_to_doc(query);
        let json = if self.pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        Ok(json)
    }

    /// Serialize a query to a writer
    pub fn serialize_to_writer<W: Write>(
        &self,
        query: &Query,
        mut writer: W,
    ) -> Result<(), PersistError> {
        let json = self.serialize(query)?;
        writer.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Deserialize a query from a string
    pub fn deserialize(&self, input: &str) -> Result<Query, PersistError> {
        let doc: QueryDoc = serde_json::from_str(input)?;
        doc_to_query(doc)
    }

    /// Deserialize a query from a reader
    pub fn deserialize_from_reader<R: Read>(&self, mut reader: R) -> Result<Query, PersistError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        self.deserialize(&content)
    }
}

/// Save a query to a file, pretty-printed.
pub fn save_query(query: &Query, path: impl AsRef<Path>) -> Result<(), PersistError> {
    let file = std::fs::File::create(path)?;
    JsonSerializer::pretty().serialize_to_writer(query, file)
}

/// Load a query from a file.
pub fn load_query(path: impl AsRef<Path>) -> Result<Query, PersistError> {
    let file = std::fs::File::open(path)?;
    JsonSerializer::new().deserialize_from_reader(file)
}

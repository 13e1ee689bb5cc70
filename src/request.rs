//! JSON request boundary.
//!
//! A [`BuildRequest`] carries path specs as raw JSON values. They are decoded
//! into [`PathSpec`]s in one pass before any build begins, so a malformed
//! request never produces a partial query.
//!
//! Accepted spec shapes:
//!
//! ```text
//! "title"                                  field
//! ["author", "name"]                       path
//! {"desc": <spec>}                         direction-tagged
//! {"field": <spec>, "as": "n",
//!  "function": "upper", ...params}         derived (or "fragment")
//! {"author": [<spec>, ...]}                nested, expanded under author
//! ```
//!
//! `field` is a reserved key. Any object carrying it decodes as a derived
//! entry, so an association named `field` cannot be expanded with the
//! nested form. Spell such paths as arrays instead, e.g. `["field", "name"]`.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::Settings;
use crate::error::BuildError;
use crate::planner::{Accumulator, AggregateSpec, QueryBuilder};
use crate::query::SortDir;
use crate::resolve::{DerivedSpec, Param, PathSpec};
use crate::schema::SchemaGraph;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Failed to parse request: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path spec {spec}: {reason}")]
    InvalidSpec { spec: String, reason: String },

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl RequestError {
    fn invalid(spec: &Value, reason: impl Into<String>) -> Self {
        RequestError::InvalidSpec {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}

/// A complete build request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildRequest {
    /// Root entity type.
    pub entity: String,
    #[serde(default)]
    pub root_alias: Option<String>,
    #[serde(default)]
    pub load_path: Vec<String>,
    #[serde(default)]
    pub select: Vec<Value>,
    #[serde(default)]
    pub group_by: Vec<Value>,
    #[serde(default)]
    pub order_by: Vec<Value>,
    #[serde(default)]
    pub aggregate: Option<AggregateRequest>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregateRequest {
    #[serde(default)]
    pub group_by: Vec<Value>,
    #[serde(default)]
    pub functions: Vec<AggregateEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregateEntry {
    pub function: String,
    pub field: Value,
    #[serde(default, rename = "as")]
    pub alias: Option<String>,
}

/// A request with every spec decoded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedRequest {
    pub select: Vec<PathSpec>,
    pub group_by: Vec<PathSpec>,
    pub order_by: Vec<PathSpec>,
    pub aggregate_group_by: Vec<PathSpec>,
    pub aggregates: Vec<AggregateSpec>,
}

impl BuildRequest {
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn decode(&self) -> Result<DecodedRequest, RequestError> {
        let mut decoded = DecodedRequest {
            select: decode_specs(&self.select)?,
            group_by: decode_specs(&self.group_by)?,
            order_by: decode_specs(&self.order_by)?,
            ..Default::default()
        };

        if let Some(aggregate) = &self.aggregate {
            decoded.aggregate_group_by = decode_specs(&aggregate.group_by)?;
            for entry in &aggregate.functions {
                let path = decode_single(&entry.field)?;
                let mut spec = AggregateSpec::new(entry.function.as_str(), path);
                spec.alias = entry.alias.clone();
                decoded.aggregates.push(spec);
            }
        }

        Ok(decoded)
    }
}

/// Decode a request and run Select, Group, Sort and Aggregate in that order.
pub fn build(
    graph: &dyn SchemaGraph,
    request: &BuildRequest,
    settings: &Settings,
) -> Result<Accumulator, RequestError> {
    let decoded = request.decode()?;

    let mut builder = QueryBuilder::configured(
        graph,
        &request.entity,
        request.root_alias.as_deref(),
        settings,
    )?
    .load_path(request.load_path.iter().cloned())
    .select(&decoded.select)?
    .group_by(&decoded.group_by)
    .order_by(&decoded.order_by);

    if request.aggregate.is_some() {
        builder = builder.aggregate(&decoded.aggregate_group_by, &decoded.aggregates)?;
    }
    if let Some(limit) = request.limit {
        builder = builder.limit(limit);
    }
    if let Some(offset) = request.offset {
        builder = builder.offset(offset);
    }

    Ok(builder.finish())
}

/// Decode a list of specs, flattening nested expansions.
pub fn decode_specs(values: &[Value]) -> Result<Vec<PathSpec>, RequestError> {
    let mut specs = Vec::with_capacity(values.len());
    for value in values {
        specs.extend(decode_spec(value)?);
    }
    Ok(specs)
}

/// Decode one spec value. Nested shapes expand to several specs.
pub fn decode_spec(value: &Value) -> Result<Vec<PathSpec>, RequestError> {
    match value {
        Value::String(name) => Ok(vec![PathSpec::field(name)]),
        Value::Array(items) => {
            let segments = items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(String::from)
                        .ok_or_else(|| {
                            RequestError::invalid(value, "path segments must be strings")
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(vec![PathSpec::Path(segments)])
        }
        Value::Object(map) => decode_object(value, map),
        _ => Err(RequestError::invalid(value, "expected a string, array or object")),
    }
}

fn decode_single(value: &Value) -> Result<PathSpec, RequestError> {
    let mut specs = decode_spec(value)?;
    match specs.len() {
        1 => Ok(specs.remove(0)),
        _ => Err(RequestError::invalid(value, "expected exactly one path")),
    }
}

fn decode_object(value: &Value, map: &Map<String, Value>) -> Result<Vec<PathSpec>, RequestError> {
    if map.contains_key("field") {
        return decode_derived(value, map).map(|spec| vec![spec]);
    }

    let mut entries = map.iter();
    let (key, inner) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(RequestError::invalid(
                value,
                "object specs need a single direction or association key",
            ))
        }
    };

    let dir = match key.as_str() {
        "asc" => Some(SortDir::Asc),
        "desc" => Some(SortDir::Desc),
        _ => None,
    };

    if let Some(dir) = dir {
        let specs = decode_spec(inner)?;
        return Ok(specs
            .into_iter()
            .map(|spec| PathSpec::Directional(dir, Box::new(spec)))
            .collect());
    }

    let children = match inner {
        Value::Array(items) => decode_specs(items)?,
        other => decode_spec(other)?,
    };
    Ok(PathSpec::nested(key, children))
}

fn decode_derived(value: &Value, map: &Map<String, Value>) -> Result<PathSpec, RequestError> {
    let source = decode_single(&map["field"])?;

    let mut derived = match (map.get("function"), map.get("fragment")) {
        (Some(Value::String(name)), None) => DerivedSpec::function(source, name),
        (None, Some(Value::String(template))) => DerivedSpec::fragment(source, template),
        (Some(_), Some(_)) => {
            return Err(RequestError::invalid(
                value,
                "'function' and 'fragment' are mutually exclusive",
            ))
        }
        (None, None) => {
            return Err(RequestError::invalid(
                value,
                "derived specs need a 'function' or 'fragment'",
            ))
        }
        _ => {
            return Err(RequestError::invalid(
                value,
                "'function' and 'fragment' must be strings",
            ))
        }
    };

    match map.get("as") {
        Some(Value::String(alias)) => derived = derived.with_alias(alias),
        Some(_) => return Err(RequestError::invalid(value, "'as' must be a string")),
        None => {}
    }

    for (name, param) in map {
        if matches!(name.as_str(), "field" | "as" | "function" | "fragment") {
            continue;
        }
        derived = derived.with_param(name, decode_param(value, name, param)?);
    }

    Ok(derived.into())
}

fn decode_param(spec: &Value, name: &str, value: &Value) -> Result<Param, RequestError> {
    match value {
        Value::Bool(b) => Ok(Param::Bool(*b)),
        Value::String(s) => Ok(Param::String(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(Param::Int)
            .or_else(|| n.as_f64().map(Param::Float))
            .ok_or_else(|| {
                RequestError::invalid(spec, format!("parameter '{}' is out of range", name))
            }),
        _ => Err(RequestError::invalid(
            spec,
            format!("parameter '{}' must be a number, string or boolean", name),
        )),
    }
}

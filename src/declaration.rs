//! Variable declarations and scoring tables as seen by the evaluator.

use serde::{Deserialize, Serialize};

use crate::geometry::Coords;
use crate::value::{BaseType, Cardinality, Point, Scalar, Value};

/// Role-specific parts of a declaration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum VariableKind {
    #[serde(rename_all = "camelCase")]
    Response {
        #[serde(default)]
        correct_response: Option<Value>,
        #[serde(default)]
        mapping: Option<Mapping>,
        #[serde(default)]
        area_mapping: Option<AreaMapping>,
    },
    #[default]
    Outcome,
    Template,
}

/// A typed state slot of an item or test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub identifier: String,
    #[serde(flatten)]
    pub kind: VariableKind,
    /// `None` only for record cardinality.
    pub base_type: Option<BaseType>,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl Variable {
    pub fn outcome(
        identifier: impl Into<String>,
        base_type: BaseType,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            kind: VariableKind::Outcome,
            base_type: Some(base_type),
            cardinality,
            value: None,
            default_value: None,
        }
    }

    pub fn template(
        identifier: impl Into<String>,
        base_type: BaseType,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            kind: VariableKind::Template,
            ..Self::outcome(identifier, base_type, cardinality)
        }
    }

    pub fn response(
        identifier: impl Into<String>,
        base_type: BaseType,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            kind: VariableKind::Response {
                correct_response: None,
                mapping: None,
                area_mapping: None,
            },
            ..Self::outcome(identifier, base_type, cardinality)
        }
    }

    pub fn record(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: VariableKind::Outcome,
            base_type: None,
            cardinality: Cardinality::Record,
            value: None,
            default_value: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value.normalize();
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = value.normalize();
        self
    }

    /// Only meaningful on response variables; other kinds are returned
    /// unchanged.
    pub fn with_correct_response(mut self, value: Value) -> Self {
        if let VariableKind::Response {
            correct_response, ..
        } = &mut self.kind
        {
            *correct_response = value.normalize();
        }
        self
    }

    pub fn with_mapping(mut self, value: Mapping) -> Self {
        if let VariableKind::Response { mapping, .. } = &mut self.kind {
            *mapping = Some(value);
        }
        self
    }

    pub fn with_area_mapping(mut self, value: AreaMapping) -> Self {
        if let VariableKind::Response { area_mapping, .. } = &mut self.kind {
            *area_mapping = Some(value);
        }
        self
    }

    pub fn is_response(&self) -> bool {
        matches!(self.kind, VariableKind::Response { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref().filter(|v| !v.is_null())
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref().filter(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntry {
    pub map_key: Scalar,
    pub mapped_value: f64,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

impl MapEntry {
    pub fn new(map_key: Scalar, mapped_value: f64) -> Self {
        Self {
            map_key,
            mapped_value,
            case_sensitive: true,
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn matches(&self, candidate: &Scalar) -> bool {
        if !self.case_sensitive {
            if let (Scalar::String(key), Scalar::String(value)) = (&self.map_key, candidate) {
                return key.to_lowercase() == value.to_lowercase();
            }
        }
        &self.map_key == candidate
    }
}

/// Key to value scoring table of a response variable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    #[serde(default)]
    pub lower_bound: Option<f64>,
    #[serde(default)]
    pub upper_bound: Option<f64>,
    #[serde(default)]
    pub default_value: f64,
    pub map_entries: Vec<MapEntry>,
}

impl Mapping {
    pub fn new(map_entries: Vec<MapEntry>) -> Self {
        Self {
            map_entries,
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default_value: f64) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    /// First entry whose key matches the candidate.
    pub fn lookup(&self, candidate: &Scalar) -> Option<(usize, &MapEntry)> {
        self.map_entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.matches(candidate))
    }

    pub fn clamp(&self, value: f64) -> f64 {
        clamp_to_bounds(value, self.lower_bound, self.upper_bound)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaMapEntry {
    pub coords: Coords,
    pub mapped_value: f64,
}

/// Area to value scoring table of a point response variable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaMapping {
    #[serde(default)]
    pub lower_bound: Option<f64>,
    #[serde(default)]
    pub upper_bound: Option<f64>,
    #[serde(default)]
    pub default_value: f64,
    pub area_map_entries: Vec<AreaMapEntry>,
}

impl AreaMapping {
    pub fn new(area_map_entries: Vec<AreaMapEntry>) -> Self {
        Self {
            area_map_entries,
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default_value: f64) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    /// Indexes of every area containing the point.
    pub fn hits(&self, point: Point) -> impl Iterator<Item = usize> + '_ {
        self.area_map_entries
            .iter()
            .enumerate()
            .filter(move |(_, entry)| entry.coords.contains(point))
            .map(|(i, _)| i)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        clamp_to_bounds(value, self.lower_bound, self.upper_bound)
    }
}

fn clamp_to_bounds(value: f64, lower: Option<f64>, upper: Option<f64>) -> f64 {
    let value = lower.map_or(value, |lower| value.max(lower));
    upper.map_or(value, |upper| value.min(upper))
}

fn default_case_sensitive() -> bool {
    true
}

//! Runtime value model.
//!
//! A runtime value is either absent (`None`, QTI's NULL) or a [`Value`]:
//! a bare scalar for single cardinality, or one of the three container shapes.
//! Empty strings and empty containers are NULL as well; [`Value::normalize`]
//! folds them into `None` so evaluators test nullness once.

pub mod container;
pub mod scalar;
pub mod utils;

use serde::{Deserialize, Serialize};

pub use container::{Container, Record, ValueError};
pub use scalar::{BaseType, DirectedPair, FileValue, IntOrIdentifier, Pair, Point, Scalar};
pub use utils::*;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Cardinality {
    Single,
    Multiple,
    Ordered,
    Record,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cardinality", content = "value", rename_all = "camelCase")]
pub enum Value {
    Single(Scalar),
    Multiple(Container),
    Ordered(Container),
    Record(Record),
}

impl Value {
    pub fn boolean(value: bool) -> Self {
        Value::Single(Scalar::Boolean(value))
    }

    pub fn integer(value: i64) -> Self {
        Value::Single(Scalar::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        Value::Single(Scalar::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::Single(Scalar::String(value.into()))
    }

    pub fn identifier(value: impl Into<String>) -> Self {
        Value::Single(Scalar::Identifier(value.into()))
    }

    pub fn point(x: i64, y: i64) -> Self {
        Value::Single(Scalar::Point(Point::new(x, y)))
    }

    pub fn duration(value: std::time::Duration) -> Self {
        Value::Single(Scalar::Duration(value))
    }

    pub fn multiple(
        base_type: BaseType,
        scalars: impl IntoIterator<Item = Scalar>,
    ) -> Result<Self, ValueError> {
        Ok(Value::Multiple(Container::from_scalars(base_type, scalars)?))
    }

    pub fn ordered(
        base_type: BaseType,
        scalars: impl IntoIterator<Item = Scalar>,
    ) -> Result<Self, ValueError> {
        Ok(Value::Ordered(Container::from_scalars(base_type, scalars)?))
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Value::Single(_) => Cardinality::Single,
            Value::Multiple(_) => Cardinality::Multiple,
            Value::Ordered(_) => Cardinality::Ordered,
            Value::Record(_) => Cardinality::Record,
        }
    }

    /// Records carry no baseType.
    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            Value::Single(scalar) => Some(scalar.base_type()),
            Value::Multiple(container) | Value::Ordered(container) => Some(container.base_type()),
            Value::Record(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Single(scalar) => scalar.is_null(),
            Value::Multiple(container) | Value::Ordered(container) => container.is_empty(),
            Value::Record(record) => record.is_empty(),
        }
    }

    /// Collapses every NULL spelling into `None`.
    pub fn normalize(self) -> Option<Value> {
        if self.is_null() { None } else { Some(self) }
    }

    pub fn as_single(&self) -> Option<&Scalar> {
        match self {
            Value::Single(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Value::Multiple(container) | Value::Ordered(container) => Some(container),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Every non-null scalar the value carries, in order. Record fields are
    /// not included.
    pub fn scalars(&self) -> Box<dyn Iterator<Item = &Scalar> + '_> {
        match self {
            Value::Single(scalar) => Box::new(std::iter::once(scalar)),
            Value::Multiple(container) | Value::Ordered(container) => {
                Box::new(container.scalars())
            }
            Value::Record(_) => Box::new(std::iter::empty()),
        }
    }
}

/// Container-aware equality: multiset for multiple, positional for ordered,
/// key set plus per-key values for records, value/component equality for
/// scalars.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Single(a), Value::Single(b)) => a == b,
            (Value::Multiple(a), Value::Multiple(b)) => a.multiset_eq(b),
            (Value::Ordered(a), Value::Ordered(b)) => a.sequence_eq(b),
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Single(scalar)
    }
}

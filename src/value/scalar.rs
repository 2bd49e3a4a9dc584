use core::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scalar kinds a QTI variable or expression result can carry.
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
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum BaseType {
    Boolean,
    Integer,
    Float,
    String,
    Identifier,
    Point,
    Pair,
    DirectedPair,
    Duration,
    Uri,
    File,
    IntOrIdentifier,
}

impl BaseType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, BaseType::Integer | BaseType::Float)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Unordered pair of identifiers: `A B` equals `B A`.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub first: String,
    pub second: String,
}

impl Pair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

impl PartialEq for Pair {
    fn eq(&self, other: &Self) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectedPair {
    pub source: String,
    pub destination: String,
}

impl DirectedPair {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// File contents are compared byte for byte together with their metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValue {
    pub filename: Option<String>,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntOrIdentifier {
    Int(i64),
    Identifier(String),
}

/// An immutable, typed scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "baseType", content = "value", rename_all = "camelCase")]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Identifier(String),
    Point(Point),
    Pair(Pair),
    DirectedPair(DirectedPair),
    Duration(Duration),
    Uri(String),
    File(FileValue),
    IntOrIdentifier(IntOrIdentifier),
}

impl Scalar {
    pub fn base_type(&self) -> BaseType {
        match self {
            Scalar::Boolean(_) => BaseType::Boolean,
            Scalar::Integer(_) => BaseType::Integer,
            Scalar::Float(_) => BaseType::Float,
            Scalar::String(_) => BaseType::String,
            Scalar::Identifier(_) => BaseType::Identifier,
            Scalar::Point(_) => BaseType::Point,
            Scalar::Pair(_) => BaseType::Pair,
            Scalar::DirectedPair(_) => BaseType::DirectedPair,
            Scalar::Duration(_) => BaseType::Duration,
            Scalar::Uri(_) => BaseType::Uri,
            Scalar::File(_) => BaseType::File,
            Scalar::IntOrIdentifier(_) => BaseType::IntOrIdentifier,
        }
    }

    /// Numeric view of integer and float scalars.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Text carried by string-like scalars (string, identifier, uri).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) | Scalar::Identifier(s) | Scalar::Uri(s) => Some(s),
            Scalar::IntOrIdentifier(IntOrIdentifier::Identifier(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Scalar::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Scalar::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// An empty string is the only scalar that counts as null.
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::String(s) if s.is_empty())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::String(s) | Scalar::Identifier(s) | Scalar::Uri(s) => write!(f, "{}", s),
            Scalar::Point(p) => write!(f, "{} {}", p.x, p.y),
            Scalar::Pair(p) => write!(f, "{} {}", p.first, p.second),
            Scalar::DirectedPair(p) => write!(f, "{} {}", p.source, p.destination),
            Scalar::Duration(d) => write!(f, "PT{}S", d.as_secs_f64()),
            Scalar::File(file) => write!(
                f,
                "{} ({} bytes)",
                file.filename.as_deref().unwrap_or("file"),
                file.data.len()
            ),
            Scalar::IntOrIdentifier(IntOrIdentifier::Int(i)) => write!(f, "{}", i),
            Scalar::IntOrIdentifier(IntOrIdentifier::Identifier(s)) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<Point> for Scalar {
    fn from(value: Point) -> Self {
        Scalar::Point(value)
    }
}

impl From<Duration> for Scalar {
    fn from(value: Duration) -> Self {
        Scalar::Duration(value)
    }
}

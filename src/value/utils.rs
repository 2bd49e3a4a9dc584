//! Type classification helpers over possibly-null runtime values.

use super::{BaseType, Cardinality, Value};

/// True when the value is absent, an empty string or an empty container.
pub fn is_null(value: Option<&Value>) -> bool {
    value.is_none_or(Value::is_null)
}

/// The baseType of a runtime value; `None` means unknown (NULL or record).
pub fn infer_base_type(value: Option<&Value>) -> Option<BaseType> {
    value.filter(|v| !v.is_null()).and_then(Value::base_type)
}

/// The cardinality of a runtime value; `None` means unknown (NULL).
pub fn infer_cardinality(value: Option<&Value>) -> Option<Cardinality> {
    value.filter(|v| !v.is_null()).map(Value::cardinality)
}

/// NULL complies with every baseType; records comply with none.
pub fn is_base_type_compliant(base_type: BaseType, value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(v) if v.is_null() => true,
        Some(v) => v.base_type() == Some(base_type),
    }
}

pub fn is_cardinality_compliant(cardinality: Cardinality, value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(v) if v.is_null() => true,
        Some(v) => v.cardinality() == cardinality,
    }
}

/// Value equality over runtime values. NULL is never equal to anything,
/// including another NULL.
pub fn equals(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) if !a.is_null() && !b.is_null() => a == b,
        _ => false,
    }
}

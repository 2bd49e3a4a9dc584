use crate::ast::ExpressionKind;
use crate::eval::error::{EvalError, EvalResult};
use crate::value::{BaseType, Cardinality, Container, Scalar, Value};

/// The evaluated operands of one processor call.
///
/// Every classification predicate is false on an empty collection, and a
/// NULL operand never satisfies a type predicate: an empty container is NULL
/// and therefore carries no usable type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operands {
    values: Vec<Option<Value>>,
}

impl Operands {
    /// Values are normalized on the way in so that NULL has one spelling.
    pub fn new(values: Vec<Option<Value>>) -> Self {
        Self {
            values: values.into_iter().map(|v| v.and_then(Value::normalize)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(|v| v.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Value>> {
        self.values.iter().map(|v| v.as_ref())
    }

    /// Non-null operands only.
    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().flatten()
    }

    pub fn into_values(self) -> Vec<Option<Value>> {
        self.values
    }

    pub fn contains_null(&self) -> bool {
        self.values.iter().any(|v| v.is_none())
    }

    fn all(&self, predicate: impl Fn(&Value) -> bool) -> bool {
        !self.values.is_empty()
            && self
                .values
                .iter()
                .all(|v| v.as_ref().is_some_and(&predicate))
    }

    fn all_base_type(&self, predicate: impl Fn(BaseType) -> bool) -> bool {
        self.all(|v| v.base_type().is_some_and(&predicate))
    }

    pub fn exclusively_single(&self) -> bool {
        self.all(|v| v.cardinality() == Cardinality::Single)
    }

    pub fn exclusively_multiple_or_ordered(&self) -> bool {
        self.all(|v| matches!(v, Value::Multiple(_) | Value::Ordered(_)))
    }

    pub fn exclusively_single_or_multiple(&self) -> bool {
        self.all(|v| matches!(v, Value::Single(_) | Value::Multiple(_)))
    }

    pub fn exclusively_single_or_ordered(&self) -> bool {
        self.all(|v| matches!(v, Value::Single(_) | Value::Ordered(_)))
    }

    pub fn exclusively_ordered(&self) -> bool {
        self.all(|v| v.cardinality() == Cardinality::Ordered)
    }

    pub fn exclusively_record(&self) -> bool {
        self.all(|v| v.cardinality() == Cardinality::Record)
    }

    pub fn exclusively_boolean(&self) -> bool {
        self.all_base_type(|t| t == BaseType::Boolean)
    }

    pub fn exclusively_numeric(&self) -> bool {
        self.all_base_type(|t| t.is_numeric())
    }

    pub fn exclusively_integer(&self) -> bool {
        self.all_base_type(|t| t == BaseType::Integer)
    }

    pub fn exclusively_string(&self) -> bool {
        self.all_base_type(|t| t == BaseType::String)
    }

    pub fn exclusively_duration(&self) -> bool {
        self.all_base_type(|t| t == BaseType::Duration)
    }

    pub fn exclusively_point(&self) -> bool {
        self.all_base_type(|t| t == BaseType::Point)
    }

    /// Records carry no baseType and are compatible with each other, but not
    /// with typed values.
    pub fn same_base_type(&self) -> bool {
        if self.values.is_empty() || self.contains_null() {
            return false;
        }
        let mut base_types = self.present().map(Value::base_type);
        let first = base_types.next().flatten();
        base_types.all(|t| t == first)
    }

    pub fn same_cardinality(&self) -> bool {
        if self.values.is_empty() || self.contains_null() {
            return false;
        }
        let mut cardinalities = self.present().map(Value::cardinality);
        let first = cardinalities.next();
        cardinalities.all(|c| Some(c) == first)
    }

    /// Fails with the operand-shape error of `operator` unless `satisfied`.
    pub fn require(
        &self,
        operator: ExpressionKind,
        satisfied: bool,
        constraint: &str,
    ) -> EvalResult<()> {
        if satisfied {
            Ok(())
        } else {
            Err(EvalError::operand_shape(operator, constraint))
        }
    }

    /// Single scalars of the operands, in order. Call only after
    /// `exclusively_single` held.
    pub fn singles(&self) -> Vec<&Scalar> {
        self.present().filter_map(Value::as_single).collect()
    }

    pub fn single(&self, index: usize) -> Option<&Scalar> {
        self.get(index).and_then(Value::as_single)
    }

    pub fn container(&self, index: usize) -> Option<&Container> {
        self.get(index).and_then(Value::as_container)
    }
}

impl FromIterator<Option<Value>> for Operands {
    fn from_iter<T: IntoIterator<Item = Option<Value>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

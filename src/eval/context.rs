use std::collections::HashMap;

use rand::RngCore;
use tracing::trace;

use crate::ast::{ExpressionKind, FloatOrVariableRef, IntegerOrVariableRef, StringOrVariableRef};
use crate::declaration::Variable;
use crate::eval::error::{EvalError, EvalResult};
use crate::value::{BaseType, Scalar, Value};

/// Read-only variable lookup consumed by the evaluator.
///
/// The evaluator never writes variables; implementations only need shared
/// access for the duration of an evaluation.
pub trait VariableStore {
    fn lookup(&self, identifier: &str) -> Option<&Variable>;

    /// Weight of the item owning `identifier`. Only test-scope stores return
    /// weights; item-scope stores keep the default.
    fn weight(&self, _identifier: &str, _weight_identifier: &str) -> Option<f64> {
        None
    }
}

/// Variables of a single item session.
#[derive(Debug, Clone, Default)]
pub struct ItemState {
    variables: HashMap<String, Variable>,
}

impl ItemState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: Variable) {
        self.variables.insert(variable.identifier.clone(), variable);
    }

    pub fn with(mut self, variable: Variable) -> Self {
        self.insert(variable);
        self
    }
}

impl FromIterator<Variable> for ItemState {
    fn from_iter<T: IntoIterator<Item = Variable>>(iter: T) -> Self {
        let mut state = Self::new();
        for variable in iter {
            state.insert(variable);
        }
        state
    }
}

impl VariableStore for ItemState {
    fn lookup(&self, identifier: &str) -> Option<&Variable> {
        self.variables.get(identifier)
    }
}

/// Test-scope variables. Item variables are addressed as `ITEM.VARIABLE`,
/// test-level ones by their bare identifier.
#[derive(Debug, Clone, Default)]
pub struct TestState {
    variables: HashMap<String, Variable>,
    weights: HashMap<String, HashMap<String, f64>>,
}

impl TestState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: Variable) {
        self.variables.insert(variable.identifier.clone(), variable);
    }

    /// Registers `variable` under `item.identifier`.
    pub fn insert_item_variable(&mut self, item: &str, mut variable: Variable) {
        variable.identifier = format!("{}.{}", item, variable.identifier);
        self.insert(variable);
    }

    pub fn set_weight(&mut self, item: &str, weight_identifier: &str, weight: f64) {
        self.weights
            .entry(item.to_string())
            .or_default()
            .insert(weight_identifier.to_string(), weight);
    }
}

impl VariableStore for TestState {
    fn lookup(&self, identifier: &str) -> Option<&Variable> {
        self.variables.get(identifier)
    }

    fn weight(&self, identifier: &str, weight_identifier: &str) -> Option<f64> {
        let (item, _) = identifier.split_once('.')?;
        self.weights.get(item)?.get(weight_identifier).copied()
    }
}

/// What a processor may consult besides its operands: the variable store and
/// the injected random source.
pub struct EvaluationContext<'a> {
    pub store: &'a dyn VariableStore,
    pub rng: &'a mut dyn RngCore,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(store: &'a dyn VariableStore, rng: &'a mut dyn RngCore) -> Self {
        Self { store, rng }
    }

    pub fn lookup(&self, identifier: &str) -> Option<&'a Variable> {
        self.store.lookup(identifier)
    }

    /// Looks up a referenced variable and returns its single scalar value.
    fn resolve_reference(&self, operator: ExpressionKind, identifier: &str) -> EvalResult<&'a Scalar> {
        let variable = self
            .lookup(identifier)
            .ok_or_else(|| EvalError::nonexistent_variable(operator, identifier))?;
        match variable.value() {
            Some(Value::Single(scalar)) => {
                trace!(%operator, identifier, value = %scalar, "resolved variable reference");
                Ok(scalar)
            }
            Some(_) => Err(EvalError::WrongVariableType {
                operator,
                identifier: identifier.to_string(),
                expected: "single cardinality".to_string(),
            }),
            None => Err(EvalError::inconsistent_variable(
                operator,
                identifier,
                "the referenced value is NULL",
            )),
        }
    }

    pub fn resolve_integer(
        &self,
        operator: ExpressionKind,
        attribute: &IntegerOrVariableRef,
    ) -> EvalResult<i64> {
        match attribute {
            IntegerOrVariableRef::Integer(value) => Ok(*value),
            IntegerOrVariableRef::VariableRef(identifier) => {
                let scalar = self.resolve_reference(operator, identifier)?;
                scalar
                    .as_i64()
                    .ok_or_else(|| wrong_reference_base_type(operator, identifier, BaseType::Integer))
            }
        }
    }

    /// Integer references are accepted where a float is expected.
    pub fn resolve_float(
        &self,
        operator: ExpressionKind,
        attribute: &FloatOrVariableRef,
    ) -> EvalResult<f64> {
        match attribute {
            FloatOrVariableRef::Float(value) => Ok(*value),
            FloatOrVariableRef::VariableRef(identifier) => {
                let scalar = self.resolve_reference(operator, identifier)?;
                scalar
                    .as_f64()
                    .ok_or_else(|| wrong_reference_base_type(operator, identifier, BaseType::Float))
            }
        }
    }

    pub fn resolve_string(
        &self,
        operator: ExpressionKind,
        attribute: &StringOrVariableRef,
    ) -> EvalResult<String> {
        match attribute {
            StringOrVariableRef::String(value) => Ok(value.clone()),
            StringOrVariableRef::VariableRef(identifier) => {
                let scalar = self.resolve_reference(operator, identifier)?;
                match scalar {
                    Scalar::String(s) => Ok(s.clone()),
                    _ => Err(wrong_reference_base_type(operator, identifier, BaseType::String)),
                }
            }
        }
    }
}

fn wrong_reference_base_type(
    operator: ExpressionKind,
    identifier: &str,
    expected: BaseType,
) -> EvalError {
    EvalError::WrongVariableBaseType {
        operator,
        identifier: identifier.to_string(),
        message: format!("must have baseType {} to be referenced", expected),
    }
}

#![allow(dead_code)]

use qti_expr::{
    BaseType, EngineConfig, Evaluator, Expression, IntegerOrVariableRef, ItemState,
    Scalar, Value,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub const SEED: u64 = 20240917;

pub fn evaluator(store: &ItemState) -> Evaluator<'_> {
    Evaluator::with_config(store, &EngineConfig::default().with_seed(SEED))
}

pub fn int(value: i64) -> Expression {
    Expression::base_value(value)
}

pub fn float(value: f64) -> Expression {
    Expression::base_value(value)
}

pub fn boolean(value: bool) -> Expression {
    Expression::base_value(value)
}

pub fn identifier(value: &str) -> Expression {
    Expression::BaseValue(Scalar::Identifier(value.to_string()))
}

pub fn string(value: &str) -> Expression {
    Expression::BaseValue(Scalar::String(value.to_string()))
}

pub fn literal(value: i64) -> IntegerOrVariableRef {
    IntegerOrVariableRef::Integer(value)
}

pub fn identifiers(names: &[&str]) -> Vec<Scalar> {
    names.iter().map(|n| Scalar::Identifier(n.to_string())).collect()
}

pub fn multiple_of(names: &[&str]) -> Value {
    Value::multiple(BaseType::Identifier, identifiers(names)).unwrap()
}

pub fn ordered_of(names: &[&str]) -> Value {
    Value::ordered(BaseType::Identifier, identifiers(names)).unwrap()
}

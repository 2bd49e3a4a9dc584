//! Leaves that read the variable store: variable, correct, default,
//! mapResponse and mapResponsePoint.

use std::collections::HashSet;

use tracing::trace;

use crate::ast::ExpressionKind;
use crate::declaration::{Variable, VariableKind};
use crate::eval::context::EvaluationContext;
use crate::eval::error::{EvalError, EvalResult};
use crate::value::{BaseType, Scalar, Value};

/// The current value, multiplied by the item weight when one applies.
///
/// Weights only exist in test scope and only touch integer or float values;
/// a weighted value is always a float.
pub fn variable(
    ctx: &EvaluationContext<'_>,
    identifier: &str,
    weight_identifier: Option<&str>,
) -> EvalResult<Option<Value>> {
    let Some(value) = ctx.lookup(identifier).and_then(Variable::value) else {
        return Ok(None);
    };
    let weight = weight_identifier.and_then(|w| ctx.store.weight(identifier, w));
    match (weight, value.base_type()) {
        (Some(weight), Some(base_type)) if base_type.is_numeric() => {
            trace!(identifier, weight, "applying item weight");
            Ok(Some(apply_weight(value, weight)))
        }
        _ => Ok(Some(value.clone())),
    }
}

fn apply_weight(value: &Value, weight: f64) -> Value {
    let weigh = |scalar: &Scalar| Scalar::Float(scalar.as_f64().unwrap_or_default() * weight);
    match value {
        Value::Single(scalar) => Value::Single(weigh(scalar)),
        Value::Multiple(container) => Value::Multiple(container.map_items(BaseType::Float, weigh)),
        Value::Ordered(container) => Value::Ordered(container.map_items(BaseType::Float, weigh)),
        Value::Record(_) => value.clone(),
    }
}

pub fn correct(ctx: &EvaluationContext<'_>, identifier: &str) -> EvalResult<Option<Value>> {
    let Some(variable) = ctx.lookup(identifier) else {
        return Ok(None);
    };
    match &variable.kind {
        VariableKind::Response {
            correct_response, ..
        } => Ok(correct_response.clone().and_then(Value::normalize)),
        _ => Err(not_a_response(ExpressionKind::Correct, identifier)),
    }
}

pub fn default(ctx: &EvaluationContext<'_>, identifier: &str) -> EvalResult<Option<Value>> {
    Ok(ctx
        .lookup(identifier)
        .and_then(Variable::default_value)
        .cloned())
}

fn not_a_response(operator: ExpressionKind, identifier: &str) -> EvalError {
    EvalError::WrongVariableType {
        operator,
        identifier: identifier.to_string(),
        expected: "response".to_string(),
    }
}

fn response_variable<'a>(
    ctx: &EvaluationContext<'a>,
    operator: ExpressionKind,
    identifier: &str,
) -> EvalResult<&'a Variable> {
    let variable = ctx
        .lookup(identifier)
        .ok_or_else(|| EvalError::nonexistent_variable(operator, identifier))?;
    if !variable.is_response() {
        return Err(not_a_response(operator, identifier));
    }
    Ok(variable)
}

/// Scores the response through its mapping. Each map entry contributes at
/// most once however often its key occurs; elements without an entry
/// contribute the mapping default. A response matching nothing scores the
/// default, otherwise the total is clamped to the mapping bounds.
pub fn map_response(ctx: &EvaluationContext<'_>, identifier: &str) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::MapResponse;
    let variable = response_variable(ctx, kind, identifier)?;
    let VariableKind::Response {
        mapping: Some(mapping),
        ..
    } = &variable.kind
    else {
        return Err(EvalError::inconsistent_variable(kind, identifier, "no mapping is declared"));
    };

    let Some(value) = variable.value() else {
        return Ok(Some(Value::float(mapping.default_value)));
    };

    let mut matched = HashSet::new();
    let mut total = 0.0;
    for scalar in value.scalars() {
        match mapping.lookup(scalar) {
            Some((index, entry)) => {
                if matched.insert(index) {
                    total += entry.mapped_value;
                }
            }
            None => total += mapping.default_value,
        }
    }
    trace!(identifier, matched = matched.len(), total, "mapped response");

    if matched.is_empty() {
        return Ok(Some(Value::float(mapping.default_value)));
    }
    Ok(Some(Value::float(mapping.clamp(total))))
}

/// Scores point responses through the area mapping, each area counted at
/// most once.
pub fn map_response_point(
    ctx: &EvaluationContext<'_>,
    identifier: &str,
) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::MapResponsePoint;
    let variable = response_variable(ctx, kind, identifier)?;
    if variable.base_type != Some(BaseType::Point) {
        return Err(EvalError::WrongVariableBaseType {
            operator: kind,
            identifier: identifier.to_string(),
            message: "must have baseType point".to_string(),
        });
    }
    let VariableKind::Response {
        area_mapping: Some(area_mapping),
        ..
    } = &variable.kind
    else {
        return Err(EvalError::inconsistent_variable(
            kind,
            identifier,
            "no areaMapping is declared",
        ));
    };

    let Some(value) = variable.value() else {
        return Ok(Some(Value::float(area_mapping.default_value)));
    };

    let hits: HashSet<usize> = value
        .scalars()
        .filter_map(Scalar::as_point)
        .flat_map(|point| area_mapping.hits(point))
        .collect();
    if hits.is_empty() {
        return Ok(Some(Value::float(area_mapping.default_value)));
    }
    let total = hits
        .iter()
        .map(|i| area_mapping.area_map_entries[*i].mapped_value)
        .sum();
    Ok(Some(Value::float(area_mapping.clamp(total))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{AreaMapEntry, AreaMapping, MapEntry, Mapping};
    use crate::eval::context::{ItemState, TestState};
    use crate::geometry::{Coords, Shape};
    use crate::value::{Cardinality, Point};
    use pretty_assertions::assert_eq;
    use rand::{SeedableRng, rngs::StdRng};

    fn id(name: &str) -> Scalar {
        Scalar::Identifier(name.to_string())
    }

    fn choice_mapping() -> Mapping {
        Mapping::new(vec![MapEntry::new(id("A"), 1.0), MapEntry::new(id("B"), 0.5)])
            .with_default(-0.25)
            .with_bounds(Some(0.0), Some(1.25))
    }

    fn store_with(response: Value) -> ItemState {
        ItemState::new().with(
            Variable::response("RESPONSE", BaseType::Identifier, Cardinality::Multiple)
                .with_mapping(choice_mapping())
                .with_value(response),
        )
    }

    fn evaluate_map_response(store: &ItemState) -> EvalResult<Option<Value>> {
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = EvaluationContext::new(store, &mut rng);
        map_response(&ctx, "RESPONSE")
    }

    #[test]
    fn test_map_response_counts_entries_once() {
        let store = store_with(Value::multiple(BaseType::Identifier, vec![id("A"), id("A")]).unwrap());
        assert_eq!(evaluate_map_response(&store), Ok(Some(Value::float(1.0))));
    }

    #[test]
    fn test_map_response_clamps() {
        let store = store_with(Value::multiple(BaseType::Identifier, vec![id("A"), id("B")]).unwrap());
        assert_eq!(evaluate_map_response(&store), Ok(Some(Value::float(1.25))));
    }

    #[test]
    fn test_map_response_without_match_is_default() {
        let store = store_with(Value::multiple(BaseType::Identifier, vec![id("Z")]).unwrap());
        assert_eq!(evaluate_map_response(&store), Ok(Some(Value::float(-0.25))));
    }

    #[test]
    fn test_map_response_errors() {
        let store = ItemState::new()
            .with(Variable::response("PLAIN", BaseType::Identifier, Cardinality::Single))
            .with(Variable::outcome("SCORE", BaseType::Float, Cardinality::Single));
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = EvaluationContext::new(&store, &mut rng);

        assert!(matches!(
            map_response(&ctx, "PLAIN"),
            Err(EvalError::InconsistentVariable { .. })
        ));
        assert!(matches!(
            map_response(&ctx, "SCORE"),
            Err(EvalError::WrongVariableType { .. })
        ));
        assert!(matches!(
            map_response(&ctx, "MISSING"),
            Err(EvalError::NonexistentVariable { .. })
        ));
        assert!(matches!(
            correct(&ctx, "SCORE"),
            Err(EvalError::WrongVariableType { .. })
        ));
        assert_eq!(correct(&ctx, "MISSING"), Ok(None));
        assert_eq!(variable(&ctx, "MISSING", None), Ok(None));
    }

    #[test]
    fn test_map_response_point_counts_areas_once() {
        let area = |x0, y0, x1, y1, value| AreaMapEntry {
            coords: Coords::new(Shape::Rect, vec![x0, y0, x1, y1]).unwrap(),
            mapped_value: value,
        };
        let area_mapping = AreaMapping::new(vec![area(0, 0, 10, 10, 1.0), area(20, 20, 30, 30, 2.0)])
            .with_default(0.0);
        let points = Value::multiple(
            BaseType::Point,
            vec![
                Scalar::Point(Point::new(1, 1)),
                Scalar::Point(Point::new(2, 2)),
                Scalar::Point(Point::new(25, 25)),
            ],
        )
        .unwrap();
        let store = ItemState::new().with(
            Variable::response("POINTS", BaseType::Point, Cardinality::Multiple)
                .with_area_mapping(area_mapping)
                .with_value(points),
        );
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = EvaluationContext::new(&store, &mut rng);
        assert_eq!(map_response_point(&ctx, "POINTS"), Ok(Some(Value::float(3.0))));
    }

    #[test]
    fn test_weighted_variable() {
        let mut store = TestState::new();
        store.insert_item_variable(
            "Q01",
            Variable::outcome("SCORE", BaseType::Integer, Cardinality::Single)
                .with_value(Value::integer(3)),
        );
        store.set_weight("Q01", "W", 0.5);
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = EvaluationContext::new(&store, &mut rng);

        assert_eq!(variable(&ctx, "Q01.SCORE", Some("W")), Ok(Some(Value::float(1.5))));
        assert_eq!(variable(&ctx, "Q01.SCORE", None), Ok(Some(Value::integer(3))));
        assert_eq!(variable(&ctx, "Q01.SCORE", Some("OTHER")), Ok(Some(Value::integer(3))));
    }

    #[test]
    fn test_weight_applies_elementwise() {
        let mut store = TestState::new();
        store.insert_item_variable(
            "Q01",
            Variable::outcome("PARTS", BaseType::Integer, Cardinality::Multiple).with_value(
                Value::multiple(BaseType::Integer, vec![Scalar::Integer(1), Scalar::Integer(4)]).unwrap(),
            ),
        );
        store.insert_item_variable(
            "Q01",
            Variable::outcome("STEPS", BaseType::Float, Cardinality::Ordered).with_value(
                Value::ordered(BaseType::Float, vec![Scalar::Float(2.0), Scalar::Float(0.5)]).unwrap(),
            ),
        );
        store.set_weight("Q01", "W", 2.0);
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = EvaluationContext::new(&store, &mut rng);

        assert_eq!(
            variable(&ctx, "Q01.PARTS", Some("W")),
            Ok(Some(
                Value::multiple(BaseType::Float, vec![Scalar::Float(2.0), Scalar::Float(8.0)]).unwrap()
            ))
        );
        assert_eq!(
            variable(&ctx, "Q01.STEPS", Some("W")),
            Ok(Some(
                Value::ordered(BaseType::Float, vec![Scalar::Float(4.0), Scalar::Float(1.0)]).unwrap()
            ))
        );
    }

    #[test]
    fn test_weight_skips_non_numeric_values() {
        let mut store = TestState::new();
        store.insert_item_variable(
            "Q01",
            Variable::outcome("GRADE", BaseType::Identifier, Cardinality::Single)
                .with_value(Value::identifier("PASS")),
        );
        store.set_weight("Q01", "W", 2.0);
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = EvaluationContext::new(&store, &mut rng);

        assert_eq!(
            variable(&ctx, "Q01.GRADE", Some("W")),
            Ok(Some(Value::identifier("PASS")))
        );
    }

    #[test]
    fn test_correct_and_default() {
        let store = ItemState::new().with(
            Variable::response("RESPONSE", BaseType::Identifier, Cardinality::Single)
                .with_correct_response(Value::identifier("A"))
                .with_default(Value::identifier("B")),
        );
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = EvaluationContext::new(&store, &mut rng);
        assert_eq!(correct(&ctx, "RESPONSE"), Ok(Some(Value::identifier("A"))));
        assert_eq!(default(&ctx, "RESPONSE"), Ok(Some(Value::identifier("B"))));
    }
}

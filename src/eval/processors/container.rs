//! Container algebra, plus the record and geometry projections.

use rand::Rng;

use crate::ast::{ExpressionKind, IntegerOrVariableRef};
use crate::eval::context::EvaluationContext;
use crate::eval::error::{EvalError, EvalResult};
use crate::eval::operands::Operands;
use crate::geometry::Coords;
use crate::value::{Container, Scalar, Value};

const CONTAINER: &str = "of multiple or ordered cardinality";

/// Shared by multiple, ordered and repeat: NULL contributors are skipped and
/// the result is NULL only when nothing else is left.
fn gather(operator: ExpressionKind, operands: &Operands, ordered: bool) -> EvalResult<Option<Value>> {
    let present: Operands = operands.present().cloned().map(Some).collect();
    if present.is_empty() {
        return Ok(None);
    }
    let (shape_ok, constraint) = if ordered {
        (present.exclusively_single_or_ordered(), "of single or ordered cardinality")
    } else {
        (present.exclusively_single_or_multiple(), "of single or multiple cardinality")
    };
    present.require(operator, shape_ok, constraint)?;
    present.require(operator, present.same_base_type(), "of the same baseType")?;

    let Some(base_type) = present.get(0).and_then(Value::base_type) else {
        return Err(EvalError::operand_shape(operator, constraint));
    };
    let mut result = Container::empty(base_type);
    for value in present.present() {
        let items: Vec<Option<Scalar>> = match value {
            Value::Single(scalar) => vec![Some(scalar.clone())],
            other => other.as_container().map(|c| c.items().to_vec()).unwrap_or_default(),
        };
        for item in items {
            result
                .push(item)
                .map_err(|e| EvalError::from_value(operator, e))?;
        }
    }
    let value = if ordered {
        Value::Ordered(result)
    } else {
        Value::Multiple(result)
    };
    Ok(value.normalize())
}

pub fn multiple(operands: &Operands) -> EvalResult<Option<Value>> {
    gather(ExpressionKind::Multiple, operands, false)
}

pub fn ordered(operands: &Operands) -> EvalResult<Option<Value>> {
    gather(ExpressionKind::Ordered, operands, true)
}

/// Resolves numberRepeats; the evaluator then runs the children that many
/// times and hands every result to [`repeat`].
pub fn repeat_count(
    ctx: &EvaluationContext<'_>,
    number_repeats: &IntegerOrVariableRef,
) -> EvalResult<i64> {
    ctx.resolve_integer(ExpressionKind::Repeat, number_repeats)
}

pub fn repeat(results: &Operands) -> EvalResult<Option<Value>> {
    gather(ExpressionKind::Repeat, results, true)
}

/// NULL has size 0.
pub fn container_size(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::ContainerSize;
    if operands.contains_null() {
        return Ok(Some(Value::integer(0)));
    }
    operands.require(kind, operands.exclusively_multiple_or_ordered(), CONTAINER)?;
    let size = operands.container(0).map_or(0, Container::len);
    Ok(Some(Value::integer(size as i64)))
}

pub fn is_null(operands: &Operands) -> EvalResult<Option<Value>> {
    Ok(Some(Value::boolean(operands.contains_null())))
}

/// Checks the single/container pair taken by delete and member.
fn single_and_container<'o>(
    operator: ExpressionKind,
    operands: &'o Operands,
) -> EvalResult<(&'o Scalar, &'o Value)> {
    const CONSTRAINT: &str =
        "of the same baseType, the first of single and the second of multiple or ordered cardinality";
    let (Some(Value::Single(scalar)), Some(container @ (Value::Multiple(_) | Value::Ordered(_)))) =
        (operands.get(0), operands.get(1))
    else {
        return Err(EvalError::operand_shape(operator, CONSTRAINT));
    };
    operands.require(operator, operands.same_base_type(), CONSTRAINT)?;
    Ok((scalar, container))
}

/// Removes every occurrence of the first operand from the second, keeping
/// its cardinality.
pub fn delete(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Delete;
    if operands.contains_null() {
        return Ok(None);
    }
    let (scalar, value) = single_and_container(kind, operands)?;
    let Some(container) = value.as_container() else {
        return Err(EvalError::operand_shape(kind, CONTAINER));
    };
    let kept = container
        .items()
        .iter()
        .filter(|item| item.as_ref() != Some(scalar))
        .cloned()
        .collect();
    let kept = Container::new(container.base_type(), kept).map_err(|e| EvalError::from_value(kind, e))?;
    let result = match value {
        Value::Ordered(_) => Value::Ordered(kept),
        _ => Value::Multiple(kept),
    };
    Ok(result.normalize())
}

pub fn member(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Member;
    if operands.contains_null() {
        return Ok(None);
    }
    let (scalar, value) = single_and_container(kind, operands)?;
    let found = value.as_container().is_some_and(|c| c.contains(scalar));
    Ok(Some(Value::boolean(found)))
}

/// Multiset inclusion for multiple containers, contiguous subsequence for
/// ordered ones.
pub fn contains(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Contains;
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(
        kind,
        operands.exclusively_multiple_or_ordered()
            && operands.same_cardinality()
            && operands.same_base_type(),
        "of the same baseType and the same multiple or ordered cardinality",
    )?;
    let found = match (operands.get(0), operands.get(1)) {
        (Some(Value::Multiple(haystack)), Some(Value::Multiple(needle))) => {
            haystack.includes_multiset(needle)
        }
        (Some(Value::Ordered(haystack)), Some(Value::Ordered(needle))) => {
            haystack.includes_sequence(needle)
        }
        _ => return Err(EvalError::operand_shape(kind, CONTAINER)),
    };
    Ok(Some(Value::boolean(found)))
}

/// 1-based lookup into an ordered container. Past the end is NULL, below 1
/// is an error.
pub fn index(
    ctx: &EvaluationContext<'_>,
    operands: &Operands,
    n: &IntegerOrVariableRef,
) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Index;
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(kind, operands.exclusively_ordered(), "of ordered cardinality")?;
    let n = ctx.resolve_integer(kind, n)?;
    if n < 1 {
        return Err(EvalError::logic(kind, format!("n must be 1 or greater, found {}", n)));
    }
    let element = usize::try_from(n - 1)
        .ok()
        .and_then(|i| operands.container(0).and_then(|c| c.get(i)));
    Ok(element.cloned().map(Value::Single))
}

/// Picks one element uniformly from the injected random source.
pub fn random(ctx: &mut EvaluationContext<'_>, operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Random;
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(kind, operands.exclusively_multiple_or_ordered(), CONTAINER)?;
    let Some(container) = operands.container(0) else {
        return Err(EvalError::operand_shape(kind, CONTAINER));
    };
    let picked = ctx.rng.gen_range(0..container.len());
    Ok(container.get(picked).cloned().map(Value::Single))
}

pub fn field_value(operands: &Operands, field_identifier: &str) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::FieldValue;
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(kind, operands.exclusively_record(), "of record cardinality")?;
    let field = operands
        .get(0)
        .and_then(Value::as_record)
        .and_then(|record| record.get(field_identifier));
    Ok(field.cloned().map(Value::Single).and_then(Value::normalize))
}

/// True when any point of the operand lies in the area.
pub fn inside(operands: &Operands, coords: &Coords) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Inside;
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(
        kind,
        operands.exclusively_point(),
        "of baseType point",
    )?;
    let hit = operands
        .present()
        .flat_map(Value::scalars)
        .filter_map(Scalar::as_point)
        .any(|point| coords.contains(point));
    Ok(Some(Value::boolean(hit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::context::ItemState;
    use crate::geometry::Shape;
    use crate::value::{BaseType, Point, Record};
    use pretty_assertions::assert_eq;
    use rand::{SeedableRng, rngs::StdRng};

    fn ids(names: &[&str]) -> Vec<Scalar> {
        names.iter().map(|n| Scalar::Identifier(n.to_string())).collect()
    }

    fn multiple_of(names: &[&str]) -> Value {
        Value::multiple(BaseType::Identifier, ids(names)).unwrap()
    }

    fn ordered_of(names: &[&str]) -> Value {
        Value::ordered(BaseType::Identifier, ids(names)).unwrap()
    }

    fn operands(values: Vec<Option<Value>>) -> Operands {
        Operands::new(values)
    }

    #[test]
    fn test_multiple_skips_nulls() {
        let result = multiple(&operands(vec![
            Some(Value::identifier("A")),
            None,
            Some(multiple_of(&["B", "C"])),
        ]));
        assert_eq!(result, Ok(Some(multiple_of(&["C", "B", "A"]))));
        assert_eq!(multiple(&operands(vec![None, None])), Ok(None));
        assert_eq!(multiple(&Operands::default()), Ok(None));
    }

    #[test]
    fn test_multiple_rejects_mixed_base_types() {
        let result = multiple(&operands(vec![Some(Value::identifier("A")), Some(Value::integer(1))]));
        assert!(matches!(result, Err(EvalError::OperandShape { .. })));
        let result = multiple(&operands(vec![Some(ordered_of(&["A"]))]));
        assert!(matches!(result, Err(EvalError::OperandShape { .. })));
    }

    #[test]
    fn test_ordered_keeps_order() {
        let result = ordered(&operands(vec![
            Some(Value::identifier("B")),
            Some(ordered_of(&["A", "C"])),
        ]));
        assert_eq!(result, Ok(Some(ordered_of(&["B", "A", "C"]))));
    }

    #[test]
    fn test_container_size_and_is_null() {
        assert_eq!(
            container_size(&operands(vec![None])),
            Ok(Some(Value::integer(0)))
        );
        assert_eq!(
            container_size(&operands(vec![Some(multiple_of(&["A", "A"]))])),
            Ok(Some(Value::integer(2)))
        );
        assert_eq!(is_null(&operands(vec![Some(Value::string(""))])), Ok(Some(Value::boolean(true))));
        assert_eq!(is_null(&operands(vec![Some(Value::integer(0))])), Ok(Some(Value::boolean(false))));
    }

    #[test]
    fn test_delete_every_occurrence() {
        let result = delete(&operands(vec![
            Some(Value::identifier("A")),
            Some(ordered_of(&["A", "B", "A"])),
        ]));
        assert_eq!(result, Ok(Some(ordered_of(&["B"]))));

        let emptied = delete(&operands(vec![
            Some(Value::identifier("A")),
            Some(ordered_of(&["A", "A"])),
        ]));
        assert_eq!(emptied, Ok(None));
    }

    #[test]
    fn test_member() {
        let result = member(&operands(vec![
            Some(Value::identifier("B")),
            Some(multiple_of(&["A", "B"])),
        ]));
        assert_eq!(result, Ok(Some(Value::boolean(true))));

        let mismatch = member(&operands(vec![Some(Value::integer(1)), Some(multiple_of(&["A"]))]));
        assert!(matches!(mismatch, Err(EvalError::OperandShape { .. })));
    }

    #[test]
    fn test_contains() {
        let bag = contains(&operands(vec![
            Some(multiple_of(&["A", "B", "C"])),
            Some(multiple_of(&["C", "A"])),
        ]));
        assert_eq!(bag, Ok(Some(Value::boolean(true))));

        let sequence = contains(&operands(vec![
            Some(ordered_of(&["A", "B", "C"])),
            Some(ordered_of(&["C", "A"])),
        ]));
        assert_eq!(sequence, Ok(Some(Value::boolean(false))));

        let run = contains(&operands(vec![
            Some(ordered_of(&["A", "B", "C"])),
            Some(ordered_of(&["B", "C"])),
        ]));
        assert_eq!(run, Ok(Some(Value::boolean(true))));

        let duplicates = contains(&operands(vec![
            Some(multiple_of(&["A", "B"])),
            Some(multiple_of(&["A", "A"])),
        ]));
        assert_eq!(duplicates, Ok(Some(Value::boolean(false))));
    }

    #[test]
    fn test_index() {
        let store = ItemState::new();
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = EvaluationContext::new(&store, &mut rng);
        let list = operands(vec![Some(Value::ordered(
            BaseType::String,
            vec![Scalar::String("a".into()), Scalar::String("b".into())],
        ).unwrap())]);

        assert_eq!(
            index(&ctx, &list, &IntegerOrVariableRef::Integer(2)),
            Ok(Some(Value::string("b")))
        );
        assert_eq!(index(&ctx, &list, &IntegerOrVariableRef::Integer(3)), Ok(None));
        assert!(matches!(
            index(&ctx, &list, &IntegerOrVariableRef::Integer(0)),
            Err(EvalError::Logic { .. })
        ));
    }

    #[test]
    fn test_random_picks_an_element() {
        let store = ItemState::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut ctx = EvaluationContext::new(&store, &mut rng);
        let bag = operands(vec![Some(multiple_of(&["A", "B", "C"]))]);
        for _ in 0..20 {
            let picked = random(&mut ctx, &bag).unwrap().unwrap();
            assert!(["A", "B", "C"].iter().any(|n| picked == Value::identifier(*n)));
        }
    }

    #[test]
    fn test_field_value() {
        let record = Value::Record(
            Record::new()
                .with_field("score", Some(Scalar::Float(2.5)))
                .with_field("empty", Some(Scalar::String(String::new()))),
        );
        let operand = operands(vec![Some(record)]);
        assert_eq!(field_value(&operand, "score"), Ok(Some(Value::float(2.5))));
        assert_eq!(field_value(&operand, "empty"), Ok(None));
        assert_eq!(field_value(&operand, "missing"), Ok(None));
    }

    #[test]
    fn test_inside() {
        let square = Coords::new(Shape::Rect, vec![0, 0, 10, 10]).unwrap();
        let points = Value::multiple(
            BaseType::Point,
            vec![Scalar::Point(Point::new(20, 20)), Scalar::Point(Point::new(5, 5))],
        )
        .unwrap();
        assert_eq!(inside(&operands(vec![Some(points)]), &square), Ok(Some(Value::boolean(true))));
        assert_eq!(
            inside(&operands(vec![Some(Value::point(11, 0))]), &square),
            Ok(Some(Value::boolean(false)))
        );
        assert!(inside(&operands(vec![Some(Value::integer(1))]), &square).is_err());
    }
}

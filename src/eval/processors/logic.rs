//! and, or, not, anyN.
//!
//! and/or validate the non-null operands first, then apply the deciding value
//! (false for and, true for or) before NULL propagation, so `and(false, NULL)`
//! is false and `or(true, NULL)` is true.

use crate::ast::{ExpressionKind, IntegerOrVariableRef};
use crate::eval::context::EvaluationContext;
use crate::eval::error::{EvalError, EvalResult};
use crate::eval::operands::Operands;
use crate::value::{Scalar, Value};

const SINGLE_BOOLEAN: &str = "of single cardinality and baseType boolean";

/// Tri-valued view of the operands: `None` for NULL.
fn tri_values(operator: ExpressionKind, operands: &Operands) -> EvalResult<Vec<Option<bool>>> {
    operands
        .iter()
        .map(|operand| match operand {
            None => Ok(None),
            Some(Value::Single(Scalar::Boolean(b))) => Ok(Some(*b)),
            Some(_) => Err(EvalError::operand_shape(operator, SINGLE_BOOLEAN)),
        })
        .collect()
}

fn decide(operator: ExpressionKind, operands: &Operands, deciding: bool) -> EvalResult<Option<Value>> {
    let values = tri_values(operator, operands)?;
    if values.contains(&Some(deciding)) {
        return Ok(Some(Value::boolean(deciding)));
    }
    if values.contains(&None) {
        return Ok(None);
    }
    Ok(Some(Value::boolean(!deciding)))
}

pub fn and(operands: &Operands) -> EvalResult<Option<Value>> {
    decide(ExpressionKind::And, operands, false)
}

pub fn or(operands: &Operands) -> EvalResult<Option<Value>> {
    decide(ExpressionKind::Or, operands, true)
}

pub fn not(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Not;
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(
        kind,
        operands.exclusively_single() && operands.exclusively_boolean(),
        SINGLE_BOOLEAN,
    )?;
    let value = operands.single(0).and_then(Scalar::as_bool).unwrap_or_default();
    Ok(Some(Value::boolean(!value)))
}

/// True when the number of true operands lies in `[min, max]`, false when it
/// cannot get there whatever the NULL operands stand for, NULL otherwise.
pub fn any_n(
    ctx: &EvaluationContext<'_>,
    operands: &Operands,
    min: &IntegerOrVariableRef,
    max: &IntegerOrVariableRef,
) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::AnyN;
    let min = ctx.resolve_integer(kind, min)?;
    let max = ctx.resolve_integer(kind, max)?;
    if min > max {
        return Err(EvalError::logic(
            kind,
            format!("min ({}) is greater than max ({})", min, max),
        ));
    }

    let values = tri_values(kind, operands)?;
    let trues = values.iter().filter(|v| **v == Some(true)).count() as i64;
    let nulls = values.iter().filter(|v| v.is_none()).count() as i64;

    if trues >= min && trues <= max {
        Ok(Some(Value::boolean(true)))
    } else if trues + nulls < min || trues > max {
        Ok(Some(Value::boolean(false)))
    } else {
        Ok(None)
    }
}

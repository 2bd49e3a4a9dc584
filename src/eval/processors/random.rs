use rand::Rng;

use crate::ast::{ExpressionKind, FloatOrVariableRef, IntegerOrVariableRef};
use crate::eval::context::EvaluationContext;
use crate::eval::error::{EvalError, EvalResult};
use crate::value::Value;

/// Uniform over `min, min + step, ...` up to `max`.
pub fn random_integer(
    ctx: &mut EvaluationContext<'_>,
    min: &IntegerOrVariableRef,
    max: &IntegerOrVariableRef,
    step: &IntegerOrVariableRef,
) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::RandomInteger;
    let min = ctx.resolve_integer(kind, min)?;
    let max = ctx.resolve_integer(kind, max)?;
    let step = ctx.resolve_integer(kind, step)?;
    if min > max {
        return Err(EvalError::logic(
            kind,
            format!("min ({}) is greater than max ({})", min, max),
        ));
    }
    if step < 1 {
        return Err(EvalError::logic(kind, format!("step must be 1 or greater, found {}", step)));
    }
    let span = (max as i128 - min as i128) / step as i128;
    let picked = ctx.rng.gen_range(0..=span);
    let value = i64::try_from(min as i128 + picked * step as i128)
        .map_err(|_| EvalError::logic(kind, "integer overflow"))?;
    Ok(Some(Value::integer(value)))
}

pub fn random_float(
    ctx: &mut EvaluationContext<'_>,
    min: &FloatOrVariableRef,
    max: &FloatOrVariableRef,
) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::RandomFloat;
    let min = ctx.resolve_float(kind, min)?;
    let max = ctx.resolve_float(kind, max)?;
    if !min.is_finite() || !max.is_finite() {
        return Err(EvalError::logic(kind, "min and max must be finite"));
    }
    if min > max {
        return Err(EvalError::logic(
            kind,
            format!("min ({}) is greater than max ({})", min, max),
        ));
    }
    Ok(Some(Value::float(ctx.rng.gen_range(min..=max))))
}

use std::cmp::Ordering;

use regex::Regex;

use super::arithmetic::{check_figures, round_to_figures};
use crate::ast::{
    ExpressionKind, FloatOrVariableRef, IntegerOrVariableRef, RoundingMode, StringOrVariableRef,
    ToleranceMode,
};
use crate::eval::context::EvaluationContext;
use crate::eval::error::{EvalError, EvalResult};
use crate::eval::operands::Operands;
use crate::value::{Scalar, Value};

const SINGLE_NUMERIC: &str = "of single cardinality and baseType integer or float";
const SINGLE_STRING: &str = "of single cardinality and baseType string";
const SINGLE_DURATION: &str = "of single cardinality and baseType duration";

fn numeric_pair(operator: ExpressionKind, operands: &Operands) -> EvalResult<(f64, f64)> {
    operands.require(
        operator,
        operands.exclusively_single() && operands.exclusively_numeric(),
        SINGLE_NUMERIC,
    )?;
    match operands.singles().as_slice() {
        [a, b] => Ok((a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default())),
        _ => Err(EvalError::operand_shape(operator, SINGLE_NUMERIC)),
    }
}

fn compare(
    operator: ExpressionKind,
    operands: &Operands,
    accept: impl Fn(Ordering) -> bool,
) -> EvalResult<Option<Value>> {
    if operands.contains_null() {
        return Ok(None);
    }
    let (a, b) = numeric_pair(operator, operands)?;
    // NaN compares with nothing
    Ok(Some(Value::boolean(a.partial_cmp(&b).is_some_and(accept))))
}

pub fn lt(operands: &Operands) -> EvalResult<Option<Value>> {
    compare(ExpressionKind::Lt, operands, Ordering::is_lt)
}

pub fn lte(operands: &Operands) -> EvalResult<Option<Value>> {
    compare(ExpressionKind::Lte, operands, Ordering::is_le)
}

pub fn gt(operands: &Operands) -> EvalResult<Option<Value>> {
    compare(ExpressionKind::Gt, operands, Ordering::is_gt)
}

pub fn gte(operands: &Operands) -> EvalResult<Option<Value>> {
    compare(ExpressionKind::Gte, operands, Ordering::is_ge)
}

/// Container-aware equality of two operands of identical baseType and
/// cardinality.
pub fn match_values(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Match;
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(
        kind,
        operands.same_base_type() && operands.same_cardinality(),
        "of the same baseType and cardinality",
    )?;
    Ok(Some(Value::boolean(operands.get(0) == operands.get(1))))
}

pub fn equal(
    ctx: &EvaluationContext<'_>,
    operands: &Operands,
    mode: ToleranceMode,
    tolerance: &[FloatOrVariableRef],
    include_lower_bound: bool,
    include_upper_bound: bool,
) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Equal;
    if operands.contains_null() {
        return Ok(None);
    }
    let (x, y) = numeric_pair(kind, operands)?;

    if mode == ToleranceMode::Exact {
        return Ok(Some(Value::boolean(x == y)));
    }

    let t0 = match tolerance.first() {
        Some(t) => ctx.resolve_float(kind, t)?,
        None => {
            return Err(EvalError::logic(
                kind,
                format!("toleranceMode {} needs a tolerance", mode),
            ));
        }
    };
    let t1 = match tolerance.get(1) {
        Some(t) => ctx.resolve_float(kind, t)?,
        None => t0,
    };

    let (lower, upper) = match mode {
        ToleranceMode::Absolute => (x - t0, x + t1),
        // percentages of |x| so the lower bound stays below x when x < 0
        _ => (x - x.abs() * t0 / 100.0, x + x.abs() * t1 / 100.0),
    };
    let above_lower = if include_lower_bound { y >= lower } else { y > lower };
    let below_upper = if include_upper_bound { y <= upper } else { y < upper };
    Ok(Some(Value::boolean(above_lower && below_upper)))
}

pub fn equal_rounded(
    ctx: &EvaluationContext<'_>,
    operands: &Operands,
    mode: RoundingMode,
    figures: &IntegerOrVariableRef,
) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::EqualRounded;
    if operands.contains_null() {
        return Ok(None);
    }
    let (x, y) = numeric_pair(kind, operands)?;
    let figures = ctx.resolve_integer(kind, figures)?;
    check_figures(kind, mode, figures)?;
    Ok(Some(Value::boolean(
        round_to_figures(x, mode, figures) == round_to_figures(y, mode, figures),
    )))
}

fn string_pair<'o>(
    operator: ExpressionKind,
    operands: &'o Operands,
) -> EvalResult<(&'o str, &'o str)> {
    operands.require(
        operator,
        operands.exclusively_single() && operands.exclusively_string(),
        SINGLE_STRING,
    )?;
    match (operands.single(0), operands.single(1)) {
        (Some(Scalar::String(a)), Some(Scalar::String(b))) => Ok((a.as_str(), b.as_str())),
        _ => Err(EvalError::operand_shape(operator, SINGLE_STRING)),
    }
}

/// With `substring` set, the first operand only has to occur in the second.
pub fn string_match(
    operands: &Operands,
    case_sensitive: bool,
    substring: bool,
) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::StringMatch;
    if operands.contains_null() {
        return Ok(None);
    }
    let (a, b) = string_pair(kind, operands)?;
    let (a, b) = if case_sensitive {
        (a.to_string(), b.to_string())
    } else {
        (a.to_lowercase(), b.to_lowercase())
    };
    let matched = if substring { b.contains(&a) } else { a == b };
    Ok(Some(Value::boolean(matched)))
}

/// True when the first operand occurs in the second.
pub fn substring(operands: &Operands, case_sensitive: bool) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Substring;
    if operands.contains_null() {
        return Ok(None);
    }
    let (needle, haystack) = string_pair(kind, operands)?;
    let found = if case_sensitive {
        haystack.contains(needle)
    } else {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    };
    Ok(Some(Value::boolean(found)))
}

/// The pattern has to match the whole operand.
pub fn pattern_match(
    ctx: &EvaluationContext<'_>,
    operands: &Operands,
    pattern: &StringOrVariableRef,
) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::PatternMatch;
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(
        kind,
        operands.exclusively_single() && operands.exclusively_string(),
        SINGLE_STRING,
    )?;
    let pattern = ctx.resolve_string(kind, pattern)?;
    let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
        EvalError::logic(kind, format!("invalid pattern '{}': {}", pattern, e))
    })?;
    let text = operands.single(0).and_then(Scalar::as_str).unwrap_or_default();
    Ok(Some(Value::boolean(regex.is_match(text))))
}

fn compare_durations(
    operator: ExpressionKind,
    operands: &Operands,
    accept: impl Fn(Ordering) -> bool,
) -> EvalResult<Option<Value>> {
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(
        operator,
        operands.exclusively_single() && operands.exclusively_duration(),
        SINGLE_DURATION,
    )?;
    let durations: Vec<_> = operands.singles().into_iter().filter_map(Scalar::as_duration).collect();
    match durations.as_slice() {
        [a, b] => Ok(Some(Value::boolean(accept(a.cmp(b))))),
        _ => Err(EvalError::operand_shape(operator, SINGLE_DURATION)),
    }
}

pub fn duration_lt(operands: &Operands) -> EvalResult<Option<Value>> {
    compare_durations(ExpressionKind::DurationLt, operands, Ordering::is_lt)
}

pub fn duration_gte(operands: &Operands) -> EvalResult<Option<Value>> {
    compare_durations(ExpressionKind::DurationGte, operands, Ordering::is_ge)
}

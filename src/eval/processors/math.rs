use std::f64::consts;

use super::arithmetic::{finite, integral};
use crate::ast::{ExpressionKind, MathConstantName, MathFunction, StatsFunction};
use crate::eval::error::{EvalError, EvalResult};
use crate::eval::operands::Operands;
use crate::value::{Scalar, Value};

const SINGLE_NUMERIC: &str = "of single cardinality and baseType integer or float";
const CONTAINER_NUMERIC: &str = "of multiple or ordered cardinality and baseType integer or float";

pub fn math_constant(name: MathConstantName) -> Option<Value> {
    Some(Value::float(match name {
        MathConstantName::Pi => consts::PI,
        MathConstantName::E => consts::E,
    }))
}

/// `atan2` takes two operands, every other function exactly one.
pub fn math_operator(operands: &Operands, name: MathFunction) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::MathOperator;
    let expected = if name == MathFunction::Atan2 { 2 } else { 1 };
    if operands.len() != expected {
        return Err(EvalError::Arity {
            operator: kind,
            expected: format!("exactly {} ({})", expected, name),
            found: operands.len(),
        });
    }
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(
        kind,
        operands.exclusively_single() && operands.exclusively_numeric(),
        SINGLE_NUMERIC,
    )?;

    let scalars = operands.singles();
    let (first, second) = match scalars.as_slice() {
        [first] => (*first, None),
        [first, second] => (*first, Some(*second)),
        _ => return Err(EvalError::operand_shape(kind, SINGLE_NUMERIC)),
    };
    let x = first.as_f64().unwrap_or_default();
    let result = match name {
        MathFunction::Sin => finite(x.sin()),
        MathFunction::Cos => finite(x.cos()),
        MathFunction::Tan => finite(x.tan()),
        MathFunction::Sec => finite(1.0 / x.cos()),
        MathFunction::Csc => finite(1.0 / x.sin()),
        MathFunction::Cot => finite(1.0 / x.tan()),
        MathFunction::Asin => finite(x.asin()),
        MathFunction::Acos => finite(x.acos()),
        MathFunction::Atan => finite(x.atan()),
        // atan2(y, x): the first operand is the ordinate
        MathFunction::Atan2 => finite(x.atan2(second.and_then(Scalar::as_f64).unwrap_or_default())),
        MathFunction::Asec => finite((1.0 / x).acos()),
        MathFunction::Acsc => finite((1.0 / x).asin()),
        MathFunction::Acot => finite((1.0 / x).atan()),
        MathFunction::Sinh => finite(x.sinh()),
        MathFunction::Cosh => finite(x.cosh()),
        MathFunction::Tanh => finite(x.tanh()),
        MathFunction::Sech => finite(1.0 / x.cosh()),
        MathFunction::Csch => finite(1.0 / x.sinh()),
        MathFunction::Coth => finite(1.0 / x.tanh()),
        MathFunction::Log => finite(x.log10()),
        MathFunction::Ln => finite(x.ln()),
        MathFunction::Exp => finite(x.exp()),
        MathFunction::Abs => match first {
            Scalar::Integer(i) => i.checked_abs().map(Value::integer),
            _ => finite(x.abs()),
        },
        MathFunction::Signum => match first {
            Scalar::Integer(i) => Some(Value::integer(i.signum())),
            _ if x.is_nan() => None,
            _ if x == 0.0 => Some(Value::integer(0)),
            _ => integral(x.signum()),
        },
        MathFunction::Floor => match first {
            Scalar::Integer(i) => Some(Value::integer(*i)),
            _ => integral(x.floor()),
        },
        MathFunction::Ceil => match first {
            Scalar::Integer(i) => Some(Value::integer(*i)),
            _ => integral(x.ceil()),
        },
        MathFunction::ToDegrees => finite(x.to_degrees()),
        MathFunction::ToRadians => finite(x.to_radians()),
    };
    Ok(result)
}

/// Descriptive statistics over the non-null elements of one numeric
/// container.
pub fn stats_operator(operands: &Operands, name: StatsFunction) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::StatsOperator;
    if operands.contains_null() {
        return Ok(None);
    }
    operands.require(
        kind,
        operands.exclusively_multiple_or_ordered() && operands.exclusively_numeric(),
        CONTAINER_NUMERIC,
    )?;

    let values: Vec<f64> = operands
        .present()
        .flat_map(Value::scalars)
        .filter_map(Scalar::as_f64)
        .collect();
    if values.is_empty() {
        return Ok(None);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();

    let result = match name {
        StatsFunction::Mean => mean,
        StatsFunction::PopVariance => squares / n,
        StatsFunction::PopSd => (squares / n).sqrt(),
        StatsFunction::SampleVariance | StatsFunction::SampleSd if values.len() < 2 => {
            return Ok(None);
        }
        StatsFunction::SampleVariance => squares / (n - 1.0),
        StatsFunction::SampleSd => (squares / (n - 1.0)).sqrt(),
    };
    Ok(finite(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BaseType;
    use pretty_assertions::assert_eq;

    fn single(value: Value) -> Operands {
        Operands::new(vec![Some(value)])
    }

    fn numbers(values: &[i64]) -> Operands {
        single(Value::multiple(BaseType::Integer, values.iter().map(|v| Scalar::Integer(*v))).unwrap())
    }

    #[test]
    fn test_math_constant() {
        assert_eq!(math_constant(MathConstantName::Pi), Some(Value::float(consts::PI)));
    }

    #[test]
    fn test_math_operator() {
        assert_eq!(
            math_operator(&single(Value::float(0.0)), MathFunction::Sin),
            Ok(Some(Value::float(0.0)))
        );
        assert_eq!(
            math_operator(&single(Value::float(-2.5)), MathFunction::Floor),
            Ok(Some(Value::integer(-3)))
        );
        assert_eq!(
            math_operator(&single(Value::integer(-4)), MathFunction::Abs),
            Ok(Some(Value::integer(4)))
        );
        assert_eq!(
            math_operator(&single(Value::float(-0.5)), MathFunction::Signum),
            Ok(Some(Value::integer(-1)))
        );
        assert_eq!(math_operator(&single(Value::float(0.0)), MathFunction::Ln), Ok(None));
        assert_eq!(math_operator(&single(Value::float(0.0)), MathFunction::Cot), Ok(None));
    }

    #[test]
    fn test_integer_results_stay_in_range() {
        assert_eq!(math_operator(&single(Value::float(1e300)), MathFunction::Floor), Ok(None));
        assert_eq!(math_operator(&single(Value::float(-1e300)), MathFunction::Ceil), Ok(None));
        assert_eq!(
            math_operator(&single(Value::float(-1e300)), MathFunction::Signum),
            Ok(Some(Value::integer(-1)))
        );
    }

    #[test]
    fn test_atan2_takes_two_operands() {
        let operands = Operands::new(vec![Some(Value::float(1.0)), Some(Value::float(1.0))]);
        assert_eq!(
            math_operator(&operands, MathFunction::Atan2),
            Ok(Some(Value::float(consts::FRAC_PI_4)))
        );
        assert!(matches!(
            math_operator(&single(Value::float(1.0)), MathFunction::Atan2),
            Err(EvalError::Arity { .. })
        ));
        assert!(matches!(
            math_operator(&operands, MathFunction::Sin),
            Err(EvalError::Arity { .. })
        ));
    }

    #[test]
    fn test_stats_operator() {
        let operands = numbers(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(stats_operator(&operands, StatsFunction::Mean), Ok(Some(Value::float(5.0))));
        assert_eq!(
            stats_operator(&operands, StatsFunction::PopVariance),
            Ok(Some(Value::float(4.0)))
        );
        assert_eq!(stats_operator(&operands, StatsFunction::PopSd), Ok(Some(Value::float(2.0))));
        assert_eq!(
            stats_operator(&operands, StatsFunction::SampleVariance),
            Ok(Some(Value::float(32.0 / 7.0)))
        );
    }

    #[test]
    fn test_sample_statistics_need_two_values() {
        assert_eq!(stats_operator(&numbers(&[3]), StatsFunction::SampleSd), Ok(None));
        assert_eq!(stats_operator(&numbers(&[3]), StatsFunction::Mean), Ok(Some(Value::float(3.0))));
    }

    #[test]
    fn test_stats_rejects_single() {
        assert!(matches!(
            stats_operator(&single(Value::integer(3)), StatsFunction::Mean),
            Err(EvalError::OperandShape { .. })
        ));
    }
}

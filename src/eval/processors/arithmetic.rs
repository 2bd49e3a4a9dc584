use crate::ast::{ExpressionKind, IntegerOrVariableRef, RoundingMode};
use crate::eval::context::EvaluationContext;
use crate::eval::error::{EvalError, EvalResult};
use crate::eval::operands::Operands;
use crate::value::{Scalar, Value};

const NUMERIC: &str = "of baseType integer or float";
const SINGLE_NUMERIC: &str = "of single cardinality and baseType integer or float";
const SINGLE_INTEGER: &str = "of single cardinality and baseType integer";

/// Numeric contributions of all operands, containers flattened. NULL
/// elements inside a container contribute nothing.
struct Numbers {
    values: Vec<Scalar>,
    integer: bool,
}

impl Numbers {
    fn collect(operator: ExpressionKind, operands: &Operands) -> EvalResult<Self> {
        operands.require(operator, operands.exclusively_numeric(), NUMERIC)?;
        let values: Vec<Scalar> = operands.present().flat_map(Value::scalars).cloned().collect();
        let integer = values.iter().all(|v| matches!(v, Scalar::Integer(_)));
        Ok(Self { values, integer })
    }

    fn integers(&self) -> impl Iterator<Item = i64> + '_ {
        self.values.iter().filter_map(Scalar::as_i64)
    }

    fn floats(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(Scalar::as_f64)
    }
}

fn overflow(operator: ExpressionKind) -> EvalError {
    EvalError::logic(operator, "integer overflow")
}

/// Non-finite float results are NULL.
pub(crate) fn finite(value: f64) -> Option<Value> {
    value.is_finite().then(|| Value::float(value))
}

/// Integral floats outside the i64 range (or not numbers) are NULL.
pub(crate) fn integral(value: f64) -> Option<Value> {
    // i64::MIN is exactly representable, i64::MAX rounds up to 2^63
    let in_range = value >= i64::MIN as f64 && value < -(i64::MIN as f64);
    in_range.then(|| Value::integer(value as i64))
}

fn single_numbers(operator: ExpressionKind, operands: &Operands) -> EvalResult<Vec<Scalar>> {
    operands.require(
        operator,
        operands.exclusively_single() && operands.exclusively_numeric(),
        SINGLE_NUMERIC,
    )?;
    Ok(operands.singles().into_iter().cloned().collect())
}

fn single_integers(operator: ExpressionKind, operands: &Operands) -> EvalResult<Vec<i64>> {
    operands.require(
        operator,
        operands.exclusively_single() && operands.exclusively_integer(),
        SINGLE_INTEGER,
    )?;
    Ok(operands.singles().into_iter().filter_map(Scalar::as_i64).collect())
}

pub fn sum(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Sum;
    if operands.contains_null() {
        return Ok(None);
    }
    let numbers = Numbers::collect(kind, operands)?;
    if numbers.integer {
        let total = numbers
            .integers()
            .try_fold(0i64, |acc, v| acc.checked_add(v))
            .ok_or_else(|| overflow(kind))?;
        Ok(Some(Value::integer(total)))
    } else {
        Ok(Some(Value::float(numbers.floats().sum())))
    }
}

pub fn product(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Product;
    if operands.contains_null() {
        return Ok(None);
    }
    let numbers = Numbers::collect(kind, operands)?;
    if numbers.integer {
        let total = numbers
            .integers()
            .try_fold(1i64, |acc, v| acc.checked_mul(v))
            .ok_or_else(|| overflow(kind))?;
        Ok(Some(Value::integer(total)))
    } else {
        Ok(Some(Value::float(numbers.floats().product())))
    }
}

pub fn subtract(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Subtract;
    if operands.contains_null() {
        return Ok(None);
    }
    match single_numbers(kind, operands)?.as_slice() {
        [Scalar::Integer(a), Scalar::Integer(b)] => a
            .checked_sub(*b)
            .map(|v| Some(Value::integer(v)))
            .ok_or_else(|| overflow(kind)),
        [a, b] => Ok(Some(Value::float(
            a.as_f64().unwrap_or_default() - b.as_f64().unwrap_or_default(),
        ))),
        _ => Err(EvalError::operand_shape(kind, SINGLE_NUMERIC)),
    }
}

/// Division by zero is NULL.
pub fn divide(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Divide;
    if operands.contains_null() {
        return Ok(None);
    }
    match single_numbers(kind, operands)?.as_slice() {
        [_, b] if b.as_f64() == Some(0.0) => Ok(None),
        [a, b] => Ok(finite(
            a.as_f64().unwrap_or_default() / b.as_f64().unwrap_or_default(),
        )),
        _ => Err(EvalError::operand_shape(kind, SINGLE_NUMERIC)),
    }
}

/// Integer when both operands are integers and the exact result fits,
/// float otherwise.
pub fn power(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Power;
    if operands.contains_null() {
        return Ok(None);
    }
    let values = single_numbers(kind, operands)?;
    let [base, exponent] = values.as_slice() else {
        return Err(EvalError::operand_shape(kind, SINGLE_NUMERIC));
    };
    if let (Scalar::Integer(base), Scalar::Integer(exponent)) = (base, exponent) {
        if let Ok(exponent) = u32::try_from(*exponent) {
            if let Some(result) = base.checked_pow(exponent) {
                return Ok(Some(Value::integer(result)));
            }
        }
    }
    Ok(finite(
        base.as_f64()
            .unwrap_or_default()
            .powf(exponent.as_f64().unwrap_or_default()),
    ))
}

/// Floor division; a zero divisor is NULL.
pub fn integer_divide(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::IntegerDivide;
    if operands.contains_null() {
        return Ok(None);
    }
    let (a, b) = match single_integers(kind, operands)?.as_slice() {
        [a, b] => (*a, *b),
        _ => return Err(EvalError::operand_shape(kind, SINGLE_INTEGER)),
    };
    if b == 0 {
        return Ok(None);
    }
    let quotient = a.checked_div(b).ok_or_else(|| overflow(kind))?;
    let floored = if a % b != 0 && ((a < 0) != (b < 0)) {
        quotient - 1
    } else {
        quotient
    };
    Ok(Some(Value::integer(floored)))
}

/// Remainder with the sign of the dividend; a zero divisor is NULL.
pub fn integer_modulus(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::IntegerModulus;
    if operands.contains_null() {
        return Ok(None);
    }
    match single_integers(kind, operands)?.as_slice() {
        [_, 0] => Ok(None),
        // i64::MIN % -1 is 0, not an overflow
        [a, b] => Ok(Some(Value::integer(a.wrapping_rem(*b)))),
        _ => Err(EvalError::operand_shape(kind, SINGLE_INTEGER)),
    }
}

pub fn integer_to_float(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::IntegerToFloat;
    if operands.contains_null() {
        return Ok(None);
    }
    match single_integers(kind, operands)?.as_slice() {
        [value] => Ok(Some(Value::float(*value as f64))),
        _ => Err(EvalError::operand_shape(kind, SINGLE_INTEGER)),
    }
}

/// Shared by round and truncate: integers pass, NaN is NULL, infinities pass
/// through as floats. Finite results beyond the integer range are NULL.
fn to_integer(
    operator: ExpressionKind,
    operands: &Operands,
    f: impl Fn(f64) -> f64,
) -> EvalResult<Option<Value>> {
    if operands.contains_null() {
        return Ok(None);
    }
    match single_numbers(operator, operands)?.as_slice() {
        [Scalar::Integer(i)] => Ok(Some(Value::integer(*i))),
        [Scalar::Float(x)] if x.is_nan() => Ok(None),
        [Scalar::Float(x)] if x.is_infinite() => Ok(Some(Value::float(*x))),
        [Scalar::Float(x)] => Ok(integral(f(*x))),
        _ => Err(EvalError::operand_shape(operator, SINGLE_NUMERIC)),
    }
}

pub fn truncate(operands: &Operands) -> EvalResult<Option<Value>> {
    to_integer(ExpressionKind::Truncate, operands, f64::trunc)
}

/// Half up for positive values, half down for negative ones: 6.5 is 7 and
/// -6.5 is -6.
pub fn round(operands: &Operands) -> EvalResult<Option<Value>> {
    to_integer(ExpressionKind::Round, operands, round_half_up)
}

fn round_half_up(x: f64) -> f64 {
    // x - floor(x) is exact, unlike x + 0.5
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Validates `figures` against the rounding mode.
pub(crate) fn check_figures(
    operator: ExpressionKind,
    mode: RoundingMode,
    figures: i64,
) -> EvalResult<()> {
    match mode {
        RoundingMode::SignificantFigures if figures < 1 => Err(EvalError::logic(
            operator,
            format!("significantFigures needs figures > 0, found {}", figures),
        )),
        RoundingMode::DecimalPlaces if figures < 0 => Err(EvalError::logic(
            operator,
            format!("decimalPlaces needs figures >= 0, found {}", figures),
        )),
        _ => Ok(()),
    }
}

/// A value that already has fewer digits than requested, so that scaling it
/// leaves the float range, is returned unchanged.
pub(crate) fn round_to_figures(value: f64, mode: RoundingMode, figures: i64) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    let figures = figures.clamp(0, i32::MAX as i64) as i32;
    let power = match mode {
        RoundingMode::DecimalPlaces => figures,
        RoundingMode::SignificantFigures => {
            figures.saturating_sub(value.abs().log10().ceil() as i32)
        }
    };
    if power < 0 {
        let magnitude = 10f64.powi(power.saturating_neg());
        let scaled = value / magnitude;
        if magnitude.is_finite() { scaled.round() * magnitude } else { value }
    } else {
        let magnitude = 10f64.powi(power);
        let scaled = value * magnitude;
        if scaled.is_finite() { scaled.round() / magnitude } else { value }
    }
}

pub fn round_to(
    ctx: &EvaluationContext<'_>,
    operands: &Operands,
    figures: &IntegerOrVariableRef,
    mode: RoundingMode,
) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::RoundTo;
    if operands.contains_null() {
        return Ok(None);
    }
    let values = single_numbers(kind, operands)?;
    let figures = ctx.resolve_integer(kind, figures)?;
    check_figures(kind, mode, figures)?;

    let value = match values.as_slice() {
        [value] => value.as_f64().unwrap_or_default(),
        _ => return Err(EvalError::operand_shape(kind, SINGLE_NUMERIC)),
    };
    if value.is_nan() {
        return Ok(None);
    }
    Ok(Some(Value::float(round_to_figures(value, mode, figures))))
}

fn integers(operator: ExpressionKind, operands: &Operands) -> EvalResult<Vec<i64>> {
    operands.require(operator, operands.exclusively_integer(), "of baseType integer")?;
    Ok(operands
        .present()
        .flat_map(Value::scalars)
        .filter_map(Scalar::as_i64)
        .collect())
}

fn gcd_pair(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a as i64
}

/// Greatest common divisor; zero when every value is zero.
pub fn gcd(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Gcd;
    if operands.contains_null() {
        return Ok(None);
    }
    let values = integers(kind, operands)?;
    Ok(Some(Value::integer(values.into_iter().fold(0, gcd_pair))))
}

/// Least common multiple; zero when any value is zero.
pub fn lcm(operands: &Operands) -> EvalResult<Option<Value>> {
    let kind = ExpressionKind::Lcm;
    if operands.contains_null() {
        return Ok(None);
    }
    let values = integers(kind, operands)?;
    if values.contains(&0) {
        return Ok(Some(Value::integer(0)));
    }
    let mut result = 1i64;
    for value in values {
        let value = value.checked_abs().ok_or_else(|| overflow(kind))?;
        result = (result / gcd_pair(result, value))
            .checked_mul(value)
            .ok_or_else(|| overflow(kind))?;
    }
    Ok(Some(Value::integer(result)))
}

fn extreme(operator: ExpressionKind, operands: &Operands, greatest: bool) -> EvalResult<Option<Value>> {
    if operands.contains_null() {
        return Ok(None);
    }
    let numbers = Numbers::collect(operator, operands)?;
    if numbers.integer {
        let result = if greatest {
            numbers.integers().max()
        } else {
            numbers.integers().min()
        };
        Ok(result.map(Value::integer))
    } else {
        let result = numbers
            .floats()
            .reduce(|a, b| if (b > a) == greatest { b } else { a });
        Ok(result.and_then(finite))
    }
}

pub fn min(operands: &Operands) -> EvalResult<Option<Value>> {
    extreme(ExpressionKind::Min, operands, false)
}

pub fn max(operands: &Operands) -> EvalResult<Option<Value>> {
    extreme(ExpressionKind::Max, operands, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BaseType;
    use pretty_assertions::assert_eq;

    fn singles(values: Vec<Value>) -> Operands {
        values.into_iter().map(Some).collect()
    }

    #[test]
    fn test_sum_keeps_integers() {
        let operands = singles(vec![
            Value::integer(1),
            Value::multiple(BaseType::Integer, vec![Scalar::Integer(2), Scalar::Integer(3)]).unwrap(),
        ]);
        assert_eq!(sum(&operands), Ok(Some(Value::integer(6))));
    }

    #[test]
    fn test_sum_promotes_to_float() {
        let operands = singles(vec![Value::integer(1), Value::float(0.5)]);
        assert_eq!(sum(&operands), Ok(Some(Value::float(1.5))));
        assert_eq!(product(&operands), Ok(Some(Value::float(0.5))));
    }

    #[test]
    fn test_null_wins_over_bad_types() {
        let operands = Operands::new(vec![Some(Value::string("nope")), None]);
        assert_eq!(sum(&operands), Ok(None));
        assert_eq!(subtract(&operands), Ok(None));
    }

    #[test]
    fn test_integer_modulus() {
        let ten_by = |d| singles(vec![Value::integer(10), Value::integer(d)]);
        assert_eq!(integer_modulus(&ten_by(3)), Ok(Some(Value::integer(1))));
        assert_eq!(integer_modulus(&ten_by(0)), Ok(None));
        assert_eq!(
            integer_modulus(&singles(vec![Value::integer(-10), Value::integer(3)])),
            Ok(Some(Value::integer(-1)))
        );
        assert_eq!(
            integer_modulus(&singles(vec![Value::integer(i64::MIN), Value::integer(-1)])),
            Ok(Some(Value::integer(0)))
        );
    }

    #[test]
    fn test_integer_divide_floors() {
        let divide = |a, b| integer_divide(&singles(vec![Value::integer(a), Value::integer(b)]));
        assert_eq!(divide(7, 2), Ok(Some(Value::integer(3))));
        assert_eq!(divide(-7, 2), Ok(Some(Value::integer(-4))));
        assert_eq!(divide(7, 0), Ok(None));
    }

    #[test]
    fn test_divide_and_power() {
        assert_eq!(
            divide(&singles(vec![Value::integer(1), Value::integer(0)])),
            Ok(None)
        );
        assert_eq!(
            divide(&singles(vec![Value::integer(1), Value::integer(4)])),
            Ok(Some(Value::float(0.25)))
        );
        assert_eq!(
            power(&singles(vec![Value::integer(2), Value::integer(10)])),
            Ok(Some(Value::integer(1024)))
        );
        assert_eq!(
            power(&singles(vec![Value::integer(2), Value::integer(-1)])),
            Ok(Some(Value::float(0.5)))
        );
        assert_eq!(
            power(&singles(vec![Value::float(10.0), Value::integer(400)])),
            Ok(None)
        );
    }

    #[test]
    fn test_round() {
        let round_one = |x: f64| round(&singles(vec![Value::float(x)]));
        assert_eq!(round_one(6.5), Ok(Some(Value::integer(7))));
        assert_eq!(round_one(-6.5), Ok(Some(Value::integer(-6))));
        assert_eq!(round_one(-6.51), Ok(Some(Value::integer(-7))));
        assert_eq!(round_one(6.49), Ok(Some(Value::integer(6))));
        // the largest double below one half
        assert_eq!(round_one(0.49999999999999994), Ok(Some(Value::integer(0))));
        assert_eq!(round_one(-0.5), Ok(Some(Value::integer(0))));
        assert_eq!(round_one(f64::NAN), Ok(None));
        assert_eq!(
            round_one(f64::INFINITY),
            Ok(Some(Value::float(f64::INFINITY)))
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(
            truncate(&singles(vec![Value::float(-6.8)])),
            Ok(Some(Value::integer(-6)))
        );
    }

    #[test]
    fn test_integer_conversion_out_of_range_is_null() {
        assert_eq!(round(&singles(vec![Value::float(1e300)])), Ok(None));
        assert_eq!(truncate(&singles(vec![Value::float(-1e300)])), Ok(None));
        assert_eq!(round(&singles(vec![Value::float(9.3e18)])), Ok(None));
        assert_eq!(
            truncate(&singles(vec![Value::float(-9_223_372_036_854_775_808.0)])),
            Ok(Some(Value::integer(i64::MIN)))
        );
    }

    #[test]
    fn test_wrong_operand_count_is_an_error() {
        let one = singles(vec![Value::integer(1)]);
        assert!(matches!(divide(&one), Err(EvalError::OperandShape { .. })));
        assert!(matches!(power(&one), Err(EvalError::OperandShape { .. })));
        assert!(matches!(integer_divide(&one), Err(EvalError::OperandShape { .. })));
        assert!(matches!(integer_modulus(&one), Err(EvalError::OperandShape { .. })));
        assert!(matches!(
            round(&singles(vec![Value::float(1.0), Value::float(2.0)])),
            Err(EvalError::OperandShape { .. })
        ));
        assert!(matches!(
            integer_to_float(&Operands::new(vec![])),
            Err(EvalError::OperandShape { .. })
        ));
    }

    #[test]
    fn test_round_to_figures() {
        assert_eq!(round_to_figures(3.14159, RoundingMode::DecimalPlaces, 2), 3.14);
        assert_eq!(round_to_figures(1234.5, RoundingMode::SignificantFigures, 2), 1200.0);
        assert_eq!(round_to_figures(0.012345, RoundingMode::SignificantFigures, 3), 0.0123);
        assert_eq!(round_to_figures(0.0, RoundingMode::SignificantFigures, 3), 0.0);
        assert_eq!(round_to_figures(-1234.5, RoundingMode::SignificantFigures, 2), -1200.0);
        assert!(check_figures(ExpressionKind::RoundTo, RoundingMode::SignificantFigures, 0).is_err());
        assert!(check_figures(ExpressionKind::RoundTo, RoundingMode::DecimalPlaces, 0).is_ok());
    }

    #[test]
    fn test_round_to_figures_beyond_float_range() {
        assert_eq!(round_to_figures(1.5, RoundingMode::DecimalPlaces, 400), 1.5);
        assert_eq!(round_to_figures(1e-300, RoundingMode::SignificantFigures, 20), 1e-300);
        assert_eq!(round_to_figures(1e300, RoundingMode::DecimalPlaces, 10), 1e300);
        assert_eq!(round_to_figures(2.5, RoundingMode::SignificantFigures, i64::MAX), 2.5);
    }

    #[test]
    fn test_round_to_many_places_is_not_nan() {
        use crate::eval::context::ItemState;
        use rand::{SeedableRng, rngs::StdRng};

        let store = ItemState::new();
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = EvaluationContext::new(&store, &mut rng);
        let places = IntegerOrVariableRef::Integer(400);
        assert_eq!(
            round_to(&ctx, &singles(vec![Value::float(1.5)]), &places, RoundingMode::DecimalPlaces),
            Ok(Some(Value::float(1.5)))
        );
    }

    #[test]
    fn test_gcd_lcm() {
        let operands = singles(vec![
            Value::integer(12),
            Value::multiple(BaseType::Integer, vec![Scalar::Integer(18), Scalar::Integer(-30)]).unwrap(),
        ]);
        assert_eq!(gcd(&operands), Ok(Some(Value::integer(6))));
        assert_eq!(lcm(&operands), Ok(Some(Value::integer(180))));
        assert_eq!(
            gcd(&singles(vec![Value::integer(0), Value::integer(0)])),
            Ok(Some(Value::integer(0)))
        );
        assert_eq!(
            lcm(&singles(vec![Value::integer(0), Value::integer(5)])),
            Ok(Some(Value::integer(0)))
        );
    }

    #[test]
    fn test_min_max() {
        let operands = singles(vec![Value::integer(3), Value::integer(-2), Value::integer(7)]);
        assert_eq!(min(&operands), Ok(Some(Value::integer(-2))));
        assert_eq!(max(&operands), Ok(Some(Value::integer(7))));

        let mixed = singles(vec![Value::integer(3), Value::float(3.5)]);
        assert_eq!(max(&mixed), Ok(Some(Value::float(3.5))));
        assert_eq!(min(&mixed), Ok(Some(Value::float(3.0))));
    }
}

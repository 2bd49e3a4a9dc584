use rand::{RngCore, SeedableRng, rngs::StdRng};
use tracing::{debug, trace};

use super::context::{EvaluationContext, VariableStore};
use super::error::{EvalError, EvalResult};
use super::operands::Operands;
use super::processor::Processor;
use super::processors::{arithmetic, container, logic, math, random, relational, variable};
use crate::ast::{Expression, ExpressionKind};
use crate::config::EngineConfig;
use crate::value::Value;

/// Evaluates expression trees against one variable store.
///
/// Evaluation is depth first: every operand of a node is evaluated before
/// the node's processor runs. The store is only read. Random operators draw
/// from the evaluator's own generator, so a seeded evaluator is
/// deterministic.
pub struct Evaluator<'s, R: RngCore = StdRng> {
    store: &'s dyn VariableStore,
    rng: R,
    max_depth: usize,
}

impl<'s> Evaluator<'s, StdRng> {
    pub fn new(store: &'s dyn VariableStore) -> Self {
        Self::with_config(store, &EngineConfig::default())
    }

    pub fn with_config(store: &'s dyn VariableStore, config: &EngineConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            rng,
            max_depth: config.max_depth,
        }
    }
}

impl<'s, R: RngCore> Evaluator<'s, R> {
    pub fn with_rng(store: &'s dyn VariableStore, rng: R) -> Self {
        Self {
            store,
            rng,
            max_depth: EngineConfig::default().max_depth,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Top level entry point. `None` is QTI's NULL.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %expression.kind()), err)]
    pub fn evaluate(&mut self, expression: &Expression) -> EvalResult<Option<Value>> {
        self.evaluate_at(expression, 0)
    }

    /// Evaluates `expression` with the processor of `kind`, failing at bind
    /// time when the two disagree.
    pub fn evaluate_as(
        &mut self,
        kind: ExpressionKind,
        expression: &Expression,
    ) -> EvalResult<Option<Value>> {
        let processor = Processor::bind(kind, expression)?;
        self.process(processor, 0)
    }

    fn evaluate_at(&mut self, expression: &Expression, depth: usize) -> EvalResult<Option<Value>> {
        let processor = Processor::bind(expression.kind(), expression)?;
        self.process(processor, depth)
    }

    fn evaluate_operands(&mut self, children: &[Expression], depth: usize) -> EvalResult<Operands> {
        children
            .iter()
            .map(|child| self.evaluate_at(child, depth))
            .collect::<EvalResult<Vec<_>>>()
            .map(Operands::new)
    }

    fn context(&mut self) -> EvaluationContext<'_> {
        EvaluationContext::new(self.store, &mut self.rng)
    }

    fn process(&mut self, processor: Processor<'_>, depth: usize) -> EvalResult<Option<Value>> {
        let kind = processor.kind();
        if depth >= self.max_depth {
            return Err(EvalError::DepthExceeded {
                operator: kind,
                limit: self.max_depth,
            });
        }
        let expression = processor.expression();
        trace!(%kind, depth, operands = expression.operands().len(), "processing");

        let result = match expression {
            Expression::Repeat {
                number_repeats,
                operands,
            } => {
                // children run once per repetition
                let count = container::repeat_count(&self.context(), number_repeats)?;
                if count < 1 {
                    return Ok(None);
                }
                let mut results = Vec::new();
                for _ in 0..count {
                    results.extend(self.evaluate_operands(operands, depth + 1)?.into_values());
                }
                container::repeat(&Operands::new(results))
            }
            _ => {
                let operands = self.evaluate_operands(expression.operands(), depth + 1)?;
                let mut ctx = self.context();
                dispatch(&mut ctx, expression, &operands)
            }
        };

        match &result {
            Ok(Some(value)) => debug!(%kind, ?value, "evaluated"),
            Ok(None) => debug!(%kind, "evaluated to NULL"),
            Err(error) => debug!(%kind, %error, "evaluation failed"),
        }
        result
    }
}

fn dispatch(
    ctx: &mut EvaluationContext<'_>,
    expression: &Expression,
    operands: &Operands,
) -> EvalResult<Option<Value>> {
    match expression {
        // Leaves
        Expression::BaseValue(scalar) => Ok(Value::Single(scalar.clone()).normalize()),
        Expression::Null => Ok(None),
        Expression::Variable {
            identifier,
            weight_identifier,
        } => variable::variable(ctx, identifier, weight_identifier.as_deref()),
        Expression::Correct { identifier } => variable::correct(ctx, identifier),
        Expression::Default { identifier } => variable::default(ctx, identifier),
        Expression::MapResponse { identifier } => variable::map_response(ctx, identifier),
        Expression::MapResponsePoint { identifier } => {
            variable::map_response_point(ctx, identifier)
        }
        Expression::RandomInteger { min, max, step } => {
            random::random_integer(ctx, min, max, step)
        }
        Expression::RandomFloat { min, max } => random::random_float(ctx, min, max),
        Expression::MathConstant(name) => Ok(math::math_constant(*name)),

        // Logical
        Expression::And(_) => logic::and(operands),
        Expression::Or(_) => logic::or(operands),
        Expression::Not(_) => logic::not(operands),
        Expression::AnyN { min, max, .. } => logic::any_n(ctx, operands, min, max),

        // Relational
        Expression::Lt(_) => relational::lt(operands),
        Expression::Lte(_) => relational::lte(operands),
        Expression::Gt(_) => relational::gt(operands),
        Expression::Gte(_) => relational::gte(operands),
        Expression::Match(_) => relational::match_values(operands),
        Expression::Equal {
            tolerance_mode,
            tolerance,
            include_lower_bound,
            include_upper_bound,
            ..
        } => relational::equal(
            ctx,
            operands,
            *tolerance_mode,
            tolerance,
            *include_lower_bound,
            *include_upper_bound,
        ),
        Expression::EqualRounded {
            rounding_mode,
            figures,
            ..
        } => relational::equal_rounded(ctx, operands, *rounding_mode, figures),
        Expression::StringMatch {
            case_sensitive,
            substring,
            ..
        } => relational::string_match(operands, *case_sensitive, *substring),
        Expression::PatternMatch { pattern, .. } => {
            relational::pattern_match(ctx, operands, pattern)
        }
        Expression::Substring { case_sensitive, .. } => {
            relational::substring(operands, *case_sensitive)
        }
        Expression::DurationLt(_) => relational::duration_lt(operands),
        Expression::DurationGte(_) => relational::duration_gte(operands),

        // Arithmetic
        Expression::Sum(_) => arithmetic::sum(operands),
        Expression::Product(_) => arithmetic::product(operands),
        Expression::Subtract(_) => arithmetic::subtract(operands),
        Expression::Divide(_) => arithmetic::divide(operands),
        Expression::Power(_) => arithmetic::power(operands),
        Expression::IntegerDivide(_) => arithmetic::integer_divide(operands),
        Expression::IntegerModulus(_) => arithmetic::integer_modulus(operands),
        Expression::IntegerToFloat(_) => arithmetic::integer_to_float(operands),
        Expression::Truncate(_) => arithmetic::truncate(operands),
        Expression::Round(_) => arithmetic::round(operands),
        Expression::RoundTo {
            figures,
            rounding_mode,
            ..
        } => arithmetic::round_to(ctx, operands, figures, *rounding_mode),
        Expression::Gcd(_) => arithmetic::gcd(operands),
        Expression::Lcm(_) => arithmetic::lcm(operands),
        Expression::Min(_) => arithmetic::min(operands),
        Expression::Max(_) => arithmetic::max(operands),
        Expression::MathOperator { name, .. } => math::math_operator(operands, *name),
        Expression::StatsOperator { name, .. } => math::stats_operator(operands, *name),

        // Containers
        Expression::Multiple(_) => container::multiple(operands),
        Expression::Ordered(_) => container::ordered(operands),
        Expression::ContainerSize(_) => container::container_size(operands),
        Expression::IsNull(_) => container::is_null(operands),
        Expression::Delete(_) => container::delete(operands),
        Expression::Member(_) => container::member(operands),
        Expression::Contains(_) => container::contains(operands),
        Expression::Index { n, .. } => container::index(ctx, operands, n),
        Expression::Repeat { .. } => container::repeat(operands),
        Expression::Random(_) => container::random(ctx, operands),
        Expression::FieldValue {
            field_identifier, ..
        } => container::field_value(operands, field_identifier),
        Expression::Inside { coords, .. } => container::inside(operands, coords),
    }
}

use crate::ast::{Arity, Expression, ExpressionKind};
use crate::eval::error::{EvalError, EvalResult};

/// An expression bound to the processor of its kind.
///
/// Binding fails when the expression is of another kind or carries an
/// operand count outside the kind's arity, before anything is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct Processor<'e> {
    kind: ExpressionKind,
    expression: &'e Expression,
}

impl<'e> Processor<'e> {
    pub fn bind(kind: ExpressionKind, expression: &'e Expression) -> EvalResult<Self> {
        let found = expression.kind();
        if found != kind {
            return Err(EvalError::WrongExpressionKind {
                expected: kind,
                found,
            });
        }
        let arity = kind.arity();
        let count = expression.operands().len();
        if !arity.accepts(count) {
            return Err(EvalError::Arity {
                operator: kind,
                expected: arity.to_string(),
                found: count,
            });
        }
        Ok(Self { kind, expression })
    }

    pub fn kind(&self) -> ExpressionKind {
        self.kind
    }

    pub fn arity(&self) -> Arity {
        self.kind.arity()
    }

    pub fn expression(&self) -> &'e Expression {
        self.expression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    #[test]
    fn test_bind_checks_kind() {
        let expr = Expression::Not(vec![Expression::base_value(true)]);
        match Processor::bind(ExpressionKind::And, &expr) {
            Err(EvalError::WrongExpressionKind { expected, found }) => {
                assert_eq!(expected, ExpressionKind::And);
                assert_eq!(found, ExpressionKind::Not);
            }
            other => panic!("Expected WrongExpressionKind, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_checks_arity() {
        let expr = Expression::Not(vec![
            Expression::base_value(true),
            Expression::base_value(false),
        ]);
        match Processor::bind(ExpressionKind::Not, &expr) {
            Err(EvalError::Arity {
                operator,
                expected,
                found,
            }) => {
                assert_eq!(operator, ExpressionKind::Not);
                assert_eq!(expected, "exactly 1");
                assert_eq!(found, 2);
            }
            other => panic!("Expected Arity error, got {:?}", other),
        }

        let empty_and = Expression::And(vec![]);
        assert!(Processor::bind(ExpressionKind::And, &empty_and).is_err());
    }

    #[test]
    fn test_bind_accepts_valid_expression() {
        let expr = Expression::Multiple(vec![]);
        let processor = Processor::bind(ExpressionKind::Multiple, &expr).unwrap();
        assert_eq!(processor.kind(), ExpressionKind::Multiple);
        assert_eq!(processor.arity().to_string(), "at least 0");

        let leaf = Expression::BaseValue(Scalar::Integer(1));
        assert!(Processor::bind(ExpressionKind::BaseValue, &leaf).is_ok());
    }
}

use thiserror::Error;

use crate::ast::ExpressionKind;
use crate::value::ValueError;

/// Failures raised while binding or evaluating an expression. Every variant
/// names the evaluator that raised it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("The {expected} processor cannot process a {found} expression")]
    WrongExpressionKind {
        expected: ExpressionKind,
        found: ExpressionKind,
    },

    #[error("The {operator} operator takes {expected} operands, {found} given")]
    Arity {
        operator: ExpressionKind,
        expected: String,
        found: usize,
    },

    #[error("The {operator} operator only accepts operands {constraint}")]
    OperandShape {
        operator: ExpressionKind,
        constraint: String,
    },

    #[error("The {operator} expression: variable '{identifier}' is not a {expected} variable")]
    WrongVariableType {
        operator: ExpressionKind,
        identifier: String,
        expected: String,
    },

    #[error("The {operator} expression: variable '{identifier}' {message}")]
    WrongVariableBaseType {
        operator: ExpressionKind,
        identifier: String,
        message: String,
    },

    #[error("The {operator} expression: variable '{identifier}' is inconsistent: {message}")]
    InconsistentVariable {
        operator: ExpressionKind,
        identifier: String,
        message: String,
    },

    #[error("The {operator} expression: no variable with identifier '{identifier}'")]
    NonexistentVariable {
        operator: ExpressionKind,
        identifier: String,
    },

    #[error("The {operator} operator: {message}")]
    Logic {
        operator: ExpressionKind,
        message: String,
    },

    #[error("Expression nesting exceeds the configured depth of {limit} at {operator}")]
    DepthExceeded {
        operator: ExpressionKind,
        limit: usize,
    },
}

impl EvalError {
    pub fn operand_shape(operator: ExpressionKind, constraint: impl Into<String>) -> Self {
        Self::OperandShape {
            operator,
            constraint: constraint.into(),
        }
    }

    pub fn logic(operator: ExpressionKind, message: impl Into<String>) -> Self {
        Self::Logic {
            operator,
            message: message.into(),
        }
    }

    pub fn nonexistent_variable(operator: ExpressionKind, identifier: &str) -> Self {
        Self::NonexistentVariable {
            operator,
            identifier: identifier.to_string(),
        }
    }

    pub fn inconsistent_variable(
        operator: ExpressionKind,
        identifier: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::InconsistentVariable {
            operator,
            identifier: identifier.to_string(),
            message: message.into(),
        }
    }

    /// Result containers are only ever built from checked operands, so a
    /// baseType clash while building one is an operand shape problem.
    pub fn from_value(operator: ExpressionKind, error: ValueError) -> Self {
        Self::operand_shape(operator, format!("of one baseType ({})", error))
    }

    /// The evaluator that raised the error.
    pub fn operator(&self) -> ExpressionKind {
        match self {
            Self::WrongExpressionKind { expected, .. } => *expected,
            Self::Arity { operator, .. }
            | Self::OperandShape { operator, .. }
            | Self::WrongVariableType { operator, .. }
            | Self::WrongVariableBaseType { operator, .. }
            | Self::InconsistentVariable { operator, .. }
            | Self::NonexistentVariable { operator, .. }
            | Self::Logic { operator, .. }
            | Self::DepthExceeded { operator, .. } => *operator,
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

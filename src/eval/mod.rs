//! Expression Evaluation
//!
//! Turns an already-parsed [`Expression`](crate::ast::Expression) tree into a
//! runtime value, reproducing QTI's NULL propagation and type rules.
//!
//! # Core Components
//!
//! ## Evaluator
//! Walks the tree depth first and owns the random source. Every node is bound
//! to its processor before any of its operands are evaluated.
//!
//! ## Processor
//! Binding of one expression to the processor of its kind, with the operand
//! count checked against the kind's arity.
//!
//! ## Operands
//! The evaluated operands of one call, with the classification predicates
//! every processor uses to check their shape.
//!
//! ## Processors
//! One function per operator, grouped into logic, relational, arithmetic,
//! math, container, random and variable families.
//!
//! ## Evaluation Context
//! Read-only variable lookup plus the injected random source, the only
//! things a processor may consult besides its operands.
//!
//! # Evaluation Pipeline
//!
//! 1. The Evaluator binds the node to its processor (kind and arity checks)
//! 2. Operands are evaluated recursively and normalized
//! 3. The processor applies NULL propagation, then checks operand shapes
//! 4. The result is returned, or a typed [`EvalError`](error::EvalError) naming the processor

pub mod context;
pub mod error;
pub mod evaluator;
pub mod operands;
pub mod processor;
pub mod processors;

pub use context::{EvaluationContext, ItemState, TestState, VariableStore};
pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use operands::Operands;
pub use processor::Processor;

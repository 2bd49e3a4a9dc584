//! # qti-expr: QTI Expression Evaluation
//!
//! Evaluates the response and outcome processing expression language of IMS
//! QTI over a typed value model, so that independently built engines score
//! candidates identically.
//!
//! ## Components
//!
//! - Value model ([`value`]): scalars, the multiple/ordered/record
//!   containers, and NULL normalization
//! - Declarations ([`declaration`]): variables with their mappings and area
//!   mappings
//! - Geometry ([`geometry`]): the shapes used by `inside` and
//!   `mapResponsePoint`
//! - Expression trees ([`ast`]): one variant per operator, deserializable
//!   from JSON
//! - Evaluation ([`eval`]): binding, operand classification and the operator
//!   library
//! - Configuration ([`config`]) and errors ([`error`])
//!
//! ## Example
//!
//! ```
//! use qti_expr::{Evaluator, Expression, ItemState, Value};
//!
//! let store = ItemState::new();
//! let expr = Expression::Sum(vec![Expression::base_value(1i64), Expression::base_value(2.5)]);
//! let result = Evaluator::new(&store).evaluate(&expr).unwrap();
//! assert_eq!(result, Some(Value::float(3.5)));
//! ```
pub mod ast;
pub mod config;
pub mod declaration;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod value;

// Re-exports
pub use ast::*;
pub use config::EngineConfig;
pub use declaration::*;
pub use error::*;
pub use eval::*;
pub use value::{BaseType, Cardinality, Container, Point, Record, Scalar, Value};

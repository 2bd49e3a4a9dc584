//! One function per operator, grouped by family. Processors receive already
//! evaluated [`Operands`](crate::eval::operands::Operands) and never recurse.

pub mod arithmetic;
pub mod container;
pub mod logic;
pub mod math;
pub mod random;
pub mod relational;
pub mod variable;

//! # Front end
//!
//! Functions are not parsed from text. A host declares them with
//! [`Function`], builds each body as an [`Expr`] tree and compiles it into a
//! supercombinator table.

pub mod expr;
pub mod function;

pub use expr::{Expr, arg, call, if_, lit};
pub use function::Function;

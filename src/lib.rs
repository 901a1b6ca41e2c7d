//! # gmachine
//!
//! A small lazy graph-reduction machine. Functions are declared with a fixed
//! arity, given a body built from argument references, integer literals and
//! calls, compiled once into supercombinator code, and evaluated on demand:
//! an argument is reduced only when an instruction needs its value, and a
//! shared sub-expression is reached through the same heap node rather than
//! copied.
//!
//! ```no_run
//! use gmachine::{Function, arg, if_};
//!
//! let fact = Function::new(1);
//! fact.define(arg(0) * if_(arg(0).equals(1), 1, fact.call([arg(0) - 1])))
//!     .unwrap();
//! assert_eq!(fact.exec(&[10]), Ok(3_628_800));
//! ```
//!
//! ## Modules
//!
//! - `lang`: expression trees and declared-function handles
//! - `bytecode`: instruction set, supercombinator table, builtins, compiler
//! - `runtime`: heap, the machine itself and its faults

pub mod bytecode;
pub mod lang;
pub mod runtime;

pub use bytecode::{GlobalId, ScTable};
pub use lang::{Expr, Function, arg, call, if_, lit};
pub use runtime::{EvalStats, FaultKind, GmError, Machine, MachineConfig, Step};

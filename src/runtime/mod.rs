pub mod heap;
pub mod machine;
pub mod runtime_error;

pub use machine::{EvalStats, Machine, MachineConfig, Step};
pub use runtime_error::{FaultKind, GmError};

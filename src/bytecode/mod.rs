pub mod builtins;
pub mod code;
pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod instr;
pub mod stack_check;
pub mod table;

pub use code::CodeStack;
pub use instr::{Addr, GlobalId, Instr};
pub use table::{ScTable, Supercombinator};

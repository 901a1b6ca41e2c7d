use crate::bytecode::GlobalId;
use crate::runtime::heap::NodeKind;

/// Coarse classification of a [`GmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Under-saturated supercombinator application
    Arity,
    /// A number was required but something else reached WHNF
    Type,
    /// The code ran out without leaving a lone number
    Stuck,
    /// Code that violates the machine's stack discipline
    Malformed,
    /// Division by zero or integer overflow
    Arithmetic,
    /// `exec` called with the wrong number of arguments
    Call,
    /// A limit set in the machine's config was hit
    Limit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GmError {
    #[error(
        "arity fault: {global} expects {arity} argument(s) but only {available} are on the stack"
    )]
    Arity {
        global: GlobalId,
        arity: usize,
        available: usize,
    },

    #[error("type fault: {instr} expected a number, found {found}")]
    Type {
        instr: &'static str,
        found: NodeKind,
    },

    #[error(
        "stuck program: code exhausted with {stack_depth} node(s) on the stack and {dump_depth} suspended frame(s)"
    )]
    Stuck {
        stack_depth: usize,
        dump_depth: usize,
    },

    #[error("stack underflow: {instr} needs {needed} node(s), found {available}")]
    StackUnderflow {
        instr: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("PUSH ARG {offset}: slot {slot} holds a {found}, not an application")]
    NotAnApplication {
        offset: usize,
        slot: usize,
        found: NodeKind,
    },

    #[error("unknown supercombinator {0}")]
    UnknownGlobal(GlobalId),

    #[error("supercombinator {0} was declared but never compiled")]
    NotCompiled(GlobalId),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {instr}")]
    Overflow { instr: &'static str },

    #[error("{global} takes {expected} argument(s), {got} given")]
    ArgumentCount {
        global: GlobalId,
        expected: usize,
        got: usize,
    },

    #[error("execution step limit exceeded ({limit})")]
    StepLimit { limit: u64 },

    #[error("dump depth limit exceeded ({limit})")]
    DumpLimit { limit: usize },
}

impl GmError {
    pub fn kind(&self) -> FaultKind {
        match self {
            GmError::Arity { .. } => FaultKind::Arity,
            GmError::Type { .. } => FaultKind::Type,
            GmError::Stuck { .. } => FaultKind::Stuck,
            GmError::StackUnderflow { .. }
            | GmError::NotAnApplication { .. }
            | GmError::UnknownGlobal(_)
            | GmError::NotCompiled(_) => FaultKind::Malformed,
            GmError::DivisionByZero | GmError::Overflow { .. } => FaultKind::Arithmetic,
            GmError::ArgumentCount { .. } => FaultKind::Call,
            GmError::StepLimit { .. } | GmError::DumpLimit { .. } => FaultKind::Limit,
        }
    }
}

pub fn arity_fault(global: GlobalId, arity: usize, stack_depth: usize) -> GmError {
    // the supercombinator node itself occupies one slot
    GmError::Arity {
        global,
        arity,
        available: stack_depth.saturating_sub(1),
    }
}

pub fn type_error(instr: &'static str, found: NodeKind) -> GmError {
    GmError::Type { instr, found }
}

pub fn stack_underflow(instr: &'static str, needed: usize, available: usize) -> GmError {
    GmError::StackUnderflow {
        instr,
        needed,
        available,
    }
}

pub fn division_by_zero() -> GmError {
    GmError::DivisionByZero
}

pub fn overflow(instr: &'static str) -> GmError {
    GmError::Overflow { instr }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_fault_counts_arguments_only() {
        let err = arity_fault(GlobalId(8), 2, 2);
        assert_eq!(
            err,
            GmError::Arity {
                global: GlobalId(8),
                arity: 2,
                available: 1,
            }
        );
        assert_eq!(err.kind(), FaultKind::Arity);
        assert!(err.to_string().contains("expects 2 argument(s)"));
    }

    #[test]
    fn test_kinds_are_distinct_for_core_faults() {
        assert_eq!(type_error("ADD", NodeKind::Global).kind(), FaultKind::Type);
        let stuck = GmError::Stuck {
            stack_depth: 2,
            dump_depth: 0,
        };
        assert_eq!(stuck.kind(), FaultKind::Stuck);
        assert_eq!(GmError::StepLimit { limit: 10 }.kind(), FaultKind::Limit);
        assert_eq!(division_by_zero().kind(), FaultKind::Arithmetic);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            type_error("COND", NodeKind::Application).to_string(),
            "type fault: COND expected a number, found application"
        );
        assert_eq!(
            stack_underflow("MKAP", 2, 1).to_string(),
            "stack underflow: MKAP needs 2 node(s), found 1"
        );
    }
}

use crate::bytecode::{GlobalId, stack_check::StackCheckError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// An argument reference past the function's arity
    #[error("compile error: argument {index} referenced in a function of arity {arity}")]
    ArgumentOutOfRange { index: usize, arity: usize },

    /// A call to an id the table has never declared
    #[error("compile error: call to unknown function {global}")]
    UnknownFunction { global: GlobalId },

    /// Compiling or installing into an id the table has never declared
    #[error("compile error: function {global} was not declared in this table")]
    NotDeclared { global: GlobalId },

    /// Generated or hand-assembled code failed verification
    #[error("compile error: {0}")]
    StackCheck(#[from] StackCheckError),
}

impl CompileError {
    pub fn argument_out_of_range(index: usize, arity: usize) -> Self {
        CompileError::ArgumentOutOfRange { index, arity }
    }

    pub fn unknown_function(global: GlobalId) -> Self {
        CompileError::UnknownFunction { global }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CompileError::argument_out_of_range(3, 2);
        assert_eq!(
            err.to_string(),
            "compile error: argument 3 referenced in a function of arity 2"
        );

        let err = CompileError::unknown_function(GlobalId(42));
        assert!(err.to_string().contains("$42"));
    }
}

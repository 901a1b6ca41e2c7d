use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a supercombinator: its index in the [`ScTable`](super::ScTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlobalId(pub usize);

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

// =============================================================================
// ADDR - what a PUSH instruction pushes
// =============================================================================

/// Operand of [`Instr::Push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addr {
    /// A reference to a supercombinator.
    Global(GlobalId),

    /// A fresh number node.
    Literal(i64),

    /// The argument of the application `n + 1` slots below the top.
    ///
    /// Stack effect: `( app_n+1 .. app_1 x -- app_n+1 .. app_1 x arg )`
    Arg(usize),

    /// An alias of the node `n` slots below the top.
    Local(usize),
}

// =============================================================================
// INSTR - G-machine instructions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Push(Addr),

    /// ( f x -- f@x )
    Mkap,

    /// Keep the top node and drop the `n` nodes beneath it.
    Slide(usize),

    /// Pop a number; continue with `then_code` if it is nonzero, `else_code` otherwise.
    /// Both branches are stored in execution order.
    Cond {
        then_code: Vec<Instr>,
        else_code: Vec<Instr>,
    },

    /// Force the top node to WHNF on a fresh stack, suspending the current one on the dump.
    Eval,

    // arithmetic: ( b a -- b OP a )
    Add,
    Sub,
    Mul,
    Div,
    Equ,

    Unwind,
}

impl Instr {
    pub fn push_global(id: GlobalId) -> Self {
        Instr::Push(Addr::Global(id))
    }

    pub fn push_literal(value: i64) -> Self {
        Instr::Push(Addr::Literal(value))
    }

    pub fn push_arg(offset: usize) -> Self {
        Instr::Push(Addr::Arg(offset))
    }

    pub fn push_local(offset: usize) -> Self {
        Instr::Push(Addr::Local(offset))
    }

    /// Upper-case mnemonic used by the disassembler and in fault messages.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instr::Push(_) => "PUSH",
            Instr::Mkap => "MKAP",
            Instr::Slide(_) => "SLIDE",
            Instr::Cond { .. } => "COND",
            Instr::Eval => "EVAL",
            Instr::Add => "ADD",
            Instr::Sub => "SUB",
            Instr::Mul => "MUL",
            Instr::Div => "DIV",
            Instr::Equ => "EQU",
            Instr::Unwind => "UNWIND",
        }
    }

    pub fn is_binop(&self) -> bool {
        matches!(
            self,
            Instr::Add | Instr::Sub | Instr::Mul | Instr::Div | Instr::Equ
        )
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addr::Global(id) => write!(f, "GLOBAL {}", id),
            Addr::Literal(v) => write!(f, "LITERAL {}", v),
            Addr::Arg(n) => write!(f, "ARG {}", n),
            Addr::Local(n) => write!(f, "LOCAL {}", n),
        }
    }
}

impl fmt::Display for Instr {
    /// Single-line form; COND branches are shown inline in brackets.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Push(addr) => write!(f, "PUSH {}", addr),
            Instr::Slide(n) => write!(f, "SLIDE {}", n),
            Instr::Cond {
                then_code,
                else_code,
            } => {
                write!(f, "COND [")?;
                write_inline(f, then_code)?;
                write!(f, "] [")?;
                write_inline(f, else_code)?;
                write!(f, "]")
            }
            other => write!(f, "{}", other.mnemonic()),
        }
    }
}

fn write_inline(f: &mut fmt::Formatter<'_>, code: &[Instr]) -> fmt::Result {
    for (i, instr) in code.iter().enumerate() {
        if i > 0 {
            write!(f, "; ")?;
        }
        write!(f, "{}", instr)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_push_modes() {
        assert_eq!(Instr::push_global(GlobalId(7)).to_string(), "PUSH GLOBAL $7");
        assert_eq!(Instr::push_literal(-3).to_string(), "PUSH LITERAL -3");
        assert_eq!(Instr::push_arg(2).to_string(), "PUSH ARG 2");
        assert_eq!(Instr::push_local(0).to_string(), "PUSH LOCAL 0");
    }

    #[test]
    fn test_display_cond_inline() {
        let cond = Instr::Cond {
            then_code: vec![Instr::push_arg(1)],
            else_code: vec![Instr::push_arg(2), Instr::Eval],
        };
        assert_eq!(cond.to_string(), "COND [PUSH ARG 1] [PUSH ARG 2; EVAL]");
    }

    #[test]
    fn test_binop_classification() {
        assert!(Instr::Equ.is_binop());
        assert!(Instr::Div.is_binop());
        assert!(!Instr::Mkap.is_binop());
        assert!(!Instr::Slide(3).is_binop());
    }
}

//! Pre-compiled supercombinators every table starts with.
//!
//! Their ids are fixed, so expression builders can reference them without a
//! user definition.

use crate::bytecode::{GlobalId, Instr, Supercombinator};

pub const ADD: GlobalId = GlobalId(0);
pub const SUB: GlobalId = GlobalId(1);
pub const DIV: GlobalId = GlobalId(2);
pub const MUL: GlobalId = GlobalId(3);
pub const EQU: GlobalId = GlobalId(4);
pub const IF: GlobalId = GlobalId(5);

/// Number of builtin entries; the first user id.
pub const COUNT: usize = 6;

/// Builtin supercombinators, indexed by their id.
pub fn entries() -> Vec<Supercombinator> {
    vec![
        binop(Instr::Add),
        binop(Instr::Sub),
        binop(Instr::Div),
        binop(Instr::Mul),
        binop(Instr::Equ),
        if_then_else(),
    ]
}

/// Name shown by the disassembler, or `None` for user ids.
pub fn name(id: GlobalId) -> Option<&'static str> {
    Some(match id {
        ADD => "add",
        SUB => "sub",
        DIV => "div",
        MUL => "mul",
        EQU => "equ",
        IF => "if",
        _ => return None,
    })
}

/// `( f@x@y -- x OP y )` with both operands forced.
///
/// The second operand is read with `ARG 2`: after the first EVAL its value
/// sits on top of the spine, one slot deeper than at entry.
fn binop(op: Instr) -> Supercombinator {
    Supercombinator::new(
        2,
        vec![
            Instr::push_arg(0),
            Instr::Eval,
            Instr::push_arg(2),
            Instr::Eval,
            op,
            Instr::Slide(3),
            Instr::Unwind,
        ],
    )
}

/// `if c t e`: forces `c`, then only the selected branch.
fn if_then_else() -> Supercombinator {
    Supercombinator::new(
        3,
        vec![
            Instr::push_arg(0),
            Instr::Eval,
            Instr::Cond {
                then_code: vec![Instr::push_arg(1)],
                else_code: vec![Instr::push_arg(2)],
            },
            Instr::Eval,
            Instr::Slide(4),
            Instr::Unwind,
        ],
    )
}

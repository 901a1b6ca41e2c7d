use crate::bytecode::Instr;

/// Pending instructions, stored execution-order-reversed so the next
/// instruction is popped from the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeStack {
    rev: Vec<Instr>,
}

impl CodeStack {
    pub fn new() -> Self {
        Self { rev: Vec::new() }
    }

    /// Build from a sequence given in execution order.
    pub fn from_ordered(mut ordered: Vec<Instr>) -> Self {
        ordered.reverse();
        Self { rev: ordered }
    }

    /// A code stack holding only `UNWIND`.
    pub fn unwind() -> Self {
        Self {
            rev: vec![Instr::Unwind],
        }
    }

    pub fn pop(&mut self) -> Option<Instr> {
        self.rev.pop()
    }

    /// Schedule `ordered` to run before everything already pending.
    pub fn prepend(&mut self, ordered: &[Instr]) {
        self.rev.extend(ordered.iter().rev().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.rev.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rev.len()
    }

    pub fn clear(&mut self) {
        self.rev.clear();
    }

    /// Instructions in the order they will execute.
    pub fn iter(&self) -> impl Iterator<Item = &Instr> {
        self.rev.iter().rev()
    }

    pub fn to_ordered(&self) -> Vec<Instr> {
        self.iter().cloned().collect()
    }
}

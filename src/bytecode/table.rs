use std::sync::{LazyLock, RwLock};

use crate::bytecode::{
    CodeStack, GlobalId, Instr, builtins, compile_error::CompileError, stack_check::check_code,
};

/// A compiled function body with its declared arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supercombinator {
    pub arity: usize,
    pub code: CodeStack,
}

impl Supercombinator {
    /// `code` is given in execution order.
    pub fn new(arity: usize, code: Vec<Instr>) -> Self {
        Self {
            arity,
            code: CodeStack::from_ordered(code),
        }
    }

    /// A reserved entry: arity known, body not compiled yet.
    pub fn declared(arity: usize) -> Self {
        Self {
            arity,
            code: CodeStack::new(),
        }
    }

    pub fn is_compiled(&self) -> bool {
        !self.code.is_empty()
    }
}

/// Registry from [`GlobalId`] to [`Supercombinator`].
///
/// Entries are appended at declaration time, so a body may reference its own
/// id before it is compiled. The machine only reads the table.
#[derive(Debug, Clone)]
pub struct ScTable {
    entries: Vec<Supercombinator>,
}

impl Default for ScTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScTable {
    /// A table holding only the builtin library.
    pub fn new() -> Self {
        Self {
            entries: builtins::entries(),
        }
    }

    /// Reserve a fresh id with an empty body.
    pub fn declare(&mut self, arity: usize) -> GlobalId {
        let id = GlobalId(self.entries.len());
        self.entries.push(Supercombinator::declared(arity));
        id
    }

    /// Replace the code of a declared entry.
    pub fn install(&mut self, id: GlobalId, sc: Supercombinator) -> Result<(), CompileError> {
        let slot = self
            .entries
            .get_mut(id.0)
            .ok_or(CompileError::NotDeclared { global: id })?;
        *slot = sc;
        Ok(())
    }

    /// Declare and install a hand-assembled body in one step.
    ///
    /// The code is stack-checked first; nothing is declared if it fails.
    pub fn define_raw(&mut self, arity: usize, code: Vec<Instr>) -> Result<GlobalId, CompileError> {
        check_code(arity, &code)?;
        let id = self.declare(arity);
        self.install(id, Supercombinator::new(arity, code))?;
        Ok(id)
    }

    pub fn get(&self, id: GlobalId) -> Option<&Supercombinator> {
        self.entries.get(id.0)
    }

    pub fn contains(&self, id: GlobalId) -> bool {
        id.0 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GlobalId, &Supercombinator)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, sc)| (GlobalId(i), sc))
    }
}

static GLOBAL: LazyLock<RwLock<ScTable>> = LazyLock::new(|| RwLock::new(ScTable::new()));

/// The process-wide table used by [`Function::new`](crate::Function::new) and friends.
///
/// Writers (declare/compile) take the write lock; running machines hold the
/// read lock for the length of one evaluation.
pub fn global() -> &'static RwLock<ScTable> {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_holds_builtins() {
        let table = ScTable::new();
        assert_eq!(table.len(), builtins::COUNT);
        assert!(table.iter().all(|(_, sc)| sc.is_compiled()));
    }

    #[test]
    fn test_declare_reserves_sequential_ids() {
        let mut table = ScTable::new();
        let a = table.declare(1);
        let b = table.declare(0);
        assert_eq!(a, GlobalId(builtins::COUNT));
        assert_eq!(b, GlobalId(builtins::COUNT + 1));

        let entry = table.get(a).expect("declared entry");
        assert_eq!(entry.arity, 1);
        assert!(!entry.is_compiled());
    }

    #[test]
    fn test_install_unknown_id() {
        let mut table = ScTable::new();
        let err = table
            .install(GlobalId(99), Supercombinator::declared(0))
            .unwrap_err();
        assert!(matches!(err, CompileError::NotDeclared { global } if global == GlobalId(99)));
    }

    #[test]
    fn test_define_raw_rejects_bad_code() {
        let mut table = ScTable::new();
        let before = table.len();
        assert!(table.define_raw(0, vec![Instr::Mkap, Instr::Unwind]).is_err());
        assert_eq!(table.len(), before);
    }

    #[test]
    fn test_define_raw_installs() {
        let mut table = ScTable::new();
        let id = table
            .define_raw(
                0,
                vec![Instr::push_literal(9), Instr::Slide(1), Instr::Unwind],
            )
            .unwrap();
        assert!(table.get(id).unwrap().is_compiled());
    }
}

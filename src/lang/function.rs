use std::sync::PoisonError;

use tracing::info;

use crate::bytecode::{
    GlobalId, ScTable, builtins, compile::compile_into, compile_error::CompileError, table,
};
use crate::lang::expr::{Expr, call};
use crate::runtime::{EvalStats, GmError, Machine, MachineConfig};

/// A declared function: a table id plus the arity it was declared with.
///
/// Declaring reserves the id immediately, so the body passed to
/// [`define`](Self::define) may call the function itself.
///
/// The plain methods work on the process-wide table from
/// [`table::global`]; the `*_in` variants take an explicit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Function {
    id: GlobalId,
    arity: usize,
}

impl Function {
    pub const ADD: Function = Function::builtin(builtins::ADD, 2);
    pub const SUB: Function = Function::builtin(builtins::SUB, 2);
    pub const MUL: Function = Function::builtin(builtins::MUL, 2);
    pub const DIV: Function = Function::builtin(builtins::DIV, 2);
    pub const EQU: Function = Function::builtin(builtins::EQU, 2);
    /// `if c t e`, present in every table.
    pub const IF: Function = Function::builtin(builtins::IF, 3);

    const fn builtin(id: GlobalId, arity: usize) -> Self {
        Self { id, arity }
    }

    /// Declare a function of `arity` parameters in the global table.
    pub fn new(arity: usize) -> Self {
        let mut table = table::global()
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Self::declare_in(&mut table, arity)
    }

    pub fn declare_in(table: &mut ScTable, arity: usize) -> Self {
        Self {
            id: table.declare(arity),
            arity,
        }
    }

    pub fn id(&self) -> GlobalId {
        self.id
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// An expression applying this function to `args`.
    pub fn call(&self, args: impl IntoIterator<Item = Expr>) -> Expr {
        call(self.id, args)
    }

    /// Compile `body` into the global table. Returns `self` so an anonymous
    /// function can be defined and called in one expression.
    pub fn define(self, body: Expr) -> Result<Self, CompileError> {
        let mut table = table::global()
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.compile_in(&mut table, body)
    }

    pub fn compile_in(self, table: &mut ScTable, body: Expr) -> Result<Self, CompileError> {
        match table.get(self.id) {
            Some(sc) if sc.arity == self.arity => {}
            _ => return Err(CompileError::NotDeclared { global: self.id }),
        }
        compile_into(table, self.id, &body)?;
        Ok(self)
    }

    /// Apply the function to `args` using the global table.
    pub fn exec(&self, args: &[i64]) -> Result<i64, GmError> {
        let table = table::global()
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        self.exec_in(&table, args)
    }

    pub fn exec_in(&self, table: &ScTable, args: &[i64]) -> Result<i64, GmError> {
        self.exec_with(table, args, MachineConfig::default())
            .map(|(value, _)| value)
    }

    /// Run under `config` and return the counters of the run with the result.
    pub fn exec_with(
        &self,
        table: &ScTable,
        args: &[i64],
        config: MachineConfig,
    ) -> Result<(i64, EvalStats), GmError> {
        info!(global = %self.id, ?args, "exec");
        let mut machine = Machine::for_call(table, self.id, args, config)?;
        let value = machine.run()?;
        Ok((value, machine.stats().clone()))
    }
}

use tracing::debug;

use crate::{
    bytecode::{
        GlobalId, Instr, ScTable, Supercombinator, compile_error::CompileError,
        stack_check::check_code,
    },
    lang::expr::Expr,
};

/// Translates one function body into G-machine code.
pub struct Compiler<'t> {
    /// Table used to resolve call targets
    table: &'t ScTable,

    /// Arity of the function being compiled
    arity: usize,

    /// Nodes the emitted code has pushed above the call frame so far
    pushed: usize,

    /// Output, in execution order
    code: Vec<Instr>,
}

impl<'t> Compiler<'t> {
    pub fn new(table: &'t ScTable, arity: usize) -> Self {
        Self {
            table,
            arity,
            pushed: 0,
            code: Vec::new(),
        }
    }

    /// Compile `body` into a complete supercombinator body (execution order),
    /// ending in `SLIDE arity+1; UNWIND`.
    pub fn compile_body(mut self, body: &Expr) -> Result<Vec<Instr>, CompileError> {
        self.compile_expr(body)?;
        self.code.push(Instr::Slide(self.arity + 1));
        self.code.push(Instr::Unwind);

        check_code(self.arity, &self.code)?;
        Ok(self.code)
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Call { global, args } => {
                if !self.table.contains(*global) {
                    return Err(CompileError::unknown_function(*global));
                }
                self.emit_push(Instr::push_global(*global));
                for arg in args {
                    self.compile_expr(arg)?;
                    self.code.push(Instr::Mkap);
                    // two slots become one application
                    self.pushed -= 1;
                }
            }
            Expr::Literal(value) => self.emit_push(Instr::push_literal(*value)),
            Expr::Arg(n) => {
                if *n >= self.arity {
                    return Err(CompileError::argument_out_of_range(*n, self.arity));
                }
                self.emit_push(Instr::push_arg(n + self.pushed));
            }
        }
        Ok(())
    }

    fn emit_push(&mut self, instr: Instr) {
        self.code.push(instr);
        self.pushed += 1;
    }
}

/// Compile `body` for the declared entry `id` and install it, replacing any
/// previous code. The entry keeps its declared arity.
pub fn compile_into(table: &mut ScTable, id: GlobalId, body: &Expr) -> Result<(), CompileError> {
    let arity = table
        .get(id)
        .ok_or(CompileError::NotDeclared { global: id })?
        .arity;

    let code = Compiler::new(table, arity).compile_body(body)?;
    debug!(global = %id, arity, instructions = code.len(), "compiled supercombinator");

    table.install(id, Supercombinator::new(arity, code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::builtins;
    use crate::lang::expr::{arg, call, if_, lit};

    fn compile(table: &ScTable, arity: usize, body: &Expr) -> Vec<Instr> {
        Compiler::new(table, arity)
            .compile_body(body)
            .expect("body should compile")
    }

    #[test]
    fn test_compile_literal() {
        let table = ScTable::new();
        assert_eq!(
            compile(&table, 0, &lit(42)),
            vec![Instr::push_literal(42), Instr::Slide(1), Instr::Unwind]
        );
    }

    #[test]
    fn test_compile_identity() {
        let table = ScTable::new();
        assert_eq!(
            compile(&table, 1, &arg(0)),
            vec![Instr::push_arg(0), Instr::Slide(2), Instr::Unwind]
        );
    }

    #[test]
    fn test_arg_offsets_account_for_pushes() {
        // f x y = y - x
        let table = ScTable::new();
        let code = compile(&table, 2, &(arg(1) - arg(0)));
        assert_eq!(
            code,
            vec![
                Instr::push_global(builtins::SUB),
                Instr::push_arg(2),
                Instr::Mkap,
                Instr::push_arg(1),
                Instr::Mkap,
                Instr::Slide(3),
                Instr::Unwind,
            ]
        );
    }

    #[test]
    fn test_compile_factorial_shape() {
        let mut table = ScTable::new();
        let fact = table.declare(1);
        let body = arg(0) * if_(arg(0).equals(1), 1, call(fact, [arg(0) - 1]));
        let code = compile(&table, 1, &body);

        assert_eq!(code[0], Instr::push_global(builtins::MUL));
        assert_eq!(code[1], Instr::push_arg(1));
        // eq's first argument is three pushes deep: mul@x, if, equ
        assert_eq!(code[5], Instr::push_arg(3));
        assert!(code.contains(&Instr::push_global(fact)));
        assert_eq!(code[code.len() - 2], Instr::Slide(2));
        assert_eq!(code[code.len() - 1], Instr::Unwind);

        let mkaps = code.iter().filter(|i| **i == Instr::Mkap).count();
        // mul:2 if:3 equ:2 fact:1 sub:2
        assert_eq!(mkaps, 10);
    }

    #[test]
    fn test_zero_argument_call() {
        let mut table = ScTable::new();
        let omega = table.declare(0);
        assert_eq!(
            compile(&table, 0, &call(omega, [])),
            vec![Instr::push_global(omega), Instr::Slide(1), Instr::Unwind]
        );
    }

    #[test]
    fn test_arg_out_of_range() {
        let table = ScTable::new();
        let err = Compiler::new(&table, 1)
            .compile_body(&(arg(0) + arg(1)))
            .unwrap_err();
        assert_eq!(err, CompileError::argument_out_of_range(1, 1));
    }

    #[test]
    fn test_unknown_function() {
        let table = ScTable::new();
        let err = Compiler::new(&table, 0)
            .compile_body(&call(GlobalId(500), []))
            .unwrap_err();
        assert_eq!(err, CompileError::unknown_function(GlobalId(500)));
    }

    #[test]
    fn test_compile_into_installs_and_replaces() {
        let mut table = ScTable::new();
        let f = table.declare(1);

        compile_into(&mut table, f, &(arg(0) + 1)).unwrap();
        let first = table.get(f).unwrap().clone();
        assert!(first.is_compiled());
        assert_eq!(first.arity, 1);

        compile_into(&mut table, f, &arg(0)).unwrap();
        let second = table.get(f).unwrap();
        assert_ne!(&first, second);
        assert_eq!(second.code.len(), 3);
    }

    #[test]
    fn test_compile_into_undeclared() {
        let mut table = ScTable::new();
        let err = compile_into(&mut table, GlobalId(77), &lit(1)).unwrap_err();
        assert_eq!(err, CompileError::NotDeclared { global: GlobalId(77) });
    }
}

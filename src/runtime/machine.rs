use std::collections::{BTreeMap, HashMap};
use std::mem;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::bytecode::{Addr, CodeStack, GlobalId, Instr, ScTable};
use crate::runtime::heap::{Heap, Node, NodeId};
use crate::runtime::runtime_error::{
    GmError, arity_fault, division_by_zero, overflow, stack_underflow, type_error,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Stop with [`GmError::StepLimit`] after this many instructions.
    /// `None` lets a diverging program run forever.
    pub max_steps: Option<u64>,

    /// Stop with [`GmError::DumpLimit`] when nested forcing gets this deep.
    pub max_dump_depth: Option<usize>,

    /// Remember the WHNF of every node forced by EVAL, and of every node a
    /// tail call reduces in its place, so a shared sub-expression is reduced
    /// at most once per run.
    pub share_forced: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            max_steps: None,
            max_dump_depth: None,
            share_forced: true,
        }
    }
}

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvalStats {
    /// Instructions executed
    pub steps: u64,
    pub unwinds: u64,
    /// EVALs that suspended the current context
    pub evals: u64,
    /// EVALs and UNWINDs answered from the shared-result memo
    pub memo_hits: u64,
    pub heap_nodes: usize,
    pub max_dump_depth: usize,
    /// Times each supercombinator's code was entered
    pub reductions: BTreeMap<GlobalId, u64>,
}

impl EvalStats {
    pub fn reductions_of(&self, global: GlobalId) -> u64 {
        self.reductions.get(&global).copied().unwrap_or(0)
    }
}

/// Result of a single [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Running,
    Done(i64),
}

/// A context suspended by EVAL.
#[derive(Debug)]
struct DumpFrame {
    code: CodeStack,
    stack: Vec<NodeId>,
    /// Nodes whose WHNF the nested context computes: the node given to
    /// EVAL, then each node a tail call leaves at the bottom of the stack
    roots: Vec<NodeId>,
}

/// The G-machine.
///
/// The operand stack keeps its top at the end of the vector; `peek(k)` reads
/// the k-th node from the top.
pub struct Machine<'t> {
    table: &'t ScTable,
    heap: Heap,
    stack: Vec<NodeId>,
    dump: Vec<DumpFrame>,
    code: CodeStack,
    memo: HashMap<NodeId, NodeId>,
    config: MachineConfig,
    stats: EvalStats,
}

impl<'t> Machine<'t> {
    pub fn new(table: &'t ScTable) -> Self {
        Self::with_config(table, MachineConfig::default())
    }

    pub fn with_config(table: &'t ScTable, config: MachineConfig) -> Self {
        Self {
            table,
            heap: Heap::new(),
            stack: Vec::new(),
            dump: Vec::new(),
            code: CodeStack::new(),
            memo: HashMap::new(),
            config,
            stats: EvalStats::default(),
        }
    }

    /// A machine set up to apply `global` to integer `args`.
    pub fn for_call(
        table: &'t ScTable,
        global: GlobalId,
        args: &[i64],
        config: MachineConfig,
    ) -> Result<Self, GmError> {
        let sc = table.get(global).ok_or(GmError::UnknownGlobal(global))?;
        if args.len() != sc.arity {
            return Err(GmError::ArgumentCount {
                global,
                expected: sc.arity,
                got: args.len(),
            });
        }

        let mut code = Vec::with_capacity(args.len() * 2 + 2);
        code.push(Instr::push_global(global));
        for &arg in args {
            code.push(Instr::push_literal(arg));
            code.push(Instr::Mkap);
        }
        code.push(Instr::Unwind);

        let mut machine = Self::with_config(table, config);
        machine.load(code);
        Ok(machine)
    }

    /// Discard all state and schedule `code` (execution order) to run.
    pub fn load(&mut self, code: Vec<Instr>) {
        self.heap = Heap::new();
        self.stack.clear();
        self.dump.clear();
        self.memo.clear();
        self.stats = EvalStats::default();
        self.code = CodeStack::from_ordered(code);
    }

    pub fn stats(&self) -> &EvalStats {
        &self.stats
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn dump_depth(&self) -> usize {
        self.dump.len()
    }

    /// No code is left, or the outermost context holds a lone number.
    pub fn is_final(&self) -> bool {
        self.code.is_empty() || (self.dump.is_empty() && self.lone_number().is_some())
    }

    /// The answer of a machine in its final state.
    pub fn result(&self) -> Result<i64, GmError> {
        match self.lone_number() {
            Some(n) if self.dump.is_empty() => Ok(n),
            _ => Err(GmError::Stuck {
                stack_depth: self.stack.len(),
                dump_depth: self.dump.len(),
            }),
        }
    }

    /// Run until the machine is final.
    pub fn run(&mut self) -> Result<i64, GmError> {
        loop {
            match self.step() {
                Ok(Step::Running) => {}
                Ok(Step::Done(n)) => {
                    info!(
                        result = n,
                        steps = self.stats.steps,
                        heap_nodes = self.stats.heap_nodes,
                        "evaluation finished"
                    );
                    return Ok(n);
                }
                Err(e) => {
                    debug!(error = %e, steps = self.stats.steps, "evaluation failed");
                    return Err(e);
                }
            }
        }
    }

    /// Execute one instruction.
    pub fn step(&mut self) -> Result<Step, GmError> {
        if self.is_final() {
            return self.result().map(Step::Done);
        }

        if let Some(limit) = self.config.max_steps {
            if self.stats.steps >= limit {
                return Err(GmError::StepLimit { limit });
            }
        }

        let Some(instr) = self.code.pop() else {
            return self.result().map(Step::Done);
        };
        self.stats.steps += 1;
        trace!(
            step = self.stats.steps,
            instr = %instr,
            stack = self.stack.len(),
            dump = self.dump.len(),
            "dispatch"
        );

        self.dispatch(instr)?;
        self.stats.heap_nodes = self.heap.len();

        if self.is_final() {
            self.result().map(Step::Done)
        } else {
            Ok(Step::Running)
        }
    }

    // Dispatch

    fn dispatch(&mut self, instr: Instr) -> Result<(), GmError> {
        match instr {
            Instr::Push(addr) => self.push_addr(addr)?,

            Instr::Mkap => {
                self.require("MKAP", 2)?;
                let x = self.pop("MKAP")?;
                let f = self.pop("MKAP")?;
                let app = self.heap.application(f, x);
                self.stack.push(app);
            }

            Instr::Slide(n) => {
                self.require("SLIDE", n.saturating_add(1))?;
                let top = self.pop("SLIDE")?;
                let keep = self.stack.len() - n;
                self.stack.truncate(keep);
                self.stack.push(top);
            }

            Instr::Cond {
                then_code,
                else_code,
            } => {
                let scrutinee = self.pop("COND")?;
                let value = self.number(scrutinee, "COND")?;
                if value != 0 {
                    self.code.prepend(&then_code);
                } else {
                    self.code.prepend(&else_code);
                }
            }

            Instr::Eval => self.eval_top()?,

            Instr::Add | Instr::Sub | Instr::Mul | Instr::Div | Instr::Equ => {
                self.arith(&instr)?;
            }

            Instr::Unwind => self.unwind()?,
        }

        Ok(())
    }

    fn push_addr(&mut self, addr: Addr) -> Result<(), GmError> {
        let node = match addr {
            Addr::Global(g) => {
                if !self.table.contains(g) {
                    return Err(GmError::UnknownGlobal(g));
                }
                self.heap.global(g)
            }
            Addr::Literal(v) => self.heap.number(v),
            Addr::Arg(n) => {
                let slot = n.saturating_add(1);
                let app = self.peek(slot, "PUSH")?;
                match self.heap.get(app) {
                    Node::Application { argument, .. } => argument,
                    other => {
                        return Err(GmError::NotAnApplication {
                            offset: n,
                            slot,
                            found: other.kind(),
                        });
                    }
                }
            }
            Addr::Local(n) => self.peek(n, "PUSH")?,
        };

        self.stack.push(node);
        Ok(())
    }

    fn eval_top(&mut self) -> Result<(), GmError> {
        let node = self.pop("EVAL")?;

        if self.config.share_forced {
            if let Some(&whnf) = self.memo.get(&node) {
                self.stats.memo_hits += 1;
                self.stack.push(whnf);
                return Ok(());
            }
        }

        if let Some(limit) = self.config.max_dump_depth {
            if self.dump.len() >= limit {
                return Err(GmError::DumpLimit { limit });
            }
        }

        let stack = mem::take(&mut self.stack);
        let code = mem::replace(&mut self.code, CodeStack::unwind());
        self.dump.push(DumpFrame {
            code,
            stack,
            roots: vec![node],
        });
        self.stack.push(node);

        self.stats.evals += 1;
        self.stats.max_dump_depth = self.stats.max_dump_depth.max(self.dump.len());
        debug!(depth = self.dump.len(), "suspend context");
        Ok(())
    }

    fn arith(&mut self, instr: &Instr) -> Result<(), GmError> {
        let name = instr.mnemonic();
        self.require(name, 2)?;
        let a = self.pop(name)?;
        let a = self.number(a, name)?;
        let b = self.pop(name)?;
        let b = self.number(b, name)?;

        let value = match instr {
            Instr::Add => b.checked_add(a).ok_or_else(|| overflow(name))?,
            Instr::Sub => b.checked_sub(a).ok_or_else(|| overflow(name))?,
            Instr::Mul => b.checked_mul(a).ok_or_else(|| overflow(name))?,
            Instr::Div => {
                if a == 0 {
                    return Err(division_by_zero());
                }
                b.checked_div(a).ok_or_else(|| overflow(name))?
            }
            _ => i64::from(b == a),
        };

        let node = self.heap.number(value);
        self.stack.push(node);
        Ok(())
    }

    // Unwind

    fn unwind(&mut self) -> Result<(), GmError> {
        self.stats.unwinds += 1;
        let mut top = self.peek(0, "UNWIND")?;

        if self.config.share_forced {
            if let Some(&whnf) = self.memo.get(&top) {
                self.stats.memo_hits += 1;
                self.stack.pop();
                self.stack.push(whnf);
                top = whnf;
            }
        }

        match self.heap.get(top) {
            Node::Number(_) => {
                let Some(frame) = self.dump.pop() else {
                    self.code.clear();
                    return Ok(());
                };
                debug!(depth = self.dump.len(), "resume context");

                if self.config.share_forced {
                    for root in frame.roots {
                        self.memo.insert(root, top);
                    }
                }
                let forced = mem::replace(&mut self.stack, frame.stack);
                self.stack.extend(forced);
                self.code = frame.code;
            }

            Node::Global(g) => {
                let table = self.table;
                let sc = table.get(g).ok_or(GmError::UnknownGlobal(g))?;
                if !sc.is_compiled() {
                    return Err(GmError::NotCompiled(g));
                }
                if self.stack.len() <= sc.arity {
                    return Err(arity_fault(g, sc.arity, self.stack.len()));
                }
                self.note_root(top);
                self.code = sc.code.clone();
                *self.stats.reductions.entry(g).or_insert(0) += 1;
            }

            Node::Application { function, .. } => {
                self.note_root(top);
                self.code = CodeStack::unwind();
                self.stack.push(function);
            }
        }

        Ok(())
    }

    /// A node unwound from the bottom of a nested stack has the same WHNF
    /// as the node that context was forcing.
    fn note_root(&mut self, node: NodeId) {
        if !self.config.share_forced || self.stack.len() != 1 {
            return;
        }
        if let Some(frame) = self.dump.last_mut() {
            if frame.roots.last() != Some(&node) {
                frame.roots.push(node);
            }
        }
    }

    // Stack operations

    fn require(&self, instr: &'static str, needed: usize) -> Result<(), GmError> {
        if self.stack.len() < needed {
            return Err(stack_underflow(instr, needed, self.stack.len()));
        }
        Ok(())
    }

    fn pop(&mut self, instr: &'static str) -> Result<NodeId, GmError> {
        self.stack.pop().ok_or_else(|| stack_underflow(instr, 1, 0))
    }

    fn peek(&self, k: usize, instr: &'static str) -> Result<NodeId, GmError> {
        let len = self.stack.len();
        if k >= len {
            return Err(stack_underflow(instr, k.saturating_add(1), len));
        }
        Ok(self.stack[len - 1 - k])
    }

    fn number(&self, node: NodeId, instr: &'static str) -> Result<i64, GmError> {
        match self.heap.get(node) {
            Node::Number(n) => Ok(n),
            other => Err(type_error(instr, other.kind())),
        }
    }

    fn lone_number(&self) -> Option<i64> {
        match self.stack.as_slice() {
            [only] => match self.heap.get(*only) {
                Node::Number(n) => Some(n),
                _ => None,
            },
            _ => None,
        }
    }
}

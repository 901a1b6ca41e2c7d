use std::fmt::{self, Write};

use crate::bytecode::{Addr, GlobalId, Instr, ScTable, Supercombinator, builtins};

/// Print disassembly of every compiled entry of a table
pub fn print_table(table: &ScTable, include_builtins: bool) {
    print!("{}", disassemble_table(table, include_builtins));
}

/// Listing of every compiled entry, in id order.
pub fn disassemble_table(table: &ScTable, include_builtins: bool) -> String {
    render(|out| {
        for (id, sc) in table.iter() {
            if include_builtins || builtins::name(id).is_none() {
                write_entry(out, id, sc)?;
            }
        }
        Ok(())
    })
}

/// Listing of a single entry.
pub fn disassemble_entry(id: GlobalId, sc: &Supercombinator) -> String {
    render(|out| write_entry(out, id, sc))
}

/// Listing of an instruction sequence given in execution order.
pub fn disassemble_code(code: &[Instr]) -> String {
    render(|out| write_ops(out, code, 0))
}

fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    write(&mut out).ok();
    out
}

fn write_entry(out: &mut String, id: GlobalId, sc: &Supercombinator) -> fmt::Result {
    let label = match builtins::name(id) {
        Some(name) => format!("{} {}", id, name),
        None => id.to_string(),
    };

    writeln!(out, "════════════════════════════════════════")?;
    writeln!(out, " {}  (arity {})", label, sc.arity)?;
    if sc.is_compiled() {
        writeln!(out, " {} instructions", sc.code.len())?;
    } else {
        writeln!(out, " <not compiled>")?;
    }
    writeln!(out, "════════════════════════════════════════")?;
    write_ops(out, &sc.code.to_ordered(), 0)?;
    writeln!(out)
}

fn write_ops(out: &mut String, code: &[Instr], indent: usize) -> fmt::Result {
    let prefix = "    ".repeat(indent);

    for (ip, instr) in code.iter().enumerate() {
        match instr {
            Instr::Cond {
                then_code,
                else_code,
            } => {
                writeln!(out, "{}{:04}  COND", prefix, ip)?;
                writeln!(out, "{}      then:", prefix)?;
                write_ops(out, then_code, indent + 2)?;
                writeln!(out, "{}      else:", prefix)?;
                write_ops(out, else_code, indent + 2)?;
            }
            Instr::Push(Addr::Global(g)) => match builtins::name(*g) {
                Some(name) => writeln!(out, "{}{:04}  {}  ; {}", prefix, ip, instr, name)?,
                None => writeln!(out, "{}{:04}  {}", prefix, ip, instr)?,
            },
            _ => writeln!(out, "{}{:04}  {}", prefix, ip, instr)?,
        }
    }

    Ok(())
}

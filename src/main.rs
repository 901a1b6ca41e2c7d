use std::env;

use gmachine::bytecode::disasm::print_table;
use gmachine::{Function, MachineConfig, ScTable, arg, if_};
use tracing::Level;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let show_code = args.iter().any(|a| a == "--code");
    let trace = args.iter().any(|a| a == "--trace");

    if trace {
        tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_target(false)
            .init();
    }

    let mut table = ScTable::new();
    if let Err(e) = run_demos(&mut table, show_code) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("gmachine - lazy graph reduction demo");
    println!();
    println!("Usage:");
    println!("  gmachine            Run the demo programs");
    println!("  gmachine --code     Also print the compiled supercombinators");
    println!("  gmachine --trace    Log every instruction");
    println!("  gmachine --help     Show this help");
}

fn run_demos(table: &mut ScTable, show_code: bool) -> Result<(), Box<dyn std::error::Error>> {
    let fact = Function::declare_in(table, 1);
    fact.compile_in(
        table,
        arg(0) * if_(arg(0).equals(1), 1, fact.call([arg(0) - 1])),
    )?;

    let fibo = Function::declare_in(table, 1);
    fibo.compile_in(
        table,
        if_(
            arg(0),
            if_(
                arg(0) - 1,
                fibo.call([arg(0) - 1]) + fibo.call([arg(0) - 2]),
                1,
            ),
            0,
        ),
    )?;

    let omega = Function::declare_in(table, 0);
    omega.compile_in(table, omega.call([]))?;

    let guarded = Function::declare_in(table, 1);
    guarded.compile_in(table, if_(arg(0), omega.call([]), arg(0)))?;

    let plus = Function::declare_in(table, 2).compile_in(table, arg(0) + arg(1))?;
    let weird_plus = Function::declare_in(table, 2);
    weird_plus.compile_in(table, plus.call([arg(0) * arg(1), arg(1)]))?;

    if show_code {
        print_table(table, false);
    }

    println!("fact 10           = {}", fact.exec_in(table, &[10])?);
    println!("fibo 6            = {}", fibo.exec_in(table, &[6])?);
    println!("guarded 0         = {}", guarded.exec_in(table, &[0])?);
    println!("weird_plus 1 2    = {}", weird_plus.exec_in(table, &[1, 2])?);

    let bounded = MachineConfig {
        max_steps: Some(100_000),
        ..MachineConfig::default()
    };
    match guarded.exec_with(table, &[1], bounded) {
        Ok((value, _)) => println!("guarded 1         = {}", value),
        Err(e) => println!("guarded 1         : {}", e),
    }

    let (value, stats) = fibo.exec_with(table, &[15], MachineConfig::default())?;
    println!(
        "fibo 15           = {} ({} steps, {} heap nodes, dump depth {})",
        value, stats.steps, stats.heap_nodes, stats.max_dump_depth
    );

    Ok(())
}

//! `fifth`: the command-line front end over the `fifth` library crate.
//!
//! Argument handling is hand-rolled, inspecting `std::env::args()` directly rather than reaching
//! for a parsing crate -- the surface is small enough that a dependency would buy nothing.

use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use fifth::runtime::built_ins::register_all;
use fifth::runtime::error::ScriptError;
use fifth::Vm;

/// One item from the command line, processed left-to-right: `-e` arguments and file arguments
/// may be freely mixed.
enum Action {
    File(String),
    Eval(String),
}

fn print_usage() {
    println!("Usage: fifth [-e CODE] [FILE ...] [-h | --help]");
    println!();
    println!("  fifth                 Load the bootstrap file, then start an interactive REPL.");
    println!("  fifth FILE [FILE...]  Load the bootstrap file, then interpret each FILE in order.");
    println!("  fifth -e \"CODE\"       Interpret CODE as a line of Forth.");
    println!("  fifth -h, --help      Print this message.");
    println!();
    println!("-e and FILE arguments may be mixed; they run left-to-right.");
}

/// Expand a leading `~` to `HOME`.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Ok(home) = env::var("HOME") {
            return format!("{}{}", home, rest);
        }
    }
    path.to_string()
}

/// Find `boot/core.fs` via the discovery order: next to the executable, that directory's parent,
/// then `$HOME/fifth/engine/boot/core.fs`.
fn find_bootstrap() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok().and_then(|p| p.parent().map(|d| d.to_path_buf()));

    if let Some(dir) = &exe_dir {
        let candidate = dir.join("boot/core.fs");
        if candidate.is_file() {
            return Some(candidate);
        }

        if let Some(parent) = dir.parent() {
            let candidate = parent.join("boot/core.fs");
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    if let Ok(home) = env::var("HOME") {
        let candidate = Path::new(&home).join("fifth/engine/boot/core.fs");
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    None
}

/// Load the bootstrap file if one can be found.  Missing bootstrap is non-fatal: a warning goes
/// to stderr and the engine carries on with only its native primitives.
fn load_bootstrap(vm: &mut Vm) {
    match find_bootstrap() {
        Some(path) => {
            if let Err(error) = vm.run_file(&path.to_string_lossy()) {
                vm.report_and_recover(&error);
            }
        }
        None => {
            eprintln!("fifth: warning: could not find boot/core.fs; starting with no bootstrap library.");
        }
    }
}

fn parse_args(args: &[String]) -> Result<Vec<Action>, ()> {
    let mut actions = Vec::new();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return Err(());
            }
            "-e" => {
                i += 1;
                match args.get(i) {
                    Some(code) => actions.push(Action::Eval(code.clone())),
                    None => {
                        eprintln!("fifth: -e requires an argument.");
                        return Err(());
                    }
                }
            }
            other => actions.push(Action::File(expand_tilde(other))),
        }
        i += 1;
    }

    Ok(actions)
}

fn run_repl(vm: &mut Vm) {
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();

        let bytes_read = match stdin.lock().read_line(&mut line) {
            Ok(n) => n,
            Err(_) => break,
        };

        if bytes_read == 0 {
            println!();
            break;
        }

        if let Err(error) = vm.interpret_line("<repl>", line.trim_end_matches(['\n', '\r'])) {
            vm.report_and_recover(&error);
        }

        if vm.exit_code.is_some() {
            break;
        }
    }
}

fn report_top_level_error(error: &ScriptError) {
    eprintln!("{}", error);
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let actions = match parse_args(&args) {
        Ok(actions) => actions,
        Err(()) => std::process::exit(0),
    };

    let mut vm = Vm::new();
    vm.argv = env::args().collect();

    if let Err(error) = register_all(&mut vm) {
        report_top_level_error(&error);
        std::process::exit(1);
    }

    load_bootstrap(&mut vm);

    let mut saw_error = false;

    if actions.is_empty() {
        run_repl(&mut vm);
    } else {
        for action in actions {
            if vm.exit_code.is_some() {
                break;
            }

            let result = match &action {
                Action::File(path) => vm.run_file(path),
                Action::Eval(code) => vm.interpret_line("<-e>", code),
            };

            if let Err(error) = result {
                report_top_level_error(&error);
                saw_error = true;
                break;
            }
        }
    }

    let exit_code = vm.exit_code.unwrap_or(if saw_error { 1 } else { 0 });
    std::process::exit(exit_code);
}

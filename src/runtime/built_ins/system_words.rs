//! Process/environment interface and dictionary introspection.

use std::process::Command;

use crate::runtime::error;
use crate::runtime::interpreter::Vm;

fn word_system(vm: &mut Vm) -> error::Result<()> {
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    let bytes = vm.memory.read_bytes(addr, len)?.to_vec();
    let command_line = String::from_utf8_lossy(&bytes).to_string();

    let status = if cfg!(windows) {
        Command::new("cmd").args(["/C", &command_line]).status()?
    } else {
        Command::new("sh").args(["-c", &command_line]).status()?
    };

    vm.push(status.code().unwrap_or(-1) as i64)
}

fn word_getenv(vm: &mut Vm) -> error::Result<()> {
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    let bytes = vm.memory.read_bytes(addr, len)?.to_vec();
    let name = String::from_utf8_lossy(&bytes).to_string();

    match std::env::var(&name) {
        Ok(value) => {
            let out = vm.memory.allocate_bytes(value.as_bytes())?;
            vm.push(out as i64)?;
            vm.push(value.len() as i64)
        }
        Err(_) => {
            vm.push(0)?;
            vm.push(0)
        }
    }
}

fn word_argc(vm: &mut Vm) -> error::Result<()> {
    vm.push(vm.argv.len() as i64)
}

fn word_argv(vm: &mut Vm) -> error::Result<()> {
    let index = vm.pop()? as usize;
    let arg = vm.argv.get(index).cloned().unwrap_or_default();
    let addr = vm.memory.allocate_bytes(arg.as_bytes())?;
    vm.push(addr as i64)?;
    vm.push(arg.len() as i64)
}

/// `WORDS`: list every visible dictionary entry, most recently defined first.
fn word_words(vm: &mut Vm) -> error::Result<()> {
    let names: Vec<String> = vm.dictionary.visible_entries().map(|(_, entry)| entry.name().to_string()).collect();
    for name in names.into_iter().rev() {
        vm.emit_text(name.as_bytes())?;
        vm.emit_text(b" ")?;
    }
    vm.emit_text(b"\n")
}

fn word_true(vm: &mut Vm) -> error::Result<()> {
    vm.push(-1)
}

fn word_false(vm: &mut Vm) -> error::Result<()> {
    vm.push(0)
}

pub fn register(vm: &mut Vm) -> error::Result<()> {
    vm.add_primitive("SYSTEM", false, word_system)?;
    vm.add_primitive("GETENV", false, word_getenv)?;
    vm.add_primitive("ARGC", false, word_argc)?;
    vm.add_primitive("ARGV", false, word_argv)?;
    vm.add_primitive("WORDS", false, word_words)?;
    vm.add_primitive("TRUE", false, word_true)?;
    vm.add_primitive("FALSE", false, word_false)?;
    Ok(())
}

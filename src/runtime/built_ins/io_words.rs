//! Character and string output, counted-string access, and output redirection.

use crate::runtime::error;
use crate::runtime::interpreter::{OutputTarget, Vm};

fn word_emit(vm: &mut Vm) -> error::Result<()> {
    let c = vm.pop()? as u8;
    vm.emit_text(&[c])
}

fn word_type(vm: &mut Vm) -> error::Result<()> {
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    let bytes = vm.memory.read_bytes(addr, len)?.to_vec();
    vm.emit_text(&bytes)
}

fn word_cr(vm: &mut Vm) -> error::Result<()> {
    vm.emit_text(b"\n")
}

fn word_space(vm: &mut Vm) -> error::Result<()> {
    vm.emit_text(b" ")
}

fn word_spaces(vm: &mut Vm) -> error::Result<()> {
    let n = vm.pop()?;
    if n > 0 {
        let spaces = vec![b' '; n as usize];
        vm.emit_text(&spaces)?;
    }
    Ok(())
}

/// `COUNT`: `c-addr -- addr len`, unpacking a counted string into the usual address/length pair.
fn word_count(vm: &mut Vm) -> error::Result<()> {
    let addr = vm.pop()? as usize;
    let len = vm.memory.fetch_byte(addr)?;
    vm.push(addr as i64 + 1)?;
    vm.push(len as i64)
}

/// `>FILE`: redirect `EMIT`/`TYPE`/`.`/etc. to an open file.
fn word_to_file(vm: &mut Vm) -> error::Result<()> {
    let fid = vm.pop()?;
    vm.output = OutputTarget::File(fid);
    Ok(())
}

/// `>STDOUT`: redirect output back to the terminal.
fn word_to_stdout(vm: &mut Vm) -> error::Result<()> {
    vm.output = OutputTarget::Stdout;
    Ok(())
}

fn word_key(vm: &mut Vm) -> error::Result<()> {
    let c = crate::runtime::built_ins::terminal_words::read_key()?;
    vm.push(c as i64)
}

pub fn register(vm: &mut Vm) -> error::Result<()> {
    vm.add_primitive("EMIT", false, word_emit)?;
    vm.add_primitive("TYPE", false, word_type)?;
    vm.add_primitive("CR", false, word_cr)?;
    vm.add_primitive("SPACE", false, word_space)?;
    vm.add_primitive("SPACES", false, word_spaces)?;
    vm.add_primitive("COUNT", false, word_count)?;
    vm.add_primitive(">FILE", false, word_to_file)?;
    vm.add_primitive(">STDOUT", false, word_to_stdout)?;
    vm.add_primitive("KEY", false, word_key)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_unpacks_a_counted_string() {
        let mut vm = Vm::new();
        register(&mut vm).unwrap();
        let addr = vm.memory.here();
        vm.memory.c_comma(3).unwrap();
        vm.memory.c_comma(b'h').unwrap();
        vm.memory.c_comma(b'i').unwrap();
        vm.memory.c_comma(b'!').unwrap();

        vm.push(addr as i64).unwrap();
        word_count(&mut vm).unwrap();
        assert_eq!(vm.pop().unwrap(), 3);
        assert_eq!(vm.pop().unwrap(), addr as i64 + 1);
    }
}

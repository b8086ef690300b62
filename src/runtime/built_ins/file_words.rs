//! File access words: the Forth-visible surface over `runtime::file_table`.

use crate::runtime::error;
use crate::runtime::file_table::FileMode;
use crate::runtime::interpreter::Vm;

fn read_path(vm: &mut Vm) -> error::Result<String> {
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    let bytes = vm.memory.read_bytes(addr, len)?.to_vec();
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

fn word_open_file(vm: &mut Vm) -> error::Result<()> {
    let mode = pop_mode(vm)?;
    let path = read_path(vm)?;
    let fid = vm.files.open(&path, mode)?;
    vm.push(fid)
}

fn word_create_file(vm: &mut Vm) -> error::Result<()> {
    let mode = pop_mode(vm)?;
    let path = read_path(vm)?;
    let fid = vm.files.create(&path, mode)?;
    vm.push(fid)
}

fn word_close_file(vm: &mut Vm) -> error::Result<()> {
    let fid = vm.pop()?;
    vm.files.close(fid)
}

fn word_read_line(vm: &mut Vm) -> error::Result<()> {
    let fid = vm.pop()?;
    let (line, at_eof) = vm.files.read_line(fid)?;
    let addr = vm.memory.allocate_bytes(line.as_bytes())?;
    vm.push(addr as i64)?;
    vm.push(line.len() as i64)?;
    vm.push_bool(!at_eof)
}

fn word_read_file(vm: &mut Vm) -> error::Result<()> {
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    let fid = vm.pop()?;

    let mut buf = vec![0u8; len];
    let read = vm.files.read_bytes(fid, &mut buf)?;
    vm.memory.write_bytes(addr, &buf[..read])?;
    vm.push(read as i64)
}

fn word_write_file(vm: &mut Vm) -> error::Result<()> {
    let fid = vm.pop()?;
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    let bytes = vm.memory.read_bytes(addr, len)?.to_vec();
    vm.files.write_bytes(fid, &bytes)
}

fn word_write_line(vm: &mut Vm) -> error::Result<()> {
    let fid = vm.pop()?;
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    let bytes = vm.memory.read_bytes(addr, len)?.to_vec();
    vm.files.write_line(fid, &bytes)
}

fn pop_mode(vm: &mut Vm) -> error::Result<FileMode> {
    let raw = vm.pop()?;
    Ok(match raw {
        0 => FileMode::ReadOnly,
        1 => FileMode::WriteOnly,
        _ => FileMode::ReadWrite,
    })
}

/// `SLURP-FILE`: read a whole file into a freshly-bump-allocated data-space region and return
/// `(addr, u)`.
fn word_slurp_file(vm: &mut Vm) -> error::Result<()> {
    let path = read_path(vm)?;
    let bytes = crate::lang::input::slurp(&path)?;
    let addr = vm.memory.allocate_bytes(&bytes)?;
    vm.push(addr as i64)?;
    vm.push(bytes.len() as i64)
}

fn word_r_o(vm: &mut Vm) -> error::Result<()> {
    vm.push(0)
}

fn word_w_o(vm: &mut Vm) -> error::Result<()> {
    vm.push(1)
}

fn word_r_w(vm: &mut Vm) -> error::Result<()> {
    vm.push(2)
}

pub fn register(vm: &mut Vm) -> error::Result<()> {
    vm.add_primitive("OPEN-FILE", false, word_open_file)?;
    vm.add_primitive("CREATE-FILE", false, word_create_file)?;
    vm.add_primitive("CLOSE-FILE", false, word_close_file)?;
    vm.add_primitive("READ-LINE", false, word_read_line)?;
    vm.add_primitive("READ-FILE", false, word_read_file)?;
    vm.add_primitive("WRITE-FILE", false, word_write_file)?;
    vm.add_primitive("WRITE-LINE", false, word_write_line)?;
    vm.add_primitive("SLURP-FILE", false, word_slurp_file)?;
    vm.add_primitive("R/O", false, word_r_o)?;
    vm.add_primitive("W/O", false, word_w_o)?;
    vm.add_primitive("R/W", false, word_r_w)?;
    Ok(())
}

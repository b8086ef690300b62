//! Data-space access: fetch/store, comma, and layout words.

use crate::runtime::data_structures::memory::{Memory, CELL};
use crate::runtime::error;
use crate::runtime::interpreter::Vm;

fn word_fetch(vm: &mut Vm) -> error::Result<()> {
    let addr = vm.pop()? as usize;
    let value = vm.memory.fetch_cell(addr)?;
    vm.push(value)
}

fn word_store(vm: &mut Vm) -> error::Result<()> {
    let addr = vm.pop()? as usize;
    let value = vm.pop()?;
    vm.memory.store_cell(addr, value)
}

fn word_c_fetch(vm: &mut Vm) -> error::Result<()> {
    let addr = vm.pop()? as usize;
    let value = vm.memory.fetch_byte(addr)?;
    vm.push(value as i64)
}

fn word_c_store(vm: &mut Vm) -> error::Result<()> {
    let addr = vm.pop()? as usize;
    let value = vm.pop()?;
    vm.memory.store_byte(addr, value as u8)
}

fn word_comma(vm: &mut Vm) -> error::Result<()> {
    let value = vm.pop()?;
    vm.memory.comma(value)?;
    Ok(())
}

fn word_c_comma(vm: &mut Vm) -> error::Result<()> {
    let value = vm.pop()?;
    vm.memory.c_comma(value as u8)?;
    Ok(())
}

fn word_allot(vm: &mut Vm) -> error::Result<()> {
    let n = vm.pop()?;
    vm.memory.allot(n as isize)
}

fn word_here(vm: &mut Vm) -> error::Result<()> {
    let here = vm.memory.here() as i64;
    vm.push(here)
}

fn word_align(vm: &mut Vm) -> error::Result<()> {
    vm.memory.align();
    Ok(())
}

fn word_aligned(vm: &mut Vm) -> error::Result<()> {
    let addr = vm.pop()? as usize;
    vm.push(Memory::aligned(addr) as i64)
}

fn word_cells(vm: &mut Vm) -> error::Result<()> {
    let n = vm.pop()?;
    vm.push(n.wrapping_mul(CELL as i64))
}

fn word_cell_plus(vm: &mut Vm) -> error::Result<()> {
    let addr = vm.pop()?;
    vm.push(addr.wrapping_add(CELL as i64))
}

fn word_move(vm: &mut Vm) -> error::Result<()> {
    let len = vm.pop()? as usize;
    let dst = vm.pop()? as usize;
    let src = vm.pop()? as usize;
    vm.memory.move_bytes(src, dst, len)
}

fn word_fill(vm: &mut Vm) -> error::Result<()> {
    let byte = vm.pop()? as u8;
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    vm.memory.fill(addr, len, byte)
}

fn word_erase(vm: &mut Vm) -> error::Result<()> {
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    vm.memory.fill(addr, len, 0)
}

pub fn register(vm: &mut Vm) -> error::Result<()> {
    vm.add_primitive("@", false, word_fetch)?;
    vm.add_primitive("!", false, word_store)?;
    vm.add_primitive("C@", false, word_c_fetch)?;
    vm.add_primitive("C!", false, word_c_store)?;
    vm.add_primitive(",", false, word_comma)?;
    vm.add_primitive("C,", false, word_c_comma)?;
    vm.add_primitive("ALLOT", false, word_allot)?;
    vm.add_primitive("HERE", false, word_here)?;
    vm.add_primitive("ALIGN", false, word_align)?;
    vm.add_primitive("ALIGNED", false, word_aligned)?;
    vm.add_primitive("CELLS", false, word_cells)?;
    vm.add_primitive("CELL+", false, word_cell_plus)?;
    vm.add_primitive("MOVE", false, word_move)?;
    vm.add_primitive("FILL", false, word_fill)?;
    vm.add_primitive("ERASE", false, word_erase)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm_with_memory_words() -> Vm {
        let mut vm = Vm::new();
        register(&mut vm).unwrap();
        vm
    }

    #[test]
    fn fetch_store_round_trip() {
        let mut vm = vm_with_memory_words();
        vm.memory.align();
        let addr = vm.memory.here() as i64;
        vm.memory.allot(CELL as isize).unwrap();

        vm.push(123).unwrap();
        vm.push(addr).unwrap();
        word_store(&mut vm).unwrap();

        vm.push(addr).unwrap();
        word_fetch(&mut vm).unwrap();
        assert_eq!(vm.pop().unwrap(), 123);
    }

    #[test]
    fn cells_scales_by_cell_size() {
        let mut vm = vm_with_memory_words();
        vm.push(3).unwrap();
        word_cells(&mut vm).unwrap();
        assert_eq!(vm.pop().unwrap(), 3 * CELL as i64);
    }
}

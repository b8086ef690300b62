//! Native word registration, grouped by the required word set families.

pub mod arithmetic_words;
pub mod file_words;
pub mod io_words;
pub mod memory_words;
pub mod numeric_output_words;
pub mod stack_words;
pub mod system_words;
pub mod terminal_words;

use crate::runtime::error;
use crate::runtime::interpreter::compiler::register_compiler_words;
use crate::runtime::interpreter::Vm;

/// Register every native word a freshly constructed `Vm` needs before it can load `boot/core.fs`
/// or any user script.  Compiler words go first: everything else is free to reference `LIT`'s and
/// friends' cached XTs, and `:`/`;` must exist before a single colon definition can compile.
pub fn register_all(vm: &mut Vm) -> error::Result<()> {
    register_compiler_words(vm)?;
    arithmetic_words::register(vm)?;
    stack_words::register(vm)?;
    memory_words::register(vm)?;
    numeric_output_words::register(vm)?;
    io_words::register(vm)?;
    file_words::register(vm)?;
    system_words::register(vm)?;
    Ok(())
}

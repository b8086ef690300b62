//! The virtual machine: state, the inner interpreter, and the glue the outer interpreter and
//! control-flow compilers build on.
//!
//! Everything the engine needs is a field of `Vm`.  There are no process-wide singletons, so
//! nothing stops an embedder from running more than one VM in a process -- e.g. forking an
//! additional VM onto its own thread with an independent stack and a copy of the dictionary.

pub mod outer;
pub mod compiler;

use std::collections::HashMap;

use crate::lang::input::InputStack;
use crate::lang::source_buffer::SourceLocation;
use crate::runtime::data_structures::dictionary::{Code, Dictionary, Xt};
use crate::runtime::data_structures::memory::{Memory, PicturedBuffer, CELL};
use crate::runtime::data_structures::stack::{Stack, STACK_SIZE};
use crate::runtime::error::{self, err, err_at, ErrorKind};
use crate::runtime::file_table::FileTable;

/// Interpret vs. compile state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    Interpret,
    Compile,
}

/// A native word's implementation.  Takes the whole VM so it can touch any of its state rather
/// than going through a narrower interpreter trait object.
pub type PrimitiveFn = fn(&mut Vm) -> error::Result<()>;

/// Where `EMIT`/`TYPE` currently write (`>FILE`/`>STDOUT`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(i64),
}

/// The execution tokens of the compiler-internal primitives, resolved once at startup so the
/// compilers can emit them by index without a name lookup on every colon definition.
#[derive(Clone, Copy)]
pub struct CachedXts {
    pub lit: Xt,
    pub slit: Xt,
    pub branch: Xt,
    pub zbranch: Xt,
    pub exit: Xt,
    pub do_: Xt,
    pub qdo: Xt,
    pub loop_: Xt,
    pub plus_loop: Xt,
    pub unloop: Xt,
    pub does_runtime: Xt,
}

/// State captured at `:` so a failed definition can be rolled back completely, restoring `HERE`
/// and the dictionary to their state at the moment `:` ran.
pub struct DefiningState {
    pub xt: Xt,
    pub here_snapshot: usize,
    pub dict_len_snapshot: usize,
}

/// The whole VM: data space, dictionary, stacks, input, and the scratch state the compilers and
/// built-in words need.
pub struct Vm {
    pub memory: Memory,
    pub dictionary: Dictionary,
    pub data_stack: Stack,
    pub return_stack: Stack,
    pub input: InputStack,
    pub pic: PicturedBuffer,
    pub state: State,

    /// The address of the cell holding the current number-conversion radix, so `BASE` behaves
    /// like any other Forth variable (`BASE @`, `BASE !`) rather than a special host field.
    pub base_addr: usize,

    pub files: FileTable,
    pub output: OutputTarget,
    pub exit_code: Option<i32>,

    /// The instruction pointer of the innermost executing colon body.  Primitives that thread
    /// control -- `LIT`, `BRANCH`, `0BRANCH`, `EXIT`, the loop words -- read and mutate this
    /// directly.
    pub ip: usize,

    /// The defining word currently under construction, if any (between `:`/`CREATE` and `;`).
    pub defining: Option<DefiningState>,

    /// Per-nested-loop lists of pending forward branches left by `LEAVE`, patched in when the
    /// enclosing `LOOP`/`+LOOP` compiles.
    pub leave_stack: Vec<Vec<usize>>,

    /// Per-nested-`CASE` lists of pending `ENDOF` forward branches, patched in when `ENDCASE`
    /// compiles.
    pub case_stack: Vec<Vec<usize>>,

    /// `ARGV`/`ARGC` support.
    pub argv: Vec<String>,

    primitives: Vec<PrimitiveFn>,
    names_by_primitive: HashMap<usize, &'static str>,
    cached: Option<CachedXts>,
}

impl Vm {
    pub fn new() -> Vm {
        let mut memory = Memory::new();
        let base_addr = memory.comma(10).expect("data space has room for the BASE cell");

        Vm {
            memory,
            dictionary: Dictionary::new(),
            data_stack: Stack::new(STACK_SIZE),
            return_stack: Stack::new(STACK_SIZE),
            input: InputStack::new(),
            pic: PicturedBuffer::new(),
            state: State::Interpret,
            base_addr,
            files: FileTable::new(),
            output: OutputTarget::Stdout,
            exit_code: None,
            ip: 0,
            defining: None,
            leave_stack: Vec::new(),
            case_stack: Vec::new(),
            argv: Vec::new(),
            primitives: Vec::new(),
            names_by_primitive: HashMap::new(),
            cached: None,
        }
    }

    /// Register a primitive word.  Returns its XT.
    pub fn add_primitive(
        &mut self,
        name: &'static str,
        immediate: bool,
        handler: PrimitiveFn,
    ) -> error::Result<Xt> {
        let index = self.primitives.len();
        self.primitives.push(handler);
        self.names_by_primitive.insert(index, name);

        let xt = self.dictionary.create(name, Code::Primitive(index), 0)?;
        if immediate {
            self.dictionary.make_immediate(xt);
        }
        Ok(xt)
    }

    /// Record the cached compiler-internal XTs.  Must be called once, after all compiler
    /// primitives (`LIT`, `BRANCH`, ...) have been registered.
    pub fn set_cached_xts(&mut self, cached: CachedXts) {
        self.cached = Some(cached);
    }

    pub fn cached(&self) -> CachedXts {
        self.cached.expect("cached compiler XTs must be set during VM bootstrap")
    }

    pub fn is_compiling(&self) -> bool {
        self.state == State::Compile
    }

    /// The current number-conversion radix (`BASE`).
    pub fn base(&self) -> u32 {
        self.memory.fetch_cell(self.base_addr).unwrap_or(10) as u32
    }

    // -- data stack convenience -------------------------------------------------------------

    pub fn push(&mut self, value: i64) -> error::Result<()> {
        self.data_stack.push(value)
    }

    pub fn pop(&mut self) -> error::Result<i64> {
        self.data_stack.pop()
    }

    pub fn pop_bool(&mut self) -> error::Result<bool> {
        Ok(self.pop()? != 0)
    }

    pub fn push_bool(&mut self, value: bool) -> error::Result<()> {
        self.push(if value { -1 } else { 0 })
    }

    // -- compiling cells into the current definition -----------------------------------------

    /// Compile a cell holding an XT (or a literal interpreted as one by the inner loop).
    pub fn compile_xt(&mut self, xt: Xt) -> error::Result<usize> {
        self.memory.comma(xt as i64)
    }

    /// Compile a literal cell value (used after `LIT`/`BRANCH`/`0BRANCH`/loop opcodes).
    pub fn compile_cell(&mut self, value: i64) -> error::Result<usize> {
        self.memory.comma(value)
    }

    // -- the inner interpreter ----------------------------------------------------------------

    /// Execute a single XT, whatever kind of entry it names.
    pub fn execute_xt(&mut self, xt: Xt) -> error::Result<()> {
        match self.dictionary.get(xt).code() {
            Code::Primitive(index) => {
                let handler = self.primitives[index];
                handler(self)
            }

            Code::Docon => {
                let value = self.dictionary.get(xt).param();
                self.push(value)
            }

            Code::Dovar => {
                let address = self.dictionary.get(xt).param();
                self.push(address)
            }

            Code::Docol => {
                let body = self.dictionary.get(xt).param() as usize;
                self.run_colon_body(body)
            }

            Code::Dodoes => {
                let address = self.dictionary.get(xt).param();
                let does = self.dictionary.get(xt).does();
                self.push(address)?;
                if does >= 0 {
                    self.run_colon_body(does as usize)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Thread a colon body starting at `body_ip` until its matching `EXIT` runs.
    ///
    /// `Docol`/`Dodoes` push the caller's `ip` onto the return stack before diverting into the
    /// body; `EXIT` pops it back off.  The loop below runs until the return stack has unwound
    /// below the depth it had right after that push -- i.e. until *this* invocation's own saved
    /// `ip` has been popped, which only `EXIT` does.
    fn run_colon_body(&mut self, body_ip: usize) -> error::Result<()> {
        self.return_stack.push(self.ip as i64)?;
        let frame_depth = self.return_stack.depth();
        self.ip = body_ip;

        while self.return_stack.depth() >= frame_depth {
            let xt = self.memory.fetch_cell(self.ip)? as usize;
            self.ip += CELL;
            self.execute_xt(xt)?;
        }

        Ok(())
    }

    // -- output ---------------------------------------------------------------------------------

    /// Write raw bytes to wherever `EMIT`/`TYPE`/`."` currently target.
    pub fn emit_text(&mut self, bytes: &[u8]) -> error::Result<()> {
        match self.output {
            OutputTarget::Stdout => {
                use std::io::Write;
                std::io::stdout().write_all(bytes)?;
                Ok(())
            }
            OutputTarget::File(fid) => self.files.write_bytes(fid, bytes),
        }
    }

    // -- aborting and recovery ------------------------------------------------------------------

    /// Raise a VM-internal error at the current input location; used by primitives that have no
    /// more specific context to attach.
    pub fn fault<T>(&self, kind: ErrorKind, message: impl Into<String>) -> error::Result<T> {
        err(kind, message)
    }

    pub fn fault_at<T>(
        &self,
        kind: ErrorKind,
        location: SourceLocation,
        message: impl Into<String>,
    ) -> error::Result<T> {
        err_at(kind, location, message)
    }

    /// Reset to a clean interpreter state after an error: both stacks cleared, state back to
    /// interpret, input stack flushed to the terminal frame, and -- if a `:` definition was in
    /// progress -- `HERE` and the dictionary rolled back to their snapshot at `:`.
    pub fn recover_from_abort(&mut self) {
        self.data_stack.clear();
        self.return_stack.clear();
        self.state = State::Interpret;
        self.input.flush_to_root();

        if let Some(defining) = self.defining.take() {
            let delta = defining.here_snapshot as isize - self.memory.here() as isize;
            let _ = self.memory.allot(delta);
            self.dictionary.truncate(defining.dict_len_snapshot);
        }

        self.leave_stack.clear();
        self.case_stack.clear();
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

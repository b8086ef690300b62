//! Control-flow compilers, defining words, `DOES>`, and string literals.
//!
//! The forward/backward branch resolution for `IF/THEN`, `BEGIN/UNTIL`, `WHILE/REPEAT` reuses
//! the VM's own data stack at compile time: these IMMEDIATE words push and pop cells in a
//! disciplined order that never leaks into the runtime behavior of the word being compiled.
//! `LEAVE`'s forward branches and `CASE`'s `ENDOF` branches don't fit that single-cell discipline
//! -- a loop or a `CASE` can collect an unbounded number of them -- so those use a small
//! dedicated per-nesting-level list instead.

use crate::runtime::data_structures::dictionary::Code;
use crate::runtime::data_structures::memory::{Memory, CELL};
use crate::runtime::error::{self, ErrorKind};
use crate::runtime::interpreter::{CachedXts, DefiningState, State, Vm};

/// Read a delimited string, dropping the single mandatory separator space Forth source always
/// places between a word like `S"` and its text.
fn read_delimited(vm: &mut Vm, delim: u8) -> String {
    let (mut text, _) = vm.input.parse(delim);
    if text.starts_with(' ') {
        text.remove(0);
    }
    text
}

/// Resolve a pending forward/backward branch cell at `addr` to target `vm.memory.here()`,
/// following `BRANCH`'s documented semantics: the offset is applied to `IP` *after* the offset
/// cell itself has been consumed.
fn resolve_branch_to_here(vm: &mut Vm, addr: usize) -> error::Result<()> {
    resolve_branch(vm, addr, vm.memory.here())
}

fn resolve_branch(vm: &mut Vm, addr: usize, target: usize) -> error::Result<()> {
    let ip_after_offset_cell = addr + CELL;
    let offset = target as i64 - ip_after_offset_cell as i64;
    vm.memory.store_cell(addr, offset)?;
    Ok(())
}

fn find_required(vm: &Vm, name: &str) -> usize {
    vm.dictionary.find(name).unwrap_or_else(|| panic!("required word '{}' is not registered", name))
}

// ---------------------------------------------------------------------------------------------
// Inner-interpreter-internal primitives.  LIT/SLIT/BRANCH/0BRANCH read their own inline operand
// cell(s), so they are the only words allowed to reach into `vm.ip` directly.
// ---------------------------------------------------------------------------------------------

fn word_lit(vm: &mut Vm) -> error::Result<()> {
    let value = vm.memory.fetch_cell(vm.ip)?;
    vm.ip += CELL;
    vm.push(value)
}

fn word_slit(vm: &mut Vm) -> error::Result<()> {
    let len = vm.memory.fetch_cell(vm.ip)? as usize;
    vm.ip += CELL;
    let addr = vm.ip;
    vm.ip += len;
    vm.ip = Memory::aligned(vm.ip);
    vm.push(addr as i64)?;
    vm.push(len as i64)
}

fn word_branch(vm: &mut Vm) -> error::Result<()> {
    let offset = vm.memory.fetch_cell(vm.ip)?;
    vm.ip += CELL;
    vm.ip = (vm.ip as i64 + offset) as usize;
    Ok(())
}

fn word_zbranch(vm: &mut Vm) -> error::Result<()> {
    let flag = vm.pop()?;
    let offset = vm.memory.fetch_cell(vm.ip)?;
    vm.ip += CELL;
    if flag == 0 {
        vm.ip = (vm.ip as i64 + offset) as usize;
    }
    Ok(())
}

fn word_exit(vm: &mut Vm) -> error::Result<()> {
    vm.ip = vm.return_stack.pop()? as usize;
    Ok(())
}

fn word_do_runtime(vm: &mut Vm) -> error::Result<()> {
    let index = vm.pop()?;
    let limit = vm.pop()?;
    vm.return_stack.push(limit)?;
    vm.return_stack.push(index)
}

fn word_qdo_runtime(vm: &mut Vm) -> error::Result<()> {
    let index = vm.pop()?;
    let limit = vm.pop()?;
    let offset = vm.memory.fetch_cell(vm.ip)?;
    vm.ip += CELL;
    if limit == index {
        vm.ip = (vm.ip as i64 + offset) as usize;
    } else {
        vm.return_stack.push(limit)?;
        vm.return_stack.push(index)?;
    }
    Ok(())
}

/// Did advancing from `before` to `after` cross `limit` in the direction `step` travels (spec
/// §4.4 `LOOP`/`+LOOP`, §8 boundary behavior)?
fn crossed_boundary(before: i64, after: i64, limit: i64, step: i64) -> bool {
    if step >= 0 {
        before < limit && after >= limit
    } else {
        before >= limit && after < limit
    }
}

fn word_loop_runtime(vm: &mut Vm) -> error::Result<()> {
    let index = vm.return_stack.pop()?;
    let limit = vm.return_stack.pop()?;
    let new_index = index + 1;
    let offset = vm.memory.fetch_cell(vm.ip)?;
    vm.ip += CELL;

    if !crossed_boundary(index, new_index, limit, 1) {
        vm.return_stack.push(limit)?;
        vm.return_stack.push(new_index)?;
        vm.ip = (vm.ip as i64 + offset) as usize;
    }
    Ok(())
}

fn word_plus_loop_runtime(vm: &mut Vm) -> error::Result<()> {
    let step = vm.pop()?;
    let index = vm.return_stack.pop()?;
    let limit = vm.return_stack.pop()?;
    let new_index = index + step;
    let offset = vm.memory.fetch_cell(vm.ip)?;
    vm.ip += CELL;

    if !crossed_boundary(index, new_index, limit, step) {
        vm.return_stack.push(limit)?;
        vm.return_stack.push(new_index)?;
        vm.ip = (vm.ip as i64 + offset) as usize;
    }
    Ok(())
}

fn word_unloop(vm: &mut Vm) -> error::Result<()> {
    let _index = vm.return_stack.pop()?;
    let _limit = vm.return_stack.pop()?;
    Ok(())
}

fn word_i(vm: &mut Vm) -> error::Result<()> {
    let index = vm.return_stack.peek(0)?;
    vm.push(index)
}

fn word_j(vm: &mut Vm) -> error::Result<()> {
    let index = vm.return_stack.peek(2)?;
    vm.push(index)
}

/// `(DOES>)`: patches the most recently `CREATE`d entry to run the DOES body whose address was
/// compiled as this primitive's own inline operand.
fn word_does_runtime(vm: &mut Vm) -> error::Result<()> {
    let does_offset = vm.memory.fetch_cell(vm.ip)?;
    vm.ip += CELL;
    let latest = vm.dictionary.latest();
    vm.dictionary.mark_does(latest, does_offset);
    Ok(())
}

// ---------------------------------------------------------------------------------------------
// Defining words.
// ---------------------------------------------------------------------------------------------

fn word_colon(vm: &mut Vm) -> error::Result<()> {
    let (name, location) = vm.input.word()?;
    if name.is_empty() {
        return vm.fault_at(ErrorKind::CompileMismatch, location, "':' expects a name.");
    }

    let here_snapshot = vm.memory.here();
    let dict_len_snapshot = vm.dictionary.len();

    vm.memory.align();
    let body = vm.memory.here();
    let xt = vm.dictionary.create(&name, Code::Docol, body as i64)?;
    vm.dictionary.hide(xt);

    vm.defining = Some(DefiningState { xt, here_snapshot, dict_len_snapshot });
    vm.state = State::Compile;
    Ok(())
}

fn word_semicolon(vm: &mut Vm) -> error::Result<()> {
    let defining = match vm.defining.take() {
        Some(defining) => defining,
        None => return vm.fault(ErrorKind::CompileMismatch, "';' with no matching ':'."),
    };

    let exit_xt = vm.cached().exit;
    vm.compile_xt(exit_xt)?;
    vm.dictionary.reveal(defining.xt);
    vm.state = State::Interpret;
    Ok(())
}

fn word_immediate(vm: &mut Vm) -> error::Result<()> {
    let xt = vm.dictionary.latest();
    vm.dictionary.make_immediate(xt);
    Ok(())
}

fn word_create(vm: &mut Vm) -> error::Result<()> {
    let (name, location) = vm.input.word()?;
    if name.is_empty() {
        return vm.fault_at(ErrorKind::CompileMismatch, location, "CREATE expects a name.");
    }
    vm.memory.align();
    let body = vm.memory.here();
    vm.dictionary.create(&name, Code::Dovar, body as i64)?;
    Ok(())
}

fn word_variable(vm: &mut Vm) -> error::Result<()> {
    word_create(vm)?;
    vm.memory.comma(0)?;
    Ok(())
}

fn word_constant(vm: &mut Vm) -> error::Result<()> {
    let value = vm.pop()?;
    let (name, location) = vm.input.word()?;
    if name.is_empty() {
        return vm.fault_at(ErrorKind::CompileMismatch, location, "CONSTANT expects a name.");
    }
    vm.dictionary.create(&name, Code::Docon, value)?;
    Ok(())
}

fn word_does(vm: &mut Vm) -> error::Result<()> {
    if !vm.is_compiling() {
        return vm.fault(ErrorKind::CompileMismatch, "DOES> is only valid inside a definition.");
    }

    let does_xt = vm.cached().does_runtime;
    vm.compile_xt(does_xt)?;
    let placeholder = vm.compile_cell(0)?;

    let exit_xt = vm.cached().exit;
    vm.compile_xt(exit_xt)?;

    let does_offset = vm.memory.here();
    vm.memory.store_cell(placeholder, does_offset as i64)?;
    Ok(())
}

fn word_recurse(vm: &mut Vm) -> error::Result<()> {
    let xt = match &vm.defining {
        Some(defining) => defining.xt,
        None => return vm.fault(ErrorKind::CompileMismatch, "RECURSE outside of a definition."),
    };
    vm.compile_xt(xt)?;
    Ok(())
}

// ---------------------------------------------------------------------------------------------
// `[` `]` `LITERAL` `'` `[']` `POSTPONE`
// ---------------------------------------------------------------------------------------------

fn word_lbracket(vm: &mut Vm) -> error::Result<()> {
    vm.state = State::Interpret;
    Ok(())
}

fn word_rbracket(vm: &mut Vm) -> error::Result<()> {
    vm.state = State::Compile;
    Ok(())
}

fn word_literal(vm: &mut Vm) -> error::Result<()> {
    let value = vm.pop()?;
    if vm.is_compiling() {
        let lit = vm.cached().lit;
        vm.compile_xt(lit)?;
        vm.compile_cell(value)?;
    } else {
        vm.push(value)?;
    }
    Ok(())
}

fn word_tick(vm: &mut Vm) -> error::Result<()> {
    let (name, location) = vm.input.word()?;
    match vm.dictionary.find(&name) {
        Some(xt) => vm.push(xt as i64),
        None => vm.fault_at(ErrorKind::UnknownWord, location, format!("'{}' is not a word.", name)),
    }
}

fn word_bracket_tick(vm: &mut Vm) -> error::Result<()> {
    let (name, location) = vm.input.word()?;
    let xt = match vm.dictionary.find(&name) {
        Some(xt) => xt,
        None => return vm.fault_at(ErrorKind::UnknownWord, location, format!("'{}' is not a word.", name)),
    };
    let lit = vm.cached().lit;
    vm.compile_xt(lit)?;
    vm.compile_cell(xt as i64)?;
    Ok(())
}

fn word_postpone(vm: &mut Vm) -> error::Result<()> {
    let (name, location) = vm.input.word()?;
    let xt = match vm.dictionary.find(&name) {
        Some(xt) => xt,
        None => return vm.fault_at(ErrorKind::UnknownWord, location, format!("'{}' is not a word.", name)),
    };
    vm.compile_xt(xt)?;
    Ok(())
}

// ---------------------------------------------------------------------------------------------
// `IF`/`ELSE`/`THEN`, `BEGIN`/`UNTIL`/`AGAIN`, `WHILE`/`REPEAT`.
// ---------------------------------------------------------------------------------------------

fn word_if(vm: &mut Vm) -> error::Result<()> {
    let zbranch = vm.cached().zbranch;
    vm.compile_xt(zbranch)?;
    let addr = vm.compile_cell(0)?;
    vm.push(addr as i64)
}

fn word_else(vm: &mut Vm) -> error::Result<()> {
    let branch = vm.cached().branch;
    vm.compile_xt(branch)?;
    let new_addr = vm.compile_cell(0)?;

    let if_addr = vm.pop()? as usize;
    resolve_branch_to_here(vm, if_addr)?;
    vm.push(new_addr as i64)
}

fn word_then(vm: &mut Vm) -> error::Result<()> {
    let addr = vm.pop()? as usize;
    resolve_branch_to_here(vm, addr)
}

fn word_begin(vm: &mut Vm) -> error::Result<()> {
    vm.push(vm.memory.here() as i64)
}

fn word_until(vm: &mut Vm) -> error::Result<()> {
    let target = vm.pop()? as usize;
    let zbranch = vm.cached().zbranch;
    vm.compile_xt(zbranch)?;
    let addr = vm.compile_cell(0)?;
    resolve_branch(vm, addr, target)
}

fn word_again(vm: &mut Vm) -> error::Result<()> {
    let target = vm.pop()? as usize;
    let branch = vm.cached().branch;
    vm.compile_xt(branch)?;
    let addr = vm.compile_cell(0)?;
    resolve_branch(vm, addr, target)
}

fn word_while(vm: &mut Vm) -> error::Result<()> {
    let zbranch = vm.cached().zbranch;
    vm.compile_xt(zbranch)?;
    let addr = vm.compile_cell(0)?;
    vm.push(addr as i64)
}

fn word_repeat(vm: &mut Vm) -> error::Result<()> {
    let while_addr = vm.pop()? as usize;
    let dest = vm.pop()? as usize;

    let branch = vm.cached().branch;
    vm.compile_xt(branch)?;
    let addr = vm.compile_cell(0)?;
    resolve_branch(vm, addr, dest)?;
    resolve_branch_to_here(vm, while_addr)
}

// ---------------------------------------------------------------------------------------------
// `DO`/`?DO`/`LOOP`/`+LOOP`/`LEAVE`.
// ---------------------------------------------------------------------------------------------

/// No forward-skip patch is needed for a plain `DO` (it always runs its body once); this
/// sentinel in the `skip_addr` slot tells `LOOP`/`+LOOP` to leave it alone.
const NO_SKIP: i64 = -1;

fn word_do(vm: &mut Vm) -> error::Result<()> {
    let do_xt = vm.cached().do_;
    vm.compile_xt(do_xt)?;
    vm.push(NO_SKIP)?;
    vm.push(vm.memory.here() as i64)?;
    vm.leave_stack.push(Vec::new());
    Ok(())
}

fn word_qdo(vm: &mut Vm) -> error::Result<()> {
    let qdo_xt = vm.cached().qdo;
    vm.compile_xt(qdo_xt)?;
    let skip_addr = vm.compile_cell(0)?;
    vm.push(skip_addr as i64)?;
    vm.push(vm.memory.here() as i64)?;
    vm.leave_stack.push(Vec::new());
    Ok(())
}

fn close_loop(vm: &mut Vm, loop_xt: usize) -> error::Result<()> {
    let loop_start = vm.pop()? as usize;
    let skip_addr = vm.pop()?;

    vm.compile_xt(loop_xt)?;
    let addr = vm.compile_cell(0)?;
    resolve_branch(vm, addr, loop_start)?;

    let loop_exit = vm.memory.here();
    if skip_addr != NO_SKIP {
        resolve_branch(vm, skip_addr as usize, loop_exit)?;
    }

    let leaves = vm.leave_stack.pop().unwrap_or_default();
    for leave_addr in leaves {
        resolve_branch(vm, leave_addr, loop_exit)?;
    }
    Ok(())
}

fn word_loop(vm: &mut Vm) -> error::Result<()> {
    let loop_xt = vm.cached().loop_;
    close_loop(vm, loop_xt)
}

fn word_plus_loop(vm: &mut Vm) -> error::Result<()> {
    let plus_loop_xt = vm.cached().plus_loop;
    close_loop(vm, plus_loop_xt)
}

fn word_leave(vm: &mut Vm) -> error::Result<()> {
    if vm.leave_stack.is_empty() {
        return vm.fault(ErrorKind::CompileMismatch, "LEAVE used outside of a DO loop.");
    }

    let unloop_xt = vm.cached().unloop;
    vm.compile_xt(unloop_xt)?;

    let branch = vm.cached().branch;
    vm.compile_xt(branch)?;
    let addr = vm.compile_cell(0)?;
    vm.leave_stack.last_mut().unwrap().push(addr);
    Ok(())
}

// ---------------------------------------------------------------------------------------------
// `CASE`/`OF`/`ENDOF`/`ENDCASE` -- compiled as a chain of `OVER = 0BRANCH` / `DROP ... BRANCH`.
// ---------------------------------------------------------------------------------------------

fn word_case(vm: &mut Vm) -> error::Result<()> {
    vm.case_stack.push(Vec::new());
    Ok(())
}

fn word_of(vm: &mut Vm) -> error::Result<()> {
    let over = find_required(vm, "OVER");
    let equals = find_required(vm, "=");
    let drop = find_required(vm, "DROP");

    vm.compile_xt(over)?;
    vm.compile_xt(equals)?;

    let zbranch = vm.cached().zbranch;
    vm.compile_xt(zbranch)?;
    let addr = vm.compile_cell(0)?;
    vm.compile_xt(drop)?;
    vm.push(addr as i64)
}

fn word_endof(vm: &mut Vm) -> error::Result<()> {
    let branch = vm.cached().branch;
    vm.compile_xt(branch)?;
    let end_addr = vm.compile_cell(0)?;

    match vm.case_stack.last_mut() {
        Some(ends) => ends.push(end_addr),
        None => return vm.fault(ErrorKind::CompileMismatch, "ENDOF outside of a CASE."),
    }

    let of_addr = vm.pop()? as usize;
    resolve_branch_to_here(vm, of_addr)
}

fn word_endcase(vm: &mut Vm) -> error::Result<()> {
    let drop = find_required(vm, "DROP");
    vm.compile_xt(drop)?;

    let ends = match vm.case_stack.pop() {
        Some(ends) => ends,
        None => return vm.fault(ErrorKind::CompileMismatch, "ENDCASE with no matching CASE."),
    };

    for addr in ends {
        resolve_branch_to_here(vm, addr)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------------------------
// String literals: `S"` `."` `C"` `ABORT"` `CHAR` `[CHAR]`.
// ---------------------------------------------------------------------------------------------

fn compile_inline_string(vm: &mut Vm, text: &str) -> error::Result<()> {
    let slit = vm.cached().slit;
    vm.compile_xt(slit)?;
    vm.compile_cell(text.len() as i64)?;
    for byte in text.bytes() {
        vm.memory.c_comma(byte)?;
    }
    vm.memory.align();
    Ok(())
}

fn word_squote(vm: &mut Vm) -> error::Result<()> {
    let text = read_delimited(vm, b'"');
    if vm.is_compiling() {
        compile_inline_string(vm, &text)
    } else {
        let addr = vm.memory.allocate_bytes(text.as_bytes())?;
        vm.push(addr as i64)?;
        vm.push(text.len() as i64)
    }
}

fn word_dot_quote(vm: &mut Vm) -> error::Result<()> {
    let text = read_delimited(vm, b'"');
    if vm.is_compiling() {
        compile_inline_string(vm, &text)?;
        let type_xt = find_required(vm, "TYPE");
        vm.compile_xt(type_xt)
    } else {
        vm.emit_text(text.as_bytes())
    }
}

fn word_cquote(vm: &mut Vm) -> error::Result<()> {
    let text = read_delimited(vm, b'"');
    let bytes = text.as_bytes();
    if bytes.len() > u8::MAX as usize {
        return vm.fault(ErrorKind::DataSpaceExhausted, "Counted string longer than 255 bytes.");
    }

    let addr = vm.memory.here();
    vm.memory.c_comma(bytes.len() as u8)?;
    for &byte in bytes {
        vm.memory.c_comma(byte)?;
    }

    if vm.is_compiling() {
        let lit = vm.cached().lit;
        vm.compile_xt(lit)?;
        vm.compile_cell(addr as i64)
    } else {
        vm.push(addr as i64)
    }
}

fn word_abort_quote(vm: &mut Vm) -> error::Result<()> {
    let text = read_delimited(vm, b'"');
    if vm.is_compiling() {
        compile_inline_string(vm, &text)?;
        let check = find_required(vm, "(ABORT\")");
        vm.compile_xt(check)
    } else {
        let flag = vm.pop_bool()?;
        if flag {
            vm.fault(ErrorKind::Abort, text)
        } else {
            Ok(())
        }
    }
}

fn word_abort_quote_runtime(vm: &mut Vm) -> error::Result<()> {
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    let flag = vm.pop_bool()?;
    if flag {
        let bytes = vm.memory.read_bytes(addr, len)?.to_vec();
        vm.fault(ErrorKind::Abort, String::from_utf8_lossy(&bytes).to_string())
    } else {
        Ok(())
    }
}

fn word_char(vm: &mut Vm) -> error::Result<()> {
    let (text, location) = vm.input.word()?;
    match text.as_bytes().first() {
        Some(&c) => vm.push(c as i64),
        None => vm.fault_at(ErrorKind::CompileMismatch, location, "CHAR expects a character."),
    }
}

fn word_bracket_char(vm: &mut Vm) -> error::Result<()> {
    let (text, location) = vm.input.word()?;
    let c = match text.as_bytes().first() {
        Some(&c) => c as i64,
        None => return vm.fault_at(ErrorKind::CompileMismatch, location, "[CHAR] expects a character."),
    };

    if vm.is_compiling() {
        let lit = vm.cached().lit;
        vm.compile_xt(lit)?;
        vm.compile_cell(c)
    } else {
        vm.push(c)
    }
}

// ---------------------------------------------------------------------------------------------
// `ABORT`, `INCLUDE`, `REQUIRE`, `EVALUATE`, `BYE`.
// ---------------------------------------------------------------------------------------------

fn word_abort(vm: &mut Vm) -> error::Result<()> {
    vm.fault(ErrorKind::Abort, "ABORT")
}

/// `(`: discard input up to the matching `)`, so parenthesized comments can appear anywhere a
/// word is expected, interpreting or compiling alike -- needed by any bootstrap file with
/// comments.
fn word_paren_comment(vm: &mut Vm) -> error::Result<()> {
    vm.input.parse(b')');
    Ok(())
}

/// `\`: discard the rest of the current line.
fn word_backslash_comment(vm: &mut Vm) -> error::Result<()> {
    vm.input.skip_to_eol();
    Ok(())
}

fn word_include(vm: &mut Vm) -> error::Result<()> {
    let (path, _) = vm.input.word()?;
    vm.include_file(&path)
}

fn word_require(vm: &mut Vm) -> error::Result<()> {
    let (path, _) = vm.input.word()?;
    vm.require_file(&path)
}

fn word_evaluate(vm: &mut Vm) -> error::Result<()> {
    let len = vm.pop()? as usize;
    let addr = vm.pop()? as usize;
    let bytes = vm.memory.read_bytes(addr, len)?.to_vec();
    let text = String::from_utf8_lossy(&bytes).to_string();
    vm.evaluate_string(&text)
}

/// `BYE`: terminate with the exit code on top of the data stack, e.g. `1 BYE`.
fn word_bye(vm: &mut Vm) -> error::Result<()> {
    let code = vm.pop()?;
    vm.exit_code = Some(code as i32);
    Ok(())
}

/// Register every compiler-internal primitive and every IMMEDIATE control-flow word, then record
/// the cached XTs the rest of the compiler relies on.  Must run before any
/// user-visible word that might reference `DO`/`TYPE`/`OVER`/etc. by name is parsed -- it need
/// not run before they're *registered*, since lookups happen lazily when the compiler words
/// execute.
pub fn register_compiler_words(vm: &mut Vm) -> error::Result<()> {
    let lit = vm.add_primitive("(lit)", false, word_lit)?;
    vm.dictionary.hide(lit);
    let slit = vm.add_primitive("(slit)", false, word_slit)?;
    vm.dictionary.hide(slit);
    let branch = vm.add_primitive("(branch)", false, word_branch)?;
    vm.dictionary.hide(branch);
    let zbranch = vm.add_primitive("(0branch)", false, word_zbranch)?;
    vm.dictionary.hide(zbranch);
    let exit = vm.add_primitive("EXIT", false, word_exit)?;
    let do_ = vm.add_primitive("(do)", false, word_do_runtime)?;
    vm.dictionary.hide(do_);
    let qdo = vm.add_primitive("(?do)", false, word_qdo_runtime)?;
    vm.dictionary.hide(qdo);
    let loop_ = vm.add_primitive("(loop)", false, word_loop_runtime)?;
    vm.dictionary.hide(loop_);
    let plus_loop = vm.add_primitive("(+loop)", false, word_plus_loop_runtime)?;
    vm.dictionary.hide(plus_loop);
    let unloop = vm.add_primitive("UNLOOP", false, word_unloop)?;
    let does_runtime = vm.add_primitive("(does>)", false, word_does_runtime)?;
    vm.dictionary.hide(does_runtime);

    vm.set_cached_xts(CachedXts {
        lit,
        slit,
        branch,
        zbranch,
        exit,
        do_,
        qdo,
        loop_,
        plus_loop,
        unloop,
        does_runtime,
    });

    vm.add_primitive("I", false, word_i)?;
    vm.add_primitive("J", false, word_j)?;
    vm.add_primitive("(ABORT\")", false, word_abort_quote_runtime)?;

    vm.add_primitive(":", true, word_colon)?;
    vm.add_primitive(";", true, word_semicolon)?;
    vm.add_primitive("IMMEDIATE", false, word_immediate)?;
    vm.add_primitive("CREATE", false, word_create)?;
    vm.add_primitive("VARIABLE", false, word_variable)?;
    vm.add_primitive("CONSTANT", false, word_constant)?;
    vm.add_primitive("DOES>", true, word_does)?;
    vm.add_primitive("RECURSE", true, word_recurse)?;

    vm.add_primitive("[", true, word_lbracket)?;
    vm.add_primitive("]", false, word_rbracket)?;
    vm.add_primitive("LITERAL", true, word_literal)?;
    vm.add_primitive("'", false, word_tick)?;
    vm.add_primitive("[']", true, word_bracket_tick)?;
    vm.add_primitive("POSTPONE", true, word_postpone)?;

    vm.add_primitive("IF", true, word_if)?;
    vm.add_primitive("ELSE", true, word_else)?;
    vm.add_primitive("THEN", true, word_then)?;
    vm.add_primitive("BEGIN", true, word_begin)?;
    vm.add_primitive("UNTIL", true, word_until)?;
    vm.add_primitive("AGAIN", true, word_again)?;
    vm.add_primitive("WHILE", true, word_while)?;
    vm.add_primitive("REPEAT", true, word_repeat)?;

    vm.add_primitive("DO", true, word_do)?;
    vm.add_primitive("?DO", true, word_qdo)?;
    vm.add_primitive("LOOP", true, word_loop)?;
    vm.add_primitive("+LOOP", true, word_plus_loop)?;
    vm.add_primitive("LEAVE", true, word_leave)?;

    vm.add_primitive("CASE", true, word_case)?;
    vm.add_primitive("OF", true, word_of)?;
    vm.add_primitive("ENDOF", true, word_endof)?;
    vm.add_primitive("ENDCASE", true, word_endcase)?;

    vm.add_primitive("S\"", true, word_squote)?;
    vm.add_primitive(".\"", true, word_dot_quote)?;
    vm.add_primitive("C\"", true, word_cquote)?;
    vm.add_primitive("ABORT\"", true, word_abort_quote)?;
    vm.add_primitive("CHAR", false, word_char)?;
    vm.add_primitive("[CHAR]", true, word_bracket_char)?;

    vm.add_primitive("ABORT", false, word_abort)?;
    vm.add_primitive("(", true, word_paren_comment)?;
    vm.add_primitive("\\", true, word_backslash_comment)?;
    vm.add_primitive("INCLUDE", false, word_include)?;
    vm.add_primitive("REQUIRE", false, word_require)?;
    vm.add_primitive("EVALUATE", false, word_evaluate)?;
    vm.add_primitive("BYE", false, word_bye)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::built_ins::register_all;

    fn new_vm() -> Vm {
        let mut vm = Vm::new();
        register_all(&mut vm).unwrap();
        vm
    }

    #[test]
    fn if_then_skips_the_consequent_when_false() {
        let mut vm = new_vm();
        vm.interpret_line("<test>", ": t 0 IF 111 THEN ; t").unwrap();
        assert_eq!(vm.data_stack.depth(), 0);
    }

    #[test]
    fn if_else_then_picks_the_right_branch() {
        let mut vm = new_vm();
        vm.interpret_line("<test>", ": t -1 IF 1 ELSE 2 THEN ; t").unwrap();
        assert_eq!(vm.pop().unwrap(), 1);

        vm.interpret_line("<test>", ": u 0 IF 1 ELSE 2 THEN ; u").unwrap();
        assert_eq!(vm.pop().unwrap(), 2);
    }

    #[test]
    fn do_loop_runs_from_zero_to_limit() {
        let mut vm = new_vm();
        vm.interpret_line("<test>", ": sum 0 10 0 DO I + LOOP ; sum").unwrap();
        assert_eq!(vm.pop().unwrap(), 45);
    }

    #[test]
    fn qdo_with_equal_bounds_runs_zero_times() {
        let mut vm = new_vm();
        vm.interpret_line("<test>", ": t 0 5 5 ?DO 1+ LOOP ; t").unwrap();
        assert_eq!(vm.pop().unwrap(), 0);
    }

    #[test]
    fn recursion_computes_factorial() {
        let mut vm = new_vm();
        vm.interpret_line(
            "<test>",
            ": fact DUP 1 > IF DUP 1 - RECURSE * THEN ; 5 fact",
        )
        .unwrap();
        assert_eq!(vm.pop().unwrap(), 120);
    }

    #[test]
    fn does_creates_a_word_that_runs_the_does_body() {
        let mut vm = new_vm();
        vm.interpret_line(
            "<test>",
            ": CONST CREATE , DOES> @ ; 42 CONST FORTYTWO FORTYTWO",
        )
        .unwrap();
        assert_eq!(vm.pop().unwrap(), 42);
    }

    #[test]
    fn failed_definition_rolls_here_back() {
        let mut vm = new_vm();
        let here_before = vm.memory.here();
        let result = vm.interpret_line("<test>", ": bad THEN ;");
        assert!(result.is_err());
        vm.recover_from_abort();
        assert_eq!(vm.memory.here(), here_before);
    }
}

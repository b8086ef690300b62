//! Data and return stack manipulation.
//!
//! Signatures are given in the usual Forth stack-effect notation: `( before -- after )`.

use crate::runtime::error::{self};
use crate::runtime::interpreter::Vm;

/// Signature: `value -- value value`
fn word_dup(vm: &mut Vm) -> error::Result<()> {
    let a = vm.data_stack.peek(0)?;
    vm.push(a)
}

/// Signature: `value --`
fn word_drop(vm: &mut Vm) -> error::Result<()> {
    vm.pop()?;
    Ok(())
}

/// Signature: `a b -- b a`
fn word_swap(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(b)?;
    vm.push(a)
}

/// Signature: `a b -- a b a`
fn word_over(vm: &mut Vm) -> error::Result<()> {
    let a = vm.data_stack.peek(1)?;
    vm.push(a)
}

/// Signature: `a b c -- b c a`
fn word_rot(vm: &mut Vm) -> error::Result<()> {
    let c = vm.pop()?;
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(b)?;
    vm.push(c)?;
    vm.push(a)
}

/// Signature: `a b c -- c a b`
fn word_minus_rot(vm: &mut Vm) -> error::Result<()> {
    let c = vm.pop()?;
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(c)?;
    vm.push(a)?;
    vm.push(b)
}

/// Signature: `a b -- b`
fn word_nip(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    vm.pop()?;
    vm.push(b)
}

/// Signature: `a b -- b a b`
fn word_tuck(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(b)?;
    vm.push(a)?;
    vm.push(b)
}

/// Signature: `a -- a a | 0` (duplicates only if nonzero)
fn word_qdup(vm: &mut Vm) -> error::Result<()> {
    let a = vm.data_stack.peek(0)?;
    if a != 0 {
        vm.push(a)?;
    }
    Ok(())
}

/// Signature: `a b -- a b a b`
fn word_2dup(vm: &mut Vm) -> error::Result<()> {
    let b = vm.data_stack.peek(0)?;
    let a = vm.data_stack.peek(1)?;
    vm.push(a)?;
    vm.push(b)
}

/// Signature: `a b --`
fn word_2drop(vm: &mut Vm) -> error::Result<()> {
    vm.pop()?;
    vm.pop()?;
    Ok(())
}

/// Signature: `a b c d -- c d a b`
fn word_2swap(vm: &mut Vm) -> error::Result<()> {
    let d = vm.pop()?;
    let c = vm.pop()?;
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(c)?;
    vm.push(d)?;
    vm.push(a)?;
    vm.push(b)
}

/// Signature: `a b c d -- a b c d a b`
fn word_2over(vm: &mut Vm) -> error::Result<()> {
    let a = vm.data_stack.peek(3)?;
    let b = vm.data_stack.peek(2)?;
    vm.push(a)?;
    vm.push(b)
}

/// Signature: `value -- ; R: -- value`
fn word_to_r(vm: &mut Vm) -> error::Result<()> {
    let value = vm.pop()?;
    vm.return_stack.push(value)
}

/// Signature: -- value; R: value --
fn word_r_from(vm: &mut Vm) -> error::Result<()> {
    let value = vm.return_stack.pop()?;
    vm.push(value)
}

/// Signature: -- value; R: value -- value
fn word_r_fetch(vm: &mut Vm) -> error::Result<()> {
    let value = vm.return_stack.peek(0)?;
    vm.push(value)
}

/// Signature: `a b -- ; R: -- a b`
fn word_2_to_r(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.return_stack.push(a)?;
    vm.return_stack.push(b)
}

/// Signature: `-- a b ; R: a b --`
fn word_2r_from(vm: &mut Vm) -> error::Result<()> {
    let b = vm.return_stack.pop()?;
    let a = vm.return_stack.pop()?;
    vm.push(a)?;
    vm.push(b)
}

/// Signature: `-- a b ; R: a b -- a b`
fn word_2r_fetch(vm: &mut Vm) -> error::Result<()> {
    let a = vm.return_stack.peek(1)?;
    let b = vm.return_stack.peek(0)?;
    vm.push(a)?;
    vm.push(b)
}

/// Signature: `-- depth` (data stack depth, for `.S`)
fn word_depth(vm: &mut Vm) -> error::Result<()> {
    let depth = vm.data_stack.depth() as i64;
    vm.push(depth)
}

pub fn register(vm: &mut Vm) -> error::Result<()> {
    vm.add_primitive("DUP", false, word_dup)?;
    vm.add_primitive("DROP", false, word_drop)?;
    vm.add_primitive("SWAP", false, word_swap)?;
    vm.add_primitive("OVER", false, word_over)?;
    vm.add_primitive("ROT", false, word_rot)?;
    vm.add_primitive("-ROT", false, word_minus_rot)?;
    vm.add_primitive("NIP", false, word_nip)?;
    vm.add_primitive("TUCK", false, word_tuck)?;
    vm.add_primitive("?DUP", false, word_qdup)?;
    vm.add_primitive("2DUP", false, word_2dup)?;
    vm.add_primitive("2DROP", false, word_2drop)?;
    vm.add_primitive("2SWAP", false, word_2swap)?;
    vm.add_primitive("2OVER", false, word_2over)?;
    vm.add_primitive(">R", false, word_to_r)?;
    vm.add_primitive("R>", false, word_r_from)?;
    vm.add_primitive("R@", false, word_r_fetch)?;
    vm.add_primitive("2>R", false, word_2_to_r)?;
    vm.add_primitive("2R>", false, word_2r_from)?;
    vm.add_primitive("2R@", false, word_2r_fetch)?;
    vm.add_primitive("DEPTH", false, word_depth)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm_with_stack_words() -> Vm {
        let mut vm = Vm::new();
        register(&mut vm).unwrap();
        vm
    }

    #[test]
    fn rot_cycles_three_deep() {
        let mut vm = vm_with_stack_words();
        vm.push(1).unwrap();
        vm.push(2).unwrap();
        vm.push(3).unwrap();
        word_rot(&mut vm).unwrap();
        assert_eq!(vm.pop().unwrap(), 1);
        assert_eq!(vm.pop().unwrap(), 3);
        assert_eq!(vm.pop().unwrap(), 2);
    }

    #[test]
    fn qdup_only_duplicates_nonzero() {
        let mut vm = vm_with_stack_words();
        vm.push(0).unwrap();
        word_qdup(&mut vm).unwrap();
        assert_eq!(vm.data_stack.depth(), 1);

        vm.pop().unwrap();
        vm.push(5).unwrap();
        word_qdup(&mut vm).unwrap();
        assert_eq!(vm.data_stack.depth(), 2);
    }

    #[test]
    fn to_r_and_r_from_round_trip() {
        let mut vm = vm_with_stack_words();
        vm.push(99).unwrap();
        word_to_r(&mut vm).unwrap();
        assert_eq!(vm.data_stack.depth(), 0);
        word_r_from(&mut vm).unwrap();
        assert_eq!(vm.pop().unwrap(), 99);
    }
}

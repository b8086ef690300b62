//! Number-base control and pictured-numeric output.

use crate::runtime::error;
use crate::runtime::interpreter::Vm;

fn word_base(vm: &mut Vm) -> error::Result<()> {
    let addr = vm.base_addr as i64;
    vm.push(addr)
}

fn word_decimal(vm: &mut Vm) -> error::Result<()> {
    vm.memory.store_cell(vm.base_addr, 10)
}

fn word_hex(vm: &mut Vm) -> error::Result<()> {
    vm.memory.store_cell(vm.base_addr, 16)
}

fn word_less_number_sign(vm: &mut Vm) -> error::Result<()> {
    vm.pic.begin();
    Ok(())
}

/// `#`: `ud1 -- ud2`.  A double-cell number is held on the stack as `(lo hi)` with `hi` on top,
/// the order `n 0` naturally produces, so that `n 0 <# #S #> EVALUATE` round-trips to `n`. Every
/// value this engine's `#`/`#S`/`#>` ever see fits in a single cell, so `hi` is only ever `0` and
/// is carried through unchanged rather than folded into a true 128-bit accumulator.
fn word_number_sign(vm: &mut Vm) -> error::Result<()> {
    let hi = vm.pop()?;
    let lo = vm.pop()? as u64;
    let base = vm.base();
    let remainder = vm.pic.digit(lo, base);
    vm.push(remainder as i64)?;
    vm.push(hi)
}

/// `#S`: `ud1 -- 0 0`.  Repeats `#` until the low cell reaches zero.
fn word_number_sign_s(vm: &mut Vm) -> error::Result<()> {
    let hi = vm.pop()?;
    let lo = vm.pop()? as u64;
    let base = vm.base();
    vm.pic.digits(lo, base);
    vm.push(0)?;
    vm.push(hi)
}

/// `#>`: `ud2 -- addr u`.  Drops the now-exhausted double number and returns the finished string.
fn word_number_sign_greater(vm: &mut Vm) -> error::Result<()> {
    vm.pop()?;
    vm.pop()?;
    let text = vm.pic.finish();
    let addr = vm.memory.allocate_bytes(&text)?;
    vm.push(addr as i64)?;
    vm.push(text.len() as i64)
}

fn word_hold(vm: &mut Vm) -> error::Result<()> {
    let c = vm.pop()? as u8;
    vm.pic.hold(c);
    Ok(())
}

fn word_sign(vm: &mut Vm) -> error::Result<()> {
    let flag = vm.pop_bool()?;
    vm.pic.sign(flag);
    Ok(())
}

fn format_in_base(value: i64, base: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let negative = value < 0;
    let mut magnitude = (value as i128).unsigned_abs() as u64;
    let mut digits = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % base as u64) as u32;
        digits.push(std::char::from_digit(digit, base).unwrap_or('0').to_ascii_uppercase());
        magnitude /= base as u64;
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

fn format_unsigned_in_base(value: i64, base: u32) -> String {
    let mut magnitude = value as u64;
    if magnitude == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % base as u64) as u32;
        digits.push(std::char::from_digit(digit, base).unwrap_or('0').to_ascii_uppercase());
        magnitude /= base as u64;
    }
    digits.iter().rev().collect()
}

fn word_dot(vm: &mut Vm) -> error::Result<()> {
    let value = vm.pop()?;
    let text = format_in_base(value, vm.base());
    vm.emit_text(text.as_bytes())?;
    vm.emit_text(b" ")
}

fn word_u_dot(vm: &mut Vm) -> error::Result<()> {
    let value = vm.pop()?;
    let text = format_unsigned_in_base(value, vm.base());
    vm.emit_text(text.as_bytes())?;
    vm.emit_text(b" ")
}

/// `.S` — print the data stack non-destructively, bottom to top, for interactive debugging.
fn word_dot_s(vm: &mut Vm) -> error::Result<()> {
    let base = vm.base();
    let cells: Vec<i64> = vm.data_stack.iter().copied().collect();
    for value in cells {
        let text = format_in_base(value, base);
        vm.emit_text(text.as_bytes())?;
        vm.emit_text(b" ")?;
    }
    Ok(())
}

pub fn register(vm: &mut Vm) -> error::Result<()> {
    vm.add_primitive("BASE", false, word_base)?;
    vm.add_primitive("DECIMAL", false, word_decimal)?;
    vm.add_primitive("HEX", false, word_hex)?;

    vm.add_primitive("<#", false, word_less_number_sign)?;
    vm.add_primitive("#", false, word_number_sign)?;
    vm.add_primitive("#S", false, word_number_sign_s)?;
    vm.add_primitive("#>", false, word_number_sign_greater)?;
    vm.add_primitive("HOLD", false, word_hold)?;
    vm.add_primitive("SIGN", false, word_sign)?;

    vm.add_primitive(".", false, word_dot)?;
    vm.add_primitive("U.", false, word_u_dot)?;
    vm.add_primitive(".S", false, word_dot_s)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_and_hex_flip_the_base_cell() {
        let mut vm = Vm::new();
        register(&mut vm).unwrap();
        word_hex(&mut vm).unwrap();
        assert_eq!(vm.base(), 16);
        word_decimal(&mut vm).unwrap();
        assert_eq!(vm.base(), 10);
    }

    #[test]
    fn format_in_base_handles_negative_hex() {
        assert_eq!(format_in_base(-255, 16), "-FF");
        assert_eq!(format_in_base(0, 10), "0");
    }
}

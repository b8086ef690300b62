//! Arithmetic, bitwise, and comparison primitives.

use crate::runtime::error::{self, ErrorKind};
use crate::runtime::interpreter::Vm;

fn word_plus(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(a.wrapping_add(b))
}

fn word_minus(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(a.wrapping_sub(b))
}

fn word_star(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(a.wrapping_mul(b))
}

fn word_slash(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    if b == 0 {
        return vm.fault(ErrorKind::NumberFormat, "Division by zero.");
    }
    vm.push(a.wrapping_div(b))
}

fn word_mod(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    if b == 0 {
        return vm.fault(ErrorKind::NumberFormat, "Division by zero.");
    }
    vm.push(a.wrapping_rem(b))
}

fn word_slash_mod(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    if b == 0 {
        return vm.fault(ErrorKind::NumberFormat, "Division by zero.");
    }
    vm.push(a.wrapping_rem(b))?;
    vm.push(a.wrapping_div(b))
}

fn word_star_slash(vm: &mut Vm) -> error::Result<()> {
    let c = vm.pop()?;
    let b = vm.pop()?;
    let a = vm.pop()?;
    if c == 0 {
        return vm.fault(ErrorKind::NumberFormat, "Division by zero.");
    }
    let product = a as i128 * b as i128;
    vm.push((product / c as i128) as i64)
}

fn word_negate(vm: &mut Vm) -> error::Result<()> {
    let a = vm.pop()?;
    vm.push(a.wrapping_neg())
}

fn word_abs(vm: &mut Vm) -> error::Result<()> {
    let a = vm.pop()?;
    vm.push(a.wrapping_abs())
}

fn word_min(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(a.min(b))
}

fn word_max(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(a.max(b))
}

fn word_and(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(a & b)
}

fn word_or(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(a | b)
}

fn word_xor(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(a ^ b)
}

fn word_invert(vm: &mut Vm) -> error::Result<()> {
    let a = vm.pop()?;
    vm.push(!a)
}

fn word_lshift(vm: &mut Vm) -> error::Result<()> {
    let n = vm.pop()?;
    let a = vm.pop()?;
    vm.push(a.wrapping_shl(n as u32))
}

fn word_rshift(vm: &mut Vm) -> error::Result<()> {
    let n = vm.pop()?;
    let a = vm.pop()?;
    vm.push(((a as u64).wrapping_shr(n as u32)) as i64)
}

fn word_one_plus(vm: &mut Vm) -> error::Result<()> {
    let a = vm.pop()?;
    vm.push(a.wrapping_add(1))
}

fn word_one_minus(vm: &mut Vm) -> error::Result<()> {
    let a = vm.pop()?;
    vm.push(a.wrapping_sub(1))
}

fn word_equals(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push_bool(a == b)
}

fn word_not_equals(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push_bool(a != b)
}

fn word_less_than(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push_bool(a < b)
}

fn word_greater_than(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push_bool(a > b)
}

fn word_less_or_equal(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push_bool(a <= b)
}

fn word_greater_or_equal(vm: &mut Vm) -> error::Result<()> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push_bool(a >= b)
}

fn word_zero_equals(vm: &mut Vm) -> error::Result<()> {
    let a = vm.pop()?;
    vm.push_bool(a == 0)
}

fn word_zero_less(vm: &mut Vm) -> error::Result<()> {
    let a = vm.pop()?;
    vm.push_bool(a < 0)
}

fn word_zero_greater(vm: &mut Vm) -> error::Result<()> {
    let a = vm.pop()?;
    vm.push_bool(a > 0)
}

pub fn register(vm: &mut Vm) -> error::Result<()> {
    vm.add_primitive("+", false, word_plus)?;
    vm.add_primitive("-", false, word_minus)?;
    vm.add_primitive("*", false, word_star)?;
    vm.add_primitive("/", false, word_slash)?;
    vm.add_primitive("MOD", false, word_mod)?;
    vm.add_primitive("/MOD", false, word_slash_mod)?;
    vm.add_primitive("*/", false, word_star_slash)?;
    vm.add_primitive("NEGATE", false, word_negate)?;
    vm.add_primitive("ABS", false, word_abs)?;
    vm.add_primitive("MIN", false, word_min)?;
    vm.add_primitive("MAX", false, word_max)?;
    vm.add_primitive("AND", false, word_and)?;
    vm.add_primitive("OR", false, word_or)?;
    vm.add_primitive("XOR", false, word_xor)?;
    vm.add_primitive("INVERT", false, word_invert)?;
    vm.add_primitive("LSHIFT", false, word_lshift)?;
    vm.add_primitive("RSHIFT", false, word_rshift)?;
    vm.add_primitive("1+", false, word_one_plus)?;
    vm.add_primitive("1-", false, word_one_minus)?;

    vm.add_primitive("=", false, word_equals)?;
    vm.add_primitive("<>", false, word_not_equals)?;
    vm.add_primitive("<", false, word_less_than)?;
    vm.add_primitive(">", false, word_greater_than)?;
    vm.add_primitive("<=", false, word_less_or_equal)?;
    vm.add_primitive(">=", false, word_greater_or_equal)?;
    vm.add_primitive("0=", false, word_zero_equals)?;
    vm.add_primitive("0<", false, word_zero_less)?;
    vm.add_primitive("0>", false, word_zero_greater)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn vm_with_arithmetic() -> Vm {
        let mut vm = Vm::new();
        register(&mut vm).unwrap();
        vm
    }

    #[test_case(7, 3, 1, 2; "positive divide and remainder")]
    #[test_case(-7, 2, -1, -3; "negative dividend truncates toward zero")]
    fn slash_mod_matches_truncating_division(a: i64, b: i64, rem: i64, quot: i64) {
        let mut vm = vm_with_arithmetic();
        vm.push(a).unwrap();
        vm.push(b).unwrap();
        word_slash_mod(&mut vm).unwrap();
        assert_eq!(vm.pop().unwrap(), quot);
        assert_eq!(vm.pop().unwrap(), rem);
    }

    #[test]
    fn division_by_zero_faults() {
        let mut vm = vm_with_arithmetic();
        vm.push(1).unwrap();
        vm.push(0).unwrap();
        assert!(word_slash(&mut vm).is_err());
    }
}

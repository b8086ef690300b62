//! Black-box integration tests driving the VM through its public `Vm` API, exercising the
//! interpreter end-to-end rather than mocking any of its pieces.

use std::fs;

use fifth::runtime::built_ins::register_all;
use fifth::runtime::data_structures::dictionary::MAX_NAME_LEN;
use fifth::runtime::data_structures::stack::STACK_SIZE;
use fifth::runtime::interpreter::State;
use fifth::Vm;

fn new_vm() -> Vm {
    let mut vm = Vm::new();
    register_all(&mut vm).unwrap();
    vm
}

fn run(vm: &mut Vm, code: &str) {
    vm.interpret_line("<test>", code).unwrap();
}

/// Redirect the VM's output to a fresh temp file for the duration of `code`, then return
/// everything written to it.  Exercises `>FILE`/`>STDOUT`/`CREATE-FILE`/`CLOSE-FILE` the same way
/// user Forth code would, rather than reaching into `Vm` internals to sniff stdout.
fn capture_output(vm: &mut Vm, code: &str) -> String {
    let path = std::env::temp_dir().join(format!(
        "fifth-test-{}-{}.out",
        std::process::id(),
        COUNTER.with(|c| {
            let v = c.get();
            c.set(v + 1);
            v
        })
    ));
    let path_str = path.to_string_lossy().to_string();

    let script = format!(
        "S\" {path}\" W/O CREATE-FILE DUP >FILE {code} >STDOUT CLOSE-FILE",
        path = path_str,
        code = code,
    );
    vm.interpret_line("<capture>", &script).unwrap();

    let contents = fs::read_to_string(&path).unwrap_or_default();
    let _ = fs::remove_file(&path);
    contents
}

thread_local! {
    static COUNTER: std::cell::Cell<u32> = std::cell::Cell::new(0);
}

// ---------------------------------------------------------------------------------------------
// §8 end-to-end scenarios
// ---------------------------------------------------------------------------------------------

#[test]
fn scenario_addition_and_print() {
    let mut vm = new_vm();
    let output = capture_output(&mut vm, "2 3 + . CR");
    assert_eq!(output, "5 \n");
}

#[test]
fn scenario_square_via_colon_definition() {
    let mut vm = new_vm();
    let output = capture_output(&mut vm, ": sq DUP * ; 5 sq . CR");
    assert_eq!(output, "25 \n");
}

#[test]
fn scenario_factorial_via_recurse() {
    let mut vm = new_vm();
    let output = capture_output(
        &mut vm,
        ": fact DUP 1 > IF DUP 1- RECURSE * THEN ; 5 fact . CR",
    );
    assert_eq!(output, "120 \n");
}

#[test]
fn scenario_do_loop_prints_index() {
    let mut vm = new_vm();
    let output = capture_output(&mut vm, ": F 10 0 DO I . LOOP CR ; F");
    assert_eq!(output, "0 1 2 3 4 5 6 7 8 9 \n");
}

#[test]
fn scenario_variable_store_and_fetch() {
    let mut vm = new_vm();
    let output = capture_output(&mut vm, "VARIABLE X 42 X ! X @ . CR");
    assert_eq!(output, "42 \n");
}

#[test]
fn scenario_constant() {
    let mut vm = new_vm();
    let output = capture_output(&mut vm, "10 CONSTANT TEN TEN 3 + . CR");
    assert_eq!(output, "13 \n");
}

#[test]
fn scenario_stack_fault_from_bad_definition() {
    let mut vm = new_vm();
    run(&mut vm, ": bad SWAP ;");
    let result = vm.interpret_line("<test>", "1 bad");
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), fifth::ErrorKind::StackFault);
}

#[test]
fn scenario_string_literal_and_type() {
    let mut vm = new_vm();
    let output = capture_output(&mut vm, "S\" hello, world\" TYPE CR");
    assert_eq!(output, "hello, world\n");
}

#[test]
fn scenario_hex_then_decimal() {
    let mut vm = new_vm();
    let output = capture_output(&mut vm, "HEX FF . DECIMAL CR");
    assert_eq!(output, "FF \n");
    assert_eq!(vm.base(), 10);
}

// ---------------------------------------------------------------------------------------------
// §8 invariants, laws, and boundary behaviors
// ---------------------------------------------------------------------------------------------

#[test]
fn error_recovery_resets_to_a_clean_state() {
    let mut vm = new_vm();
    run(&mut vm, "1 2 3");
    let result = vm.interpret_line("<test>", "NOSUCHWORD");
    assert!(result.is_err());
    vm.recover_from_abort();

    assert_eq!(vm.data_stack.depth(), 0);
    assert_eq!(vm.return_stack.depth(), 0);
    assert_eq!(vm.state, State::Interpret);
    assert_eq!(vm.input.depth(), 1);
}

#[test]
fn here_rolls_back_after_a_failed_definition() {
    let mut vm = new_vm();
    let here_before = vm.memory.here();
    let result = vm.interpret_line("<test>", ": bad THEN ;");
    assert!(result.is_err());
    vm.recover_from_abort();
    assert_eq!(vm.memory.here(), here_before);
}

#[test]
fn here_store_fetch_round_trips() {
    let mut vm = new_vm();
    run(&mut vm, "VARIABLE V 424242 V ! V @");
    assert_eq!(vm.pop().unwrap(), 424242);
}

#[test]
fn number_parsing_round_trips_through_pictured_output() {
    let mut vm = new_vm();
    let output = capture_output(&mut vm, "16 BASE ! 48879 0 <# #S #> TYPE DECIMAL CR");
    assert_eq!(output, "BEEF\n");
}

#[test]
fn require_is_idempotent() {
    let mut vm = new_vm();
    let path = std::env::temp_dir().join(format!("fifth-require-{}.fs", std::process::id()));
    fs::write(
        &path,
        "VARIABLE COUNT\n0 COUNT !\n: BUMP COUNT @ 1+ COUNT ! ;\nBUMP\n",
    )
    .unwrap();

    let path_str = path.to_string_lossy().to_string();
    vm.require_file(&path_str).unwrap();
    vm.require_file(&path_str).unwrap();

    run(&mut vm, "COUNT @");
    assert_eq!(vm.pop().unwrap(), 1);

    let _ = fs::remove_file(&path);
}

#[test]
fn name_of_max_length_succeeds_one_more_fails() {
    let mut vm = new_vm();
    let ok_name = "a".repeat(MAX_NAME_LEN);
    let bad_name = "b".repeat(MAX_NAME_LEN + 1);

    let ok_def = format!(": {} ;", ok_name);
    assert!(vm.interpret_line("<test>", &ok_def).is_ok());

    let bad_def = format!(": {} ;", bad_name);
    let result = vm.interpret_line("<test>", &bad_def);
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), fifth::ErrorKind::NameTooLong);
}

#[test]
fn data_stack_overflows_past_capacity() {
    let mut vm = new_vm();
    for i in 0..STACK_SIZE as i64 {
        vm.push(i).unwrap();
    }
    assert!(vm.push(0).is_err());
}

#[test]
fn qdo_with_equal_bounds_runs_zero_times() {
    let mut vm = new_vm();
    run(&mut vm, ": t 0 5 5 ?DO 1+ LOOP ; t");
    assert_eq!(vm.pop().unwrap(), 0);
}

#[test]
fn plus_loop_terminates_on_negative_step_boundary() {
    let mut vm = new_vm();
    // Counts 10 down to 1 inclusive, stepping by -1, accumulating each index visited.
    run(&mut vm, ": t 0 0 10 DO I + -1 +LOOP ; t");
    assert_eq!(vm.pop().unwrap(), 55);
}

#[test]
fn leave_exits_a_do_loop_early() {
    let mut vm = new_vm();
    run(&mut vm, ": t 0 100 0 DO I 5 = IF LEAVE THEN 1+ LOOP ; t");
    assert_eq!(vm.pop().unwrap(), 5);
}

#[test]
fn case_of_endof_endcase_selects_a_branch() {
    let mut vm = new_vm();
    run(
        &mut vm,
        ": t ( n -- n ) CASE 1 OF 100 ENDOF 2 OF 200 ENDOF 999 SWAP ENDCASE ; 2 t",
    );
    assert_eq!(vm.pop().unwrap(), 200);
}

#[test]
fn does_creates_a_family_of_array_accessors() {
    let mut vm = new_vm();
    run(
        &mut vm,
        ": ARR CREATE CELLS ALLOT DOES> SWAP CELLS + ; 4 ARR NUMS 0 NUMS 99 SWAP ! 0 NUMS @",
    );
    assert_eq!(vm.pop().unwrap(), 99);
}

#[test]
fn abort_quote_unwinds_with_the_given_message() {
    let mut vm = new_vm();
    let result = vm.interpret_line("<test>", ": t -1 ABORT\" boom\" ; t");
    assert!(result.is_err());
    let err = result.unwrap_err();
    assert_eq!(err.kind(), fifth::ErrorKind::Abort);
    assert!(err.message().contains("boom"));
}

#[test]
fn evaluate_runs_a_string_as_forth_source() {
    let mut vm = new_vm();
    run(&mut vm, "S\" 2 3 +\" EVALUATE");
    assert_eq!(vm.pop().unwrap(), 5);
}

#[test]
fn getenv_reads_an_environment_variable() {
    std::env::set_var("FIFTH_TEST_VAR", "hello");
    let mut vm = new_vm();
    let output = capture_output(&mut vm, "S\" FIFTH_TEST_VAR\" GETENV TYPE CR");
    assert_eq!(output, "hello\n");
}

#[test]
fn slurp_file_reads_a_whole_file_into_the_data_space() {
    let mut vm = new_vm();
    let path = std::env::temp_dir().join(format!("fifth-slurp-{}.txt", std::process::id()));
    fs::write(&path, "abc").unwrap();

    let script = format!("S\" {}\" SLURP-FILE TYPE CR", path.to_string_lossy());
    let output = capture_output(&mut vm, &script);
    assert_eq!(output, "abc\n");

    let _ = fs::remove_file(&path);
}

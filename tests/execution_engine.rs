//! End-to-end scenarios from the embedding API down through the dispatch
//! loop — the literal scenarios a module author would actually write.

use basm::prelude::*;
use rstest::rstest;

#[test]
fn scenario_basic_export_returns_constant() {
    let src = b"func $main() {\n  mov r0, 42\n  ret r0\n}\nexport $main as \"main\"\n";
    let mut module = Module::load(src).unwrap();
    assert_eq!(module.call_export("main", &[]).unwrap(), 42);
}

#[test]
fn scenario_add_function() {
    let src = b"func $add(a,b) {\n  add r0, r0, r1\n  ret r0\n}\nexport $add as \"add\"\n";
    let mut module = Module::load(src).unwrap();
    let result = module
        .call_export("add", &[HostValue::Int(10), HostValue::Int(20)])
        .unwrap();
    assert_eq!(result, 30);
}

#[test]
fn scenario_data_builder_round_trips_through_memory() {
    let src = b"data $s {\n  write.len 5\n  write.bytes \"hello\"\n}\nfunc $main() {\n  data.load r0, $s\n  ret r0\n}\nexport $main as \"main\"\n";
    let mut module = Module::load(src).unwrap();
    let ptr = module.call_export("main", &[]).unwrap();
    assert_eq!(module.read_vm_string_len(ptr), 5);
    assert_eq!(module.read_bytes(ptr + 8, 5), b"hello");
}

#[test]
fn scenario_recursive_factorial() {
    let src = b"func $fact(n) {\n\
        cmp r0, 1\n\
        jle .base\n\
        mov r1, r0\n\
        dec r1\n\
        call $fact\n\
        mul r0, r0, r1\n\
        ret r0\n\
        .base:\n\
        mov r0, 1\n\
        ret r0\n\
    }\nexport $fact as \"fact\"\n";
    let mut module = Module::load(src).unwrap();
    let result = module.call_export("fact", &[HostValue::Int(5)]).unwrap();
    assert_eq!(result, 120);
}

#[test]
fn scenario_heap_reset_rewinds_bump_pointer() {
    let src = b"func $alloc() {\n  heap.alloc r0, 8\n  ret r0\n}\nexport $alloc as \"alloc\"\n";
    let mut module = Module::load(src).unwrap();
    let first = module.call_export("alloc", &[]).unwrap();
    let _second = module.call_export("alloc", &[]).unwrap();
    module.reset();
    let after_reset = module.call_export("alloc", &[]).unwrap();
    assert_eq!(after_reset, first);
}

#[test]
fn scenario_func_addr_and_call_indirect_closure_convention() {
    let src = b"func $f(env) {\n  ret r0\n}\nfunc $main() {\n\
        func.addr r2, $f\n\
        mov r0, 0\n\
        mov r1, 77\n\
        call.indirect r2\n\
        ret r0\n\
    }\nexport $main as \"main\"\n";
    let mut module = Module::load(src).unwrap();
    assert_eq!(module.call_export("main", &[]).unwrap(), 77);
}

#[test]
fn call_stack_overflow_surfaces_configured_depth() {
    let src = b"func $loop() {\n  call $loop\n  ret r0\n}\nexport $loop as \"loop\"\n";
    let limits = VmLimits {
        max_call_depth: 16,
        ..VmLimits::default()
    };
    let mut module = Module::load_with_limits(src, limits).unwrap();
    let err = module.call_export("loop", &[]).unwrap_err();
    assert!(matches!(err, InterpreterError::CallStackOverflow { max_depth: 16 }));
}

#[test]
fn division_by_zero_is_reported() {
    let src = b"func $bad() {\n  mov r1, 0\n  div r0, r0, r1\n  ret r0\n}\nexport $bad as \"bad\"\n";
    let mut module = Module::load(src).unwrap();
    assert!(matches!(
        module.call_export("bad", &[]),
        Err(InterpreterError::DivisionByZero)
    ));
}

#[rstest]
#[case("setz", 5, 5, 1)]
#[case("setz", 5, 6, 0)]
#[case("setnz", 5, 5, 0)]
#[case("setnz", 5, 6, 1)]
#[case("setl", 3, 5, 1)]
#[case("setl", 5, 3, 0)]
#[case("setle", 5, 5, 1)]
#[case("setle", 6, 5, 0)]
#[case("setg", 6, 5, 1)]
#[case("setg", 5, 6, 0)]
#[case("setge", 5, 5, 1)]
#[case("setge", 4, 5, 0)]
fn predicate_opcodes_match_signed_comparison(
    #[case] opcode: &str,
    #[case] a: i64,
    #[case] b: i64,
    #[case] expected: i64,
) {
    let src = format!("func $f() {{\n  mov r0, {a}\n  mov r1, {b}\n  cmp r0, r1\n  {opcode} r2\n  ret r2\n}}\nexport $f as \"f\"\n");
    let mut module = Module::load(src.as_bytes()).unwrap();
    assert_eq!(module.call_export("f", &[]).unwrap(), expected);
}

#[test]
fn floor_division_and_remainder_match_spec() {
    let src = b"func $f() {\n  mov r0, -7\n  mov r1, 2\n  div r2, r0, r1\n  rem r3, r0, r1\n  mov r0, r2\n  ret r0\n}\nexport $f as \"f\"\n";
    let mut module = Module::load(src).unwrap();
    assert_eq!(module.call_export("f", &[]).unwrap(), -4);
}

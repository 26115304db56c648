//! Property-style tests over the invariants enumerated in the testable
//! properties section: heap allocation monotonicity/alignment, and the
//! `cmp`/`set*` truth table over a wider range than the literal examples.

use quickcheck_macros::quickcheck;

use basm::prelude::*;

#[quickcheck]
fn heap_allocations_are_monotonic_and_aligned(sizes: Vec<u16>) -> bool {
    let mut memory = Memory::new(1usize << 20);
    let mut last = -1i64;
    for size in sizes.into_iter().take(64) {
        let ptr = memory.heap_alloc(size as usize);
        if ptr <= last || ptr % 8 != 0 {
            return false;
        }
        last = ptr;
    }
    true
}

fn set_opcode_result(opcode: &str, a: i64, b: i64) -> i64 {
    let src = format!(
        "func $f() {{\n  mov r0, {a}\n  mov r1, {b}\n  cmp r0, r1\n  {opcode} r2\n  ret r2\n}}\nexport $f as \"f\"\n"
    );
    let mut module = Module::load(src.as_bytes()).unwrap();
    module.call_export("f", &[]).unwrap()
}

#[quickcheck]
fn cmp_and_set_truth_table_matches_signed_comparison(a: i32, b: i32) -> bool {
    let (a, b) = (a as i64, b as i64);
    set_opcode_result("setz", a, b) == (a == b) as i64
        && set_opcode_result("setnz", a, b) == (a != b) as i64
        && set_opcode_result("setl", a, b) == (a < b) as i64
        && set_opcode_result("setle", a, b) == (a <= b) as i64
        && set_opcode_result("setg", a, b) == (a > b) as i64
        && set_opcode_result("setge", a, b) == (a >= b) as i64
}

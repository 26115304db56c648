//! Text-format loader scenarios not already covered by the `#[cfg(test)]`
//! unit tests colocated in `src/loader/text.rs`.

use basm::prelude::*;

#[test]
fn rejects_unterminated_function_block() {
    let src = "func $main() {\n  mov r0, 1\n";
    let err = basm::loader::load(src.as_bytes()).unwrap_err();
    assert!(matches!(err, InterpreterError::ModuleLoad { .. }));
}

#[test]
fn rejects_unknown_top_level_construct() {
    let src = "widget $foo\n";
    let err = basm::loader::load(src.as_bytes()).unwrap_err();
    assert!(matches!(err, InterpreterError::ModuleLoad { .. }));
}

#[test]
fn parses_hex_and_binary_literals_with_separators() {
    let src = "func $f() {\n  mov r0, 0x1_F\n  mov r1, 0b1010_1010\n  add r0, r0, r1\n  ret r0\n}\nexport $f as \"f\"\n";
    let program = basm::loader::load(src.as_bytes()).unwrap();
    let f = program.functions.get("f").unwrap();
    assert_eq!(f.instructions.len(), 4);
}

#[test]
fn memory_operand_supports_negative_offset() {
    let src = "func $f() {\n  ld.i32 r0, [r1-4]\n  ret r0\n}\nexport $f as \"f\"\n";
    let program = basm::loader::load(src.as_bytes()).unwrap();
    let f = program.functions.get("f").unwrap();
    match &f.instructions[0].operands[1] {
        Operand::Memory { offset, .. } => assert_eq!(**offset, Operand::Immediate(-4)),
        other => panic!("expected a memory operand, got {other:?}"),
    }
}

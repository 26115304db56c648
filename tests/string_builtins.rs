//! `str.*`/`table.concat`/`char.from` builtins exercised through exported
//! functions rather than the interpreter's internal unit tests.

use basm::prelude::*;

#[test]
fn scenario_str_concat_of_two_heap_strings() {
    let src = b"data $a {\n  write.len 3\n  write.bytes \"foo\"\n}\n\
        data $b {\n  write.len 3\n  write.bytes \"bar\"\n}\n\
        func $main() {\n\
        data.load r0, $a\n\
        data.load r1, $b\n\
        str.concat r2, r0, r1\n\
        ret r2\n\
    }\nexport $main as \"main\"\n";
    let mut module = Module::load(src).unwrap();
    let ptr = module.call_export("main", &[]).unwrap();
    assert_eq!(module.read_vm_string_len(ptr), 6);
    assert_eq!(module.read_bytes(ptr + 8, 6), b"foobar");
}

#[test]
fn str_upper_and_lower_roundtrip() {
    let src = b"data $s {\n  write.len 5\n  write.bytes \"Hello\"\n}\n\
        func $main() {\n\
        data.load r0, $s\n\
        str.upper r1, r0\n\
        ret r1\n\
    }\nexport $main as \"main\"\n";
    let mut module = Module::load(src).unwrap();
    let ptr = module.call_export("main", &[]).unwrap();
    assert_eq!(module.read_bytes(ptr + 8, 5), b"HELLO");
}

#[test]
fn str_sub_with_negative_indices() {
    let src = b"data $s {\n  write.len 5\n  write.bytes \"world\"\n}\n\
        func $main() {\n\
        data.load r0, $s\n\
        mov r1, -3\n\
        mov r2, -1\n\
        str.sub r3, r0, r1, r2\n\
        ret r3\n\
    }\nexport $main as \"main\"\n";
    let mut module = Module::load(src).unwrap();
    let ptr = module.call_export("main", &[]).unwrap();
    assert_eq!(module.read_vm_string_len(ptr), 3);
    assert_eq!(module.read_bytes(ptr + 8, 3), b"rld");
}

#[test]
fn int_tostring_then_str_tonumber_round_trips() {
    let src = b"func $main() {\n\
        mov r0, 1234\n\
        int.tostring r1, r0\n\
        str.tonumber r2, r1\n\
        ret r2\n\
    }\nexport $main as \"main\"\n";
    let mut module = Module::load(src).unwrap();
    assert_eq!(module.call_export("main", &[]).unwrap(), 1234);
}

#[test]
fn char_from_builds_a_one_byte_string() {
    let src = b"func $main() {\n\
        mov r0, 65\n\
        char.from r1, r0\n\
        ret r1\n\
    }\nexport $main as \"main\"\n";
    let mut module = Module::load(src).unwrap();
    let ptr = module.call_export("main", &[]).unwrap();
    assert_eq!(module.read_bytes(ptr + 8, 1), b"A");
}

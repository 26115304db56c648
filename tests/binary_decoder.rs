//! `BASMB` binary format scenarios, plus the text/binary equivalence
//! invariant from the testable-properties section.

use basm::prelude::*;

fn le_u32(n: u32) -> [u8; 4] {
    n.to_le_bytes()
}
fn le_u16(n: u16) -> [u8; 2] {
    n.to_le_bytes()
}

fn section(id: u8, body: Vec<u8>) -> Vec<u8> {
    let mut out = vec![id];
    out.extend_from_slice(&le_u32(body.len() as u32));
    out.extend_from_slice(&body);
    out
}

/// `func $add(a, b) { add r0, r0, r1  ret r0 }` exported as `"add"`.
fn encode_add_module() -> Vec<u8> {
    let mut functions_body = Vec::new();
    functions_body.extend_from_slice(&le_u16(1));
    let name = b"add";
    functions_body.extend_from_slice(&le_u16(name.len() as u16));
    functions_body.extend_from_slice(name);
    functions_body.push(2); // param count
    functions_body.extend_from_slice(&le_u16(2)); // instr count

    let mut code_body = Vec::new();
    code_body.extend_from_slice(&le_u16(0)); // func index
    code_body.extend_from_slice(&le_u16(0)); // label count
    code_body.extend_from_slice(&le_u16(2)); // instr count
    // add r0, r0, r1
    code_body.push(0x30);
    code_body.push(3);
    code_body.extend_from_slice(&[0x01, 0, 0x01, 0, 0x01, 1]);
    // ret r0
    code_body.push(0x71);
    code_body.push(1);
    code_body.extend_from_slice(&[0x01, 0]);

    let mut exports_body = Vec::new();
    exports_body.extend_from_slice(&le_u16(1));
    let alias = b"add";
    exports_body.extend_from_slice(&le_u16(alias.len() as u16));
    exports_body.extend_from_slice(alias);
    exports_body.extend_from_slice(&le_u16(0));

    let mut bytes = b"BASM".to_vec();
    bytes.extend_from_slice(&le_u32(1));
    bytes.extend_from_slice(&section(0x02, functions_body));
    bytes.extend_from_slice(&section(0x05, code_body));
    bytes.extend_from_slice(&section(0x03, exports_body));
    bytes
}

#[test]
fn binary_module_executes_identically_to_its_text_equivalent() {
    let binary = encode_add_module();
    let text_src = "func $add(a, b) {\n  add r0, r0, r1\n  ret r0\n}\nexport $add as \"add\"\n";

    let mut from_binary = Module::load(&binary).unwrap();
    let mut from_text = Module::load(text_src.as_bytes()).unwrap();

    let args = [HostValue::Int(4), HostValue::Int(9)];
    assert_eq!(
        from_binary.call_export("add", &args).unwrap(),
        from_text.call_export("add", &args).unwrap()
    );
}

#[test]
fn rejects_bad_magic() {
    let err = Module::load(b"NOPE0000").unwrap_err();
    assert!(matches!(err, InterpreterError::Decoder { .. }));
}

#[test]
fn rejects_unsupported_major_version() {
    let mut bytes = b"BASM".to_vec();
    bytes.extend_from_slice(&le_u32(2));
    let err = Module::load(&bytes).unwrap_err();
    assert!(matches!(err, InterpreterError::Decoder { .. }));
}

#[test]
fn truncated_section_body_is_a_decoder_error() {
    let mut bytes = b"BASM".to_vec();
    bytes.extend_from_slice(&le_u32(1));
    bytes.push(0x02); // functions section id
    bytes.extend_from_slice(&le_u32(100)); // claims 100 bytes, provides none
    let err = Module::load(&bytes).unwrap_err();
    assert!(matches!(err, InterpreterError::Decoder { .. }));
}

//! The `BASMB` binary opcode byte table.
//!
//! This is the single source of truth for mnemonic <-> byte mapping, shared
//! by the binary decoder (bytes -> mnemonic) and anything that needs to
//! round-trip a decoded module back to a byte stream.

/// Mnemonic for a given opcode byte, or `"nop"` for anything unrecognized —
/// matching the reference, which treats unknown opcodes as `nop` rather
/// than raising an error.
pub fn mnemonic_for_byte(byte: u8) -> &'static str {
    match byte {
        0x01 => "mov",
        0x02 => "data.load",
        0x10 => "ld.i64",
        0x11 => "ld.i32",
        0x20 => "st.i64",
        0x21 => "st.i32",
        0x28 => "heap.alloc",
        0x29 => "heap.realloc",
        0x30 => "add",
        0x31 => "sub",
        0x32 => "mul",
        0x33 => "div",
        0x34 => "rem",
        0x35 => "neg",
        0x36 => "inc",
        0x37 => "dec",
        0x40 => "and",
        0x41 => "or",
        0x42 => "xor",
        0x43 => "not",
        0x44 => "shl",
        0x45 => "shr",
        0x50 => "cmp",
        0x51 => "setz",
        0x52 => "setnz",
        0x53 => "setl",
        0x54 => "setle",
        0x55 => "setg",
        0x56 => "setge",
        0x60 => "jmp",
        0x61 => "jz",
        0x62 => "jnz",
        0x63 => "jl",
        0x64 => "jle",
        0x65 => "jg",
        0x66 => "jge",
        0x70 => "call",
        0x71 => "ret",
        0x72 => "func.addr",
        0x73 => "call.indirect",
        0x80 => "console.log.str",
        0x81 => "console.log.val",
        0x82 => "console.log.space",
        0x83 => "console.log.newline",
        0x90 => "str.concat",
        0xFF => "nop",
        _ => "nop",
    }
}

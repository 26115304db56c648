//! `BASMB` binary module decoder.
//!
//! The decoder never builds [`crate::module::Program`] structures directly;
//! instead it reconstructs an equivalent text module (see [`decode_to_text`])
//! and feeds that through [`crate::loader::text::load_text`]. This keeps the
//! execution engine entirely format-agnostic, at the cost of one extra
//! parse pass that only runs once, at load time.

use std::collections::HashMap;
use std::fmt::Write as _;

use itertools::Itertools;

use crate::error::{InterpreterError, Result};
use crate::loader::text::load_text;
use crate::module::Program;
use crate::opcodes::mnemonic_for_byte;

const SECTION_STRINGS: u8 = 0x01;
const SECTION_FUNCTIONS: u8 = 0x02;
const SECTION_EXPORTS: u8 = 0x03;
const SECTION_CODE: u8 = 0x05;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn eof(&self, section_id: u8, what: &str) -> InterpreterError {
        InterpreterError::decoder(section_id, self.pos, format!("unexpected end of data reading {what}"))
    }

    fn take(&mut self, n: usize, section_id: u8, what: &str) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(self.eof(section_id, what));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self, section_id: u8, what: &str) -> Result<u8> {
        Ok(self.take(1, section_id, what)?[0])
    }

    fn u16(&mut self, section_id: u8, what: &str) -> Result<u16> {
        let b = self.take(2, section_id, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, section_id: u8, what: &str) -> Result<u32> {
        let b = self.take(4, section_id, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self, section_id: u8, what: &str) -> Result<i32> {
        Ok(self.u32(section_id, what)? as i32)
    }

    fn string_u16(&mut self, section_id: u8, what: &str) -> Result<String> {
        let len = self.u16(section_id, what)? as usize;
        let bytes = self.take(len, section_id, what)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }
}

struct FunctionMeta {
    name: String,
    param_count: u8,
}

struct DecodedInstruction {
    opcode: &'static str,
    operand_texts: Vec<String>,
}

struct DecodedFunction {
    labels: Vec<(String, u16)>,
    instructions: Vec<DecodedInstruction>,
}

/// Decode `BASMB` bytes into a [`Program`].
pub fn decode_binary(bytes: &[u8]) -> Result<Program> {
    let text = decode_to_text(bytes)?;
    load_text(&text)
}

/// Decode `BASMB` bytes into the equivalent textual module source.
///
/// Exposed so hosts (and tests) can verify that a module loaded from text
/// and its binary-encoded, decoded-back-to-text equivalent agree.
pub fn decode_to_text(bytes: &[u8]) -> Result<String> {
    if bytes.len() < 8 || &bytes[0..4] != crate::loader::BINARY_MAGIC {
        return Err(InterpreterError::decoder(0, 0, "missing BASM magic"));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let major = (version & 0xFF) as u8;
    if major != 1 {
        return Err(InterpreterError::decoder(
            0,
            4,
            format!("unsupported major version: {major}"),
        ));
    }

    let mut cursor = Cursor::new(bytes);
    cursor.pos = 8;

    let mut functions: Vec<FunctionMeta> = Vec::new();
    let mut strings: Vec<Vec<u8>> = Vec::new();
    let mut exports: Vec<(String, u16)> = Vec::new();
    let mut code: HashMap<u16, DecodedFunction> = HashMap::new();

    while cursor.remaining() > 0 {
        let section_id = cursor.u8(0, "section id")?;
        let section_len = cursor.u32(section_id, "section length")? as usize;
        let body = cursor.take(section_len, section_id, "section body")?;
        let mut sc = Cursor::new(body);
        match section_id {
            SECTION_STRINGS => {
                let count = sc.u16(section_id, "string count")?;
                for _ in 0..count {
                    let len = sc.u16(section_id, "string length")? as usize;
                    let payload = sc.take(len, section_id, "string payload")?;
                    strings.push(payload.to_vec());
                }
            }
            SECTION_FUNCTIONS => {
                let count = sc.u16(section_id, "function count")?;
                for _ in 0..count {
                    let name = sc.string_u16(section_id, "function name")?;
                    let param_count = sc.u8(section_id, "param count")?;
                    let _instr_count = sc.u16(section_id, "instr count")?;
                    functions.push(FunctionMeta { name, param_count });
                }
            }
            SECTION_EXPORTS => {
                let count = sc.u16(section_id, "export count")?;
                for _ in 0..count {
                    let alias = sc.string_u16(section_id, "export alias")?;
                    let func_index = sc.u16(section_id, "export func index")?;
                    exports.push((alias, func_index));
                }
            }
            SECTION_CODE => {
                while sc.remaining() > 0 {
                    let func_index = sc.u16(section_id, "code func index")?;
                    let label_count = sc.u16(section_id, "label count")?;
                    let mut labels = Vec::with_capacity(label_count as usize);
                    for _ in 0..label_count {
                        let name = sc.string_u16(section_id, "label name")?;
                        let label_pos = sc.u16(section_id, "label position")?;
                        labels.push((name, label_pos));
                    }
                    let instr_count = sc.u16(section_id, "instruction count")?;
                    let mut instructions = Vec::with_capacity(instr_count as usize);
                    for _ in 0..instr_count {
                        instructions.push(decode_instruction(&mut sc, section_id, &strings, &functions)?);
                    }
                    code.insert(func_index, DecodedFunction { labels, instructions });
                }
            }
            _ => {
                // Unknown sections are skipped: their bytes were already
                // consumed by `take` above.
            }
        }
    }

    render_text(&functions, &strings, &exports, &code)
}

fn decode_instruction(
    sc: &mut Cursor,
    section_id: u8,
    strings: &[Vec<u8>],
    functions: &[FunctionMeta],
) -> Result<DecodedInstruction> {
    let opcode_byte = sc.u8(section_id, "opcode byte")?;
    let operand_count = sc.u8(section_id, "operand count")?;
    let mut operand_texts = Vec::with_capacity(operand_count as usize);
    for _ in 0..operand_count {
        let tag = sc.u8(section_id, "operand tag")?;
        let text = match tag {
            0x01 => {
                let reg = sc.u8(section_id, "register operand")?;
                format!("r{reg}")
            }
            0x02 => {
                let imm = sc.i32(section_id, "immediate operand")?;
                imm.to_string()
            }
            0x03 => {
                let idx = sc.u16(section_id, "string index operand")? as usize;
                if idx >= strings.len() {
                    return Err(InterpreterError::decoder(section_id, sc.pos, "string index out of range"));
                }
                format!("$str_{}", idx + 1)
            }
            0x04 => {
                let idx = sc.u16(section_id, "function index operand")? as usize;
                let name = functions
                    .get(idx)
                    .map(|f| f.name.as_str())
                    .ok_or_else(|| InterpreterError::decoder(section_id, sc.pos, "function index out of range"))?;
                format!("${name}")
            }
            0x05 => {
                let name = sc.string_u16(section_id, "symbol operand")?;
                format!("${name}")
            }
            0x06 => sc.string_u16(section_id, "label operand")?,
            0x07 => {
                let base = sc.u8(section_id, "memory base operand")?;
                let offset = sc.i32(section_id, "memory offset operand")?;
                match offset.cmp(&0) {
                    std::cmp::Ordering::Equal => format!("[r{base}]"),
                    std::cmp::Ordering::Greater => format!("[r{base}+{offset}]"),
                    std::cmp::Ordering::Less => format!("[r{base}{offset}]"),
                }
            }
            _ => {
                let len = sc.u16(section_id, "raw operand length")? as usize;
                sc.take(len, section_id, "raw operand bytes")?;
                "0".to_string()
            }
        };
        operand_texts.push(text);
    }
    Ok(DecodedInstruction {
        opcode: mnemonic_for_byte(opcode_byte),
        operand_texts,
    })
}

fn render_text(
    functions: &[FunctionMeta],
    strings: &[Vec<u8>],
    exports: &[(String, u16)],
    code: &HashMap<u16, DecodedFunction>,
) -> Result<String> {
    let mut out = String::new();

    for (idx, payload) in strings.iter().enumerate() {
        let _ = writeln!(out, "data $str_{} {{", idx + 1);
        let _ = writeln!(out, "  write.len {}", payload.len());
        let _ = writeln!(out, "  write.bytes \"{}\"", escape_string(payload));
        let _ = writeln!(out, "}}");
    }

    for (idx, meta) in functions.iter().enumerate() {
        let params: Vec<String> = (1..=meta.param_count).map(|n| format!("arg{n}")).collect();
        let _ = writeln!(out, "func ${}({}) {{", meta.name, params.join(", "));
        if let Some(decoded) = code.get(&(idx as u16)) {
            let labels_by_pos: HashMap<u16, Vec<&str>> = decoded
                .labels
                .iter()
                .map(|(name, pos)| (*pos, name.as_str()))
                .into_group_map();
            for (i, instr) in decoded.instructions.iter().enumerate() {
                let one_based = (i + 1) as u16;
                if let Some(names) = labels_by_pos.get(&one_based) {
                    for name in names {
                        let _ = writeln!(out, "  {name}:");
                    }
                }
                if instr.operand_texts.is_empty() {
                    let _ = writeln!(out, "  {}", instr.opcode);
                } else {
                    let _ = writeln!(out, "  {} {}", instr.opcode, instr.operand_texts.join(", "));
                }
            }
        }
        let _ = writeln!(out, "}}");
    }

    for (alias, func_index) in exports {
        let name = functions
            .get(*func_index as usize)
            .map(|f| f.name.as_str())
            .ok_or_else(|| InterpreterError::decoder(SECTION_EXPORTS, 0, "export function index out of range"))?;
        let _ = writeln!(out, "export ${name} as \"{alias}\"");
    }

    Ok(out)
}

fn escape_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn decodes_simple_function_with_export() {
        let mut functions_body = Vec::new();
        functions_body.extend_from_slice(&le_u16(1)); // count
        let name = b"main";
        functions_body.extend_from_slice(&le_u16(name.len() as u16));
        functions_body.extend_from_slice(name);
        functions_body.push(0); // param count
        functions_body.extend_from_slice(&le_u16(2)); // instr count

        let mut code_body = Vec::new();
        code_body.extend_from_slice(&le_u16(0)); // func index
        code_body.extend_from_slice(&le_u16(0)); // label count
        code_body.extend_from_slice(&le_u16(2)); // instr count
        // mov r0, 42
        code_body.push(0x01); // mov
        code_body.push(2); // operand count
        code_body.push(0x01); // register tag
        code_body.push(0); // r0
        code_body.push(0x02); // immediate tag
        code_body.extend_from_slice(&42i32.to_le_bytes());
        // ret r0
        code_body.push(0x71); // ret
        code_body.push(1);
        code_body.push(0x01);
        code_body.push(0);

        let mut exports_body = Vec::new();
        exports_body.extend_from_slice(&le_u16(1));
        let alias = b"main";
        exports_body.extend_from_slice(&le_u16(alias.len() as u16));
        exports_body.extend_from_slice(alias);
        exports_body.extend_from_slice(&le_u16(0));

        let mut bytes = b"BASM".to_vec();
        bytes.extend_from_slice(&le_u32(1));
        bytes.extend_from_slice(&section(SECTION_FUNCTIONS, functions_body));
        bytes.extend_from_slice(&section(SECTION_CODE, code_body));
        bytes.extend_from_slice(&section(SECTION_EXPORTS, exports_body));

        let module = decode_binary(&bytes).unwrap();
        let f = module.functions.get("main").unwrap();
        assert_eq!(f.instructions.len(), 2);
        assert_eq!(module.exports.get("main"), Some(&"main".to_string()));
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = b"NOPE0000".to_vec();
        assert!(decode_binary(&bytes).is_err());
    }

    #[test]
    fn escape_string_hex_escapes_non_ascii_bytes_instead_of_lossy_char_cast() {
        assert_eq!(escape_string(&[0x41, 0xc3, 0x28]), "A\\xc3\\x28");
    }
}

//! In-memory module representation shared by the text loader and the binary
//! decoder.

use std::collections::HashMap;

use crate::operand::Operand;

/// A single parsed instruction: opcode mnemonic plus its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The opcode mnemonic, e.g. `"add"` or `"jmp"`.
    pub opcode: String,
    /// Parsed operands, in source order.
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Construct an instruction from an opcode and operand list.
    pub fn new(opcode: impl Into<String>, operands: Vec<Operand>) -> Self {
        Self {
            opcode: opcode.into(),
            operands,
        }
    }
}

/// A function definition, immutable after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Function name (without the `$` sigil).
    pub name: String,
    /// Ordered parameter names. Informational only — arguments arrive via
    /// r0-r7 regardless of declared parameter count.
    pub params: Vec<String>,
    /// Ordered instruction stream. Labels index into this with 1-based
    /// offsets, i.e. label N refers to `instructions[N - 1]`.
    pub instructions: Vec<Instruction>,
    /// Label name (including the leading `.`) to 1-based instruction index
    /// immediately following the label line.
    pub labels: HashMap<String, usize>,
}

impl Function {
    /// Create an empty function shell, ready to have instructions pushed.
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            instructions: Vec::new(),
            labels: HashMap::new(),
        }
    }
}

/// A single directive within a `data $name { ... }` block.
#[derive(Debug, Clone, PartialEq)]
pub enum DataDirective {
    /// `write.len N` — writes an 8-byte length word.
    WriteLen(i64),
    /// `write.i64 N` — writes a raw 8-byte little-endian integer.
    WriteI64(i64),
    /// `write.bytes "..."` — writes the literal bytes of an escaped string.
    WriteBytes(Vec<u8>),
}

/// The immutable tables produced by loading a module: functions, data
/// builders, and the export table.
///
/// Produced by either [`crate::loader::text::load_text`] or
/// [`crate::loader::binary::decode_binary`]; both loaders yield a `Program`
/// with identical semantics so the execution engine stays format-agnostic.
///
/// This is wrapped together with a live [`crate::interpreter::Interpreter`]
/// by [`crate::embed::Module`], the type embedding hosts actually interact
/// with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Function name to definition.
    pub functions: HashMap<String, Function>,
    /// Data builder name to its ordered directive list.
    pub data_builders: HashMap<String, Vec<DataDirective>>,
    /// External alias to internal function name.
    pub exports: HashMap<String, String>,
}

impl Program {
    /// An empty program with no functions, data builders, or exports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an export alias or a bare internal function name to a
    /// [`Function`].
    pub fn resolve(&self, name: &str) -> Option<&Function> {
        let internal = self.exports.get(name).map(String::as_str).unwrap_or(name);
        self.functions.get(internal)
    }
}

//! Module loaders: the line-oriented text format and the `BASMB` binary
//! format. Both produce an equivalent [`crate::module::Program`], keeping the
//! execution engine entirely format-agnostic.

pub mod binary;
pub mod text;

use crate::error::Result;
use crate::module::Program;

/// `BASMB`'s magic prefix, used to auto-detect binary input.
pub const BINARY_MAGIC: &[u8; 4] = b"BASM";

/// Load a module, auto-detecting binary input by its 4-byte `BASM` magic
/// and falling back to the text loader otherwise.
pub fn load(source: &[u8]) -> Result<Program> {
    if source.starts_with(BINARY_MAGIC) {
        binary::decode_binary(source)
    } else {
        let text = std::str::from_utf8(source)
            .map_err(|e| crate::error::InterpreterError::module_load(0, e.to_string()))?;
        text::load_text(text)
    }
}

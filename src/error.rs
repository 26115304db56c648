//! Runtime interpreter error implementation

use thiserror::Error;

/// Interpreter runtime error variants.
///
/// Every fallible public entry point returns `Result<T, InterpreterError>`;
/// no panics are used for recoverable conditions. Undefined opcodes and
/// out-of-range memory reads are *not* represented here — those are handled
/// silently by design (treated as `nop` / reads-as-zero), not surfaced as
/// errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterpreterError {
    /// A text module or binary module failed to load.
    #[error("module load error at line {line}: {message}")]
    ModuleLoad {
        /// 1-based line number in the source, or 0 if not applicable.
        line: usize,
        /// Human-readable description of the malformed construct.
        message: String,
    },
    /// An export alias or internal function name did not resolve.
    #[error("function not found: {0}")]
    FunctionNotFound(String),
    /// The call stack would exceed the configured maximum depth.
    #[error("call stack overflow: depth would exceed {max_depth}")]
    CallStackOverflow {
        /// The configured maximum call depth.
        max_depth: usize,
    },
    /// `div`, `rem`, `fdiv`, or `frem` was evaluated with a zero divisor.
    #[error("division by zero")]
    DivisionByZero,
    /// `call.indirect` referenced an id absent from the function-pointer
    /// table.
    #[error("invalid function pointer: {0}")]
    InvalidFunctionPointer(i64),
    /// The binary decoder hit the end of input while reading a field.
    #[error("decoder error in section 0x{section_id:02x} at offset {offset}: {message}")]
    Decoder {
        /// The section id being decoded when the error occurred.
        section_id: u8,
        /// Byte offset within the input at which the read failed.
        offset: usize,
        /// Human-readable description.
        message: String,
    },
}

impl InterpreterError {
    /// Build a [`InterpreterError::ModuleLoad`] at the given line.
    pub fn module_load(line: usize, message: impl Into<String>) -> Self {
        Self::ModuleLoad {
            line,
            message: message.into(),
        }
    }

    /// Build a [`InterpreterError::Decoder`] at the given section/offset.
    pub fn decoder(section_id: u8, offset: usize, message: impl Into<String>) -> Self {
        Self::Decoder {
            section_id,
            offset,
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InterpreterError>;

//! Call stack frame representation.

/// A single call-stack frame.
///
/// Register preservation is *not* achieved through the frame — it is
/// achieved by snapshotting the caller's full register file before entry and
/// restoring it after exit (see [`crate::interpreter::Interpreter::execute_function`]).
/// The frame exists purely to track call depth and to name the function
/// currently executing, for diagnostics and overflow errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    name: String,
}

impl Frame {
    /// Create a new frame for the given function name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The function name this frame is executing.
    pub fn name(&self) -> &str {
        &self.name
    }
}

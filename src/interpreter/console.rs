//! Console output opcodes. Output accumulates in an internal buffer and is
//! flushed to the host sink on `console.log.newline`.

use crate::error::Result;
use crate::operand::Operand;

use super::Interpreter;

impl Interpreter {
    pub(super) fn op_console_log_str(&mut self, ptr: &Operand) -> Result<()> {
        let ptr = self.eval_value(ptr)?;
        let bytes = self.read_vm_string(ptr);
        self.output.push_str(&String::from_utf8_lossy(&bytes));
        Ok(())
    }

    pub(super) fn op_console_log_val(&mut self, v: &Operand) -> Result<()> {
        let v = self.eval_value(v)?;
        self.output.push_str(&v.to_string());
        Ok(())
    }

    pub(super) fn op_console_log_space(&mut self) {
        self.output.push(' ');
    }

    pub(super) fn op_console_log_newline(&mut self) {
        tracing::trace!(line = %self.output, "console flush");
        self.log.push(std::mem::take(&mut self.output));
    }

    /// Lines flushed so far via `console.log.newline`, oldest first.
    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    /// Whatever has been written since the last `console.log.newline`, not
    /// yet flushed to [`Self::log_lines`].
    pub fn pending_output(&self) -> &str {
        &self.output
    }
}

//! Branches, calls, tailcalls, and indirect calls through the
//! function-pointer table.

use crate::call::Frame;
use crate::error::{InterpreterError, Result};
use crate::operand::Operand;

use super::Interpreter;

/// The outcome of executing one instruction: either continue to the next
/// instruction, jump to a specific (1-based) instruction index, or return a
/// value from the enclosing function.
pub(super) enum Step {
    Next,
    Jump(usize),
    Return(i64),
}

impl Interpreter {
    pub(super) fn resolve_label(&self, func_name: &str, label: &Operand) -> Result<usize> {
        let label_name = match label {
            Operand::Label(name) => name.as_str(),
            _ => {
                return Err(InterpreterError::module_load(
                    0,
                    "jump target is not a label",
                ))
            }
        };
        let function = self
            .program
            .functions
            .get(func_name)
            .ok_or_else(|| InterpreterError::FunctionNotFound(func_name.to_string()))?;
        function
            .labels
            .get(label_name)
            .copied()
            .ok_or_else(|| InterpreterError::module_load(0, format!("undefined label: {label_name}")))
    }

    pub(super) fn op_jmp(&self, func_name: &str, target: &Operand) -> Result<Step> {
        Ok(Step::Jump(self.resolve_label(func_name, target)?))
    }

    pub(super) fn op_conditional_jump(
        &self,
        func_name: &str,
        target: &Operand,
        taken: bool,
    ) -> Result<Step> {
        if taken {
            Ok(Step::Jump(self.resolve_label(func_name, target)?))
        } else {
            Ok(Step::Next)
        }
    }

    /// `call $fn` packages r0..r7 as the argument list and writes the
    /// result into r0; there is no separate destination operand.
    pub(super) fn op_call(&mut self, callee: &Operand) -> Result<()> {
        let name = self.symbol_name(callee)?;
        let args: Vec<i64> = (0u8..8).map(|r| self.registers[r]).collect();
        let result = self.execute_function(&name, &args)?;
        self.registers[0] = result;
        Ok(())
    }

    pub(super) fn op_tailcall(&mut self, callee: &Operand) -> Result<i64> {
        let name = self.symbol_name(callee)?;
        let args: Vec<i64> = (0u8..8).map(|r| self.registers[r]).collect();
        self.execute_function(&name, &args)
    }

    pub(super) fn op_ret(&mut self, value: &Operand) -> Result<i64> {
        self.eval_value(value)
    }

    pub(super) fn op_func_addr(&mut self, dst: &Operand, target: &Operand) -> Result<()> {
        let name = self.symbol_name(target)?;
        let id = self.next_fn_ptr_id;
        self.next_fn_ptr_id += 1;
        self.fn_ptr_table.insert(id, name);
        self.write_reg(dst, id);
        Ok(())
    }

    /// `call.indirect rN`. When r0 == 0 at call time the pointer is taken to
    /// be a plain (non-closure) function: r1..r7 are shifted down into
    /// r0..r6 before invoking, reflecting the observed closure-ABI
    /// convention where r0 is normally the environment pointer.
    pub(super) fn op_call_indirect(&mut self, ptr: &Operand) -> Result<()> {
        let id = self.eval_value(ptr)?;
        let name = self
            .fn_ptr_table
            .get(&id)
            .cloned()
            .ok_or(InterpreterError::InvalidFunctionPointer(id))?;
        let args: Vec<i64> = if self.registers[0] == 0 {
            (1u8..8).map(|r| self.registers[r]).collect()
        } else {
            (0u8..8).map(|r| self.registers[r]).collect()
        };
        let result = self.execute_function(&name, &args)?;
        self.registers[0] = result;
        Ok(())
    }

    fn symbol_name(&self, op: &Operand) -> Result<String> {
        match op {
            Operand::Symbol(name) => Ok(name.clone()),
            Operand::Label(name) => Ok(name.clone()),
            other => Err(InterpreterError::module_load(
                0,
                format!("expected a function reference, found {other:?}"),
            )),
        }
    }

    /// Run `name` with the given positional arguments (truncated/zero-padded
    /// to 8 slots internally). Snapshots and restores the caller's full
    /// register file; r0-r6 of the callee are merged back into the caller's
    /// view on return, in addition to the explicit return value.
    pub fn execute_function(&mut self, name: &str, args: &[i64]) -> Result<i64> {
        let function = self
            .program
            .resolve(name)
            .ok_or_else(|| InterpreterError::FunctionNotFound(name.to_string()))?
            .clone();

        if self.call_stack.len() >= self.limits.max_call_depth {
            return Err(InterpreterError::CallStackOverflow {
                max_depth: self.limits.max_call_depth,
            });
        }

        tracing::debug!(function = %name, depth = self.call_stack.len(), "entering function");

        let snapshot = self.registers.clone();
        self.call_stack.push(Frame::new(function.name.clone()));

        for (i, value) in args.iter().take(8).enumerate() {
            self.registers[i as u8] = *value;
        }

        let result = self.run_instructions(&function.name);

        self.call_stack.pop();
        let mut restored = snapshot;
        for i in 0u8..7 {
            restored[i] = self.registers[i];
        }
        self.registers = restored;

        tracing::debug!(function = %name, "exiting function");
        result
    }
}

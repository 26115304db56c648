//! The execution engine: register file, flags, linear memory, call stack,
//! and opcode dispatch.
//!
//! Split along the same lines the teacher interpreter uses: arithmetic in
//! [`alu`]/[`falu`], control flow in [`flow`], loads/stores/heap in
//! [`loadstore`], and the string/table builtins in [`strings`]/[`console`].
//! This module ties them together with the shared [`Interpreter`] state and
//! the instruction dispatch loop.

mod alu;
mod console;
mod falu;
mod flags;
mod flow;
mod loadstore;
mod memory;
mod register;
mod strings;

pub use flags::Flags;
pub use memory::Memory;
pub use register::Registers;

use std::collections::HashMap;

use crate::call::Frame;
use crate::consts::VmLimits;
use crate::error::{InterpreterError, Result};
use crate::module::{DataDirective, Program};
use crate::operand::Operand;

use self::flow::Step;

/// A single VM instance: register file, flags, linear memory, call stack,
/// function-pointer table, and the loaded program it executes.
pub struct Interpreter {
    registers: Registers,
    flags: Flags,
    memory: Memory,
    program: Program,
    call_stack: Vec<Frame>,
    data_cache: HashMap<String, i64>,
    fn_ptr_table: HashMap<i64, String>,
    next_fn_ptr_id: i64,
    output: String,
    log: Vec<String>,
    limits: VmLimits,
}

impl Interpreter {
    /// Build a fresh interpreter around an already-loaded [`Program`].
    pub fn new(program: Program, limits: VmLimits) -> Self {
        Self {
            registers: Registers::new(),
            flags: Default::default(),
            memory: Memory::new(limits.mem_size),
            program,
            call_stack: Vec::new(),
            data_cache: HashMap::new(),
            fn_ptr_table: HashMap::new(),
            next_fn_ptr_id: limits.fn_ptr_base,
            output: String::new(),
            log: Vec::new(),
            limits,
        }
    }

    /// The loaded program this interpreter executes.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Read access to linear memory, for embedding hosts.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable access to linear memory, for embedding hosts seeding
    /// arguments before a call.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Clears register file, flags, memory, the data-builder cache, the
    /// call stack, the output buffer/log, and the function-pointer table.
    pub fn reset(&mut self) {
        self.registers = Registers::new();
        self.flags = Default::default();
        self.memory.reset();
        self.call_stack.clear();
        self.data_cache.clear();
        self.fn_ptr_table.clear();
        self.next_fn_ptr_id = self.limits.fn_ptr_base;
        self.output.clear();
        self.log.clear();
    }

    fn write_reg(&mut self, op: &Operand, value: i64) {
        if let Operand::Register(r) = op {
            self.registers[*r] = value;
        }
    }

    /// Resolve an operand to its `i64` value. `Symbol` triggers (and caches)
    /// data-builder execution; `Memory` yields the computed address, not a
    /// dereferenced load (loads go through `ld.*`).
    fn eval_value(&mut self, op: &Operand) -> Result<i64> {
        match op {
            Operand::Register(r) => Ok(self.registers[*r]),
            Operand::Immediate(n) => Ok(*n),
            Operand::Null => Ok(0),
            Operand::Float(f) => Ok(*f as i64),
            Operand::Symbol(name) => self.execute_data_builder(name),
            Operand::Memory { .. } => self.eval_address(op),
            Operand::Label(_) => Err(InterpreterError::module_load(
                0,
                "label used where a value was expected",
            )),
        }
    }

    /// Resolve a `[base+off]` operand to a concrete address.
    fn eval_address(&mut self, op: &Operand) -> Result<i64> {
        match op {
            Operand::Memory { base, offset } => {
                let base = self.eval_value(base)?;
                let offset = self.eval_value(offset)?;
                Ok(base + offset)
            }
            other => self.eval_value(other),
        }
    }

    /// Execute (or fetch from cache) the named data builder, returning its
    /// base pointer.
    fn execute_data_builder(&mut self, name: &str) -> Result<i64> {
        if let Some(ptr) = self.data_cache.get(name) {
            return Ok(*ptr);
        }
        let directives = self
            .program
            .data_builders
            .get(name)
            .cloned()
            .ok_or_else(|| InterpreterError::module_load(0, format!("undefined data builder: {name}")))?;

        let total: usize = directives
            .iter()
            .map(|d| match d {
                DataDirective::WriteLen(_) | DataDirective::WriteI64(_) => 8,
                DataDirective::WriteBytes(bytes) => bytes.len(),
            })
            .sum();
        let base = self.memory.heap_alloc(total + 8);

        let mut cursor = base;
        for directive in &directives {
            match directive {
                DataDirective::WriteLen(n) | DataDirective::WriteI64(n) => {
                    self.memory.write_i64(cursor, *n);
                    cursor += 8;
                }
                DataDirective::WriteBytes(bytes) => {
                    self.memory.write_bytes(cursor, bytes);
                    cursor += bytes.len() as i64;
                }
            }
        }

        self.data_cache.insert(name.to_string(), base);
        tracing::debug!(builder = %name, ptr = base, "data builder materialized");
        Ok(base)
    }

    /// Run a function's instruction stream to completion (via `ret`) and
    /// return its value. Does not snapshot/restore registers or push a
    /// frame — that's [`Self::execute_function`]'s job, since tailcalls and
    /// the outermost call share this loop.
    fn run_instructions(&mut self, func_name: &str) -> Result<i64> {
        let instructions = self
            .program
            .functions
            .get(func_name)
            .ok_or_else(|| InterpreterError::FunctionNotFound(func_name.to_string()))?
            .instructions
            .clone();

        let mut pc: usize = 1;
        loop {
            if pc == 0 || pc > instructions.len() {
                return Ok(self.registers[0]);
            }
            let instr = &instructions[pc - 1];
            tracing::trace!(function = %func_name, pc, opcode = %instr.opcode, "dispatch");
            let step = self.dispatch(func_name, &instr.opcode, &instr.operands)?;
            match step {
                Step::Next => pc += 1,
                Step::Jump(target) => pc = target,
                Step::Return(value) => return Ok(value),
            }
        }
    }

    fn dispatch(&mut self, func_name: &str, opcode: &str, ops: &[Operand]) -> Result<Step> {
        macro_rules! op0 {
            ($f:ident) => {{
                self.$f();
                Ok(Step::Next)
            }};
        }
        macro_rules! op1 {
            ($f:ident) => {{
                self.$f(&ops[0])?;
                Ok(Step::Next)
            }};
        }
        macro_rules! op1_void {
            ($f:ident) => {{
                self.$f(&ops[0]);
                Ok(Step::Next)
            }};
        }
        macro_rules! op2 {
            ($f:ident) => {{
                self.$f(&ops[0], &ops[1])?;
                Ok(Step::Next)
            }};
        }
        macro_rules! op3 {
            ($f:ident) => {{
                self.$f(&ops[0], &ops[1], &ops[2])?;
                Ok(Step::Next)
            }};
        }

        match opcode {
            "mov" => op2!(op_mov),
            "data.load" => op2!(op_data_load),

            "ld.i8" => op2!(op_ld_i8),
            "ld.i32" => op2!(op_ld_i32),
            "ld.i64" => op2!(op_ld_i64),
            "st.i8" => op2!(op_st_i8),
            "st.i32" => op2!(op_st_i32),
            "st.i64" => op2!(op_st_i64),
            "heap.alloc" => op2!(op_heap_alloc),
            "heap.realloc" => op3!(op_heap_realloc),

            "add" => op3!(op_add),
            "sub" => op3!(op_sub),
            "mul" => op3!(op_mul),
            "div" => op3!(op_div),
            "rem" => op3!(op_rem),
            "inc" => op1!(op_inc),
            "dec" => op1!(op_dec),
            "neg" => op2!(op_neg),

            "and" => op3!(op_and),
            "or" => op3!(op_or),
            "xor" => op3!(op_xor),
            "not" => op2!(op_not),
            "shl" => op3!(op_shl),
            "shr" => op3!(op_shr),

            "cmp" => op2!(op_cmp),
            "setz" => op1_void!(op_setz),
            "setnz" => op1_void!(op_setnz),
            "setl" => op1_void!(op_setl),
            "setle" => op1_void!(op_setle),
            "setg" => op1_void!(op_setg),
            "setge" => op1_void!(op_setge),

            "fmov" => op2!(op_fmov),
            "fadd" => op3!(op_fadd),
            "fsub" => op3!(op_fsub),
            "fmul" => op3!(op_fmul),
            "fdiv" => op3!(op_fdiv),
            "frem" => op3!(op_frem),
            "ffloor" => op2!(op_ffloor),
            "fceil" => op2!(op_fceil),
            "fsqrt" => op2!(op_fsqrt),
            "fabs" => op2!(op_fabs),
            "fneg" => op2!(op_fneg),
            "i2f" => op2!(op_i2f),
            "f2i" => op2!(op_f2i),

            "jmp" => self.op_jmp(func_name, &ops[0]),
            "je" | "jz" => self.op_conditional_jump(func_name, &ops[0], self.flags.is_zero()),
            "jne" | "jnz" => self.op_conditional_jump(func_name, &ops[0], !self.flags.is_zero()),
            "jl" => self.op_conditional_jump(func_name, &ops[0], self.flags.is_less()),
            "jle" => self.op_conditional_jump(func_name, &ops[0], self.flags.is_less_equal()),
            "jg" => self.op_conditional_jump(func_name, &ops[0], self.flags.is_greater()),
            "jge" => self.op_conditional_jump(func_name, &ops[0], self.flags.is_greater_equal()),

            "call" => op1!(op_call),
            "tailcall" => {
                let value = self.op_tailcall(&ops[0])?;
                Ok(Step::Return(value))
            }
            "ret" => {
                let value = self.op_ret(&ops[0])?;
                Ok(Step::Return(value))
            }
            "func.addr" => op2!(op_func_addr),
            "call.indirect" => op1!(op_call_indirect),

            "console.log.str" => {
                self.op_console_log_str(&ops[0])?;
                Ok(Step::Next)
            }
            "console.log.val" => {
                self.op_console_log_val(&ops[0])?;
                Ok(Step::Next)
            }
            "console.log.space" => op0!(op_console_log_space),
            "console.log.newline" => op0!(op_console_log_newline),

            "str.concat" => op3!(op_str_concat),
            "str.sub" => {
                self.op_str_sub(&ops[0], &ops[1], &ops[2], &ops[3])?;
                Ok(Step::Next)
            }
            "str.rep" => op3!(op_str_rep),
            "str.reverse" => op2!(op_str_reverse),
            "str.upper" => op2!(op_str_upper),
            "str.lower" => op2!(op_str_lower),
            "int.tostring" => op2!(op_int_tostring),
            "str.tonumber" => op2!(op_str_tonumber),
            "char.from" => op2!(op_char_from),
            "table.concat" => op2!(op_table_concat),
            "type.of" => op2!(op_type_of),

            _ => {
                tracing::warn!(opcode, "unrecognized opcode, treated as nop");
                Ok(Step::Next)
            }
        }
    }
}

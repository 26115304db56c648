//! Data movement, memory loads/stores, and heap allocation.

use crate::error::Result;
use crate::operand::Operand;

use super::Interpreter;

impl Interpreter {
    pub(super) fn op_mov(&mut self, dst: &Operand, src: &Operand) -> Result<()> {
        let v = self.eval_value(src)?;
        self.write_reg(dst, v);
        Ok(())
    }

    pub(super) fn op_data_load(&mut self, dst: &Operand, name: &Operand) -> Result<()> {
        let name = match name {
            Operand::Symbol(name) => name.clone(),
            other => {
                return Err(crate::error::InterpreterError::module_load(
                    0,
                    format!("data.load expects a $symbol, found {other:?}"),
                ))
            }
        };
        let ptr = self.execute_data_builder(&name)?;
        self.write_reg(dst, ptr);
        Ok(())
    }

    pub(super) fn op_ld_i8(&mut self, dst: &Operand, addr: &Operand) -> Result<()> {
        let addr = self.eval_address(addr)?;
        self.write_reg(dst, self.memory.read_u8(addr) as i64);
        Ok(())
    }

    pub(super) fn op_ld_i32(&mut self, dst: &Operand, addr: &Operand) -> Result<()> {
        let addr = self.eval_address(addr)?;
        self.write_reg(dst, self.memory.read_i32(addr) as i64);
        Ok(())
    }

    /// True 64-bit LE semantics (see the design note on `ld.i64`/`st.i64` in
    /// the crate-level docs — this diverges intentionally from the
    /// 32-bit-plus-sign-extension behavior of some other implementations).
    pub(super) fn op_ld_i64(&mut self, dst: &Operand, addr: &Operand) -> Result<()> {
        let addr = self.eval_address(addr)?;
        self.write_reg(dst, self.memory.read_i64(addr));
        Ok(())
    }

    pub(super) fn op_st_i8(&mut self, addr: &Operand, src: &Operand) -> Result<()> {
        let addr = self.eval_address(addr)?;
        let v = self.eval_value(src)?;
        self.memory.write_u8(addr, v as u8);
        Ok(())
    }

    pub(super) fn op_st_i32(&mut self, addr: &Operand, src: &Operand) -> Result<()> {
        let addr = self.eval_address(addr)?;
        let v = self.eval_value(src)?;
        self.memory.write_i32(addr, v as i32);
        Ok(())
    }

    pub(super) fn op_st_i64(&mut self, addr: &Operand, src: &Operand) -> Result<()> {
        let addr = self.eval_address(addr)?;
        let v = self.eval_value(src)?;
        self.memory.write_i64(addr, v);
        Ok(())
    }

    pub(super) fn op_heap_alloc(&mut self, dst: &Operand, size: &Operand) -> Result<()> {
        let size = self.eval_value(size)?.max(0) as usize;
        let ptr = self.memory.heap_alloc(size);
        self.write_reg(dst, ptr);
        Ok(())
    }

    pub(super) fn op_heap_realloc(
        &mut self,
        dst: &Operand,
        old_ptr: &Operand,
        new_size: &Operand,
    ) -> Result<()> {
        let old_ptr = self.eval_value(old_ptr)?;
        let new_size = self.eval_value(new_size)?.max(0) as usize;
        let bytes = self.memory.read_bytes(old_ptr, new_size);
        let new_ptr = self.memory.heap_alloc(new_size);
        self.memory.write_bytes(new_ptr, &bytes);
        self.write_reg(dst, new_ptr);
        Ok(())
    }
}

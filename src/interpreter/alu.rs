//! Integer arithmetic, bitwise ops, comparison, and predicate extraction.

use crate::error::Result;
use crate::operand::Operand;

use super::Interpreter;

impl Interpreter {
    pub(super) fn op_add(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        self.write_reg(dst, a.wrapping_add(b));
        Ok(())
    }

    pub(super) fn op_sub(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        self.write_reg(dst, a.wrapping_sub(b));
        Ok(())
    }

    pub(super) fn op_mul(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        self.write_reg(dst, a.wrapping_mul(b));
        Ok(())
    }

    /// Floor division: truncates toward negative infinity, not toward zero.
    pub(super) fn op_div(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        if b == 0 {
            return Err(crate::error::InterpreterError::DivisionByZero);
        }
        self.write_reg(dst, floor_div(a, b));
        Ok(())
    }

    /// Remainder matching floor division (the sign follows the divisor).
    pub(super) fn op_rem(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        if b == 0 {
            return Err(crate::error::InterpreterError::DivisionByZero);
        }
        self.write_reg(dst, floor_rem(a, b));
        Ok(())
    }

    pub(super) fn op_inc(&mut self, dst: &Operand) -> Result<()> {
        let v = self.eval_value(dst)?;
        self.write_reg(dst, v.wrapping_add(1));
        Ok(())
    }

    pub(super) fn op_dec(&mut self, dst: &Operand) -> Result<()> {
        let v = self.eval_value(dst)?;
        self.write_reg(dst, v.wrapping_sub(1));
        Ok(())
    }

    pub(super) fn op_neg(&mut self, dst: &Operand, a: &Operand) -> Result<()> {
        let v = self.eval_value(a)?;
        self.write_reg(dst, v.wrapping_neg());
        Ok(())
    }

    pub(super) fn op_and(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        self.write_reg(dst, a & b);
        Ok(())
    }

    pub(super) fn op_or(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        self.write_reg(dst, a | b);
        Ok(())
    }

    pub(super) fn op_xor(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        self.write_reg(dst, a ^ b);
        Ok(())
    }

    pub(super) fn op_not(&mut self, dst: &Operand, a: &Operand) -> Result<()> {
        let v = self.eval_value(a)?;
        self.write_reg(dst, !v);
        Ok(())
    }

    pub(super) fn op_shl(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        self.write_reg(dst, a.wrapping_shl(b as u32 & 63));
        Ok(())
    }

    pub(super) fn op_shr(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        self.write_reg(dst, a.wrapping_shr(b as u32 & 63));
        Ok(())
    }

    pub(super) fn op_cmp(&mut self, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        self.flags.set_from_cmp(a, b);
        Ok(())
    }

    pub(super) fn op_setz(&mut self, dst: &Operand) {
        self.write_reg(dst, self.flags.is_zero() as i64);
    }
    pub(super) fn op_setnz(&mut self, dst: &Operand) {
        self.write_reg(dst, !self.flags.is_zero() as i64);
    }
    pub(super) fn op_setl(&mut self, dst: &Operand) {
        self.write_reg(dst, self.flags.is_less() as i64);
    }
    pub(super) fn op_setle(&mut self, dst: &Operand) {
        self.write_reg(dst, self.flags.is_less_equal() as i64);
    }
    pub(super) fn op_setg(&mut self, dst: &Operand) {
        self.write_reg(dst, self.flags.is_greater() as i64);
    }
    pub(super) fn op_setge(&mut self, dst: &Operand) {
        self.write_reg(dst, self.flags.is_greater_equal() as i64);
    }
}

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn floor_rem(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

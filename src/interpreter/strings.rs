//! String and table builtins. Every builtin here allocates a fresh
//! VM-native string object (`[i64 length][bytes]`) in the heap.

use crate::error::Result;
use crate::operand::Operand;

use super::Interpreter;

impl Interpreter {
    /// Allocate a VM-native string (`[i64 len][bytes]`) and return its base
    /// pointer.
    pub(super) fn alloc_vm_string(&mut self, bytes: &[u8]) -> i64 {
        let ptr = self.memory.heap_alloc(8 + bytes.len());
        self.memory.write_i64(ptr, bytes.len() as i64);
        self.memory.write_bytes(ptr + 8, bytes);
        ptr
    }

    /// Read a VM-native string's payload given its base pointer.
    pub(super) fn read_vm_string(&self, ptr: i64) -> Vec<u8> {
        let len = self.memory.read_i64(ptr).max(0) as usize;
        self.memory.read_bytes(ptr + 8, len)
    }

    /// Render an operand value per the `str.concat` polymorphic convention:
    /// values below 1000 are numeric literals; otherwise, if the value looks
    /// like a plausible heap string pointer, its payload is read, else it
    /// falls back to decimal rendering.
    fn render_polymorphic(&self, value: i64) -> Vec<u8> {
        if value < 1000 {
            return value.to_string().into_bytes();
        }
        let len = self.memory.read_i64(value);
        if (0..100_000).contains(&len) {
            self.memory.read_bytes(value + 8, len as usize)
        } else {
            value.to_string().into_bytes()
        }
    }

    pub(super) fn op_str_concat(&mut self, dst: &Operand, a: &Operand, b: &Operand) -> Result<()> {
        let (a, b) = (self.eval_value(a)?, self.eval_value(b)?);
        let mut out = self.render_polymorphic(a);
        out.extend_from_slice(&self.render_polymorphic(b));
        let ptr = self.alloc_vm_string(&out);
        self.write_reg(dst, ptr);
        Ok(())
    }

    /// 1-based, inclusive; negative indices count from the end of the
    /// string. Both ends are clamped to `[1, len]`.
    pub(super) fn op_str_sub(
        &mut self,
        dst: &Operand,
        s: &Operand,
        from: &Operand,
        to: &Operand,
    ) -> Result<()> {
        let ptr = self.eval_value(s)?;
        let bytes = self.read_vm_string(ptr);
        let len = bytes.len() as i64;
        let norm = |idx: i64| -> i64 {
            let idx = if idx < 0 { len + idx + 1 } else { idx };
            idx.clamp(1, len.max(1))
        };
        let from = norm(self.eval_value(from)?);
        let to = norm(self.eval_value(to)?);
        let slice = if len == 0 || from > to {
            Vec::new()
        } else {
            let to = to.min(len);
            bytes[(from - 1) as usize..to as usize].to_vec()
        };
        let ptr = self.alloc_vm_string(&slice);
        self.write_reg(dst, ptr);
        Ok(())
    }

    pub(super) fn op_str_rep(&mut self, dst: &Operand, s: &Operand, n: &Operand) -> Result<()> {
        let ptr = self.eval_value(s)?;
        let bytes = self.read_vm_string(ptr);
        let n = self.eval_value(n)?.max(0) as usize;
        let out = bytes.repeat(n);
        let ptr = self.alloc_vm_string(&out);
        self.write_reg(dst, ptr);
        Ok(())
    }

    pub(super) fn op_str_reverse(&mut self, dst: &Operand, s: &Operand) -> Result<()> {
        let ptr = self.eval_value(s)?;
        let mut bytes = self.read_vm_string(ptr);
        bytes.reverse();
        let ptr = self.alloc_vm_string(&bytes);
        self.write_reg(dst, ptr);
        Ok(())
    }

    pub(super) fn op_str_upper(&mut self, dst: &Operand, s: &Operand) -> Result<()> {
        let ptr = self.eval_value(s)?;
        let bytes = self.read_vm_string(ptr).to_ascii_uppercase();
        let ptr = self.alloc_vm_string(&bytes);
        self.write_reg(dst, ptr);
        Ok(())
    }

    pub(super) fn op_str_lower(&mut self, dst: &Operand, s: &Operand) -> Result<()> {
        let ptr = self.eval_value(s)?;
        let bytes = self.read_vm_string(ptr).to_ascii_lowercase();
        let ptr = self.alloc_vm_string(&bytes);
        self.write_reg(dst, ptr);
        Ok(())
    }

    pub(super) fn op_int_tostring(&mut self, dst: &Operand, v: &Operand) -> Result<()> {
        let v = self.eval_value(v)?;
        let ptr = self.alloc_vm_string(v.to_string().as_bytes());
        self.write_reg(dst, ptr);
        Ok(())
    }

    pub(super) fn op_str_tonumber(&mut self, dst: &Operand, s: &Operand) -> Result<()> {
        let ptr = self.eval_value(s)?;
        let bytes = self.read_vm_string(ptr);
        let text = String::from_utf8_lossy(&bytes);
        let n: i64 = text.trim().parse().unwrap_or(0);
        self.write_reg(dst, n);
        Ok(())
    }

    pub(super) fn op_char_from(&mut self, dst: &Operand, code: &Operand) -> Result<()> {
        let code = self.eval_value(code)?;
        let ch = char::from_u32(code as u32).unwrap_or('\u{FFFD}');
        let mut buf = [0u8; 4];
        let bytes = ch.encode_utf8(&mut buf).as_bytes();
        let ptr = self.alloc_vm_string(bytes);
        self.write_reg(dst, ptr);
        Ok(())
    }

    /// Table layout: `[i64 length][i64 capacity][i64 metatable][elements…]`.
    /// Element pointers begin at offset 24, i.e. `ptr + 16 + i*8` for
    /// 1-based `i`.
    pub(super) fn op_table_concat(&mut self, dst: &Operand, table: &Operand) -> Result<()> {
        let base = self.eval_value(table)?;
        let length = self.memory.read_i64(base);
        let mut out = Vec::new();
        for i in 1..=length {
            let elem_ptr = self.memory.read_i64(base + 16 + i * 8);
            out.extend_from_slice(&self.read_vm_string(elem_ptr));
        }
        let ptr = self.alloc_vm_string(&out);
        self.write_reg(dst, ptr);
        Ok(())
    }

    /// Placeholder: 1 for nonzero, 0 for zero. Matches the reference's
    /// unreliable behavior rather than doing real type tracking.
    pub(super) fn op_type_of(&mut self, dst: &Operand, v: &Operand) -> Result<()> {
        let v = self.eval_value(v)?;
        self.write_reg(dst, (v != 0) as i64);
        Ok(())
    }
}

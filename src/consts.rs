//! VM parameters

/* REGISTER FILE */

/// Register count for checking constraints.
pub const VM_REGISTER_COUNT: usize = 256;

/// First seven registers are the argument/return convention; r0-r6 are also
/// the callee's return scratch merged back into the caller on return.
pub const VM_ARG_REGISTER_COUNT: usize = 8;

/// Registers merged back from the callee into the caller's view on return.
pub const VM_RETURN_REGISTER_COUNT: usize = 7;

/* MEMORY TYPES */

/// Default linear memory capacity, in bytes (256 KiB).
pub const DEFAULT_MEM_SIZE: usize = 256 * 1024;

/// Alignment (in bytes) that every heap allocation is rounded up to.
pub const HEAP_ALIGN: usize = 8;

/* CALL STACK */

/// Default maximum call stack depth before `CallStackOverflow` is raised.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/* FUNCTION POINTERS */

/// First id handed out by the function-pointer table; chosen to avoid
/// collision with plausible data pointers in programs that store pointers
/// alongside integers.
pub const DEFAULT_FN_PTR_BASE: i64 = 1_000_000;

/// Runtime limits configuration.
///
/// Externalizes the constants the reference implementation hard-codes so
/// embedding hosts (and tests) can shrink them to exercise edge cases, such
/// as call-stack overflow or heap exhaustion, cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmLimits {
    /// Linear memory capacity, in bytes.
    pub mem_size: usize,
    /// Maximum call stack depth.
    pub max_call_depth: usize,
    /// First id handed out by the function-pointer table.
    pub fn_ptr_base: i64,
}

impl Default for VmLimits {
    fn default() -> Self {
        Self {
            mem_size: DEFAULT_MEM_SIZE,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            fn_ptr_base: DEFAULT_FN_PTR_BASE,
        }
    }
}

use thiserror::Error;

use crate::machine::MEMORY_SIZE;

/// A fatal machine fault. Any of these ends the current run; there are no
/// retries in a deterministic single-pass interpreter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// The parsed program image does not fit in memory.
    #[error("program image is {len} bytes but memory holds {MEMORY_SIZE}")]
    ProgramTooLarge { len: usize },

    /// A memory or stack access landed outside [0, 255].
    #[error("memory access out of bounds at address {addr}")]
    OutOfBounds { addr: usize },

    /// An operand byte named a register the machine does not have.
    #[error("no such register r{index}")]
    BadRegister { index: u8 },

    /// The fetched byte has no handler. Reported in both binary and
    /// decimal, since program images are written as binary literals.
    #[error("unknown opcode {opcode:#010b} ({opcode}) at address {pc}")]
    UnknownOpcode { opcode: u8, pc: usize },

    /// Integer division or modulo by zero in the ALU.
    #[error("division by zero in {op}")]
    DivideByZero { op: &'static str },
}

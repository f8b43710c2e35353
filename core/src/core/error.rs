//! Error types shared by memory, CPUs and the execution controller.

use thiserror::Error;

/// Errors that abort the current fetch-decode-execute cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmuError {
    /// An address or index beyond the logical size of a memory.
    #[error("address 0x{address:04X} is outside memory of size 0x{size:04X}")]
    AddressOutOfRange { address: usize, size: usize },

    /// A link or slice range that is reversed or exceeds the memory.
    #[error("invalid range [0x{from:04X}, 0x{to:04X}) for memory of size 0x{size:04X}")]
    InvalidLink { from: usize, to: usize, size: usize },

    /// Opcode with no defined semantics. Prefixed Z80 opcodes carry the
    /// prefix in the high byte (e.g. 0xED00).
    #[error("unrecognized opcode 0x{opcode:02X} at pc 0x{pc:04X}")]
    UnrecognizedOpcode { opcode: u16, pc: u16 },

    /// A Synacor operand word outside the literal and register ranges.
    #[error("invalid operand {value} at pc 0x{pc:04X}")]
    InvalidOperand { value: u16, pc: u16 },

    /// POP with nothing on the stack.
    #[error("stack underflow at pc 0x{pc:04X}")]
    StackUnderflow { pc: u16 },
}

pub type EmuResult<T> = Result<T, EmuError>;

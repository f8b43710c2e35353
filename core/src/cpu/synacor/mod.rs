//! Synacor challenge virtual machine.
//!
//! A 15-bit word machine: 32768 words of memory, eight registers and an
//! unbounded stack. Words are stored little-endian on the byte bus, so a
//! program binary loads into memory unchanged and the full address space
//! fills exactly 64 KiB.
//!
//! Operand words 0..=32767 are literals and 32768..=32775 name r0..r7.
//! [`Cpu::pc`] is the byte address of the current word, which keeps the
//! controller's breakpoints and the debugger window on the bus's scale.
//! Every instruction counts as one cycle.

mod disasm;

pub use disasm::{Opcode, disassemble};

use crate::core::bus::Bus;
use crate::core::debug::{CpuView, DisassembledLine, FlagView, RegisterView};
use crate::core::error::{EmuError, EmuResult};
use crate::cpu::{
    Cpu, Interrupt,
    state::{CpuStateTrait, SynacorState},
};

/// `out` writes the character here.
pub const CONSOLE_DATA_PORT: u8 = 0;
/// `in` polls this for the number of characters waiting.
pub const CONSOLE_STATUS_PORT: u8 = 1;

pub const MODULUS: u16 = 32768;
pub const REGISTER_COUNT: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct Synacor {
    pub registers: [u16; REGISTER_COUNT],
    /// Word address of the next instruction.
    pub pc: u16,
    pub stack: Vec<u16>,
    pub halted: bool,
    /// Parked on `in` with no character available.
    pub awaiting_input: bool,
}

/// A decoded operand: either a literal or a register index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Literal(u16),
    Register(usize),
}

impl Operand {
    pub fn decode(word: u16) -> Option<Self> {
        match word {
            0..=32767 => Some(Operand::Literal(word)),
            32768..=32775 => Some(Operand::Register((word - MODULUS) as usize)),
            _ => None,
        }
    }
}

impl Synacor {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_word<B: Bus + ?Sized>(bus: &mut B, address: u16) -> EmuResult<u16> {
        let byte_address = address.wrapping_mul(2);
        let lo = bus.read(byte_address)?;
        let hi = bus.read(byte_address.wrapping_add(1))?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn write_word<B: Bus + ?Sized>(bus: &mut B, address: u16, value: u16) -> EmuResult<()> {
        let byte_address = address.wrapping_mul(2);
        let [lo, hi] = value.to_le_bytes();
        bus.write(byte_address, lo)?;
        bus.write(byte_address.wrapping_add(1), hi)
    }

    fn operand(&self, word: u16) -> EmuResult<Operand> {
        Operand::decode(word).ok_or(EmuError::InvalidOperand {
            value: word,
            pc: self.pc.wrapping_mul(2),
        })
    }

    /// Value of an operand word: the literal itself or the register's
    /// contents.
    fn value(&self, word: u16) -> EmuResult<u16> {
        Ok(match self.operand(word)? {
            Operand::Literal(value) => value,
            Operand::Register(r) => self.registers[r],
        })
    }

    /// Register named by a destination operand word.
    fn register(&self, word: u16) -> EmuResult<usize> {
        match self.operand(word)? {
            Operand::Register(r) => Ok(r),
            Operand::Literal(_) => Err(EmuError::InvalidOperand {
                value: word,
                pc: self.pc.wrapping_mul(2),
            }),
        }
    }

    fn execute<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<()> {
        let pc = self.pc;
        let opcode_word = Self::read_word(bus, pc)?;
        let Some(opcode) = Opcode::from_word(opcode_word) else {
            return Err(EmuError::UnrecognizedOpcode {
                opcode: opcode_word,
                pc: pc.wrapping_mul(2),
            });
        };

        let mut args = [0u16; 3];
        for (i, arg) in args.iter_mut().enumerate().take(opcode.operand_count()) {
            *arg = Self::read_word(bus, (pc + 1 + i as u16) % MODULUS)?;
        }
        let [a, b, c] = args;
        let mut next = (pc + 1 + opcode.operand_count() as u16) % MODULUS;

        match opcode {
            Opcode::Halt => {
                self.halted = true;
                next = pc;
            }
            Opcode::Set => {
                let value = self.value(b)?;
                self.registers[self.register(a)?] = value;
            }
            Opcode::Push => {
                let value = self.value(a)?;
                self.stack.push(value);
            }
            Opcode::Pop => {
                let r = self.register(a)?;
                let value = self.stack.pop().ok_or(EmuError::StackUnderflow {
                    pc: pc.wrapping_mul(2),
                })?;
                self.registers[r] = value;
            }
            Opcode::Eq => {
                let value = (self.value(b)? == self.value(c)?) as u16;
                self.registers[self.register(a)?] = value;
            }
            Opcode::Gt => {
                let value = (self.value(b)? > self.value(c)?) as u16;
                self.registers[self.register(a)?] = value;
            }
            Opcode::Jmp => next = self.value(a)?,
            Opcode::Jt => {
                if self.value(a)? != 0 {
                    next = self.value(b)?;
                }
            }
            Opcode::Jf => {
                if self.value(a)? == 0 {
                    next = self.value(b)?;
                }
            }
            Opcode::Add => {
                let value = (self.value(b)? as u32 + self.value(c)? as u32) % MODULUS as u32;
                self.registers[self.register(a)?] = value as u16;
            }
            Opcode::Mult => {
                let value = (self.value(b)? as u32 * self.value(c)? as u32) % MODULUS as u32;
                self.registers[self.register(a)?] = value as u16;
            }
            Opcode::Mod => {
                let divisor = self.value(c)?;
                // Division by zero is undefined; it stores 0.
                let value = self.value(b)?.checked_rem(divisor).unwrap_or(0);
                self.registers[self.register(a)?] = value;
            }
            Opcode::And => {
                let value = self.value(b)? & self.value(c)?;
                self.registers[self.register(a)?] = value;
            }
            Opcode::Or => {
                let value = self.value(b)? | self.value(c)?;
                self.registers[self.register(a)?] = value;
            }
            Opcode::Not => {
                let value = !self.value(b)? & (MODULUS - 1);
                self.registers[self.register(a)?] = value;
            }
            Opcode::Rmem => {
                let value = Self::read_word(bus, self.value(b)?)?;
                self.registers[self.register(a)?] = value;
            }
            Opcode::Wmem => {
                let address = self.value(a)?;
                Self::write_word(bus, address, self.value(b)?)?;
            }
            Opcode::Call => {
                let target = self.value(a)?;
                self.stack.push(next);
                next = target;
            }
            Opcode::Ret => match self.stack.pop() {
                Some(address) => next = address,
                None => {
                    log::debug!("synacor: ret on an empty stack, halting");
                    self.halted = true;
                    next = pc;
                }
            },
            Opcode::Out => {
                let value = self.value(a)?;
                bus.io_write(CONSOLE_DATA_PORT as u16, value as u8);
            }
            Opcode::In => {
                let r = self.register(a)?;
                if bus.io_read(CONSOLE_STATUS_PORT as u16) == 0 {
                    self.awaiting_input = true;
                    return Ok(());
                }
                self.awaiting_input = false;
                self.registers[r] = bus.io_read(CONSOLE_DATA_PORT as u16) as u16;
            }
            Opcode::Noop => {}
        }

        self.pc = next % MODULUS;
        Ok(())
    }
}

impl Cpu for Synacor {
    fn reset(&mut self) {
        *self = Self::new();
    }

    fn step(&mut self, bus: &mut dyn Bus) -> EmuResult<u32> {
        if !self.halted {
            self.execute(bus)?;
        }
        Ok(1)
    }

    fn pc(&self) -> u16 {
        self.pc.wrapping_mul(2)
    }

    fn set_pc(&mut self, pc: u16) {
        self.pc = pc / 2;
    }

    /// Stack depth; the stack lives outside addressable memory.
    fn sp(&self) -> u16 {
        self.stack.len().min(u16::MAX as usize) as u16
    }

    fn signal_interrupt(&mut self, _interrupt: Interrupt) {
        log::debug!("synacor has no interrupt inputs, ignored");
    }

    fn is_sleeping(&self) -> bool {
        self.halted
    }

    fn interrupts_enabled(&self) -> bool {
        false
    }

    fn disassemble(&self, code: &[u8], address: u16) -> DisassembledLine {
        disassemble(code, address)
    }

    fn debug_view(&self) -> CpuView {
        const NAMES: [&str; REGISTER_COUNT] = ["R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7"];
        CpuView {
            pc: self.pc(),
            sp: self.sp(),
            registers: NAMES
                .iter()
                .zip(self.registers)
                .map(|(&name, value)| RegisterView::new(name, value))
                .collect(),
            flags: FlagView {
                value: self.awaiting_input as u8,
                bits: vec![("in", 0)],
            },
            interrupts_enabled: false,
            halted: self.halted,
        }
    }
}

impl CpuStateTrait for Synacor {
    type Snapshot = SynacorState;

    fn snapshot(&self) -> SynacorState {
        SynacorState {
            registers: self.registers,
            pc: self.pc,
            stack: self.stack.clone(),
            halted: self.halted,
        }
    }
}

//! Little Man Computer.
//!
//! A decimal teaching machine: 100 mailboxes of three-digit words, an
//! accumulator and a negative flag set by SUB. Each mailbox is a
//! little-endian word on the byte bus at `2 * mailbox`, and [`Cpu::pc`]
//! reports that byte address.
//!
//! ```text
//! 1xx ADD   2xx SUB   3xx STA   5xx LDA
//! 6xx BRA   7xx BRZ   8xx BRP
//! 901 INP   902 OUT   922 OTC   000 HLT
//! ```
//!
//! Numbers travel over the port space as two bytes, high first. Every
//! instruction counts as one cycle.

pub mod assembler;
mod disasm;

pub use assembler::{AssembleError, assemble};
pub use disasm::{Mnemonic, decode, disassemble, disassemble_word};

use crate::core::bus::Bus;
use crate::core::debug::{CpuView, DisassembledLine, FlagView, RegisterView};
use crate::core::error::{EmuError, EmuResult};
use crate::cpu::{
    Cpu, Interrupt,
    state::{CpuStateTrait, LmcState},
};

pub const MAILBOXES: u8 = 100;
/// Words are three decimal digits.
pub const WORD_LIMIT: u16 = 1000;

/// INP reads its number from here (high byte, then low byte); OTC writes
/// its character here.
pub const DATA_PORT: u8 = 0;
/// Bytes waiting on [`DATA_PORT`].
pub const STATUS_PORT: u8 = 1;
/// OUT writes its number here, high byte then low byte.
pub const NUMBER_PORT: u8 = 2;

#[derive(Debug, Clone, Default)]
pub struct Lmc {
    pub accumulator: u16,
    pub negative: bool,
    /// Mailbox of the next instruction.
    pub pc: u8,
    pub halted: bool,
    /// Parked on INP with no number available.
    pub awaiting_input: bool,
}

impl Lmc {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_mailbox<B: Bus + ?Sized>(bus: &mut B, mailbox: u8) -> EmuResult<u16> {
        let address = mailbox as u16 * 2;
        Ok(u16::from_le_bytes([bus.read(address)?, bus.read(address + 1)?]))
    }

    fn write_mailbox<B: Bus + ?Sized>(bus: &mut B, mailbox: u8, value: u16) -> EmuResult<()> {
        let address = mailbox as u16 * 2;
        let [lo, hi] = value.to_le_bytes();
        bus.write(address, lo)?;
        bus.write(address + 1, hi)
    }

    fn execute<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<()> {
        let pc = self.pc;
        let word = Self::read_mailbox(bus, pc)?;
        let Some((mnemonic, mailbox)) = decode(word) else {
            return Err(EmuError::UnrecognizedOpcode {
                opcode: word,
                pc: pc as u16 * 2,
            });
        };
        let mut next = (pc + 1) % MAILBOXES;

        match mnemonic {
            Mnemonic::Add => {
                let value = Self::read_mailbox(bus, mailbox)?;
                self.accumulator = (self.accumulator + value % WORD_LIMIT) % WORD_LIMIT;
                self.negative = false;
            }
            Mnemonic::Sub => {
                let value = Self::read_mailbox(bus, mailbox)? % WORD_LIMIT;
                self.negative = value > self.accumulator;
                self.accumulator = (self.accumulator + WORD_LIMIT - value) % WORD_LIMIT;
            }
            Mnemonic::Sta => Self::write_mailbox(bus, mailbox, self.accumulator)?,
            Mnemonic::Lda => {
                self.accumulator = Self::read_mailbox(bus, mailbox)? % WORD_LIMIT;
                self.negative = false;
            }
            Mnemonic::Bra => next = mailbox,
            Mnemonic::Brz => {
                if self.accumulator == 0 {
                    next = mailbox;
                }
            }
            Mnemonic::Brp => {
                if !self.negative {
                    next = mailbox;
                }
            }
            Mnemonic::Inp => {
                if bus.io_read(STATUS_PORT as u16) < 2 {
                    self.awaiting_input = true;
                    return Ok(());
                }
                self.awaiting_input = false;
                let hi = bus.io_read(DATA_PORT as u16);
                let lo = bus.io_read(DATA_PORT as u16);
                self.accumulator = u16::from_be_bytes([hi, lo]) % WORD_LIMIT;
                self.negative = false;
            }
            Mnemonic::Out => {
                let [hi, lo] = self.accumulator.to_be_bytes();
                bus.io_write(NUMBER_PORT as u16, hi);
                bus.io_write(NUMBER_PORT as u16, lo);
            }
            Mnemonic::Otc => bus.io_write(DATA_PORT as u16, self.accumulator as u8),
            Mnemonic::Hlt => {
                self.halted = true;
                next = pc;
            }
        }

        self.pc = next;
        Ok(())
    }
}

impl Cpu for Lmc {
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
        self.pc as u16 * 2
    }

    fn set_pc(&mut self, pc: u16) {
        self.pc = ((pc / 2) % MAILBOXES as u16) as u8;
    }

    /// No stack.
    fn sp(&self) -> u16 {
        0
    }

    fn signal_interrupt(&mut self, _interrupt: Interrupt) {
        log::debug!("lmc has no interrupt inputs, ignored");
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
        CpuView {
            pc: self.pc(),
            sp: 0,
            registers: vec![
                RegisterView::new("ACC", self.accumulator),
                RegisterView::new("MBX", self.pc as u16),
            ],
            flags: FlagView {
                value: self.negative as u8 | (self.awaiting_input as u8) << 1,
                bits: vec![("in", 1), ("n", 0)],
            },
            interrupts_enabled: false,
            halted: self.halted,
        }
    }
}

impl CpuStateTrait for Lmc {
    type Snapshot = LmcState;

    fn snapshot(&self) -> LmcState {
        LmcState {
            accumulator: self.accumulator,
            negative: self.negative,
            pc: self.pc,
            halted: self.halted,
        }
    }
}

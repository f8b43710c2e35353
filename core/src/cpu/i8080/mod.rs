//! Intel 8080.
//!
//! Instruction-level: every [`Cpu::step`] fetches, decodes and executes a
//! whole instruction and returns its data-book cycle count.

mod alu;
mod branch;
mod disasm;
mod flags;
mod load_store;
mod stack;
pub mod table;

pub use disasm::disassemble;
pub use flags::Flags;
pub use table::{Condition, INSTRUCTIONS, Instruction, Op, Pair, Reg, Timing};

use crate::core::bus::Bus;
use crate::core::debug::{CpuView, DisassembledLine, FlagView, RegisterView};
use crate::core::error::EmuResult;
use crate::cpu::{
    Cpu, Interrupt,
    state::{CpuStateTrait, I8080State},
};

/// Cycles burned per step while parked in HLT.
const HALT_IDLE_CYCLES: u32 = 4;

pub struct I8080 {
    // Registers
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub flags: Flags,
    pub sp: u16,
    pub pc: u16,

    // Internal state
    pub inte: bool,
    pub halted: bool,
    pub(crate) ei_delay: bool, // EI enables after the next instruction
    pub(crate) pending_interrupt: Option<u8>,
}

impl Default for I8080 {
    fn default() -> Self {
        Self::new()
    }
}

impl I8080 {
    pub fn new() -> Self {
        Self {
            a: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            flags: Flags::default(),
            sp: 0,
            pc: 0,
            inte: false,
            halted: false,
            ei_delay: false,
            pending_interrupt: None,
        }
    }

    /// Power on with execution starting at `pc`.
    pub fn with_pc(pc: u16) -> Self {
        Self {
            pc,
            ..Self::new()
        }
    }

    // Helpers for 16-bit register access
    pub fn get_bc(&self) -> u16 { ((self.b as u16) << 8) | self.c as u16 }
    pub fn set_bc(&mut self, val: u16) { self.b = (val >> 8) as u8; self.c = val as u8; }

    pub fn get_de(&self) -> u16 { ((self.d as u16) << 8) | self.e as u16 }
    pub fn set_de(&mut self, val: u16) { self.d = (val >> 8) as u8; self.e = val as u8; }

    pub fn get_hl(&self) -> u16 { ((self.h as u16) << 8) | self.l as u16 }
    pub fn set_hl(&mut self, val: u16) { self.h = (val >> 8) as u8; self.l = val as u8; }

    /// A in the high byte, the status byte in the low byte.
    pub fn get_psw(&self) -> u16 { ((self.a as u16) << 8) | self.flags.to_byte() as u16 }
    pub fn set_psw(&mut self, val: u16) { self.a = (val >> 8) as u8; self.flags = Flags::from_byte(val as u8); }

    pub(crate) fn get_pair(&self, pair: Pair) -> u16 {
        match pair {
            Pair::Bc => self.get_bc(),
            Pair::De => self.get_de(),
            Pair::Hl => self.get_hl(),
            Pair::Sp => self.sp,
            Pair::Psw => self.get_psw(),
        }
    }

    pub(crate) fn set_pair(&mut self, pair: Pair, val: u16) {
        match pair {
            Pair::Bc => self.set_bc(val),
            Pair::De => self.set_de(val),
            Pair::Hl => self.set_hl(val),
            Pair::Sp => self.sp = val,
            Pair::Psw => self.set_psw(val),
        }
    }

    /// Read an 8-bit operand. `M` goes through memory at (HL).
    pub(crate) fn get_reg<B: Bus + ?Sized>(&self, reg: Reg, bus: &mut B) -> EmuResult<u8> {
        Ok(match reg {
            Reg::B => self.b,
            Reg::C => self.c,
            Reg::D => self.d,
            Reg::E => self.e,
            Reg::H => self.h,
            Reg::L => self.l,
            Reg::M => bus.read(self.get_hl())?,
            Reg::A => self.a,
        })
    }

    pub(crate) fn set_reg<B: Bus + ?Sized>(&mut self, reg: Reg, val: u8, bus: &mut B) -> EmuResult<()> {
        match reg {
            Reg::B => self.b = val,
            Reg::C => self.c = val,
            Reg::D => self.d = val,
            Reg::E => self.e = val,
            Reg::H => self.h = val,
            Reg::L => self.l = val,
            Reg::M => bus.write(self.get_hl(), val)?,
            Reg::A => self.a = val,
        }
        Ok(())
    }

    pub(crate) fn condition(&self, condition: Condition) -> bool {
        match condition {
            Condition::NotZero => !self.flags.zero,
            Condition::Zero => self.flags.zero,
            Condition::NoCarry => !self.flags.carry,
            Condition::Carry => self.flags.carry,
            Condition::ParityOdd => !self.flags.parity,
            Condition::ParityEven => self.flags.parity,
            Condition::Plus => !self.flags.sign,
            Condition::Minus => self.flags.sign,
        }
    }

    // --- Operand fetch ---

    pub(crate) fn fetch_byte<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<u8> {
        let val = bus.read(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        Ok(val)
    }

    pub(crate) fn fetch_word<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<u16> {
        let lo = self.fetch_byte(bus)?;
        let hi = self.fetch_byte(bus)?;
        Ok(((hi as u16) << 8) | lo as u16)
    }

    // --- Execution ---

    /// Run the instruction `opcode`. PC already points past the opcode
    /// byte; operands are fetched from PC.
    fn execute<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) -> EmuResult<u32> {
        let instruction = &INSTRUCTIONS[opcode as usize];

        let taken = match instruction.op {
            Op::Nop => false,
            Op::Hlt => {
                self.halted = true;
                false
            }

            Op::Mov(dst, src) => self.op_mov(dst, src, bus)?,
            Op::Mvi(dst) => self.op_mvi(dst, bus)?,
            Op::Lxi(pair) => self.op_lxi(pair, bus)?,
            Op::Stax(pair) => self.op_stax(pair, bus)?,
            Op::Ldax(pair) => self.op_ldax(pair, bus)?,
            Op::Sta => self.op_sta(bus)?,
            Op::Lda => self.op_lda(bus)?,
            Op::Shld => self.op_shld(bus)?,
            Op::Lhld => self.op_lhld(bus)?,
            Op::Xchg => self.op_xchg(),

            Op::Alu(op, src) => {
                let val = self.get_reg(src, bus)?;
                self.perform_alu_op(op, val);
                false
            }
            Op::AluImm(op) => {
                let val = self.fetch_byte(bus)?;
                self.perform_alu_op(op, val);
                false
            }
            Op::Inr(reg) => self.op_inr(reg, bus)?,
            Op::Dcr(reg) => self.op_dcr(reg, bus)?,
            Op::Inx(pair) => self.op_inx(pair),
            Op::Dcx(pair) => self.op_dcx(pair),
            Op::Dad(pair) => self.op_dad(pair),
            Op::Daa => self.op_daa(),
            Op::Cma => self.op_cma(),
            Op::Stc => self.op_stc(),
            Op::Cmc => self.op_cmc(),
            Op::Rlc => self.op_rlc(),
            Op::Rrc => self.op_rrc(),
            Op::Ral => self.op_ral(),
            Op::Rar => self.op_rar(),

            Op::Jmp => self.op_jmp(bus)?,
            Op::Jcc(cond) => self.op_jcc(cond, bus)?,
            Op::Call => self.op_call(bus)?,
            Op::Ccc(cond) => self.op_ccc(cond, bus)?,
            Op::Ret => self.op_ret(bus)?,
            Op::Rcc(cond) => self.op_rcc(cond, bus)?,
            Op::Rst(n) => self.op_rst(n, bus)?,
            Op::Pchl => self.op_pchl(),

            Op::Push(pair) => self.op_push(pair, bus)?,
            Op::Pop(pair) => self.op_pop(pair, bus)?,
            Op::Xthl => self.op_xthl(bus)?,
            Op::Sphl => self.op_sphl(),

            Op::In => self.op_in(bus)?,
            Op::Out => self.op_out(bus)?,
            Op::Ei => self.op_ei(),
            Op::Di => self.op_di(),
        };

        Ok(instruction.timing.cycles(taken))
    }

    /// Acknowledge a latched interrupt if INTE allows it.
    ///
    /// The interrupting device supplies an instruction (normally RST n)
    /// that runs in place of the next fetch, with PC unchanged.
    fn service_interrupt<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<Option<u32>> {
        if !self.inte {
            return Ok(None);
        }
        let Some(opcode) = self.pending_interrupt.take() else {
            return Ok(None);
        };
        self.inte = false;
        self.halted = false;
        log::trace!("8080 interrupt 0x{:02X} at pc 0x{:04X}", opcode, self.pc);
        self.execute(opcode, bus).map(Some)
    }
}

impl Cpu for I8080 {
    fn reset(&mut self) {
        self.pc = 0;
        self.inte = false;
        self.halted = false;
        self.ei_delay = false;
        self.pending_interrupt = None;
    }

    fn step(&mut self, bus: &mut dyn Bus) -> EmuResult<u32> {
        if self.ei_delay {
            self.ei_delay = false;
        } else if let Some(cycles) = self.service_interrupt(bus)? {
            return Ok(cycles);
        }

        if self.halted {
            return Ok(HALT_IDLE_CYCLES);
        }

        let opcode = self.fetch_byte(bus)?;
        self.execute(opcode, bus)
    }

    fn pc(&self) -> u16 {
        self.pc
    }

    fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    fn sp(&self) -> u16 {
        self.sp
    }

    /// The INTR line is latched until INTE lets it through. The 8080
    /// has no NMI.
    fn signal_interrupt(&mut self, interrupt: Interrupt) {
        match interrupt {
            Interrupt::Maskable(opcode) => self.pending_interrupt = Some(opcode),
            Interrupt::Nmi => log::debug!("8080 has no NMI input, ignored"),
        }
    }

    fn is_sleeping(&self) -> bool {
        self.halted
    }

    fn interrupts_enabled(&self) -> bool {
        self.inte
    }

    fn disassemble(&self, code: &[u8], address: u16) -> DisassembledLine {
        disassemble(code, address)
    }

    fn debug_view(&self) -> CpuView {
        CpuView {
            pc: self.pc,
            sp: self.sp,
            registers: vec![
                RegisterView::new("A", self.a as u16),
                RegisterView::new("B", self.b as u16),
                RegisterView::new("C", self.c as u16),
                RegisterView::new("D", self.d as u16),
                RegisterView::new("E", self.e as u16),
                RegisterView::new("H", self.h as u16),
                RegisterView::new("L", self.l as u16),
            ],
            flags: FlagView {
                value: self.flags.to_byte(),
                bits: vec![("s", 7), ("z", 6), ("a", 4), ("p", 2), ("c", 0)],
            },
            interrupts_enabled: self.inte,
            halted: self.halted,
        }
    }
}

impl CpuStateTrait for I8080 {
    type Snapshot = I8080State;

    fn snapshot(&self) -> I8080State {
        I8080State {
            a: self.a,
            f: self.flags.to_byte(),
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            sp: self.sp,
            pc: self.pc,
            inte: self.inte,
            halted: self.halted,
        }
    }
}

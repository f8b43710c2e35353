//! Zilog Z80.
//!
//! Instruction-level: one [`Cpu::step`] runs a whole instruction, prefix
//! bytes included, or one interrupt acknowledge, or one HALT slot.

mod alu;
mod bit;
mod block;
mod branch;
pub mod decode;
mod disasm;
mod load_store;
mod stack;

pub use disasm::disassemble;

use crate::core::bus::Bus;
use crate::core::debug::{CpuView, DisassembledLine, FlagView, RegisterView};
use crate::core::error::{EmuError, EmuResult};
use crate::cpu::{
    Cpu, Interrupt,
    state::{CpuStateTrait, Z80State},
};
use decode::{ED, EdOp, MAIN, Op};

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    C = 0x01,  // Carry
    N = 0x02,  // Add/Subtract
    PV = 0x04, // Parity/Overflow
    X = 0x08,  // Undocumented copy of bit 3
    H = 0x10,  // Half Carry
    Y = 0x20,  // Undocumented copy of bit 5
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IndexMode {
    HL,
    IX,
    IY,
}

pub struct Z80 {
    // Registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    // Shadow Registers
    pub a_prime: u8,
    pub f_prime: u8,
    pub b_prime: u8,
    pub c_prime: u8,
    pub d_prime: u8,
    pub e_prime: u8,
    pub h_prime: u8,
    pub l_prime: u8,
    // Index & Special Registers
    pub ix: u16,
    pub iy: u16,
    pub i: u8,
    pub r: u8,
    pub sp: u16,
    pub pc: u16,

    // Internal state
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub memptr: u16, // Hidden WZ register
    pub halted: bool,
    pub ei_delay: bool,
    pub p: bool,           // Set after LD A,I / LD A,R for interrupt PV behavior
    pub q: u8,             // Copy of F when instruction modifies flags, 0 otherwise (for SCF/CCF X/Y)
    pub(crate) prev_q: u8, // Previous instruction's q value

    // Per-instruction decode state
    pub(crate) index_mode: IndexMode,
    pub(crate) instruction_pc: u16,

    // Interrupt lines
    pub(crate) irq: Option<u8>, // Maskable, held until accepted
    pub(crate) nmi_pending: bool,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    pub fn new() -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            b: 0xFF,
            c: 0xFF,
            d: 0xFF,
            e: 0xFF,
            h: 0xFF,
            l: 0xFF,
            a_prime: 0xFF,
            f_prime: 0xFF,
            b_prime: 0xFF,
            c_prime: 0xFF,
            d_prime: 0xFF,
            e_prime: 0xFF,
            h_prime: 0xFF,
            l_prime: 0xFF,
            ix: 0xFFFF,
            iy: 0xFFFF,
            i: 0,
            r: 0,
            sp: 0xFFFF,
            pc: 0x0000,
            iff1: false,
            iff2: false,
            im: 0,
            memptr: 0,
            halted: false,
            ei_delay: false,
            p: false,
            q: 0,
            prev_q: 0,
            index_mode: IndexMode::HL,
            instruction_pc: 0,
            irq: None,
            nmi_pending: false,
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

    pub fn get_af(&self) -> u16 { ((self.a as u16) << 8) | self.f as u16 }
    pub fn set_af(&mut self, val: u16) { self.a = (val >> 8) as u8; self.f = val as u8; }

    /// Write F and record it in Q for SCF/CCF.
    #[inline]
    pub(crate) fn set_flags(&mut self, f: u8) {
        self.f = f;
        self.q = f;
    }

    #[inline]
    pub(crate) fn flag(&self, flag: Flag) -> bool {
        self.f & flag as u8 != 0
    }

    /// Get 8-bit register by index, respecting IX/IY prefix for H/L (undocumented IXH/IXL/IYH/IYL).
    /// Index 6 is NOT handled here; callers must handle (HL)/(IX+d)/(IY+d) separately.
    pub fn get_reg8_ix(&self, index: u8) -> u8 {
        match (index, self.index_mode) {
            (4, IndexMode::IX) => (self.ix >> 8) as u8,
            (5, IndexMode::IX) => self.ix as u8,
            (4, IndexMode::IY) => (self.iy >> 8) as u8,
            (5, IndexMode::IY) => self.iy as u8,
            _ => self.get_reg8(index),
        }
    }

    pub fn set_reg8_ix(&mut self, index: u8, val: u8) {
        match (index, self.index_mode) {
            (4, IndexMode::IX) => self.ix = (self.ix & 0x00FF) | ((val as u16) << 8),
            (5, IndexMode::IX) => self.ix = (self.ix & 0xFF00) | val as u16,
            (4, IndexMode::IY) => self.iy = (self.iy & 0x00FF) | ((val as u16) << 8),
            (5, IndexMode::IY) => self.iy = (self.iy & 0xFF00) | val as u16,
            _ => self.set_reg8(index, val),
        }
    }

    pub fn get_reg8(&self, index: u8) -> u8 {
        match index {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            _ => self.a,
        }
    }

    pub fn set_reg8(&mut self, index: u8, val: u8) {
        match index {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            _ => self.a = val,
        }
    }

    /// HL, IX or IY depending on the active prefix.
    pub(crate) fn get_index_reg(&self) -> u16 {
        match self.index_mode {
            IndexMode::HL => self.get_hl(),
            IndexMode::IX => self.ix,
            IndexMode::IY => self.iy,
        }
    }

    pub(crate) fn set_index_reg(&mut self, val: u16) {
        match self.index_mode {
            IndexMode::HL => self.set_hl(val),
            IndexMode::IX => self.ix = val,
            IndexMode::IY => self.iy = val,
        }
    }

    /// Get 16-bit register pair by index (0=BC, 1=DE, 2=HL/IX/IY, 3=SP).
    /// Index 2 respects current index_mode for DD/FD prefixed instructions.
    pub(crate) fn get_rp(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => self.get_index_reg(),
            _ => self.sp,
        }
    }

    /// Set 16-bit register pair by index (0=BC, 1=DE, 2=HL/IX/IY, 3=SP).
    pub(crate) fn set_rp(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => self.set_index_reg(val),
            _ => self.sp = val,
        }
    }

    /// Get 16-bit register pair by index for PUSH/POP (0=BC, 1=DE, 2=HL/IX/IY, 3=AF).
    pub(crate) fn get_rp_af(&self, index: u8) -> u16 {
        match index {
            3 => self.get_af(),
            _ => self.get_rp(index),
        }
    }

    /// Set 16-bit register pair by index for PUSH/POP (0=BC, 1=DE, 2=HL/IX/IY, 3=AF).
    pub(crate) fn set_rp_af(&mut self, index: u8, val: u16) {
        match index {
            3 => self.set_af(val),
            _ => self.set_rp(index, val),
        }
    }

    // --- Fetch ---

    #[inline]
    pub(crate) fn inc_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    /// M1 cycle: opcode fetch plus memory refresh.
    pub(crate) fn fetch_opcode<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<u8> {
        let opcode = bus.read(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        self.inc_r();
        Ok(opcode)
    }

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

    pub(crate) fn read_word<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> EmuResult<u16> {
        let lo = bus.read(addr)?;
        let hi = bus.read(addr.wrapping_add(1))?;
        Ok(((hi as u16) << 8) | lo as u16)
    }

    pub(crate) fn write_word<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16, val: u16) -> EmuResult<()> {
        bus.write(addr, val as u8)?;
        bus.write(addr.wrapping_add(1), (val >> 8) as u8)
    }

    /// Address of the (HL) operand. Under DD/FD this fetches the
    /// displacement byte and yields IX+d / IY+d (also latched in MEMPTR).
    pub(crate) fn operand_addr<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<u16> {
        match self.index_mode {
            IndexMode::HL => Ok(self.get_hl()),
            _ => {
                let d = self.fetch_byte(bus)? as i8;
                let addr = self.get_index_reg().wrapping_add(d as u16);
                self.memptr = addr;
                Ok(addr)
            }
        }
    }

    // --- Execution ---

    /// Execute an unprefixed (or DD/FD-modified) opcode whose M1 fetch
    /// has already happened.
    fn execute<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) -> EmuResult<u32> {
        let instruction = MAIN[opcode as usize];

        let taken = match instruction.op {
            Op::Nop => false,
            Op::Halt => {
                self.halted = true;
                false
            }

            // Prefixes: fetch and dispatch the rest of the instruction
            Op::PrefixCb => return self.execute_cb_prefix(bus),
            Op::PrefixEd => {
                // ED cancels a pending DD/FD.
                self.index_mode = IndexMode::HL;
                let opcode = self.fetch_opcode(bus)?;
                return self.execute_ed(opcode, bus);
            }
            Op::PrefixDd | Op::PrefixFd => {
                // A prefix followed by another prefix is a 4 T no-op; PC is
                // left on the second one so the next step starts from it.
                if matches!(bus.read(self.pc)?, 0xDD | 0xFD) {
                    return Ok(4);
                }
                self.index_mode = if opcode == 0xDD { IndexMode::IX } else { IndexMode::IY };
                let next = self.fetch_opcode(bus)?;
                return Ok(4 + self.execute(next, bus)?);
            }

            // --- Load/Store ---
            Op::LdRpNn(rp) => self.op_ld_rp_nn(rp, bus)?,
            Op::LdBcA => self.op_ld_ind_a(self.get_bc(), bus)?,
            Op::LdDeA => self.op_ld_ind_a(self.get_de(), bus)?,
            Op::LdABc => self.op_ld_a_ind(self.get_bc(), bus)?,
            Op::LdADe => self.op_ld_a_ind(self.get_de(), bus)?,
            Op::LdNnHl => self.op_ld_nn_hl(bus)?,
            Op::LdHlNn => self.op_ld_hl_nn(bus)?,
            Op::LdNnA => self.op_ld_nn_a(bus)?,
            Op::LdANn => self.op_ld_a_nn(bus)?,
            Op::LdRN(r) => self.op_ld_r_n(r, bus)?,
            Op::LdRR(dst, src) => self.op_ld_r_r(dst, src, bus)?,
            Op::LdSpHl => {
                self.sp = self.get_index_reg();
                false
            }
            Op::ExAfAf => self.op_ex_af_af(),
            Op::ExDeHl => self.op_ex_de_hl(),
            Op::Exx => self.op_exx(),
            Op::ExSpHl => self.op_ex_sp_hl(bus)?,
            Op::OutNA => self.op_out_n_a(bus)?,
            Op::InAN => self.op_in_a_n(bus)?,

            // --- Stack ---
            Op::Push(rp) => self.op_push(rp, bus)?,
            Op::Pop(rp) => self.op_pop(rp, bus)?,

            // --- ALU ---
            Op::Alu(alu, r) => self.op_alu_r(alu, r, bus)?,
            Op::AluN(alu) => {
                let val = self.fetch_byte(bus)?;
                self.perform_alu_op(alu, val);
                false
            }
            Op::IncR(r) => self.op_inc_dec_r(r, false, bus)?,
            Op::DecR(r) => self.op_inc_dec_r(r, true, bus)?,
            Op::AddHlRp(rp) => self.op_add_hl_rp(rp),
            Op::IncRp(rp) => {
                self.set_rp(rp, self.get_rp(rp).wrapping_add(1));
                false
            }
            Op::DecRp(rp) => {
                self.set_rp(rp, self.get_rp(rp).wrapping_sub(1));
                false
            }
            Op::Rlca => self.op_rlca(),
            Op::Rrca => self.op_rrca(),
            Op::Rla => self.op_rla(),
            Op::Rra => self.op_rra(),
            Op::Daa => self.op_daa(),
            Op::Cpl => self.op_cpl(),
            Op::Scf => self.op_scf(),
            Op::Ccf => self.op_ccf(),

            // --- Branch/Control Flow ---
            Op::Jp => self.op_jp_nn(bus)?,
            Op::JpCc(cc) => self.op_jp_cc_nn(cc, bus)?,
            Op::JpHl => {
                self.pc = self.get_index_reg();
                true
            }
            Op::Jr => self.op_jr_e(bus)?,
            Op::JrCc(cc) => self.op_jr_cc_e(cc, bus)?,
            Op::Djnz => self.op_djnz(bus)?,
            Op::Call => self.op_call_nn(bus)?,
            Op::CallCc(cc) => self.op_call_cc_nn(cc, bus)?,
            Op::Ret => self.op_ret(bus)?,
            Op::RetCc(cc) => self.op_ret_cc(cc, bus)?,
            Op::Rst(n) => self.op_rst(n, bus)?,
            Op::Di => self.op_di(),
            Op::Ei => self.op_ei(),
        };

        let mut cycles = instruction.timing.cycles(taken);
        if self.index_mode != IndexMode::HL {
            cycles += instruction.index_extra as u32 - 4;
        }
        Ok(cycles)
    }

    /// ED prefix dispatch. `opcode` is the byte after ED.
    fn execute_ed<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) -> EmuResult<u32> {
        let instruction = ED[opcode as usize];

        let taken = match instruction.op {
            EdOp::InRC(r) => self.op_in_r_c(r, bus)?,
            EdOp::OutCR(r) => self.op_out_c_r(r, bus)?,
            EdOp::SbcHlRp(rp) => self.op_sbc_hl_rp(rp),
            EdOp::AdcHlRp(rp) => self.op_adc_hl_rp(rp),
            EdOp::LdNnRp(rp) => self.op_ld_nn_rp(rp, bus)?,
            EdOp::LdRpNn(rp) => self.op_ld_rp_ind_nn(rp, bus)?,
            EdOp::Neg => self.op_neg(),
            EdOp::Retn | EdOp::Reti => self.op_retn(bus)?,
            EdOp::Im(mode) => {
                self.im = mode;
                false
            }
            EdOp::LdIA => {
                self.i = self.a;
                false
            }
            EdOp::LdRA => {
                self.r = self.a;
                false
            }
            EdOp::LdAI => self.op_ld_a_ir(self.i),
            EdOp::LdAR => self.op_ld_a_ir(self.r),
            EdOp::Rrd => self.op_rrd(bus)?,
            EdOp::Rld => self.op_rld(bus)?,
            EdOp::Ldi => self.op_ldi_ldd(false, false, bus)?,
            EdOp::Ldd => self.op_ldi_ldd(true, false, bus)?,
            EdOp::Ldir => self.op_ldi_ldd(false, true, bus)?,
            EdOp::Lddr => self.op_ldi_ldd(true, true, bus)?,
            EdOp::Cpi => self.op_cpi_cpd(false, false, bus)?,
            EdOp::Cpd => self.op_cpi_cpd(true, false, bus)?,
            EdOp::Cpir => self.op_cpi_cpd(false, true, bus)?,
            EdOp::Cpdr => self.op_cpi_cpd(true, true, bus)?,
            EdOp::Ini => self.op_ini_ind(false, false, bus)?,
            EdOp::Ind => self.op_ini_ind(true, false, bus)?,
            EdOp::Inir => self.op_ini_ind(false, true, bus)?,
            EdOp::Indr => self.op_ini_ind(true, true, bus)?,
            EdOp::Outi => self.op_outi_outd(false, false, bus)?,
            EdOp::Outd => self.op_outi_outd(true, false, bus)?,
            EdOp::Otir => self.op_outi_outd(false, true, bus)?,
            EdOp::Otdr => self.op_outi_outd(true, true, bus)?,
            EdOp::Invalid => {
                return Err(EmuError::UnrecognizedOpcode {
                    opcode: 0xED00 | opcode as u16,
                    pc: self.instruction_pc,
                });
            }
        };

        Ok(instruction.timing.cycles(taken))
    }

    // --- Interrupts ---

    /// NMI: push PC, jump to 0x0066. IFF2 keeps the old IFF1 for RETN. 11 T.
    fn accept_nmi<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<u32> {
        self.halted = false;
        self.iff1 = false;
        self.inc_r();
        self.push_word(self.pc, bus)?;
        self.pc = 0x0066;
        self.memptr = self.pc;
        Ok(11)
    }

    /// Maskable interrupt in the current mode. `data` is what the
    /// device drives onto the bus during acknowledge.
    fn accept_irq<B: Bus + ?Sized>(&mut self, data: u8, bus: &mut B) -> EmuResult<u32> {
        // NMOS quirk: LD A,I / LD A,R interrupted right after reads IFF2 as 0.
        if self.p {
            self.f &= !(Flag::PV as u8);
        }
        self.halted = false;
        self.iff1 = false;
        self.iff2 = false;
        self.inc_r();

        match self.im {
            2 => {
                self.push_word(self.pc, bus)?;
                let vector = ((self.i as u16) << 8) | data as u16;
                self.pc = self.read_word(bus, vector)?;
                self.memptr = self.pc;
                Ok(19)
            }
            1 => {
                self.push_word(self.pc, bus)?;
                self.pc = 0x0038;
                self.memptr = self.pc;
                Ok(13)
            }
            _ => {
                // Mode 0 executes the byte on the bus, normally RST p.
                self.index_mode = IndexMode::HL;
                Ok(2 + self.execute(data, bus)?)
            }
        }
    }
}

impl Cpu for Z80 {
    fn reset(&mut self) {
        self.a = 0xFF;
        self.f = 0xFF;
        self.sp = 0xFFFF;
        self.pc = 0x0000;
        self.i = 0;
        self.r = 0;
        self.im = 0;
        self.iff1 = false;
        self.iff2 = false;
        self.halted = false;
        self.ei_delay = false;
        self.memptr = 0;
        self.p = false;
        self.q = 0;
        self.prev_q = 0;
        self.irq = None;
        self.nmi_pending = false;
    }

    fn step(&mut self, bus: &mut dyn Bus) -> EmuResult<u32> {
        self.instruction_pc = self.pc;
        self.index_mode = IndexMode::HL;

        // Check for interrupts at instruction boundary
        if self.nmi_pending {
            self.nmi_pending = false;
            self.p = false;
            return self.accept_nmi(bus);
        }
        if self.ei_delay {
            // EI delay: skip interrupt check for one instruction after EI
            self.ei_delay = false;
        } else if self.iff1 {
            if let Some(data) = self.irq.take() {
                let cycles = self.accept_irq(data, bus)?;
                self.p = false;
                return Ok(cycles);
            }
        }

        self.p = false;
        self.prev_q = self.q;
        self.q = 0;

        if self.halted {
            // HALT re-executes NOPs: refresh keeps running.
            self.inc_r();
            return Ok(4);
        }

        let opcode = self.fetch_opcode(bus)?;
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

    /// INT is held until accepted; NMI is edge-triggered and always
    /// accepted at the next boundary.
    fn signal_interrupt(&mut self, interrupt: Interrupt) {
        match interrupt {
            Interrupt::Maskable(data) => self.irq = Some(data),
            Interrupt::Nmi => self.nmi_pending = true,
        }
    }

    fn is_sleeping(&self) -> bool {
        self.halted
    }

    fn interrupts_enabled(&self) -> bool {
        self.iff1
    }

    fn disassemble(&self, code: &[u8], address: u16) -> DisassembledLine {
        disassemble(code, address)
    }

    fn debug_view(&self) -> CpuView {
        let pair = |hi: u8, lo: u8| ((hi as u16) << 8) | lo as u16;
        CpuView {
            pc: self.pc,
            sp: self.sp,
            registers: vec![
                RegisterView::with_alternate("AF", self.get_af(), pair(self.a_prime, self.f_prime)),
                RegisterView::with_alternate("BC", self.get_bc(), pair(self.b_prime, self.c_prime)),
                RegisterView::with_alternate("DE", self.get_de(), pair(self.d_prime, self.e_prime)),
                RegisterView::with_alternate("HL", self.get_hl(), pair(self.h_prime, self.l_prime)),
                RegisterView::new("IX", self.ix),
                RegisterView::new("IY", self.iy),
                RegisterView::new("I", self.i as u16),
                RegisterView::new("R", self.r as u16),
                RegisterView::new("IM", self.im as u16),
                RegisterView::new("WZ", self.memptr),
            ],
            flags: FlagView {
                value: self.f,
                bits: vec![
                    ("s", 7),
                    ("z", 6),
                    ("y", 5),
                    ("h", 4),
                    ("x", 3),
                    ("p", 2),
                    ("n", 1),
                    ("c", 0),
                ],
            },
            interrupts_enabled: self.iff1,
            halted: self.halted,
        }
    }
}

impl CpuStateTrait for Z80 {
    type Snapshot = Z80State;

    fn snapshot(&self) -> Z80State {
        Z80State {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            a_prime: self.a_prime,
            f_prime: self.f_prime,
            b_prime: self.b_prime,
            c_prime: self.c_prime,
            d_prime: self.d_prime,
            e_prime: self.e_prime,
            h_prime: self.h_prime,
            l_prime: self.l_prime,
            ix: self.ix,
            iy: self.iy,
            sp: self.sp,
            pc: self.pc,
            i: self.i,
            r: self.r,
            iff1: self.iff1,
            iff2: self.iff2,
            im: self.im,
            memptr: self.memptr,
            p: self.p,
            q: self.q,
            halted: self.halted,
        }
    }
}

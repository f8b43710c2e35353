use crate::core::bus::Bus;
use crate::core::error::EmuResult;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// Evaluate a condition code (3 bits from opcode bits 5-3).
    /// 0=NZ, 1=Z, 2=NC, 3=C, 4=PO, 5=PE, 6=P, 7=M
    pub(crate) fn eval_condition(&self, cc: u8) -> bool {
        match cc {
            0 => !self.flag(Flag::Z),  // NZ
            1 => self.flag(Flag::Z),   // Z
            2 => !self.flag(Flag::C),  // NC
            3 => self.flag(Flag::C),   // C
            4 => !self.flag(Flag::PV), // PO (parity odd)
            5 => self.flag(Flag::PV),  // PE (parity even)
            6 => !self.flag(Flag::S),  // P (positive)
            _ => self.flag(Flag::S),   // M (minus)
        }
    }

    /// JP nn: 10 T
    pub(crate) fn op_jp_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        self.memptr = addr;
        self.pc = addr;
        Ok(true)
    }

    /// JP cc,nn: 10 T whether taken or not. MEMPTR = nn either way.
    pub(crate) fn op_jp_cc_nn<B: Bus + ?Sized>(&mut self, cc: u8, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        self.memptr = addr;
        let taken = self.eval_condition(cc);
        if taken {
            self.pc = addr;
        }
        Ok(taken)
    }

    fn relative_jump(&mut self, e: i8) {
        self.pc = self.pc.wrapping_add(e as u16);
        self.memptr = self.pc;
    }

    /// JR e: 12 T
    pub(crate) fn op_jr_e<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let e = self.fetch_byte(bus)? as i8;
        self.relative_jump(e);
        Ok(true)
    }

    /// JR cc,e: 12 T taken / 7 T not taken. cc is NZ, Z, NC, C only.
    pub(crate) fn op_jr_cc_e<B: Bus + ?Sized>(&mut self, cc: u8, bus: &mut B) -> EmuResult<bool> {
        let e = self.fetch_byte(bus)? as i8;
        let taken = self.eval_condition(cc);
        if taken {
            self.relative_jump(e);
        }
        Ok(taken)
    }

    /// DJNZ e: 13 T taken / 8 T not taken. B--, jump if B != 0.
    pub(crate) fn op_djnz<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let e = self.fetch_byte(bus)? as i8;
        self.b = self.b.wrapping_sub(1);
        let taken = self.b != 0;
        if taken {
            self.relative_jump(e);
        }
        Ok(taken)
    }

    /// CALL nn: 17 T
    pub(crate) fn op_call_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        self.memptr = addr;
        self.push_word(self.pc, bus)?;
        self.pc = addr;
        Ok(true)
    }

    /// CALL cc,nn: 17 T taken / 10 T not taken.
    pub(crate) fn op_call_cc_nn<B: Bus + ?Sized>(&mut self, cc: u8, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        self.memptr = addr;
        let taken = self.eval_condition(cc);
        if taken {
            self.push_word(self.pc, bus)?;
            self.pc = addr;
        }
        Ok(taken)
    }

    /// RET: 10 T
    pub(crate) fn op_ret<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        self.pc = self.pop_word(bus)?;
        self.memptr = self.pc;
        Ok(true)
    }

    /// RET cc: 11 T taken / 5 T not taken.
    pub(crate) fn op_ret_cc<B: Bus + ?Sized>(&mut self, cc: u8, bus: &mut B) -> EmuResult<bool> {
        if !self.eval_condition(cc) {
            return Ok(false);
        }
        self.op_ret(bus)
    }

    /// RST p: 11 T. Push PC, jump to y * 8.
    pub(crate) fn op_rst<B: Bus + ?Sized>(&mut self, y: u8, bus: &mut B) -> EmuResult<bool> {
        self.push_word(self.pc, bus)?;
        self.pc = (y as u16) * 8;
        self.memptr = self.pc;
        Ok(true)
    }

    /// DI: 4 T
    pub(crate) fn op_di(&mut self) -> bool {
        self.iff1 = false;
        self.iff2 = false;
        false
    }

    /// EI: 4 T. Interrupts are accepted only after the next instruction.
    pub(crate) fn op_ei(&mut self) -> bool {
        self.iff1 = true;
        self.iff2 = true;
        self.ei_delay = true;
        false
    }

    // --- ED Control Flow ---

    /// RETN/RETI: 14 T. Pop PC, copy IFF2 to IFF1.
    pub(crate) fn op_retn<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        self.iff1 = self.iff2;
        self.op_ret(bus)
    }
}

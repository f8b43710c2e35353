use crate::core::bus::Bus;
use crate::core::error::EmuResult;
use crate::cpu::z80::{Flag, Z80};

const XY: u8 = Flag::X as u8 | Flag::Y as u8;
const SZP: u8 = Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8;

impl Z80 {
    // --- Flag Helpers ---

    pub(crate) fn get_parity(val: u8) -> bool {
        val.count_ones() % 2 == 0
    }

    /// S, Z, X, Y and parity of `val`.
    pub(crate) fn szp_flags(val: u8) -> u8 {
        let mut f = val & (Flag::S as u8 | XY);
        if val == 0 {
            f |= Flag::Z as u8;
        }
        if Self::get_parity(val) {
            f |= Flag::PV as u8;
        }
        f
    }

    fn update_flags_logic(&mut self, result: u8, is_and: bool) {
        let mut f = Self::szp_flags(result);
        // AND sets H, others clear it
        if is_and {
            f |= Flag::H as u8;
        }
        // N is 0, C is 0
        self.set_flags(f);
    }

    fn do_add(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val = if carry_in && self.flag(Flag::C) { 1 } else { 0 };
        let result_u16 = (a as u16) + (val as u16) + (c_val as u16);
        let result = result_u16 as u8;

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if ((a & 0xF) + (val & 0xF) + c_val) > 0xF {
            f |= Flag::H as u8;
        }
        if ((a ^ result) & (val ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }

        f |= result & XY;
        self.a = result;
        self.set_flags(f);
    }

    fn do_sub(&mut self, val: u8, carry_in: bool) {
        let c_val = if carry_in && self.flag(Flag::C) { 1 } else { 0 };
        let (result, f) = Self::sub_flags(self.a, val, c_val);
        self.a = result;
        self.set_flags(f | (result & XY));
    }

    /// A - val - carry: result plus every flag except X/Y.
    fn sub_flags(a: u8, val: u8, c_val: u8) -> (u8, u8) {
        let result_u16 = (a as u16).wrapping_sub(val as u16).wrapping_sub(c_val as u16);
        let result = result_u16 as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0xF) < ((val & 0xF) + c_val) {
            f |= Flag::H as u8;
        }
        if ((a ^ val) & (a ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }
        (result, f)
    }

    fn do_cp(&mut self, val: u8) {
        let (_, f) = Self::sub_flags(self.a, val, 0);
        // X/Y come from the operand for CP, not the result
        self.set_flags(f | (val & XY));
    }

    /// 0=ADD 1=ADC 2=SUB 3=SBC 4=AND 5=XOR 6=OR 7=CP
    pub(crate) fn perform_alu_op(&mut self, op: u8, val: u8) {
        match op {
            0 => self.do_add(val, false),
            1 => self.do_add(val, true),
            2 => self.do_sub(val, false),
            3 => self.do_sub(val, true),
            4 => { self.a &= val; self.update_flags_logic(self.a, true); }
            5 => { self.a ^= val; self.update_flags_logic(self.a, false); }
            6 => { self.a |= val; self.update_flags_logic(self.a, false); }
            _ => self.do_cp(val),
        }
    }

    // --- Instructions ---

    /// ALU A, r: 4 T (reg), 7 T ((HL)), 19 T ((IX+d))
    pub(crate) fn op_alu_r<B: Bus + ?Sized>(&mut self, alu_op: u8, r: u8, bus: &mut B) -> EmuResult<bool> {
        let val = if r == 6 {
            let addr = self.operand_addr(bus)?;
            bus.read(addr)?
        } else {
            self.get_reg8_ix(r)
        };
        self.perform_alu_op(alu_op, val);
        Ok(false)
    }

    /// INC/DEC r: 4 T (reg), 11 T ((HL)), 23 T ((IX+d))
    pub(crate) fn op_inc_dec_r<B: Bus + ?Sized>(&mut self, r: u8, is_dec: bool, bus: &mut B) -> EmuResult<bool> {
        if r == 6 {
            let addr = self.operand_addr(bus)?;
            let val = bus.read(addr)?;
            let result = if is_dec { self.calc_dec_flags(val) } else { self.calc_inc_flags(val) };
            bus.write(addr, result)?;
        } else {
            let val = self.get_reg8_ix(r);
            let result = if is_dec { self.calc_dec_flags(val) } else { self.calc_inc_flags(val) };
            self.set_reg8_ix(r, result);
        }
        Ok(false)
    }

    fn calc_inc_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let mut f = self.f & Flag::C as u8; // Preserve C
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (val & 0xF) == 0xF {
            f |= Flag::H as u8;
        }
        // Overflow 7F -> 80
        if val == 0x7F {
            f |= Flag::PV as u8;
        }
        f |= result & XY;
        self.set_flags(f);
        result
    }

    fn calc_dec_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8; // Preserve C, Set N
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        // Borrow from bit 4
        if (val & 0xF) == 0x0 {
            f |= Flag::H as u8;
        }
        // Overflow 80 -> 7F
        if val == 0x80 {
            f |= Flag::PV as u8;
        }
        f |= result & XY;
        self.set_flags(f);
        result
    }

    /// NEG: 8 T. A = 0 - A.
    pub(crate) fn op_neg(&mut self) -> bool {
        let val = self.a;
        self.a = 0;
        self.do_sub(val, false);
        false
    }

    // --- 16-bit ALU ---

    /// ADD HL,rr: 11 T (15 T for IX/IY)
    /// Flags: H = carry from bit 11, C = carry from bit 15, N = 0.
    /// S, Z, PV preserved. X/Y from high byte of result.
    pub(crate) fn op_add_hl_rp(&mut self, rp: u8) -> bool {
        let hl = self.get_rp(2);
        let rr = self.get_rp(rp);
        let result = (hl as u32) + (rr as u32);
        self.memptr = hl.wrapping_add(1);

        let mut f = self.f & SZP;
        if ((hl & 0x0FFF) + (rr & 0x0FFF)) > 0x0FFF {
            f |= Flag::H as u8;
        }
        if result > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & XY;
        self.set_flags(f);
        self.set_rp(2, result as u16);
        false
    }

    /// ADC HL,rr: 15 T. Full flags from the 16-bit result.
    pub(crate) fn op_adc_hl_rp(&mut self, rp: u8) -> bool {
        let hl = self.get_hl();
        let rr = self.get_rp(rp);
        let c = self.flag(Flag::C) as u32;
        let result = hl as u32 + rr as u32 + c;
        let r16 = result as u16;
        self.memptr = hl.wrapping_add(1);

        let mut f = ((r16 >> 8) as u8) & (Flag::S as u8 | XY);
        if r16 == 0 {
            f |= Flag::Z as u8;
        }
        if ((hl & 0x0FFF) as u32 + (rr & 0x0FFF) as u32 + c) > 0x0FFF {
            f |= Flag::H as u8;
        }
        if ((hl ^ r16) & (rr ^ r16) & 0x8000) != 0 {
            f |= Flag::PV as u8;
        }
        if result > 0xFFFF {
            f |= Flag::C as u8;
        }
        self.set_flags(f);
        self.set_hl(r16);
        false
    }

    /// SBC HL,rr: 15 T.
    pub(crate) fn op_sbc_hl_rp(&mut self, rp: u8) -> bool {
        let hl = self.get_hl();
        let rr = self.get_rp(rp);
        let c = self.flag(Flag::C) as u32;
        let result = (hl as u32).wrapping_sub(rr as u32).wrapping_sub(c);
        let r16 = result as u16;
        self.memptr = hl.wrapping_add(1);

        let mut f = Flag::N as u8 | (((r16 >> 8) as u8) & (Flag::S as u8 | XY));
        if r16 == 0 {
            f |= Flag::Z as u8;
        }
        if ((hl & 0x0FFF) as u32) < (rr & 0x0FFF) as u32 + c {
            f |= Flag::H as u8;
        }
        if ((hl ^ rr) & (hl ^ r16) & 0x8000) != 0 {
            f |= Flag::PV as u8;
        }
        if result > 0xFFFF {
            f |= Flag::C as u8;
        }
        self.set_flags(f);
        self.set_hl(r16);
        false
    }

    // --- Accumulator Rotates ---
    // S, Z, PV preserved. H = 0, N = 0. X/Y from A.

    fn finish_acc_rotate(&mut self, carry: bool) -> bool {
        let mut f = self.f & SZP;
        if carry {
            f |= Flag::C as u8;
        }
        f |= self.a & XY;
        self.set_flags(f);
        false
    }

    /// RLCA: old bit 7 to carry and bit 0.
    pub(crate) fn op_rlca(&mut self) -> bool {
        let bit7 = self.a >> 7;
        self.a = (self.a << 1) | bit7;
        self.finish_acc_rotate(bit7 != 0)
    }

    /// RRCA: old bit 0 to carry and bit 7.
    pub(crate) fn op_rrca(&mut self) -> bool {
        let bit0 = self.a & 1;
        self.a = (self.a >> 1) | (bit0 << 7);
        self.finish_acc_rotate(bit0 != 0)
    }

    /// RLA: old bit 7 to C, old C to bit 0.
    pub(crate) fn op_rla(&mut self) -> bool {
        let old_carry = self.flag(Flag::C) as u8;
        let bit7 = self.a >> 7;
        self.a = (self.a << 1) | old_carry;
        self.finish_acc_rotate(bit7 != 0)
    }

    /// RRA: old bit 0 to C, old C to bit 7.
    pub(crate) fn op_rra(&mut self) -> bool {
        let old_carry = if self.flag(Flag::C) { 0x80u8 } else { 0 };
        let bit0 = self.a & 1;
        self.a = (self.a >> 1) | old_carry;
        self.finish_acc_rotate(bit0 != 0)
    }

    // --- Misc ALU ---

    /// DAA: decimal adjust accumulator after BCD add/sub.
    pub(crate) fn op_daa(&mut self) -> bool {
        let a = self.a;
        let n = self.flag(Flag::N);
        let old_h = self.flag(Flag::H);
        let old_c = self.flag(Flag::C);

        let mut correction = 0u8;
        let mut new_c = old_c;

        if old_h || (a & 0x0F) > 9 {
            correction |= 0x06;
        }
        if old_c || a > 0x99 {
            correction |= 0x60;
            new_c = true;
        }

        let result = if n {
            a.wrapping_sub(correction)
        } else {
            a.wrapping_add(correction)
        };

        let new_h = if n {
            old_h && (a & 0x0F) < 6
        } else {
            (a & 0x0F) > 9
        };

        self.a = result;
        let mut f = Self::szp_flags(result);
        if new_c {
            f |= Flag::C as u8;
        }
        if n {
            f |= Flag::N as u8;
        }
        if new_h {
            f |= Flag::H as u8;
        }
        self.set_flags(f);
        false
    }

    /// CPL: complement A. Sets H and N. X/Y from A. S, Z, PV, C preserved.
    pub(crate) fn op_cpl(&mut self) -> bool {
        self.a = !self.a;
        let mut f = self.f & (SZP | Flag::C as u8);
        f |= Flag::H as u8 | Flag::N as u8;
        f |= self.a & XY;
        self.set_flags(f);
        false
    }

    /// X/Y after SCF/CCF: A alone when the previous instruction set flags,
    /// A OR F otherwise.
    fn scf_ccf_xy(&self) -> u8 {
        ((self.prev_q ^ self.f) | self.a) & XY
    }

    /// SCF: C = 1, H = 0, N = 0. S, Z, PV preserved.
    pub(crate) fn op_scf(&mut self) -> bool {
        let mut f = self.f & SZP;
        f |= Flag::C as u8;
        f |= self.scf_ccf_xy();
        self.set_flags(f);
        false
    }

    /// CCF: H = old C, C = !C, N = 0. S, Z, PV preserved.
    pub(crate) fn op_ccf(&mut self) -> bool {
        let old_c = self.flag(Flag::C);
        let mut f = self.f & SZP;
        if old_c { f |= Flag::H as u8; } else {
            f |= Flag::C as u8;
        }
        f |= self.scf_ccf_xy();
        self.set_flags(f);
        false
    }

    /// RLD: 18 T. Rotate the low nibble of A and the byte at (HL) left
    /// as one 12-bit value.
    pub(crate) fn op_rld<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let hl = self.get_hl();
        let m = bus.read(hl)?;
        bus.write(hl, (m << 4) | (self.a & 0x0F))?;
        self.a = (self.a & 0xF0) | (m >> 4);
        self.memptr = hl.wrapping_add(1);
        self.set_flags(Self::szp_flags(self.a) | (self.f & Flag::C as u8));
        Ok(false)
    }

    /// RRD: 18 T. Mirror of RLD.
    pub(crate) fn op_rrd<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let hl = self.get_hl();
        let m = bus.read(hl)?;
        bus.write(hl, (self.a << 4) | (m >> 4))?;
        self.a = (self.a & 0xF0) | (m & 0x0F);
        self.memptr = hl.wrapping_add(1);
        self.set_flags(Self::szp_flags(self.a) | (self.f & Flag::C as u8));
        Ok(false)
    }
}

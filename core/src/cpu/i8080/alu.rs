use crate::core::bus::Bus;
use crate::core::error::EmuResult;
use crate::cpu::i8080::table::{AluOp, Pair, Reg};
use crate::cpu::i8080::I8080;

impl I8080 {
    // --- Flag Helpers ---

    /// A + val + carry-in. AC is the carry out of bit 3.
    fn do_add(&mut self, val: u8, carry_in: bool) -> u8 {
        let a = self.a;
        let sum = a as u16 + val as u16 + carry_in as u16;
        let result = sum as u8;
        self.flags.set_szp(result);
        self.flags.aux_carry = (a ^ val ^ result) & 0x10 != 0;
        self.flags.carry = sum > 0xFF;
        result
    }

    /// A - val - borrow-in, done as A + !val + !borrow like the silicon,
    /// so AC is set when there is no borrow out of bit 3.
    fn do_sub(&mut self, val: u8, borrow_in: bool) -> u8 {
        let a = self.a;
        let result = a.wrapping_sub(val).wrapping_sub(borrow_in as u8);
        self.flags.set_szp(result);
        self.flags.aux_carry = !(a ^ val ^ result) & 0x10 != 0;
        self.flags.carry = (a as u16) < val as u16 + borrow_in as u16;
        result
    }

    fn do_logic(&mut self, result: u8, aux_carry: bool) {
        self.flags.set_szp(result);
        self.flags.aux_carry = aux_carry;
        self.flags.carry = false;
    }

    pub(crate) fn perform_alu_op(&mut self, op: AluOp, val: u8) {
        match op {
            AluOp::Add => self.a = self.do_add(val, false),
            AluOp::Adc => self.a = self.do_add(val, self.flags.carry),
            AluOp::Sub => self.a = self.do_sub(val, false),
            AluOp::Sbb => self.a = self.do_sub(val, self.flags.carry),
            AluOp::Ana => {
                // AND sets AC from bit 3 of the operands, not the result.
                let aux = (self.a | val) & 0x08 != 0;
                self.a &= val;
                self.do_logic(self.a, aux);
            }
            AluOp::Xra => {
                self.a ^= val;
                self.do_logic(self.a, false);
            }
            AluOp::Ora => {
                self.a |= val;
                self.do_logic(self.a, false);
            }
            AluOp::Cmp => {
                self.do_sub(val, false);
            }
        }
    }

    // --- Increment / Decrement ---

    /// INR r / INR M. CY unaffected.
    pub(crate) fn op_inr<B: Bus + ?Sized>(&mut self, reg: Reg, bus: &mut B) -> EmuResult<bool> {
        let val = self.get_reg(reg, bus)?;
        let result = val.wrapping_add(1);
        self.flags.set_szp(result);
        self.flags.aux_carry = result & 0x0F == 0;
        self.set_reg(reg, result, bus)?;
        Ok(false)
    }

    /// DCR r / DCR M. CY unaffected; AC follows the add-complement rule.
    pub(crate) fn op_dcr<B: Bus + ?Sized>(&mut self, reg: Reg, bus: &mut B) -> EmuResult<bool> {
        let val = self.get_reg(reg, bus)?;
        let result = val.wrapping_sub(1);
        self.flags.set_szp(result);
        self.flags.aux_carry = result & 0x0F != 0x0F;
        self.set_reg(reg, result, bus)?;
        Ok(false)
    }

    pub(crate) fn op_inx(&mut self, pair: Pair) -> bool {
        self.set_pair(pair, self.get_pair(pair).wrapping_add(1));
        false
    }

    pub(crate) fn op_dcx(&mut self, pair: Pair) -> bool {
        self.set_pair(pair, self.get_pair(pair).wrapping_sub(1));
        false
    }

    /// DAD rp: HL += rp. Only CY is affected.
    pub(crate) fn op_dad(&mut self, pair: Pair) -> bool {
        let sum = self.get_hl() as u32 + self.get_pair(pair) as u32;
        self.flags.carry = sum > 0xFFFF;
        self.set_hl(sum as u16);
        false
    }

    // --- Accumulator ---

    /// DAA: BCD-correct A after an addition.
    pub(crate) fn op_daa(&mut self) -> bool {
        let lsb = self.a & 0x0F;
        let msb = self.a >> 4;
        let mut correction = 0u8;
        let mut carry = self.flags.carry;

        if self.flags.aux_carry || lsb > 9 {
            correction |= 0x06;
        }
        if self.flags.carry || msb > 9 || (msb >= 9 && lsb > 9) {
            correction |= 0x60;
            carry = true;
        }

        self.a = self.do_add(correction, false);
        self.flags.carry = carry;
        false
    }

    pub(crate) fn op_cma(&mut self) -> bool {
        self.a = !self.a;
        false
    }

    pub(crate) fn op_stc(&mut self) -> bool {
        self.flags.carry = true;
        false
    }

    pub(crate) fn op_cmc(&mut self) -> bool {
        self.flags.carry = !self.flags.carry;
        false
    }

    // --- Rotates (CY only) ---

    /// RLC: bit 7 to CY and bit 0.
    pub(crate) fn op_rlc(&mut self) -> bool {
        self.flags.carry = self.a & 0x80 != 0;
        self.a = self.a.rotate_left(1);
        false
    }

    /// RRC: bit 0 to CY and bit 7.
    pub(crate) fn op_rrc(&mut self) -> bool {
        self.flags.carry = self.a & 0x01 != 0;
        self.a = self.a.rotate_right(1);
        false
    }

    /// RAL: rotate left through CY.
    pub(crate) fn op_ral(&mut self) -> bool {
        let old_carry = self.flags.carry as u8;
        self.flags.carry = self.a & 0x80 != 0;
        self.a = (self.a << 1) | old_carry;
        false
    }

    /// RAR: rotate right through CY.
    pub(crate) fn op_rar(&mut self) -> bool {
        let old_carry = (self.flags.carry as u8) << 7;
        self.flags.carry = self.a & 0x01 != 0;
        self.a = (self.a >> 1) | old_carry;
        false
    }
}

use crate::core::bus::Bus;
use crate::core::error::EmuResult;
use crate::cpu::z80::{Flag, IndexMode, Z80};

impl Z80 {
    /// Perform CB rotate/shift operation on a value.
    /// op: 0=RLC, 1=RRC, 2=RL, 3=RR, 4=SLA, 5=SRA, 6=SLL(undoc), 7=SRL.
    /// Returns (result, new_flags). Flags: S, Z, PV(parity), C from shifted bit. H=0, N=0.
    fn do_cb_rotate_shift(&self, op: u8, val: u8) -> (u8, u8) {
        let (result, carry) = match op {
            // RLC: rotate left circular
            0 => (val.rotate_left(1), val >> 7),
            // RRC: rotate right circular
            1 => (val.rotate_right(1), val & 1),
            // RL: rotate left through carry
            2 => ((val << 1) | self.flag(Flag::C) as u8, val >> 7),
            // RR: rotate right through carry
            3 => ((val >> 1) | ((self.flag(Flag::C) as u8) << 7), val & 1),
            // SLA: shift left arithmetic
            4 => (val << 1, val >> 7),
            // SRA: shift right arithmetic (preserves sign)
            5 => (((val as i8) >> 1) as u8, val & 1),
            // SLL: shift left logical, set bit 0 (undocumented)
            6 => ((val << 1) | 1, val >> 7),
            // SRL: shift right logical
            _ => (val >> 1, val & 1),
        };

        let mut f = Self::szp_flags(result);
        if carry != 0 {
            f |= Flag::C as u8;
        }
        (result, f)
    }

    /// BIT b: Z = ~bit, S = bit 7 if tested, PV = Z, H=1, N=0, C preserved.
    /// X/Y come from `xy_source`, which depends on the addressing form.
    fn do_bit(&mut self, bit: u8, val: u8, xy_source: u8) {
        let tested = val & (1 << bit);
        let mut f = self.f & Flag::C as u8;
        f |= Flag::H as u8;
        if tested == 0 {
            f |= Flag::Z as u8 | Flag::PV as u8;
        }
        if bit == 7 && tested != 0 {
            f |= Flag::S as u8;
        }
        f |= xy_source & (Flag::X as u8 | Flag::Y as u8);
        self.set_flags(f);
    }

    /// Rotate/shift (xx=0), RES (xx=2) or SET (xx=3) applied to `val`.
    fn do_cb_modify(&mut self, xx: u8, yyy: u8, val: u8) -> u8 {
        match xx {
            0 => {
                let (result, f) = self.do_cb_rotate_shift(yyy, val);
                self.set_flags(f);
                result
            }
            2 => val & !(1 << yyy),
            _ => val | (1 << yyy),
        }
    }

    /// CB prefix, plain or DD CB d op / FD CB d op. Returns cycles
    /// excluding any DD/FD prefix byte.
    pub(crate) fn execute_cb_prefix<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<u32> {
        if self.index_mode != IndexMode::HL {
            return self.execute_index_cb(bus);
        }

        let op = self.fetch_opcode(bus)?;
        let xx = op >> 6; // 0=rot/shift, 1=BIT, 2=RES, 3=SET
        let yyy = (op >> 3) & 0x07; // bit number or shift operation
        let zzz = op & 0x07; // register index

        if zzz == 6 {
            let addr = self.get_hl();
            let val = bus.read(addr)?;
            if xx == 1 {
                // BIT b,(HL): 12 T, X/Y from high byte of MEMPTR
                self.do_bit(yyy, val, (self.memptr >> 8) as u8);
                return Ok(12);
            }
            // Rotate/shift/SET/RES (HL): 15 T
            let result = self.do_cb_modify(xx, yyy, val);
            bus.write(addr, result)?;
            return Ok(15);
        }

        // Register operations: 8 T
        let val = self.get_reg8(zzz);
        if xx == 1 {
            self.do_bit(yyy, val, val);
        } else {
            let result = self.do_cb_modify(xx, yyy, val);
            self.set_reg8(zzz, result);
        }
        Ok(8)
    }

    /// DD CB d op / FD CB d op. Neither d nor op is an M1 fetch, so R
    /// does not advance for them.
    /// BIT b,(IX+d): 20 T. Other (IX+d): 23 T.
    /// For non-BIT ops with zzz != 6, result is also copied to register zzz (undocumented).
    fn execute_index_cb<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<u32> {
        let d = self.fetch_byte(bus)? as i8;
        let op = self.fetch_byte(bus)?;
        let xx = op >> 6;
        let yyy = (op >> 3) & 0x07;
        let zzz = op & 0x07;

        let addr = self.get_index_reg().wrapping_add(d as u16);
        self.memptr = addr;
        let val = bus.read(addr)?;

        if xx == 1 {
            // X/Y from high byte of address for indexed BIT
            self.do_bit(yyy, val, (addr >> 8) as u8);
            return Ok(16);
        }

        let result = self.do_cb_modify(xx, yyy, val);
        if zzz != 6 {
            self.set_reg8(zzz, result);
        }
        bus.write(addr, result)?;
        Ok(19)
    }
}

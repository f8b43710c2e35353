use crate::core::bus::Bus;
use crate::core::error::EmuResult;
use crate::cpu::z80::{Flag, Z80};

const XY: u8 = Flag::X as u8 | Flag::Y as u8;

impl Z80 {
    /// Rewind PC onto the ED prefix so the instruction runs again.
    /// X/Y then come from the high byte of PC.
    fn repeat_block(&mut self) {
        self.pc = self.pc.wrapping_sub(2);
        self.memptr = self.pc.wrapping_add(1);
        let f = (self.f & !XY) | ((self.pc >> 8) as u8 & XY);
        self.set_flags(f);
    }

    // --- Block Transfer ---

    /// LDI/LDD: 16 T. LDIR/LDDR: 21 T repeating, 16 T when done.
    /// (DE) <- (HL), HL and DE step by one, BC--.
    pub(crate) fn op_ldi_ldd<B: Bus + ?Sized>(&mut self, dec: bool, repeat: bool, bus: &mut B) -> EmuResult<bool> {
        let val = bus.read(self.get_hl())?;
        bus.write(self.get_de(), val)?;

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_de(self.get_de().wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));

        let n = val.wrapping_add(self.a);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::C as u8);
        if self.get_bc() != 0 {
            f |= Flag::PV as u8;
        }
        // Undocumented: X = bit 3 of (val+A), Y = bit 1 of (val+A)
        if (n & 0x08) != 0 {
            f |= Flag::X as u8;
        }
        if (n & 0x02) != 0 {
            f |= Flag::Y as u8;
        }
        self.set_flags(f);

        if repeat && self.get_bc() != 0 {
            self.repeat_block();
            return Ok(true);
        }
        Ok(false)
    }

    // --- Block Compare ---

    /// CPI/CPD: 16 T. CPIR/CPDR: 21 T repeating, 16 T when done.
    /// Compare A-(HL), HL steps, BC--. Repeats while BC != 0 and no match.
    pub(crate) fn op_cpi_cpd<B: Bus + ?Sized>(&mut self, dec: bool, repeat: bool, bus: &mut B) -> EmuResult<bool> {
        let val = bus.read(self.get_hl())?;
        let result = self.a.wrapping_sub(val);
        let h = (self.a & 0xF) < (val & 0xF);

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));
        self.memptr = self.memptr.wrapping_add(delta);

        let mut f = self.f & Flag::C as u8; // preserve C
        f |= Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if h {
            f |= Flag::H as u8;
        }
        if self.get_bc() != 0 {
            f |= Flag::PV as u8;
        }
        // Undocumented X/Y: n = result - H_flag
        let n = result.wrapping_sub(h as u8);
        if (n & 0x08) != 0 {
            f |= Flag::X as u8;
        }
        if (n & 0x02) != 0 {
            f |= Flag::Y as u8;
        }
        self.set_flags(f);

        if repeat && self.get_bc() != 0 && result != 0 {
            self.repeat_block();
            return Ok(true);
        }
        Ok(false)
    }

    // --- Block I/O ---

    /// Flags shared by INI/IND/OUTI/OUTD once B has been decremented.
    /// `k` is the transferred byte plus the low byte the hardware adds to it.
    fn block_io_flags(&mut self, val: u8, k: u16) {
        let mut f = self.b & (Flag::S as u8 | XY);
        if self.b == 0 {
            f |= Flag::Z as u8;
        }
        if val & 0x80 != 0 {
            f |= Flag::N as u8;
        }
        if k > 0xFF {
            f |= Flag::H as u8 | Flag::C as u8;
        }
        if Self::get_parity(((k as u8) & 0x07) ^ self.b) {
            f |= Flag::PV as u8;
        }
        self.set_flags(f);
    }

    /// INIR/INDR/OTIR/OTDR interrupted mid-block: H and PV are patched
    /// with the B the next iteration would see.
    fn repeat_block_io(&mut self, val: u8) {
        self.repeat_block();
        let odd = |x: u8| !Self::get_parity(x & 0x07);
        let mut f = self.f;
        if f & Flag::C as u8 != 0 {
            f &= !(Flag::H as u8);
            if val & 0x80 != 0 {
                if odd(self.b.wrapping_sub(1)) {
                    f ^= Flag::PV as u8;
                }
                if self.b & 0x0F == 0x00 {
                    f |= Flag::H as u8;
                }
            } else {
                if odd(self.b.wrapping_add(1)) {
                    f ^= Flag::PV as u8;
                }
                if self.b & 0x0F == 0x0F {
                    f |= Flag::H as u8;
                }
            }
        } else if odd(self.b) {
            f ^= Flag::PV as u8;
        }
        self.set_flags(f);
    }

    /// INI/IND: 16 T. INIR/INDR: 21 T repeating, 16 T when done.
    /// IN (C) -> (HL), HL steps, B--.
    pub(crate) fn op_ini_ind<B: Bus + ?Sized>(&mut self, dec: bool, repeat: bool, bus: &mut B) -> EmuResult<bool> {
        let bc = self.get_bc();
        let val = bus.io_read(bc);
        self.memptr = if dec { bc.wrapping_sub(1) } else { bc.wrapping_add(1) };
        self.b = self.b.wrapping_sub(1);
        bus.write(self.get_hl(), val)?;
        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));

        let c = if dec { self.c.wrapping_sub(1) } else { self.c.wrapping_add(1) };
        self.block_io_flags(val, val as u16 + c as u16);

        if repeat && self.b != 0 {
            self.repeat_block_io(val);
            return Ok(true);
        }
        Ok(false)
    }

    /// OUTI/OUTD: 16 T. OTIR/OTDR: 21 T repeating, 16 T when done.
    /// B--, (HL) -> OUT (C), HL steps.
    pub(crate) fn op_outi_outd<B: Bus + ?Sized>(&mut self, dec: bool, repeat: bool, bus: &mut B) -> EmuResult<bool> {
        let val = bus.read(self.get_hl())?;
        self.b = self.b.wrapping_sub(1);
        let bc = self.get_bc();
        bus.io_write(bc, val);
        self.memptr = if dec { bc.wrapping_sub(1) } else { bc.wrapping_add(1) };
        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));

        self.block_io_flags(val, val as u16 + self.l as u16);

        if repeat && self.b != 0 {
            self.repeat_block_io(val);
            return Ok(true);
        }
        Ok(false)
    }
}

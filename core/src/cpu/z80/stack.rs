use crate::core::bus::Bus;
use crate::core::error::EmuResult;
use crate::cpu::z80::Z80;

impl Z80 {
    /// High byte goes to SP-1, low byte to SP-2.
    pub(crate) fn push_word<B: Bus + ?Sized>(&mut self, val: u16, bus: &mut B) -> EmuResult<()> {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (val >> 8) as u8)?;
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, val as u8)
    }

    pub(crate) fn pop_word<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<u16> {
        let lo = bus.read(self.sp)?;
        self.sp = self.sp.wrapping_add(1);
        let hi = bus.read(self.sp)?;
        self.sp = self.sp.wrapping_add(1);
        Ok(((hi as u16) << 8) | lo as u16)
    }

    /// PUSH rr: 11 T (rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF)
    pub(crate) fn op_push<B: Bus + ?Sized>(&mut self, rp: u8, bus: &mut B) -> EmuResult<bool> {
        let val = self.get_rp_af(rp);
        self.push_word(val, bus)?;
        Ok(false)
    }

    /// POP rr: 10 T (rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF)
    pub(crate) fn op_pop<B: Bus + ?Sized>(&mut self, rp: u8, bus: &mut B) -> EmuResult<bool> {
        let val = self.pop_word(bus)?;
        self.set_rp_af(rp, val);
        Ok(false)
    }
}

use crate::core::bus::Bus;
use crate::core::error::EmuResult;
use crate::cpu::i8080::table::Pair;
use crate::cpu::i8080::I8080;

impl I8080 {
    /// Push high byte first so the word sits little-endian at SP.
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

    /// PUSH B/D/H/PSW
    pub(crate) fn op_push<B: Bus + ?Sized>(&mut self, pair: Pair, bus: &mut B) -> EmuResult<bool> {
        self.push_word(self.get_pair(pair), bus)?;
        Ok(false)
    }

    /// POP B/D/H/PSW. POP PSW drops the fixed status bits.
    pub(crate) fn op_pop<B: Bus + ?Sized>(&mut self, pair: Pair, bus: &mut B) -> EmuResult<bool> {
        let val = self.pop_word(bus)?;
        self.set_pair(pair, val);
        Ok(false)
    }

    /// XTHL: swap HL with the word on top of the stack.
    pub(crate) fn op_xthl<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let lo = bus.read(self.sp)?;
        let hi = bus.read(self.sp.wrapping_add(1))?;
        bus.write(self.sp, self.l)?;
        bus.write(self.sp.wrapping_add(1), self.h)?;
        self.l = lo;
        self.h = hi;
        Ok(false)
    }

    pub(crate) fn op_sphl(&mut self) -> bool {
        self.sp = self.get_hl();
        false
    }
}

use crate::core::bus::Bus;
use crate::core::error::EmuResult;
use crate::cpu::i8080::table::{Pair, Reg};
use crate::cpu::i8080::I8080;

impl I8080 {
    /// MOV dst,src. MOV M,M is HLT and never gets here.
    pub(crate) fn op_mov<B: Bus + ?Sized>(&mut self, dst: Reg, src: Reg, bus: &mut B) -> EmuResult<bool> {
        let val = self.get_reg(src, bus)?;
        self.set_reg(dst, val, bus)?;
        Ok(false)
    }

    pub(crate) fn op_mvi<B: Bus + ?Sized>(&mut self, dst: Reg, bus: &mut B) -> EmuResult<bool> {
        let val = self.fetch_byte(bus)?;
        self.set_reg(dst, val, bus)?;
        Ok(false)
    }

    pub(crate) fn op_lxi<B: Bus + ?Sized>(&mut self, pair: Pair, bus: &mut B) -> EmuResult<bool> {
        let val = self.fetch_word(bus)?;
        self.set_pair(pair, val);
        Ok(false)
    }

    /// STAX B / STAX D
    pub(crate) fn op_stax<B: Bus + ?Sized>(&mut self, pair: Pair, bus: &mut B) -> EmuResult<bool> {
        bus.write(self.get_pair(pair), self.a)?;
        Ok(false)
    }

    /// LDAX B / LDAX D
    pub(crate) fn op_ldax<B: Bus + ?Sized>(&mut self, pair: Pair, bus: &mut B) -> EmuResult<bool> {
        self.a = bus.read(self.get_pair(pair))?;
        Ok(false)
    }

    pub(crate) fn op_sta<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        bus.write(addr, self.a)?;
        Ok(false)
    }

    pub(crate) fn op_lda<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        self.a = bus.read(addr)?;
        Ok(false)
    }

    /// SHLD a16: (a16) <- L, (a16+1) <- H
    pub(crate) fn op_shld<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        bus.write(addr, self.l)?;
        bus.write(addr.wrapping_add(1), self.h)?;
        Ok(false)
    }

    /// LHLD a16: L <- (a16), H <- (a16+1)
    pub(crate) fn op_lhld<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        self.l = bus.read(addr)?;
        self.h = bus.read(addr.wrapping_add(1))?;
        Ok(false)
    }

    pub(crate) fn op_xchg(&mut self) -> bool {
        std::mem::swap(&mut self.d, &mut self.h);
        std::mem::swap(&mut self.e, &mut self.l);
        false
    }

    // --- I/O ---

    /// IN port. The port number is repeated on both address bytes.
    pub(crate) fn op_in<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let port = self.fetch_byte(bus)?;
        self.a = bus.io_read(((port as u16) << 8) | port as u16);
        Ok(false)
    }

    pub(crate) fn op_out<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let port = self.fetch_byte(bus)?;
        bus.io_write(((port as u16) << 8) | port as u16, self.a);
        Ok(false)
    }
}

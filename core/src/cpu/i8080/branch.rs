use crate::core::bus::Bus;
use crate::core::error::EmuResult;
use crate::cpu::i8080::table::Condition;
use crate::cpu::i8080::I8080;

impl I8080 {
    pub(crate) fn op_jmp<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        self.pc = self.fetch_word(bus)?;
        Ok(true)
    }

    /// Jcc a16: the address is always fetched; timing does not depend
    /// on the outcome.
    pub(crate) fn op_jcc<B: Bus + ?Sized>(&mut self, cond: Condition, bus: &mut B) -> EmuResult<bool> {
        let target = self.fetch_word(bus)?;
        let taken = self.condition(cond);
        if taken {
            self.pc = target;
        }
        Ok(taken)
    }

    pub(crate) fn op_call<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let target = self.fetch_word(bus)?;
        self.push_word(self.pc, bus)?;
        self.pc = target;
        Ok(true)
    }

    /// Ccc a16: 17 T taken, 11 T not taken.
    pub(crate) fn op_ccc<B: Bus + ?Sized>(&mut self, cond: Condition, bus: &mut B) -> EmuResult<bool> {
        let target = self.fetch_word(bus)?;
        let taken = self.condition(cond);
        if taken {
            self.push_word(self.pc, bus)?;
            self.pc = target;
        }
        Ok(taken)
    }

    pub(crate) fn op_ret<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        self.pc = self.pop_word(bus)?;
        Ok(true)
    }

    /// Rcc: 11 T taken, 5 T not taken.
    pub(crate) fn op_rcc<B: Bus + ?Sized>(&mut self, cond: Condition, bus: &mut B) -> EmuResult<bool> {
        let taken = self.condition(cond);
        if taken {
            self.pc = self.pop_word(bus)?;
        }
        Ok(taken)
    }

    /// RST n: call 8*n.
    pub(crate) fn op_rst<B: Bus + ?Sized>(&mut self, n: u8, bus: &mut B) -> EmuResult<bool> {
        self.push_word(self.pc, bus)?;
        self.pc = (n as u16) << 3;
        Ok(true)
    }

    pub(crate) fn op_pchl(&mut self) -> bool {
        self.pc = self.get_hl();
        true
    }

    pub(crate) fn op_di(&mut self) -> bool {
        self.inte = false;
        self.ei_delay = false;
        false
    }

    /// EI: INTE is set now, but interrupts are sampled only after the
    /// next instruction.
    pub(crate) fn op_ei(&mut self) -> bool {
        self.inte = true;
        self.ei_delay = true;
        false
    }
}

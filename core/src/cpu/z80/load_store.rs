use crate::core::bus::Bus;
use crate::core::error::EmuResult;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// LD r, n: 7 T
    /// LD (HL), n: 10 T
    /// LD (IX+d), n: 19 T, displacement precedes the immediate
    pub(crate) fn op_ld_r_n<B: Bus + ?Sized>(&mut self, r: u8, bus: &mut B) -> EmuResult<bool> {
        if r == 6 {
            let addr = self.operand_addr(bus)?;
            let n = self.fetch_byte(bus)?;
            bus.write(addr, n)?;
        } else {
            let n = self.fetch_byte(bus)?;
            self.set_reg8_ix(r, n);
        }
        Ok(false)
    }

    /// LD r, r': 4 T (8 T with IXH/IXL/IYH/IYL)
    /// LD r, (HL) / LD (HL), r: 7 T
    /// LD r, (IX+d) / LD (IX+d), r: 19 T. The other operand is then
    /// always a plain register: LD H,(IX+d) loads H, not IXH.
    pub(crate) fn op_ld_r_r<B: Bus + ?Sized>(&mut self, dst: u8, src: u8, bus: &mut B) -> EmuResult<bool> {
        if src == 6 {
            let addr = self.operand_addr(bus)?;
            let val = bus.read(addr)?;
            self.set_reg8(dst, val);
        } else if dst == 6 {
            let addr = self.operand_addr(bus)?;
            bus.write(addr, self.get_reg8(src))?;
        } else {
            let val = self.get_reg8_ix(src);
            self.set_reg8_ix(dst, val);
        }
        Ok(false)
    }

    /// LD rr, nn: 10 T (14 T for IX/IY)
    pub(crate) fn op_ld_rp_nn<B: Bus + ?Sized>(&mut self, rp: u8, bus: &mut B) -> EmuResult<bool> {
        let nn = self.fetch_word(bus)?;
        self.set_rp(rp, nn);
        Ok(false)
    }

    /// LD A, (BC) / LD A, (DE): 7 T. MEMPTR = addr + 1.
    pub(crate) fn op_ld_a_ind<B: Bus + ?Sized>(&mut self, addr: u16, bus: &mut B) -> EmuResult<bool> {
        self.a = bus.read(addr)?;
        self.memptr = addr.wrapping_add(1);
        Ok(false)
    }

    /// LD (BC), A / LD (DE), A: 7 T. MEMPTR = A:(addr + 1).
    pub(crate) fn op_ld_ind_a<B: Bus + ?Sized>(&mut self, addr: u16, bus: &mut B) -> EmuResult<bool> {
        bus.write(addr, self.a)?;
        self.memptr = ((self.a as u16) << 8) | (addr.wrapping_add(1) & 0xFF);
        Ok(false)
    }

    /// LD A, (nn): 13 T
    pub(crate) fn op_ld_a_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        self.op_ld_a_ind(addr, bus)
    }

    /// LD (nn), A: 13 T
    pub(crate) fn op_ld_nn_a<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        self.op_ld_ind_a(addr, bus)
    }

    /// LD (nn), HL: 16 T (20 T for IX/IY)
    pub(crate) fn op_ld_nn_hl<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        let val = self.get_index_reg();
        self.write_word(bus, addr, val)?;
        self.memptr = addr.wrapping_add(1);
        Ok(false)
    }

    /// LD HL, (nn): 16 T (20 T for IX/IY)
    pub(crate) fn op_ld_hl_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        let val = self.read_word(bus, addr)?;
        self.set_index_reg(val);
        self.memptr = addr.wrapping_add(1);
        Ok(false)
    }

    /// EX AF, AF': 4 T
    pub(crate) fn op_ex_af_af(&mut self) -> bool {
        std::mem::swap(&mut self.a, &mut self.a_prime);
        std::mem::swap(&mut self.f, &mut self.f_prime);
        false
    }

    /// EXX: 4 T
    pub(crate) fn op_exx(&mut self) -> bool {
        std::mem::swap(&mut self.b, &mut self.b_prime);
        std::mem::swap(&mut self.c, &mut self.c_prime);
        std::mem::swap(&mut self.d, &mut self.d_prime);
        std::mem::swap(&mut self.e, &mut self.e_prime);
        std::mem::swap(&mut self.h, &mut self.h_prime);
        std::mem::swap(&mut self.l, &mut self.l_prime);
        false
    }

    /// EX DE, HL: 4 T (NOT affected by DD/FD prefix)
    pub(crate) fn op_ex_de_hl(&mut self) -> bool {
        std::mem::swap(&mut self.d, &mut self.h);
        std::mem::swap(&mut self.e, &mut self.l);
        false
    }

    /// EX (SP), HL: 19 T (23 T for IX/IY). MEMPTR = new HL.
    pub(crate) fn op_ex_sp_hl<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let from_stack = self.read_word(bus, self.sp)?;
        let hl = self.get_index_reg();
        self.write_word(bus, self.sp, hl)?;
        self.set_index_reg(from_stack);
        self.memptr = from_stack;
        Ok(false)
    }

    /// OUT (n), A: 11 T. Port address is A:n.
    pub(crate) fn op_out_n_a<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let n = self.fetch_byte(bus)?;
        bus.io_write(((self.a as u16) << 8) | n as u16, self.a);
        self.memptr = ((self.a as u16) << 8) | (n.wrapping_add(1) as u16);
        Ok(false)
    }

    /// IN A, (n): 11 T. Port address is A:n, no flags affected.
    pub(crate) fn op_in_a_n<B: Bus + ?Sized>(&mut self, bus: &mut B) -> EmuResult<bool> {
        let n = self.fetch_byte(bus)?;
        let port = ((self.a as u16) << 8) | n as u16;
        self.a = bus.io_read(port);
        self.memptr = port.wrapping_add(1);
        Ok(false)
    }

    // --- ED Load/Store Operations ---

    /// LD A,I / LD A,R: 9 T.
    /// Flags: S, Z from the value, H=0, N=0, PV=IFF2, C preserved, X/Y from the value.
    pub(crate) fn op_ld_a_ir(&mut self, val: u8) -> bool {
        self.a = val;
        let mut f = self.f & Flag::C as u8;
        if val == 0 {
            f |= Flag::Z as u8;
        }
        f |= val & (Flag::S as u8 | Flag::X as u8 | Flag::Y as u8);
        if self.iff2 {
            f |= Flag::PV as u8;
        }
        self.set_flags(f);
        self.p = true;
        false
    }

    /// LD (nn),rr: 20 T. MEMPTR = nn + 1.
    pub(crate) fn op_ld_nn_rp<B: Bus + ?Sized>(&mut self, rp: u8, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        let val = self.get_rp(rp);
        self.write_word(bus, addr, val)?;
        self.memptr = addr.wrapping_add(1);
        Ok(false)
    }

    /// LD rr,(nn): 20 T. MEMPTR = nn + 1.
    pub(crate) fn op_ld_rp_ind_nn<B: Bus + ?Sized>(&mut self, rp: u8, bus: &mut B) -> EmuResult<bool> {
        let addr = self.fetch_word(bus)?;
        let val = self.read_word(bus, addr)?;
        self.set_rp(rp, val);
        self.memptr = addr.wrapping_add(1);
        Ok(false)
    }

    /// IN r,(C): 12 T.
    /// Flags: S, Z, PV(parity) from input, H=0, N=0, C preserved. X/Y from input.
    /// For r=6 (IN F,(C)): flags affected but value not stored.
    pub(crate) fn op_in_r_c<B: Bus + ?Sized>(&mut self, r: u8, bus: &mut B) -> EmuResult<bool> {
        let bc = self.get_bc();
        let val = bus.io_read(bc);
        if r != 6 {
            self.set_reg8(r, val);
        }
        self.set_flags(Self::szp_flags(val) | (self.f & Flag::C as u8));
        self.memptr = bc.wrapping_add(1);
        Ok(false)
    }

    /// OUT (C),r: 12 T. No flag changes.
    /// For r=6: outputs 0 (undocumented).
    pub(crate) fn op_out_c_r<B: Bus + ?Sized>(&mut self, r: u8, bus: &mut B) -> EmuResult<bool> {
        let bc = self.get_bc();
        let val = if r == 6 { 0 } else { self.get_reg8(r) };
        bus.io_write(bc, val);
        self.memptr = bc.wrapping_add(1);
        Ok(false)
    }
}

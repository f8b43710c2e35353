/// Condition bits of the 8080 status byte.
///
/// Layout when pushed with PSW: `S Z 0 AC 0 P 1 CY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub sign: bool,
    pub zero: bool,
    pub aux_carry: bool,
    pub parity: bool,
    pub carry: bool,
}

pub const SIGN: u8 = 0x80;
pub const ZERO: u8 = 0x40;
pub const AUX_CARRY: u8 = 0x10;
pub const PARITY: u8 = 0x04;
pub const ALWAYS_ONE: u8 = 0x02;
pub const CARRY: u8 = 0x01;

impl Flags {
    pub fn to_byte(self) -> u8 {
        let mut f = ALWAYS_ONE;
        if self.sign {
            f |= SIGN;
        }
        if self.zero {
            f |= ZERO;
        }
        if self.aux_carry {
            f |= AUX_CARRY;
        }
        if self.parity {
            f |= PARITY;
        }
        if self.carry {
            f |= CARRY;
        }
        f
    }

    /// Bits 1, 3 and 5 are fixed in hardware and ignored here.
    pub fn from_byte(f: u8) -> Self {
        Self {
            sign: f & SIGN != 0,
            zero: f & ZERO != 0,
            aux_carry: f & AUX_CARRY != 0,
            parity: f & PARITY != 0,
            carry: f & CARRY != 0,
        }
    }

    /// Set S, Z and P from a result byte.
    #[inline]
    pub fn set_szp(&mut self, result: u8) {
        self.sign = result & 0x80 != 0;
        self.zero = result == 0;
        self.parity = result.count_ones() % 2 == 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_bits_are_forced() {
        assert_eq!(Flags::default().to_byte(), 0x02);
        assert_eq!(Flags::from_byte(0xFF).to_byte(), 0xD7);
        assert_eq!(Flags::from_byte(0x00).to_byte(), 0x02);
    }

    #[test]
    fn parity_is_even_parity() {
        let mut flags = Flags::default();
        flags.set_szp(0x03);
        assert!(flags.parity);
        flags.set_szp(0x01);
        assert!(!flags.parity);
        flags.set_szp(0x00);
        assert!(flags.parity && flags.zero && !flags.sign);
    }
}

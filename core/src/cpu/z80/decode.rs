//! Opcode descriptors for the unprefixed and ED-prefixed tables.
//!
//! Register fields keep the hardware encoding: `r` is 0..7 for
//! B, C, D, E, H, L, (HL), A; `rp` is 0..3 for BC, DE, HL, SP (AF for
//! PUSH/POP); `cc` is 0..7 for NZ, Z, NC, C, PO, PE, P, M.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Nop,
    ExAfAf,
    Djnz,
    Jr,
    JrCc(u8),
    LdRpNn(u8),
    AddHlRp(u8),
    LdBcA,
    LdDeA,
    LdABc,
    LdADe,
    LdNnHl,
    LdHlNn,
    LdNnA,
    LdANn,
    IncRp(u8),
    DecRp(u8),
    IncR(u8),
    DecR(u8),
    LdRN(u8),
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Halt,
    LdRR(u8, u8),
    Alu(u8, u8),
    AluN(u8),
    RetCc(u8),
    Pop(u8),
    Ret,
    Exx,
    JpHl,
    LdSpHl,
    JpCc(u8),
    Jp,
    OutNA,
    InAN,
    ExSpHl,
    ExDeHl,
    Di,
    Ei,
    CallCc(u8),
    Push(u8),
    Call,
    Rst(u8),
    PrefixCb,
    PrefixDd,
    PrefixEd,
    PrefixFd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdOp {
    InRC(u8),
    OutCR(u8),
    SbcHlRp(u8),
    AdcHlRp(u8),
    LdNnRp(u8),
    LdRpNn(u8),
    Neg,
    Retn,
    Reti,
    Im(u8),
    LdIA,
    LdRA,
    LdAI,
    LdAR,
    Rrd,
    Rld,
    Ldi,
    Ldd,
    Ldir,
    Lddr,
    Cpi,
    Cpd,
    Cpir,
    Cpdr,
    Ini,
    Ind,
    Inir,
    Indr,
    Outi,
    Outd,
    Otir,
    Otdr,
    /// Not part of the instruction set.
    Invalid,
}

/// Cycle cost rule. For repeating block instructions "taken" means
/// another iteration follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timing {
    Fixed(u8),
    Branch { not_taken: u8, taken: u8 },
}

impl Timing {
    pub fn cycles(self, taken: bool) -> u32 {
        match self {
            Timing::Fixed(n) => n as u32,
            Timing::Branch { not_taken, taken: t } => {
                if taken {
                    t as u32
                } else {
                    not_taken as u32
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub timing: Timing,
    /// Extra cycles under a DD/FD prefix: 4 for the prefix fetch, more
    /// when (HL) becomes (IX+d).
    pub index_extra: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdInstruction {
    pub op: EdOp,
    /// Total cycles, ED prefix included.
    pub timing: Timing,
}

const fn fixed(op: Op, cycles: u8) -> Instruction {
    Instruction {
        op,
        timing: Timing::Fixed(cycles),
        index_extra: 4,
    }
}

const fn branch(op: Op, not_taken: u8, taken: u8) -> Instruction {
    Instruction {
        op,
        timing: Timing::Branch { not_taken, taken },
        index_extra: 4,
    }
}

/// An op whose (HL) operand becomes (IX+d): displacement fetch plus
/// address arithmetic.
const fn indexed(op: Op, cycles: u8, index_extra: u8) -> Instruction {
    Instruction {
        op,
        timing: Timing::Fixed(cycles),
        index_extra,
    }
}

pub const fn decode(opcode: u8) -> Instruction {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let p = y >> 1;

    match opcode {
        0x00 => fixed(Op::Nop, 4),
        0x08 => fixed(Op::ExAfAf, 4),
        0x10 => branch(Op::Djnz, 8, 13),
        0x18 => fixed(Op::Jr, 12),
        0x20 | 0x28 | 0x30 | 0x38 => branch(Op::JrCc(y - 4), 7, 12),

        0x02 => fixed(Op::LdBcA, 7),
        0x12 => fixed(Op::LdDeA, 7),
        0x0A => fixed(Op::LdABc, 7),
        0x1A => fixed(Op::LdADe, 7),
        0x22 => fixed(Op::LdNnHl, 16),
        0x2A => fixed(Op::LdHlNn, 16),
        0x32 => fixed(Op::LdNnA, 13),
        0x3A => fixed(Op::LdANn, 13),

        0x07 => fixed(Op::Rlca, 4),
        0x0F => fixed(Op::Rrca, 4),
        0x17 => fixed(Op::Rla, 4),
        0x1F => fixed(Op::Rra, 4),
        0x27 => fixed(Op::Daa, 4),
        0x2F => fixed(Op::Cpl, 4),
        0x37 => fixed(Op::Scf, 4),
        0x3F => fixed(Op::Ccf, 4),

        0x76 => fixed(Op::Halt, 4),

        0xC3 => fixed(Op::Jp, 10),
        0xC9 => fixed(Op::Ret, 10),
        0xCB => fixed(Op::PrefixCb, 0),
        0xCD => fixed(Op::Call, 17),
        0xD3 => fixed(Op::OutNA, 11),
        0xD9 => fixed(Op::Exx, 4),
        0xDB => fixed(Op::InAN, 11),
        0xDD => fixed(Op::PrefixDd, 4),
        0xE3 => fixed(Op::ExSpHl, 19),
        0xE9 => fixed(Op::JpHl, 4),
        0xEB => fixed(Op::ExDeHl, 4),
        0xED => fixed(Op::PrefixEd, 0),
        0xF3 => fixed(Op::Di, 4),
        0xF9 => fixed(Op::LdSpHl, 6),
        0xFB => fixed(Op::Ei, 4),
        0xFD => fixed(Op::PrefixFd, 4),

        _ => match (x, z) {
            (0, 1) if y & 1 == 0 => fixed(Op::LdRpNn(p), 10),
            (0, 1) => fixed(Op::AddHlRp(p), 11),
            (0, 3) if y & 1 == 0 => fixed(Op::IncRp(p), 6),
            (0, 3) => fixed(Op::DecRp(p), 6),
            (0, 4) if y == 6 => indexed(Op::IncR(y), 11, 12),
            (0, 4) => fixed(Op::IncR(y), 4),
            (0, 5) if y == 6 => indexed(Op::DecR(y), 11, 12),
            (0, 5) => fixed(Op::DecR(y), 4),
            (0, 6) if y == 6 => indexed(Op::LdRN(y), 10, 9),
            (0, _) => fixed(Op::LdRN(y), 7),

            (1, _) if y == 6 || z == 6 => indexed(Op::LdRR(y, z), 7, 12),
            (1, _) => fixed(Op::LdRR(y, z), 4),

            (2, 6) => indexed(Op::Alu(y, z), 7, 12),
            (2, _) => fixed(Op::Alu(y, z), 4),

            (_, 0) => branch(Op::RetCc(y), 5, 11),
            (_, 1) => fixed(Op::Pop(p), 10),
            (_, 2) => fixed(Op::JpCc(y), 10),
            (_, 4) => branch(Op::CallCc(y), 10, 17),
            (_, 5) => fixed(Op::Push(p), 11),
            (_, 6) => fixed(Op::AluN(y), 7),
            _ => fixed(Op::Rst(y), 11),
        },
    }
}

const fn ed(op: EdOp, cycles: u8) -> EdInstruction {
    EdInstruction {
        op,
        timing: Timing::Fixed(cycles),
    }
}

const fn ed_repeat(op: EdOp) -> EdInstruction {
    EdInstruction {
        op,
        timing: Timing::Branch {
            not_taken: 16,
            taken: 21,
        },
    }
}

/// Decode the byte after ED. The 0x40-0x7F block mirrors NEG, RETN and
/// IM across unused slots like the silicon does.
pub const fn decode_ed(opcode: u8) -> EdInstruction {
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let p = y >> 1;

    match opcode {
        0x47 => ed(EdOp::LdIA, 9),
        0x4F => ed(EdOp::LdRA, 9),
        0x57 => ed(EdOp::LdAI, 9),
        0x5F => ed(EdOp::LdAR, 9),
        0x67 => ed(EdOp::Rrd, 18),
        0x6F => ed(EdOp::Rld, 18),
        0x4D => ed(EdOp::Reti, 14),
        0x77 | 0x7F => ed(EdOp::Invalid, 8),

        0x40..=0x7F => match z {
            0 => ed(EdOp::InRC(y), 12),
            1 => ed(EdOp::OutCR(y), 12),
            2 if y & 1 == 0 => ed(EdOp::SbcHlRp(p), 15),
            2 => ed(EdOp::AdcHlRp(p), 15),
            3 if y & 1 == 0 => ed(EdOp::LdNnRp(p), 20),
            3 => ed(EdOp::LdRpNn(p), 20),
            4 => ed(EdOp::Neg, 8),
            5 => ed(EdOp::Retn, 14),
            _ => {
                let mode = match y & 0x03 {
                    0 | 1 => 0,
                    2 => 1,
                    _ => 2,
                };
                ed(EdOp::Im(mode), 8)
            }
        },

        0xA0 => ed(EdOp::Ldi, 16),
        0xA8 => ed(EdOp::Ldd, 16),
        0xB0 => ed_repeat(EdOp::Ldir),
        0xB8 => ed_repeat(EdOp::Lddr),
        0xA1 => ed(EdOp::Cpi, 16),
        0xA9 => ed(EdOp::Cpd, 16),
        0xB1 => ed_repeat(EdOp::Cpir),
        0xB9 => ed_repeat(EdOp::Cpdr),
        0xA2 => ed(EdOp::Ini, 16),
        0xAA => ed(EdOp::Ind, 16),
        0xB2 => ed_repeat(EdOp::Inir),
        0xBA => ed_repeat(EdOp::Indr),
        0xA3 => ed(EdOp::Outi, 16),
        0xAB => ed(EdOp::Outd, 16),
        0xB3 => ed_repeat(EdOp::Otir),
        0xBB => ed_repeat(EdOp::Otdr),

        _ => ed(EdOp::Invalid, 8),
    }
}

const fn build_main() -> [Instruction; 256] {
    let mut table = [fixed(Op::Nop, 4); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
}

const fn build_ed() -> [EdInstruction; 256] {
    let mut table = [ed(EdOp::Invalid, 8); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode_ed(i as u8);
        i += 1;
    }
    table
}

pub static MAIN: [Instruction; 256] = build_main();
pub static ED: [EdInstruction; 256] = build_ed();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_table_spot_checks() {
        assert_eq!(MAIN[0x3E].op, Op::LdRN(7));
        assert_eq!(MAIN[0x36].op, Op::LdRN(6));
        assert_eq!(MAIN[0x36].index_extra, 9);
        assert_eq!(MAIN[0x46].op, Op::LdRR(0, 6));
        assert_eq!(MAIN[0x86].index_extra, 12);
        assert_eq!(MAIN[0x31].op, Op::LdRpNn(3));
        assert_eq!(MAIN[0x39].op, Op::AddHlRp(3));
        assert_eq!(MAIN[0xF5].op, Op::Push(3));
        assert_eq!(MAIN[0xFF].op, Op::Rst(7));
        assert_eq!(MAIN[0x38].op, Op::JrCc(3));
        assert_eq!(MAIN[0xFE].op, Op::AluN(7));
    }

    #[test]
    fn ed_table_covers_documented_set() {
        assert_eq!(ED[0x44].op, EdOp::Neg);
        assert_eq!(ED[0x7C].op, EdOp::Neg);
        assert_eq!(ED[0x5E].op, EdOp::Im(2));
        assert_eq!(ED[0x56].op, EdOp::Im(1));
        assert_eq!(ED[0x4E].op, EdOp::Im(0));
        assert_eq!(ED[0x73].op, EdOp::LdNnRp(3));
        assert_eq!(ED[0x78].op, EdOp::InRC(7));
        assert_eq!(ED[0xB0].timing.cycles(true), 21);
        assert_eq!(ED[0x00].op, EdOp::Invalid);
        assert_eq!(ED[0x7F].op, EdOp::Invalid);
        assert_eq!(ED[0xA4].op, EdOp::Invalid);
        assert_eq!(ED[0xFF].op, EdOp::Invalid);
    }
}

//! Zilog-mnemonic disassembler over the same decode tables the CPU runs.

use crate::core::debug::DisassembledLine;
use crate::cpu::z80::decode::{ED, EdOp, MAIN, Op};

const REG: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
const RP: [&str; 4] = ["BC", "DE", "HL", "SP"];
const RP_AF: [&str; 4] = ["BC", "DE", "HL", "AF"];
const CC: [&str; 8] = ["NZ", "Z", "NC", "C", "PO", "PE", "P", "M"];
const ALU: [&str; 8] = ["ADD A,", "ADC A,", "SUB ", "SBC A,", "AND ", "XOR ", "OR ", "CP "];
const ROT: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SLL", "SRL"];

struct Reader<'a> {
    code: &'a [u8],
    pos: usize,
    address: u16,
}

impl Reader<'_> {
    /// Missing bytes read as zero.
    fn byte(&mut self) -> u8 {
        let b = self.code.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        b
    }

    fn peek(&self) -> u8 {
        self.code.get(self.pos).copied().unwrap_or(0)
    }

    fn word(&mut self) -> String {
        let lo = self.byte() as u16;
        let hi = self.byte() as u16;
        format!("{:04X}H", (hi << 8) | lo)
    }

    fn imm(&mut self) -> String {
        format!("{:02X}H", self.byte())
    }

    /// Absolute target of a relative jump.
    fn relative(&mut self) -> String {
        let e = self.byte() as i8;
        let target = self
            .address
            .wrapping_add(self.pos as u16)
            .wrapping_add(e as u16);
        format!("{target:04X}H")
    }
}

/// Active index register, if any.
#[derive(Clone, Copy)]
struct Index(Option<&'static str>);

impl Index {
    fn hl(self) -> &'static str {
        self.0.unwrap_or("HL")
    }

    fn rp(self, rp: u8) -> &'static str {
        if rp == 2 { self.hl() } else { RP[rp as usize] }
    }

    fn rp_af(self, rp: u8) -> &'static str {
        if rp == 2 { self.hl() } else { RP_AF[rp as usize] }
    }

    fn memory(self, rd: &mut Reader) -> String {
        match self.0 {
            Some(ix) => displaced(ix, rd.byte() as i8),
            None => "(HL)".to_string(),
        }
    }

    /// Register operand, with IXH/IXL when the prefix applies.
    fn reg(self, r: u8, rd: &mut Reader) -> String {
        match (r, self.0) {
            (6, _) => self.memory(rd),
            (4, Some(ix)) => format!("{ix}H"),
            (5, Some(ix)) => format!("{ix}L"),
            _ => REG[r as usize].to_string(),
        }
    }
}

fn displaced(ix: &str, d: i8) -> String {
    if d < 0 {
        format!("({ix}-{:02X}H)", (d as i16).unsigned_abs())
    } else {
        format!("({ix}+{d:02X}H)")
    }
}

/// Decode one instruction at the start of `code`.
pub fn disassemble(code: &[u8], address: u16) -> DisassembledLine {
    let mut rd = Reader {
        code,
        pos: 0,
        address,
    };
    let text = unprefixed(&mut rd, Index(None));
    DisassembledLine {
        address,
        bytes: (0..rd.pos)
            .map(|i| code.get(i).copied().unwrap_or(0))
            .collect(),
        text,
    }
}

fn unprefixed(rd: &mut Reader, ix: Index) -> String {
    let opcode = rd.byte();
    match MAIN[opcode as usize].op {
        Op::Nop => "NOP".into(),
        Op::ExAfAf => "EX AF,AF'".into(),
        Op::Djnz => format!("DJNZ {}", rd.relative()),
        Op::Jr => format!("JR {}", rd.relative()),
        Op::JrCc(cc) => format!("JR {},{}", CC[cc as usize], rd.relative()),
        Op::LdRpNn(rp) => format!("LD {},{}", ix.rp(rp), rd.word()),
        Op::AddHlRp(rp) => format!("ADD {},{}", ix.hl(), ix.rp(rp)),
        Op::LdBcA => "LD (BC),A".into(),
        Op::LdDeA => "LD (DE),A".into(),
        Op::LdABc => "LD A,(BC)".into(),
        Op::LdADe => "LD A,(DE)".into(),
        Op::LdNnHl => format!("LD ({}),{}", rd.word(), ix.hl()),
        Op::LdHlNn => format!("LD {},({})", ix.hl(), rd.word()),
        Op::LdNnA => format!("LD ({}),A", rd.word()),
        Op::LdANn => format!("LD A,({})", rd.word()),
        Op::IncRp(rp) => format!("INC {}", ix.rp(rp)),
        Op::DecRp(rp) => format!("DEC {}", ix.rp(rp)),
        Op::IncR(r) => format!("INC {}", ix.reg(r, rd)),
        Op::DecR(r) => format!("DEC {}", ix.reg(r, rd)),
        Op::LdRN(r) => {
            let dst = ix.reg(r, rd);
            format!("LD {dst},{}", rd.imm())
        }
        Op::Rlca => "RLCA".into(),
        Op::Rrca => "RRCA".into(),
        Op::Rla => "RLA".into(),
        Op::Rra => "RRA".into(),
        Op::Daa => "DAA".into(),
        Op::Cpl => "CPL".into(),
        Op::Scf => "SCF".into(),
        Op::Ccf => "CCF".into(),
        Op::Halt => "HALT".into(),
        // With (IX+d) on one side the other side is a plain register.
        Op::LdRR(dst, 6) => format!("LD {},{}", REG[dst as usize], ix.memory(rd)),
        Op::LdRR(6, src) => format!("LD {},{}", ix.memory(rd), REG[src as usize]),
        Op::LdRR(dst, src) => format!("LD {},{}", ix.reg(dst, rd), ix.reg(src, rd)),
        Op::Alu(op, r) => format!("{}{}", ALU[op as usize], ix.reg(r, rd)),
        Op::AluN(op) => format!("{}{}", ALU[op as usize], rd.imm()),
        Op::RetCc(cc) => format!("RET {}", CC[cc as usize]),
        Op::Pop(rp) => format!("POP {}", ix.rp_af(rp)),
        Op::Ret => "RET".into(),
        Op::Exx => "EXX".into(),
        Op::JpHl => format!("JP ({})", ix.hl()),
        Op::LdSpHl => format!("LD SP,{}", ix.hl()),
        Op::JpCc(cc) => format!("JP {},{}", CC[cc as usize], rd.word()),
        Op::Jp => format!("JP {}", rd.word()),
        Op::OutNA => format!("OUT ({}),A", rd.imm()),
        Op::InAN => format!("IN A,({})", rd.imm()),
        Op::ExSpHl => format!("EX (SP),{}", ix.hl()),
        Op::ExDeHl => "EX DE,HL".into(),
        Op::Di => "DI".into(),
        Op::Ei => "EI".into(),
        Op::CallCc(cc) => format!("CALL {},{}", CC[cc as usize], rd.word()),
        Op::Push(rp) => format!("PUSH {}", ix.rp_af(rp)),
        Op::Call => format!("CALL {}", rd.word()),
        Op::Rst(y) => format!("RST {:02X}H", y * 8),
        Op::PrefixCb => cb(rd, ix),
        Op::PrefixEd => ed(rd),
        Op::PrefixDd | Op::PrefixFd => match rd.peek() {
            // A prefix followed by another prefix (or ED) does nothing on its own.
            0xDD | 0xED | 0xFD => "*NOP".into(),
            _ => unprefixed(rd, Index(Some(if opcode == 0xDD { "IX" } else { "IY" }))),
        },
    }
}

fn cb(rd: &mut Reader, ix: Index) -> String {
    // DD CB d op: displacement comes before the opcode.
    let operand = ix.0.map(|name| displaced(name, rd.byte() as i8));
    let op = rd.byte();
    let x = op >> 6;
    let y = (op >> 3) & 0x07;
    let z = op & 0x07;

    let target = operand.clone().unwrap_or_else(|| REG[z as usize].to_string());
    let mut text = match x {
        0 => format!("{} {target}", ROT[y as usize]),
        1 => format!("BIT {y},{target}"),
        2 => format!("RES {y},{target}"),
        _ => format!("SET {y},{target}"),
    };
    // Undocumented register copy of an indexed result.
    if operand.is_some() && x != 1 && z != 6 {
        text.push(',');
        text.push_str(REG[z as usize]);
    }
    text
}

fn ed(rd: &mut Reader) -> String {
    let op = rd.byte();
    let name = match ED[op as usize].op {
        EdOp::InRC(6) => return "IN (C)".into(),
        EdOp::InRC(r) => return format!("IN {},(C)", REG[r as usize]),
        EdOp::OutCR(6) => return "OUT (C),0".into(),
        EdOp::OutCR(r) => return format!("OUT (C),{}", REG[r as usize]),
        EdOp::SbcHlRp(rp) => return format!("SBC HL,{}", RP[rp as usize]),
        EdOp::AdcHlRp(rp) => return format!("ADC HL,{}", RP[rp as usize]),
        EdOp::LdNnRp(rp) => return format!("LD ({}),{}", rd.word(), RP[rp as usize]),
        EdOp::LdRpNn(rp) => return format!("LD {},({})", RP[rp as usize], rd.word()),
        EdOp::Im(mode) => return format!("IM {mode}"),
        EdOp::Invalid => return format!("DB EDH,{op:02X}H"),
        EdOp::Neg => "NEG",
        EdOp::Retn => "RETN",
        EdOp::Reti => "RETI",
        EdOp::LdIA => "LD I,A",
        EdOp::LdRA => "LD R,A",
        EdOp::LdAI => "LD A,I",
        EdOp::LdAR => "LD A,R",
        EdOp::Rrd => "RRD",
        EdOp::Rld => "RLD",
        EdOp::Ldi => "LDI",
        EdOp::Ldd => "LDD",
        EdOp::Ldir => "LDIR",
        EdOp::Lddr => "LDDR",
        EdOp::Cpi => "CPI",
        EdOp::Cpd => "CPD",
        EdOp::Cpir => "CPIR",
        EdOp::Cpdr => "CPDR",
        EdOp::Ini => "INI",
        EdOp::Ind => "IND",
        EdOp::Inir => "INIR",
        EdOp::Indr => "INDR",
        EdOp::Outi => "OUTI",
        EdOp::Outd => "OUTD",
        EdOp::Otir => "OTIR",
        EdOp::Otdr => "OTDR",
    };
    name.into()
}

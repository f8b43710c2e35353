//! Opcode table: one descriptor per byte, built at compile time.
//!
//! Execution and disassembly both read [`INSTRUCTIONS`]; an opcode's
//! operands, length and cycle rule live here as data.

/// 8-bit operand, in opcode-field order (`ddd`/`sss` = 0..7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    B,
    C,
    D,
    E,
    H,
    L,
    /// Memory at (HL).
    M,
    A,
}

impl Reg {
    const fn from_bits(bits: u8) -> Reg {
        match bits & 0x07 {
            0 => Reg::B,
            1 => Reg::C,
            2 => Reg::D,
            3 => Reg::E,
            4 => Reg::H,
            5 => Reg::L,
            6 => Reg::M,
            _ => Reg::A,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Reg::B => "B",
            Reg::C => "C",
            Reg::D => "D",
            Reg::E => "E",
            Reg::H => "H",
            Reg::L => "L",
            Reg::M => "M",
            Reg::A => "A",
        }
    }
}

/// Register pair operand (`rp` field). `Sp` becomes PSW for PUSH/POP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pair {
    Bc,
    De,
    Hl,
    Sp,
    Psw,
}

impl Pair {
    const fn from_bits(bits: u8) -> Pair {
        match bits & 0x03 {
            0 => Pair::Bc,
            1 => Pair::De,
            2 => Pair::Hl,
            _ => Pair::Sp,
        }
    }

    const fn stack_from_bits(bits: u8) -> Pair {
        match bits & 0x03 {
            0 => Pair::Bc,
            1 => Pair::De,
            2 => Pair::Hl,
            _ => Pair::Psw,
        }
    }

    /// Intel names the pair by its high register.
    pub fn name(self) -> &'static str {
        match self {
            Pair::Bc => "B",
            Pair::De => "D",
            Pair::Hl => "H",
            Pair::Sp => "SP",
            Pair::Psw => "PSW",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    NotZero,
    Zero,
    NoCarry,
    Carry,
    ParityOdd,
    ParityEven,
    Plus,
    Minus,
}

impl Condition {
    const fn from_bits(bits: u8) -> Condition {
        match bits & 0x07 {
            0 => Condition::NotZero,
            1 => Condition::Zero,
            2 => Condition::NoCarry,
            3 => Condition::Carry,
            4 => Condition::ParityOdd,
            5 => Condition::ParityEven,
            6 => Condition::Plus,
            _ => Condition::Minus,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Condition::NotZero => "NZ",
            Condition::Zero => "Z",
            Condition::NoCarry => "NC",
            Condition::Carry => "C",
            Condition::ParityOdd => "PO",
            Condition::ParityEven => "PE",
            Condition::Plus => "P",
            Condition::Minus => "M",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbb,
    Ana,
    Xra,
    Ora,
    Cmp,
}

impl AluOp {
    const fn from_bits(bits: u8) -> AluOp {
        match bits & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbb,
            4 => AluOp::Ana,
            5 => AluOp::Xra,
            6 => AluOp::Ora,
            _ => AluOp::Cmp,
        }
    }

    pub const fn mnemonic(self, immediate: bool) -> &'static str {
        match (self, immediate) {
            (AluOp::Add, false) => "ADD",
            (AluOp::Adc, false) => "ADC",
            (AluOp::Sub, false) => "SUB",
            (AluOp::Sbb, false) => "SBB",
            (AluOp::Ana, false) => "ANA",
            (AluOp::Xra, false) => "XRA",
            (AluOp::Ora, false) => "ORA",
            (AluOp::Cmp, false) => "CMP",
            (AluOp::Add, true) => "ADI",
            (AluOp::Adc, true) => "ACI",
            (AluOp::Sub, true) => "SUI",
            (AluOp::Sbb, true) => "SBI",
            (AluOp::Ana, true) => "ANI",
            (AluOp::Xra, true) => "XRI",
            (AluOp::Ora, true) => "ORI",
            (AluOp::Cmp, true) => "CPI",
        }
    }
}

/// What an opcode does, with its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Nop,
    Hlt,

    // Data transfer
    Mov(Reg, Reg),
    Mvi(Reg),
    Lxi(Pair),
    Stax(Pair),
    Ldax(Pair),
    Sta,
    Lda,
    Shld,
    Lhld,
    Xchg,

    // Arithmetic / logic
    Alu(AluOp, Reg),
    AluImm(AluOp),
    Inr(Reg),
    Dcr(Reg),
    Inx(Pair),
    Dcx(Pair),
    Dad(Pair),
    Daa,
    Cma,
    Stc,
    Cmc,
    Rlc,
    Rrc,
    Ral,
    Rar,

    // Control flow
    Jmp,
    Jcc(Condition),
    Call,
    Ccc(Condition),
    Ret,
    Rcc(Condition),
    Rst(u8),
    Pchl,

    // Stack
    Push(Pair),
    Pop(Pair),
    Xthl,
    Sphl,

    // Machine control
    In,
    Out,
    Ei,
    Di,
}

/// Cycle cost rule.
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
    /// Length in bytes, opcode included.
    pub size: u8,
    pub timing: Timing,
    pub mnemonic: &'static str,
    /// Unassigned opcode that aliases a documented one on real silicon.
    pub undocumented: bool,
}

const fn fixed(op: Op, size: u8, cycles: u8, mnemonic: &'static str) -> Instruction {
    Instruction {
        op,
        size,
        timing: Timing::Fixed(cycles),
        mnemonic,
        undocumented: false,
    }
}

const fn branch(op: Op, size: u8, not_taken: u8, taken: u8, mnemonic: &'static str) -> Instruction {
    Instruction {
        op,
        size,
        timing: Timing::Branch { not_taken, taken },
        mnemonic,
        undocumented: false,
    }
}

const fn alias(mut instruction: Instruction) -> Instruction {
    instruction.undocumented = true;
    instruction
}

/// Decode one opcode byte. Every byte maps to something.
pub const fn decode(opcode: u8) -> Instruction {
    let ddd = (opcode >> 3) & 0x07;
    let sss = opcode & 0x07;
    let rp = (opcode >> 4) & 0x03;

    match opcode {
        0x00 => fixed(Op::Nop, 1, 4, "NOP"),
        0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => alias(fixed(Op::Nop, 1, 4, "NOP")),

        0x76 => fixed(Op::Hlt, 1, 7, "HLT"),

        0x02 | 0x12 => fixed(Op::Stax(Pair::from_bits(rp)), 1, 7, "STAX"),
        0x0A | 0x1A => fixed(Op::Ldax(Pair::from_bits(rp)), 1, 7, "LDAX"),
        0x22 => fixed(Op::Shld, 3, 16, "SHLD"),
        0x2A => fixed(Op::Lhld, 3, 16, "LHLD"),
        0x32 => fixed(Op::Sta, 3, 13, "STA"),
        0x3A => fixed(Op::Lda, 3, 13, "LDA"),

        0x07 => fixed(Op::Rlc, 1, 4, "RLC"),
        0x0F => fixed(Op::Rrc, 1, 4, "RRC"),
        0x17 => fixed(Op::Ral, 1, 4, "RAL"),
        0x1F => fixed(Op::Rar, 1, 4, "RAR"),
        0x27 => fixed(Op::Daa, 1, 4, "DAA"),
        0x2F => fixed(Op::Cma, 1, 4, "CMA"),
        0x37 => fixed(Op::Stc, 1, 4, "STC"),
        0x3F => fixed(Op::Cmc, 1, 4, "CMC"),

        op if op & 0xCF == 0x01 => fixed(Op::Lxi(Pair::from_bits(rp)), 3, 10, "LXI"),
        op if op & 0xCF == 0x03 => fixed(Op::Inx(Pair::from_bits(rp)), 1, 5, "INX"),
        op if op & 0xCF == 0x0B => fixed(Op::Dcx(Pair::from_bits(rp)), 1, 5, "DCX"),
        op if op & 0xCF == 0x09 => fixed(Op::Dad(Pair::from_bits(rp)), 1, 10, "DAD"),

        op if op & 0xC7 == 0x04 => {
            let cycles = if ddd == 6 { 10 } else { 5 };
            fixed(Op::Inr(Reg::from_bits(ddd)), 1, cycles, "INR")
        }
        op if op & 0xC7 == 0x05 => {
            let cycles = if ddd == 6 { 10 } else { 5 };
            fixed(Op::Dcr(Reg::from_bits(ddd)), 1, cycles, "DCR")
        }
        op if op & 0xC7 == 0x06 => {
            let cycles = if ddd == 6 { 10 } else { 7 };
            fixed(Op::Mvi(Reg::from_bits(ddd)), 2, cycles, "MVI")
        }

        // MOV: 0x40-0x7F minus HLT
        op if op & 0xC0 == 0x40 => {
            let cycles = if ddd == 6 || sss == 6 { 7 } else { 5 };
            fixed(Op::Mov(Reg::from_bits(ddd), Reg::from_bits(sss)), 1, cycles, "MOV")
        }

        // ALU r: 0x80-0xBF
        op if op & 0xC0 == 0x80 => {
            let cycles = if sss == 6 { 7 } else { 4 };
            let alu = AluOp::from_bits(ddd);
            fixed(Op::Alu(alu, Reg::from_bits(sss)), 1, cycles, alu.mnemonic(false))
        }
        op if op & 0xC7 == 0xC6 => {
            let alu = AluOp::from_bits(ddd);
            fixed(Op::AluImm(alu), 2, 7, alu.mnemonic(true))
        }

        0xC3 => fixed(Op::Jmp, 3, 10, "JMP"),
        0xCB => alias(fixed(Op::Jmp, 3, 10, "JMP")),
        0xCD => fixed(Op::Call, 3, 17, "CALL"),
        0xDD | 0xED | 0xFD => alias(fixed(Op::Call, 3, 17, "CALL")),
        0xC9 => fixed(Op::Ret, 1, 10, "RET"),
        0xD9 => alias(fixed(Op::Ret, 1, 10, "RET")),
        0xE9 => fixed(Op::Pchl, 1, 5, "PCHL"),

        op if op & 0xC7 == 0xC2 => fixed(Op::Jcc(Condition::from_bits(ddd)), 3, 10, "J"),
        op if op & 0xC7 == 0xC4 => branch(Op::Ccc(Condition::from_bits(ddd)), 3, 11, 17, "C"),
        op if op & 0xC7 == 0xC0 => branch(Op::Rcc(Condition::from_bits(ddd)), 1, 5, 11, "R"),
        op if op & 0xC7 == 0xC7 => fixed(Op::Rst(ddd), 1, 11, "RST"),

        op if op & 0xCF == 0xC5 => fixed(Op::Push(Pair::stack_from_bits(rp)), 1, 11, "PUSH"),
        op if op & 0xCF == 0xC1 => fixed(Op::Pop(Pair::stack_from_bits(rp)), 1, 10, "POP"),
        0xE3 => fixed(Op::Xthl, 1, 18, "XTHL"),
        0xEB => fixed(Op::Xchg, 1, 4, "XCHG"),
        0xF9 => fixed(Op::Sphl, 1, 5, "SPHL"),

        0xD3 => fixed(Op::Out, 2, 10, "OUT"),
        0xDB => fixed(Op::In, 2, 10, "IN"),
        0xF3 => fixed(Op::Di, 1, 4, "DI"),
        _ => fixed(Op::Ei, 1, 4, "EI"),
    }
}

const fn build_table() -> [Instruction; 256] {
    let mut table = [fixed(Op::Nop, 1, 4, "NOP"); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
}

pub static INSTRUCTIONS: [Instruction; 256] = build_table();

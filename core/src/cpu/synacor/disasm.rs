//! Synacor opcode table and disassembler.

use crate::core::debug::DisassembledLine;
use crate::cpu::synacor::Operand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Halt,
    Set,
    Push,
    Pop,
    Eq,
    Gt,
    Jmp,
    Jt,
    Jf,
    Add,
    Mult,
    Mod,
    And,
    Or,
    Not,
    Rmem,
    Wmem,
    Call,
    Ret,
    Out,
    In,
    Noop,
}

const OPCODES: [Opcode; 22] = [
    Opcode::Halt,
    Opcode::Set,
    Opcode::Push,
    Opcode::Pop,
    Opcode::Eq,
    Opcode::Gt,
    Opcode::Jmp,
    Opcode::Jt,
    Opcode::Jf,
    Opcode::Add,
    Opcode::Mult,
    Opcode::Mod,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Rmem,
    Opcode::Wmem,
    Opcode::Call,
    Opcode::Ret,
    Opcode::Out,
    Opcode::In,
    Opcode::Noop,
];

impl Opcode {
    pub fn from_word(word: u16) -> Option<Self> {
        OPCODES.get(word as usize).copied()
    }

    pub fn operand_count(self) -> usize {
        match self {
            Opcode::Halt | Opcode::Ret | Opcode::Noop => 0,
            Opcode::Push | Opcode::Pop | Opcode::Jmp | Opcode::Call | Opcode::Out | Opcode::In => 1,
            Opcode::Set | Opcode::Jt | Opcode::Jf | Opcode::Not | Opcode::Rmem | Opcode::Wmem => 2,
            Opcode::Eq
            | Opcode::Gt
            | Opcode::Add
            | Opcode::Mult
            | Opcode::Mod
            | Opcode::And
            | Opcode::Or => 3,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Halt => "halt",
            Opcode::Set => "set",
            Opcode::Push => "push",
            Opcode::Pop => "pop",
            Opcode::Eq => "eq",
            Opcode::Gt => "gt",
            Opcode::Jmp => "jmp",
            Opcode::Jt => "jt",
            Opcode::Jf => "jf",
            Opcode::Add => "add",
            Opcode::Mult => "mult",
            Opcode::Mod => "mod",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Not => "not",
            Opcode::Rmem => "rmem",
            Opcode::Wmem => "wmem",
            Opcode::Call => "call",
            Opcode::Ret => "ret",
            Opcode::Out => "out",
            Opcode::In => "in",
            Opcode::Noop => "noop",
        }
    }
}

fn operand_text(word: u16, as_char: bool) -> String {
    match Operand::decode(word) {
        Some(Operand::Register(r)) => format!("r{r}"),
        Some(Operand::Literal(value)) if as_char && (0x20..0x7F).contains(&value) => {
            format!("'{}'", value as u8 as char)
        }
        Some(Operand::Literal(0x0A)) if as_char => "'\\n'".to_string(),
        Some(Operand::Literal(value)) => format!("{value:04X}"),
        None => format!("?{word:04X}"),
    }
}

/// Decode the instruction in the little-endian words at the start of
/// `code`. Missing words read as zero; an unknown opcode becomes a
/// one-word `.word` line.
pub fn disassemble(code: &[u8], address: u16) -> DisassembledLine {
    let byte = |i: usize| code.get(i).copied().unwrap_or(0);
    let word = |i: usize| u16::from_le_bytes([byte(2 * i), byte(2 * i + 1)]);

    let (words, text) = match Opcode::from_word(word(0)) {
        Some(opcode) => {
            let count = opcode.operand_count();
            let operands: Vec<String> = (1..=count)
                .map(|i| operand_text(word(i), opcode == Opcode::Out))
                .collect();
            let text = if operands.is_empty() {
                opcode.mnemonic().to_string()
            } else {
                format!("{} {}", opcode.mnemonic(), operands.join(","))
            };
            (count + 1, text)
        }
        None => (1, format!(".word {:04X}", word(0))),
    };

    DisassembledLine {
        address,
        bytes: (0..words * 2).map(byte).collect(),
        text,
    }
}

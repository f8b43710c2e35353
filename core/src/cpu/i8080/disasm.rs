//! Intel-mnemonic disassembler driven by the opcode table.

use crate::core::debug::DisassembledLine;
use crate::cpu::i8080::table::{INSTRUCTIONS, Op};

/// Decode one instruction at the start of `code`. Missing operand bytes
/// read as zero.
pub fn disassemble(code: &[u8], address: u16) -> DisassembledLine {
    let byte = |i: usize| code.get(i).copied().unwrap_or(0);
    let opcode = byte(0);
    let instruction = &INSTRUCTIONS[opcode as usize];
    let size = instruction.size as usize;

    let d8 = byte(1);
    let d16 = ((byte(2) as u16) << 8) | byte(1) as u16;
    let m = instruction.mnemonic;

    let mut text = match instruction.op {
        Op::Mov(dst, src) => format!("{m} {},{}", dst.name(), src.name()),
        Op::Mvi(dst) => format!("{m} {},{d8:02X}H", dst.name()),
        Op::Lxi(pair) => format!("{m} {},{d16:04X}H", pair.name()),
        Op::Stax(pair) | Op::Ldax(pair) | Op::Inx(pair) | Op::Dcx(pair) | Op::Dad(pair) => {
            format!("{m} {}", pair.name())
        }
        Op::Push(pair) | Op::Pop(pair) => format!("{m} {}", pair.name()),
        Op::Sta | Op::Lda | Op::Shld | Op::Lhld | Op::Jmp | Op::Call => format!("{m} {d16:04X}H"),
        Op::Jcc(cond) | Op::Ccc(cond) => format!("{m}{} {d16:04X}H", cond.suffix()),
        Op::Rcc(cond) => format!("{m}{}", cond.suffix()),
        Op::Alu(_, src) | Op::Inr(src) | Op::Dcr(src) => format!("{m} {}", src.name()),
        Op::AluImm(_) | Op::In | Op::Out => format!("{m} {d8:02X}H"),
        Op::Rst(n) => format!("{m} {n}"),
        _ => m.to_string(),
    };
    if instruction.undocumented {
        text.insert(0, '*');
    }

    DisassembledLine {
        address,
        bytes: (0..size).map(byte).collect(),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_operands() {
        assert_eq!(disassemble(&[0x3E, 0x12], 0).text, "MVI A,12H");
        assert_eq!(disassemble(&[0xC3, 0x34, 0x12], 0).text, "JMP 1234H");
        assert_eq!(disassemble(&[0xDA, 0x00, 0x01], 0).text, "JC 0100H");
        assert_eq!(disassemble(&[0xC0], 0).text, "RNZ");
        assert_eq!(disassemble(&[0x7E], 0).text, "MOV A,M");
        assert_eq!(disassemble(&[0xF5], 0).text, "PUSH PSW");
        assert_eq!(disassemble(&[0xFE, 0x24], 0).text, "CPI 24H");
        assert_eq!(disassemble(&[0xEF], 0).text, "RST 5");
    }

    #[test]
    fn marks_undocumented_aliases() {
        assert_eq!(disassemble(&[0x08], 0).text, "*NOP");
        assert_eq!(disassemble(&[0xCB, 0x00, 0x20], 0).text, "*JMP 2000H");
    }

    #[test]
    fn truncated_code_pads_with_zero() {
        let line = disassemble(&[0x21], 0x0100);
        assert_eq!(line.bytes, vec![0x21, 0x00, 0x00]);
        assert_eq!(line.text, "LXI H,0000H");
        assert_eq!(line.address, 0x0100);
    }
}

//! LMC instruction decoding and disassembly.

use crate::core::debug::DisassembledLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Add,
    Sub,
    Sta,
    Lda,
    Bra,
    Brz,
    Brp,
    Inp,
    Out,
    Otc,
    Hlt,
}

impl Mnemonic {
    pub fn name(self) -> &'static str {
        match self {
            Mnemonic::Add => "ADD",
            Mnemonic::Sub => "SUB",
            Mnemonic::Sta => "STA",
            Mnemonic::Lda => "LDA",
            Mnemonic::Bra => "BRA",
            Mnemonic::Brz => "BRZ",
            Mnemonic::Brp => "BRP",
            Mnemonic::Inp => "INP",
            Mnemonic::Out => "OUT",
            Mnemonic::Otc => "OTC",
            Mnemonic::Hlt => "HLT",
        }
    }

    /// Hundreds digit of a mailbox-addressing instruction, or the whole
    /// word for the fixed ones.
    pub fn base(self) -> u16 {
        match self {
            Mnemonic::Add => 100,
            Mnemonic::Sub => 200,
            Mnemonic::Sta => 300,
            Mnemonic::Lda => 500,
            Mnemonic::Bra => 600,
            Mnemonic::Brz => 700,
            Mnemonic::Brp => 800,
            Mnemonic::Inp => 901,
            Mnemonic::Out => 902,
            Mnemonic::Otc => 922,
            Mnemonic::Hlt => 0,
        }
    }

    pub fn takes_mailbox(self) -> bool {
        self.base() % 100 == 0 && self != Mnemonic::Hlt
    }
}

/// Split a word into its instruction and mailbox operand. 000-099 all
/// halt; 4xx and the unused 9xx words decode to `None`.
pub fn decode(word: u16) -> Option<(Mnemonic, u8)> {
    let mailbox = (word % 100) as u8;
    let mnemonic = match word / 100 {
        0 => Mnemonic::Hlt,
        1 => Mnemonic::Add,
        2 => Mnemonic::Sub,
        3 => Mnemonic::Sta,
        5 => Mnemonic::Lda,
        6 => Mnemonic::Bra,
        7 => Mnemonic::Brz,
        8 => Mnemonic::Brp,
        9 => match word {
            901 => Mnemonic::Inp,
            902 => Mnemonic::Out,
            922 => Mnemonic::Otc,
            _ => return None,
        },
        _ => return None,
    };
    Some((mnemonic, mailbox))
}

/// `ADD 07`, `HLT`, or `DAT n` for words that only make sense as data.
pub fn disassemble_word(word: u16) -> String {
    match decode(word) {
        Some((Mnemonic::Hlt, _)) if word != 0 => format!("DAT {word}"),
        Some((mnemonic, mailbox)) if mnemonic.takes_mailbox() => {
            format!("{} {mailbox:02}", mnemonic.name())
        }
        Some((mnemonic, _)) => mnemonic.name().to_string(),
        None => format!("DAT {word}"),
    }
}

/// Decode the mailbox word at the start of `code`.
pub fn disassemble(code: &[u8], address: u16) -> DisassembledLine {
    let byte = |i: usize| code.get(i).copied().unwrap_or(0);
    let word = u16::from_le_bytes([byte(0), byte(1)]);
    DisassembledLine {
        address,
        bytes: vec![byte(0), byte(1)],
        text: disassemble_word(word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_group() {
        assert_eq!(decode(105), Some((Mnemonic::Add, 5)));
        assert_eq!(decode(299), Some((Mnemonic::Sub, 99)));
        assert_eq!(decode(742), Some((Mnemonic::Brz, 42)));
        assert_eq!(decode(901), Some((Mnemonic::Inp, 1)));
        assert_eq!(decode(922), Some((Mnemonic::Otc, 22)));
        assert_eq!(decode(42), Some((Mnemonic::Hlt, 42)));
        assert_eq!(decode(450), None);
        assert_eq!(decode(900), None);
        assert_eq!(decode(1000), None);
    }

    #[test]
    fn formats_words() {
        assert_eq!(disassemble_word(507), "LDA 07");
        assert_eq!(disassemble_word(902), "OUT");
        assert_eq!(disassemble_word(0), "HLT");
        assert_eq!(disassemble_word(17), "DAT 17");
        assert_eq!(disassemble_word(450), "DAT 450");
    }

    #[test]
    fn line_covers_one_mailbox() {
        let [lo, hi] = 601u16.to_le_bytes();
        let line = disassemble(&[lo, hi], 0x0010);
        assert_eq!(line.text, "BRA 01");
        assert_eq!(line.bytes, vec![lo, hi]);
    }
}

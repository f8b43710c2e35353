//! Two-pass LMC assembler.
//!
//! One instruction per line, optionally preceded by a label:
//!
//! ```text
//!         INP
//! loop    SUB one      // comments run to the end of the line
//!         BRP loop
//!         HLT
//! one     DAT 1
//! ```
//!
//! Mnemonics are case-insensitive; labels are not. `COB` is accepted as
//! an alias for `HLT` and `STO` for `STA`. Operands are a mailbox number
//! or a label.

use std::collections::HashMap;

use thiserror::Error;

use crate::cpu::lmc::{MAILBOXES, Mnemonic, WORD_LIMIT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("line {line}: expected an instruction, found {found:?}")]
    UnknownMnemonic { line: usize, found: String },
    #[error("line {line}: {mnemonic} needs an operand")]
    MissingOperand { line: usize, mnemonic: &'static str },
    #[error("line {line}: unexpected {found:?} after the instruction")]
    UnexpectedToken { line: usize, found: String },
    #[error("line {line}: label {label:?} is defined twice")]
    DuplicateLabel { line: usize, label: String },
    #[error("line {line}: undefined label {label:?}")]
    UndefinedLabel { line: usize, label: String },
    #[error("line {line}: {value} is out of range (max {max})")]
    OutOfRange { line: usize, value: u32, max: u16 },
    #[error("program needs {size} mailboxes, only 100 exist")]
    ProgramTooLarge { size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Instruction(Mnemonic),
    Data,
}

fn directive(token: &str) -> Option<Directive> {
    let directive = match token.to_ascii_uppercase().as_str() {
        "ADD" => Directive::Instruction(Mnemonic::Add),
        "SUB" => Directive::Instruction(Mnemonic::Sub),
        "STA" | "STO" => Directive::Instruction(Mnemonic::Sta),
        "LDA" => Directive::Instruction(Mnemonic::Lda),
        "BRA" => Directive::Instruction(Mnemonic::Bra),
        "BRZ" => Directive::Instruction(Mnemonic::Brz),
        "BRP" => Directive::Instruction(Mnemonic::Brp),
        "INP" => Directive::Instruction(Mnemonic::Inp),
        "OUT" => Directive::Instruction(Mnemonic::Out),
        "OTC" => Directive::Instruction(Mnemonic::Otc),
        "HLT" | "COB" => Directive::Instruction(Mnemonic::Hlt),
        "DAT" => Directive::Data,
        _ => return None,
    };
    Some(directive)
}

/// One source line that emits a word.
struct Statement<'a> {
    line: usize,
    directive: Directive,
    operand: Option<&'a str>,
}

fn strip_comment(line: &str) -> &str {
    let end = ["//", "#", ";"]
        .iter()
        .filter_map(|marker| line.find(marker))
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

/// First pass: labels to mailboxes, plus the statements in order.
fn parse(source: &str) -> Result<(HashMap<&str, u8>, Vec<Statement<'_>>), AssembleError> {
    let mut labels = HashMap::new();
    let mut statements = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let mut tokens = strip_comment(raw).split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };

        let directive = match directive(first) {
            Some(directive) => directive,
            None => {
                let mailbox = statements.len().min(u8::MAX as usize) as u8;
                if labels.insert(first, mailbox).is_some() {
                    return Err(AssembleError::DuplicateLabel {
                        line,
                        label: first.to_string(),
                    });
                }
                let found = tokens.next().unwrap_or_default();
                directive(found).ok_or_else(|| AssembleError::UnknownMnemonic {
                    line,
                    found: found.to_string(),
                })?
            }
        };

        let operand = tokens.next();
        if let Some(extra) = tokens.next() {
            return Err(AssembleError::UnexpectedToken {
                line,
                found: extra.to_string(),
            });
        }
        statements.push(Statement {
            line,
            directive,
            operand,
        });
    }

    if statements.len() > MAILBOXES as usize {
        return Err(AssembleError::ProgramTooLarge {
            size: statements.len(),
        });
    }
    Ok((labels, statements))
}

fn resolve(
    labels: &HashMap<&str, u8>,
    line: usize,
    operand: &str,
    max: u16,
) -> Result<u16, AssembleError> {
    if operand.bytes().all(|b| b.is_ascii_digit()) {
        let value: u32 = operand.parse().unwrap_or(u32::MAX);
        if value > max as u32 {
            return Err(AssembleError::OutOfRange { line, value, max });
        }
        return Ok(value as u16);
    }
    labels
        .get(operand)
        .map(|&mailbox| mailbox as u16)
        .ok_or_else(|| AssembleError::UndefinedLabel {
            line,
            label: operand.to_string(),
        })
}

/// Assemble `source` into mailbox words, starting at mailbox 0.
pub fn assemble(source: &str) -> Result<Vec<u16>, AssembleError> {
    let (labels, statements) = parse(source)?;

    statements
        .iter()
        .map(|statement| {
            let line = statement.line;
            match (statement.directive, statement.operand) {
                (Directive::Data, None) => Ok(0),
                (Directive::Data, Some(operand)) => resolve(&labels, line, operand, WORD_LIMIT - 1),
                (Directive::Instruction(mnemonic), operand) if mnemonic.takes_mailbox() => {
                    let operand = operand.ok_or(AssembleError::MissingOperand {
                        line,
                        mnemonic: mnemonic.name(),
                    })?;
                    let mailbox = resolve(&labels, line, operand, MAILBOXES as u16 - 1)?;
                    Ok(mnemonic.base() + mailbox)
                }
                (Directive::Instruction(_), Some(extra)) => Err(AssembleError::UnexpectedToken {
                    line,
                    found: extra.to_string(),
                }),
                (Directive::Instruction(mnemonic), None) => Ok(mnemonic.base()),
            }
        })
        .collect()
}

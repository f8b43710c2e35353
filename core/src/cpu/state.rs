//! CPU state snapshot types and traits

/// Trait for CPU types that can provide state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
}

/// I8080 CPU state snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct I8080State {
    pub a: u8,      // Accumulator
    pub f: u8,      // Flag byte (S Z 0 AC 0 P 1 CY)
    pub b: u8,      // Register B
    pub c: u8,      // Register C
    pub d: u8,      // Register D
    pub e: u8,      // Register E
    pub h: u8,      // Register H
    pub l: u8,      // Register L
    pub sp: u16,    // Stack pointer
    pub pc: u16,    // Program counter
    pub inte: bool, // Interrupt enable flip-flop
    pub halted: bool,
}

/// Z80 CPU state snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Z80State {
    pub a: u8,       // Accumulator
    pub f: u8,       // Flags register
    pub b: u8,       // Register B
    pub c: u8,       // Register C
    pub d: u8,       // Register D
    pub e: u8,       // Register E
    pub h: u8,       // Register H
    pub l: u8,       // Register L
    pub a_prime: u8, // Shadow accumulator
    pub f_prime: u8, // Shadow flags
    pub b_prime: u8, // Shadow B
    pub c_prime: u8, // Shadow C
    pub d_prime: u8, // Shadow D
    pub e_prime: u8, // Shadow E
    pub h_prime: u8, // Shadow H
    pub l_prime: u8, // Shadow L
    pub ix: u16,     // Index register X
    pub iy: u16,     // Index register Y
    pub sp: u16,     // Stack pointer
    pub pc: u16,     // Program counter
    pub i: u8,       // Interrupt vector base
    pub r: u8,       // Memory refresh counter
    pub iff1: bool,  // Interrupt enable flip-flop 1
    pub iff2: bool,  // Interrupt enable flip-flop 2
    pub im: u8,      // Interrupt mode (0, 1, 2)
    pub memptr: u16, // Internal WZ register
    pub p: bool,     // Last instruction was LD A,I or LD A,R
    pub q: u8,       // Flags written by the last instruction, 0 otherwise
    pub halted: bool,
}

/// Synacor VM state snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SynacorState {
    pub registers: [u16; 8],
    pub pc: u16, // Word address
    pub stack: Vec<u16>,
    pub halted: bool,
}

/// Little Man Computer state snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct LmcState {
    pub accumulator: u16,
    pub negative: bool,
    pub pc: u8, // Mailbox number
    pub halted: bool,
}

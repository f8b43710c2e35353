use crate::core::bus::Bus;
use crate::core::debug::{CpuView, DisassembledLine};
use crate::core::error::EmuResult;

/// An interrupt request as seen on the CPU pins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    /// INT/INTR with the byte the device drives onto the data bus during
    /// acknowledge: an RST opcode for the 8080 and Z80 mode 0, the low
    /// vector byte for Z80 mode 2. Ignored by Z80 mode 1.
    Maskable(u8),
    /// Z80 non-maskable interrupt. The 8080 has no NMI pin.
    Nmi,
}

/// Instruction-level CPU interface driven by the execution controller.
pub trait Cpu: CpuStateTrait {
    /// Power-on / RESET pin state.
    fn reset(&mut self);

    /// Execute one instruction (or one interrupt acknowledge, or one idle
    /// HALT slot) and return the number of clock cycles it took.
    fn step(&mut self, bus: &mut dyn Bus) -> EmuResult<u32>;

    fn pc(&self) -> u16;
    fn set_pc(&mut self, pc: u16);
    fn sp(&self) -> u16;

    /// Raise an interrupt line. It is serviced at the start of a later
    /// `step` once the CPU accepts interrupts.
    fn signal_interrupt(&mut self, interrupt: Interrupt);

    /// True while the CPU is parked in HALT.
    fn is_sleeping(&self) -> bool;

    fn interrupts_enabled(&self) -> bool;

    /// Decode the instruction whose first byte is `code[0]`, located at
    /// `address`. Bytes past the end of `code` read as zero.
    fn disassemble(&self, code: &[u8], address: u16) -> DisassembledLine;

    /// Registers and flags for the debugger.
    fn debug_view(&self) -> CpuView;
}

// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, I8080State, LmcState, SynacorState, Z80State};

// Intel 8080
pub mod i8080;
pub use i8080::I8080;

// Zilog Z80
pub mod z80;
pub use z80::Z80;

// Synacor challenge VM
pub mod synacor;
pub use synacor::Synacor;

// Little Man Computer
pub mod lmc;
pub use lmc::Lmc;

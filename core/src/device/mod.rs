//! Peripheral chips that sit on the bus next to the CPU.

pub mod console;
pub mod namco_wsg;
pub mod shift_register;

pub use console::ConsoleInput;
pub use namco_wsg::{NamcoWsg3, Voice, VoiceRegisters};
pub use shift_register::ShiftRegister;

use thiserror::Error;

/// A device was handed a payload that violates one of its preconditions.
///
/// Raised at construction time for bad configuration, and at run time
/// for port or register payloads. Run-time errors are reported and the
/// payload is dropped without touching device state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("expected {expected} waveforms, got {actual}")]
    WaveformCount { expected: usize, actual: usize },
    #[error("expected {expected} voices, got {actual}")]
    VoiceCount { expected: usize, actual: usize },
    #[error("waveform {waveform} sample {index} is 0x{value:02X}, wider than 4 bits")]
    SampleOutOfRange { waveform: usize, index: usize, value: u8 },
    #[error("voice {voice} does not exist ({voices} configured)")]
    VoiceOutOfRange { voice: usize, voices: usize },
    #[error("shift offset {offset} is wider than 3 bits")]
    ShiftOffsetOutOfRange { offset: u8 },
}

use std::sync::mpsc::Sender;

use crate::core::controller::{Request, RunState};
use crate::core::debug::{DebugSnapshot, Debugger};
use crate::core::error::EmuResult;

/// Describes a single input button that a machine accepts.
pub struct InputButton {
    /// Machine-defined button identifier, passed to `set_input()`.
    pub id: u8,
    /// Human-readable name for display/configuration (e.g., "P1 Left", "Coin").
    pub name: &'static str,
}

/// Result of advancing a machine by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    /// The session reached its terminal state.
    Finished,
}

/// Machine-agnostic interface for emulated systems.
///
/// Each machine (CP/M harness, the Synacor and LMC consoles, Space
/// Invaders, Pac-Man) wires a CPU, memory map and devices behind an
/// execution controller. Front ends drive it frame by frame and post
/// control requests; rendering and audio output stay outside.
pub trait Machine {
    /// Registry name (e.g. "invaders").
    fn name(&self) -> &'static str;

    /// Advance one frame's worth of cycles, honouring the controller
    /// state. While Stepping, only a granted instruction executes.
    fn run_frame(&mut self) -> EmuResult<FrameOutcome>;

    /// Handle an input event. `button` is a machine-defined ID from `input_map()`.
    /// `pressed` is true for key-down, false for key-up.
    fn set_input(&mut self, button: u8, pressed: bool);

    /// Get the list of input buttons this machine accepts.
    fn input_map(&self) -> &[InputButton];

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self) -> EmuResult<()>;

    /// Post a control request; applied at the next yield point.
    fn request(&mut self, request: Request);

    /// Request channel usable from another thread.
    fn control_handle(&self) -> Sender<Request>;

    fn run_state(&self) -> RunState;

    fn debugger_mut(&mut self) -> &mut Debugger;

    fn debug_snapshot(&self) -> EmuResult<DebugSnapshot>;

    /// Copy of video memory in the board's native layout, for an
    /// external renderer.
    fn framebuffer_region(&self) -> Option<Vec<u8>> {
        None
    }

    /// Drain rendered audio samples. Returns the number written.
    fn fill_audio(&mut self, _buffer: &mut [i16]) -> usize {
        0
    }

    /// Text printed by the emulated program, for console-style machines.
    fn console_output(&self) -> Option<&str> {
        None
    }

    /// Queue keyboard text for a console-style machine. `end_of_input`
    /// marks that nothing further will be typed, so a program that waits
    /// for more afterwards finishes instead of spinning.
    fn console_input(&mut self, _text: &str, _end_of_input: bool) {}

    fn frame_rate_hz(&self) -> f64 {
        60.0
    }
}

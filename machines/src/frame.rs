//! Video-frame timing shared by the arcade boards.

use cathode_core::core::{EmuResult, ExecutionController};
use cathode_core::cpu::Cpu;

/// Position inside a video frame, in CPU cycles.
///
/// The position survives across `run_frame` calls, so a frame cut short by
/// a breakpoint or by single-stepping resumes where it stopped and each
/// mark still fires exactly once.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    length: u64,
    position: u64,
}

impl FrameTimer {
    pub fn new(length: u64) -> Self {
        Self {
            length,
            position: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Run until the first of `marks` past the current position (the frame
    /// end if none is left). `marks` are ascending cycle offsets.
    ///
    /// Returns the mark reached, or `None` when the controller stopped
    /// executing first. Reaching the frame end wraps the position.
    pub fn run_to_next_mark<C: Cpu>(
        &mut self,
        controller: &mut ExecutionController<C>,
        marks: &[u64],
    ) -> EmuResult<Option<u64>> {
        let target = marks
            .iter()
            .copied()
            .find(|&mark| mark > self.position && mark < self.length)
            .unwrap_or(self.length);

        self.position += controller.run_for(target - self.position)?;
        if self.position < target {
            return Ok(None);
        }
        if target == self.length {
            self.position -= self.length;
        }
        Ok(Some(target))
    }
}

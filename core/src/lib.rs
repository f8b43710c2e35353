pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::machine::{FrameOutcome, InputButton, Machine};
    pub use crate::core::{
        Bus, EmuError, EmuResult, EmulatorMemory, ExecutionController, Request, RunState,
        SystemBus,
    };
    pub use crate::cpu::{Cpu, Interrupt};
}

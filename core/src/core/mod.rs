pub mod bus;
pub mod controller;
pub mod debug;
pub mod error;
pub mod io;
pub mod machine;
pub mod memory;

pub use bus::{Bus, SystemBus};
pub use controller::{ExecutionController, Request, RunState};
pub use debug::{DebugSnapshot, Debugger, DisassembledLine};
pub use error::{EmuError, EmuResult};
pub use io::{ChannelObserver, IoPorts, PortObserver, PortWrite};
pub use machine::{FrameOutcome, InputButton, Machine};
pub use memory::{EmulatorMemory, MemoryMapper, MemoryStore};

//! Synacor challenge console.
//!
//! The program binary is a sequence of little-endian words loaded at
//! address 0. `out` prints a character; `in` reads from the keyboard
//! buffer fed through [`Machine::console_input`]. The session finishes on
//! `halt`, on `ret` with an empty stack, or when the program waits for a
//! character after the input has been closed.

use std::io::Write;
use std::sync::mpsc::{Receiver, Sender};

use cathode_core::core::debug::{DebugSnapshot, Debugger};
use cathode_core::core::io::{ChannelObserver, PortWrite};
use cathode_core::core::machine::{FrameOutcome, InputButton, Machine};
use cathode_core::core::{EmuResult, EmulatorMemory, ExecutionController, Request, RunState, SystemBus};
use cathode_core::cpu::synacor::{CONSOLE_DATA_PORT, CONSOLE_STATUS_PORT, Synacor};
use cathode_core::device::ConsoleInput;

use crate::registry::MachineEntry;
use crate::rom_loader::{RomLoadError, RomSet};

/// 32768 words.
const MEMORY_SIZE: usize = 0x10000;

/// Instructions run per `run_frame`.
const CYCLES_PER_FRAME: u64 = 100_000;

/// Memory image with `program` at address 0. An odd trailing byte becomes
/// the low half of a word whose high half is zero.
pub fn synacor_image(program: &[u8]) -> Result<Vec<u8>, RomLoadError> {
    if program.len() > MEMORY_SIZE {
        return Err(RomLoadError::ProgramTooLarge {
            size: program.len(),
            capacity: MEMORY_SIZE,
        });
    }
    let mut image = vec![0u8; MEMORY_SIZE];
    image[..program.len()].copy_from_slice(program);
    Ok(image)
}

pub struct SynacorMachine {
    controller: ExecutionController<Synacor>,
    output: Receiver<PortWrite>,
    keyboard: Sender<u8>,
    input_closed: bool,
    image: Vec<u8>,
    console: String,
    echo: bool,
}

impl SynacorMachine {
    pub fn new(program: &[u8]) -> Result<Self, RomLoadError> {
        let image = synacor_image(program)?;

        let (observer, output) = ChannelObserver::new(&[CONSOLE_DATA_PORT]);
        let (input, keyboard) = ConsoleInput::new(CONSOLE_DATA_PORT, CONSOLE_STATUS_PORT);
        let mut bus = SystemBus::new(EmulatorMemory::from_bytes(&image));
        bus.io.add_observer(Box::new(observer));
        bus.io.add_observer(Box::new(input));

        let mut debugger = Debugger::default();
        debugger.label_port(CONSOLE_DATA_PORT, "console");
        debugger.label_port(CONSOLE_STATUS_PORT, "console status");

        let mut controller = ExecutionController::new(Synacor::new(), bus)
            .with_debugger(debugger)
            .with_stop_on_halt(true);
        controller.start();

        log::info!("synacor: loaded {} words", program.len().div_ceil(2));
        Ok(Self {
            controller,
            output,
            keyboard,
            input_closed: false,
            image,
            console: String::new(),
            echo: false,
        })
    }

    /// Mirror console output to stdout as it is produced.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn console(&self) -> &str {
        &self.console
    }

    pub fn controller(&self) -> &ExecutionController<Synacor> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ExecutionController<Synacor> {
        &mut self.controller
    }

    fn drain_output(&mut self) {
        let start = self.console.len();
        while let Ok(write) = self.output.try_recv() {
            self.console.push(write.value as char);
        }
        if self.echo && self.console.len() > start {
            print!("{}", &self.console[start..]);
            let _ = std::io::stdout().flush();
        }
    }
}

impl Machine for SynacorMachine {
    fn name(&self) -> &'static str {
        "synacor"
    }

    fn run_frame(&mut self) -> EmuResult<FrameOutcome> {
        let result = self.controller.run_for(CYCLES_PER_FRAME);
        self.drain_output();
        result?;

        if self.input_closed && self.controller.cpu().awaiting_input && !self.controller.is_stopped() {
            log::info!("synacor: waiting for input after the end of input, stopping");
            self.controller.request(Request::Stop);
        }
        Ok(if self.controller.is_stopped() {
            FrameOutcome::Finished
        } else {
            FrameOutcome::Continue
        })
    }

    fn set_input(&mut self, _button: u8, _pressed: bool) {}

    fn input_map(&self) -> &[InputButton] {
        &[]
    }

    fn reset(&mut self) -> EmuResult<()> {
        self.controller.reset();
        for (address, &byte) in self.image.iter().enumerate() {
            self.controller.bus_mut().memory.direct_write(address as u16, byte)?;
        }
        while self.output.try_recv().is_ok() {}
        self.console.clear();
        Ok(())
    }

    fn request(&mut self, request: Request) {
        self.controller.request(request);
    }

    fn control_handle(&self) -> Sender<Request> {
        self.controller.handle()
    }

    fn run_state(&self) -> RunState {
        self.controller.state()
    }

    fn debugger_mut(&mut self) -> &mut Debugger {
        self.controller.debugger_mut()
    }

    fn debug_snapshot(&self) -> EmuResult<DebugSnapshot> {
        self.controller.snapshot()
    }

    fn console_output(&self) -> Option<&str> {
        Some(&self.console)
    }

    fn console_input(&mut self, text: &str, end_of_input: bool) {
        for byte in text.bytes() {
            if self.keyboard.send(byte).is_err() {
                log::warn!("synacor: keyboard buffer gone, input dropped");
                break;
            }
        }
        self.input_closed |= end_of_input;
    }
}

// ---------------------------------------------------------------------------
// Machine registry
// ---------------------------------------------------------------------------

fn create_synacor(rom_set: &RomSet) -> Result<Box<dyn Machine>, RomLoadError> {
    Ok(Box::new(SynacorMachine::new(rom_set.single()?)?))
}

inventory::submit! {
    MachineEntry::new("synacor", "Synacor challenge VM binary", create_synacor)
}

//! Little Man Computer console.
//!
//! The program is LMC assembly source, assembled into the 100 mailboxes
//! on load. OUT prints the accumulator as a decimal line and OTC prints it
//! as a character. INP takes the next number from the keyboard buffer;
//! [`Machine::console_input`] accepts whitespace-separated decimals.

use std::io::Write;
use std::sync::mpsc::{Receiver, Sender};

use cathode_core::core::debug::{DebugSnapshot, Debugger};
use cathode_core::core::io::{ChannelObserver, PortWrite};
use cathode_core::core::machine::{FrameOutcome, InputButton, Machine};
use cathode_core::core::{EmuResult, EmulatorMemory, ExecutionController, Request, RunState, SystemBus};
use cathode_core::cpu::lmc::{self, DATA_PORT, Lmc, MAILBOXES, NUMBER_PORT, STATUS_PORT, WORD_LIMIT};
use cathode_core::device::ConsoleInput;

use crate::registry::MachineEntry;
use crate::rom_loader::{RomLoadError, RomSet};

const MEMORY_SIZE: usize = MAILBOXES as usize * 2;

/// Instructions run per `run_frame`.
const CYCLES_PER_FRAME: u64 = 10_000;

/// Mailbox words laid out little-endian, padded to all 100 mailboxes.
pub fn lmc_image(words: &[u16]) -> Result<Vec<u8>, RomLoadError> {
    if words.len() > MAILBOXES as usize {
        return Err(RomLoadError::ProgramTooLarge {
            size: words.len(),
            capacity: MAILBOXES as usize,
        });
    }
    let mut image = vec![0u8; MEMORY_SIZE];
    for (slot, word) in image.chunks_exact_mut(2).zip(words) {
        slot.copy_from_slice(&(word % WORD_LIMIT).to_le_bytes());
    }
    Ok(image)
}

pub struct LmcMachine {
    controller: ExecutionController<Lmc>,
    output: Receiver<PortWrite>,
    /// High byte of an OUT number waiting for its low byte.
    pending_high: Option<u8>,
    keyboard: Sender<u8>,
    input_closed: bool,
    image: Vec<u8>,
    console: String,
    echo: bool,
}

impl LmcMachine {
    /// Assemble `source` and load it.
    pub fn new(source: &str) -> Result<Self, RomLoadError> {
        Self::from_words(&lmc::assemble(source)?)
    }

    pub fn from_words(words: &[u16]) -> Result<Self, RomLoadError> {
        let image = lmc_image(words)?;

        let (observer, output) = ChannelObserver::new(&[DATA_PORT, NUMBER_PORT]);
        let (input, keyboard) = ConsoleInput::new(DATA_PORT, STATUS_PORT);
        let mut bus = SystemBus::new(EmulatorMemory::from_bytes(&image));
        bus.io.add_observer(Box::new(observer));
        bus.io.add_observer(Box::new(input));

        let mut debugger = Debugger::default();
        debugger.label_port(DATA_PORT, "console");
        debugger.label_port(STATUS_PORT, "console status");
        debugger.label_port(NUMBER_PORT, "number out");

        let mut controller = ExecutionController::new(Lmc::new(), bus)
            .with_debugger(debugger)
            .with_stop_on_halt(true);
        controller.start();

        log::info!("lmc: loaded {} mailboxes", words.len());
        Ok(Self {
            controller,
            output,
            pending_high: None,
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

    pub fn controller(&self) -> &ExecutionController<Lmc> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ExecutionController<Lmc> {
        &mut self.controller
    }

    fn drain_output(&mut self) {
        let start = self.console.len();
        while let Ok(write) = self.output.try_recv() {
            match (write.port, self.pending_high.take()) {
                (DATA_PORT, _) => self.console.push(write.value as char),
                (NUMBER_PORT, None) => self.pending_high = Some(write.value),
                (NUMBER_PORT, Some(high)) => {
                    let number = u16::from_be_bytes([high, write.value]);
                    self.console.push_str(&format!("{number}\n"));
                }
                _ => {}
            }
        }
        if self.echo && self.console.len() > start {
            print!("{}", &self.console[start..]);
            let _ = std::io::stdout().flush();
        }
    }
}

impl Machine for LmcMachine {
    fn name(&self) -> &'static str {
        "lmc"
    }

    fn run_frame(&mut self) -> EmuResult<FrameOutcome> {
        let result = self.controller.run_for(CYCLES_PER_FRAME);
        self.drain_output();
        result?;

        if self.input_closed && self.controller.cpu().awaiting_input && !self.controller.is_stopped() {
            log::info!("lmc: INP after the end of input, stopping");
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
        self.pending_high = None;
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
        for token in text.split_whitespace() {
            let Ok(number) = token.parse::<u16>() else {
                log::warn!("lmc: ignoring non-numeric input {token:?}");
                continue;
            };
            let [high, low] = (number % WORD_LIMIT).to_be_bytes();
            if self.keyboard.send(high).and_then(|()| self.keyboard.send(low)).is_err() {
                log::warn!("lmc: keyboard buffer gone, input dropped");
                break;
            }
        }
        self.input_closed |= end_of_input;
    }
}

// ---------------------------------------------------------------------------
// Machine registry
// ---------------------------------------------------------------------------

fn create_lmc(rom_set: &RomSet) -> Result<Box<dyn Machine>, RomLoadError> {
    let source = std::str::from_utf8(rom_set.single()?)?;
    Ok(Box::new(LmcMachine::new(source)?))
}

inventory::submit! {
    MachineEntry::new("lmc", "Little Man Computer assembly program", create_lmc)
}

//! CP/M test harness for 8080 and Z80 exerciser programs.
//!
//! There is no real CP/M here. The program is loaded at 0x0100 and the two
//! entry points a test program uses are patched with OUT instructions:
//!
//! ```text
//! 0x0000  OUT 0        warm boot: the program is done
//! 0x0005  OUT 1 ; RET  BDOS call, serviced from C and DE
//! ```
//!
//! Only console output is supported: function 2 prints E, function 9
//! prints the `$`-terminated string at DE.

use std::io::Write;
use std::sync::mpsc::{Receiver, Sender};

use cathode_core::core::debug::{DebugSnapshot, Debugger};
use cathode_core::core::io::{ChannelObserver, PortWrite};
use cathode_core::core::machine::{FrameOutcome, InputButton, Machine};
use cathode_core::core::{EmuResult, EmulatorMemory, ExecutionController, Request, RunState, SystemBus};
use cathode_core::cpu::{Cpu, I8080, Z80};

use crate::registry::MachineEntry;
use crate::rom_loader::{RomLoadError, RomSet};

pub const PROGRAM_START: u16 = 0x0100;
const MEMORY_SIZE: usize = 0x10000;

const FINISH_PORT: u8 = 0;
const BDOS_PORT: u8 = 1;

const BDOS_CONSOLE_OUTPUT: u8 = 2;
const BDOS_PRINT_STRING: u8 = 9;

/// Cycles run per `run_frame`. CP/M has no video, so this only bounds how
/// long the front end waits between yield points.
const CYCLES_PER_FRAME: u64 = 100_000;

/// CPU registers a BDOS call passes its arguments in.
pub trait BdosRegisters {
    /// Function number, register C.
    fn bdos_function(&self) -> u8;
    /// Parameter, register pair DE.
    fn bdos_parameter(&self) -> u16;
}

impl BdosRegisters for I8080 {
    fn bdos_function(&self) -> u8 {
        self.c
    }

    fn bdos_parameter(&self) -> u16 {
        self.get_de()
    }
}

impl BdosRegisters for Z80 {
    fn bdos_function(&self) -> u8 {
        self.c
    }

    fn bdos_parameter(&self) -> u16 {
        self.get_de()
    }
}

/// 64 KiB memory image: zero page, program at 0x0100, zero fill, with the
/// warm-boot and BDOS entry points patched in.
pub fn cpm_image(program: &[u8]) -> Result<Vec<u8>, RomLoadError> {
    let start = PROGRAM_START as usize;
    let capacity = MEMORY_SIZE - start;
    if program.len() > capacity {
        return Err(RomLoadError::ProgramTooLarge {
            size: program.len(),
            capacity,
        });
    }

    let mut image = vec![0u8; MEMORY_SIZE];
    image[start..start + program.len()].copy_from_slice(program);
    image[0x0000..0x0002].copy_from_slice(&[0xD3, FINISH_PORT]);
    image[0x0005..0x0008].copy_from_slice(&[0xD3, BDOS_PORT, 0xC9]);
    Ok(image)
}

pub struct CpmMachine<C: Cpu + BdosRegisters> {
    name: &'static str,
    controller: ExecutionController<C>,
    port_writes: Receiver<PortWrite>,
    image: Vec<u8>,
    console: String,
    echo: bool,
}

impl<C: Cpu + BdosRegisters> CpmMachine<C> {
    /// Load `program` and start the session.
    pub fn new(name: &'static str, mut cpu: C, program: &[u8]) -> Result<Self, RomLoadError> {
        let image = cpm_image(program)?;

        let (observer, port_writes) = ChannelObserver::new(&[FINISH_PORT, BDOS_PORT]);
        let mut bus = SystemBus::new(EmulatorMemory::from_bytes(&image));
        bus.io.add_observer(Box::new(observer));

        cpu.reset();
        cpu.set_pc(PROGRAM_START);

        let mut debugger = Debugger::default();
        debugger.label_port(FINISH_PORT, "warm boot");
        debugger.label_port(BDOS_PORT, "bdos");

        let mut controller = ExecutionController::new(cpu, bus)
            .with_debugger(debugger)
            .with_stop_on_halt(true);
        controller.start();

        log::info!("{name}: loaded {} byte program", program.len());
        Ok(Self {
            name,
            controller,
            port_writes,
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

    pub fn controller(&self) -> &ExecutionController<C> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ExecutionController<C> {
        &mut self.controller
    }

    /// Run until the program warm-boots, halts or fails.
    pub fn run_to_completion(&mut self) -> EmuResult<()> {
        while self.run_frame()? == FrameOutcome::Continue {
            if self.controller.state() != RunState::Running {
                break;
            }
        }
        Ok(())
    }

    fn service_ports(&mut self) {
        while let Ok(write) = self.port_writes.try_recv() {
            match write.port {
                FINISH_PORT => {
                    log::info!("{}: warm boot, program finished", self.name);
                    self.controller.request(Request::Stop);
                }
                BDOS_PORT => self.bdos_call(),
                _ => {}
            }
        }
    }

    fn bdos_call(&mut self) {
        let function = self.controller.cpu().bdos_function();
        let parameter = self.controller.cpu().bdos_parameter();
        let text = match function {
            BDOS_CONSOLE_OUTPUT => (parameter as u8 as char).to_string(),
            BDOS_PRINT_STRING => self.dollar_string(parameter),
            _ => {
                log::debug!("{}: BDOS function {function} ignored", self.name);
                return;
            }
        };
        if self.echo {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
        self.console.push_str(&text);
    }

    /// Bytes from `address` up to, not including, the next `$`.
    fn dollar_string(&self, address: u16) -> String {
        let memory = &self.controller.bus().memory;
        let mut text = String::new();
        let mut address = address;
        for _ in 0..MEMORY_SIZE {
            match memory.direct_read(address) {
                Ok(b'$') | Err(_) => break,
                Ok(byte) => text.push(byte as char),
            }
            address = address.wrapping_add(1);
        }
        text
    }
}

impl<C: Cpu + BdosRegisters> Machine for CpmMachine<C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run_frame(&mut self) -> EmuResult<FrameOutcome> {
        let mut spent = 0u64;
        while spent < CYCLES_PER_FRAME {
            let Some(cycles) = self.controller.tick()? else {
                break;
            };
            spent += cycles as u64;
            // BDOS reads C and DE, so service before the next instruction.
            self.service_ports();
            if self.controller.state() != RunState::Running {
                break;
            }
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
        self.controller.cpu_mut().set_pc(PROGRAM_START);
        while self.port_writes.try_recv().is_ok() {}
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
}

// ---------------------------------------------------------------------------
// Machine registry
// ---------------------------------------------------------------------------

fn create_cpm8080(rom_set: &RomSet) -> Result<Box<dyn Machine>, RomLoadError> {
    let machine = CpmMachine::new("cpm8080", I8080::new(), rom_set.single()?)?;
    Ok(Box::new(machine))
}

fn create_cpmz80(rom_set: &RomSet) -> Result<Box<dyn Machine>, RomLoadError> {
    let machine = CpmMachine::new("cpmz80", Z80::new(), rom_set.single()?)?;
    Ok(Box::new(machine))
}

inventory::submit! {
    MachineEntry::new("cpm8080", "CP/M test program on an Intel 8080", create_cpm8080)
}

inventory::submit! {
    MachineEntry::new("cpmz80", "CP/M test program on a Zilog Z80", create_cpmz80)
}

use std::sync::mpsc::Sender;

use cathode_core::core::debug::{DebugSnapshot, Debugger};
use cathode_core::core::machine::{FrameOutcome, InputButton, Machine};
use cathode_core::core::{EmuResult, EmulatorMemory, ExecutionController, Request, RunState, SystemBus};
use cathode_core::cpu::{Cpu, I8080, Interrupt};
use cathode_core::device::ShiftRegister;
use cathode_core::device::shift_register::{DATA_PORT, OFFSET_PORT};

use crate::frame::FrameTimer;
use crate::registry::MachineEntry;
use crate::rom_loader::{RomEntry, RomLoadError, RomRegion, RomSet};

// ---------------------------------------------------------------------------
// Space Invaders ROM definitions ("invaders" Midway set)
// ---------------------------------------------------------------------------

/// Program ROM: 8KB at 0x0000-0x1FFF (four 2KB chips).
pub static INVADERS_PROGRAM_ROM: RomRegion = RomRegion {
    size: 0x2000,
    entries: &[
        RomEntry {
            name: "invaders.h",
            size: 0x0800,
            offset: 0x0000,
            crc32: &[0x734f5ad8],
        },
        RomEntry {
            name: "invaders.g",
            size: 0x0800,
            offset: 0x0800,
            crc32: &[0x6bfaca4a],
        },
        RomEntry {
            name: "invaders.f",
            size: 0x0800,
            offset: 0x1000,
            crc32: &[0x0ccead96],
        },
        RomEntry {
            name: "invaders.e",
            size: 0x0800,
            offset: 0x1800,
            crc32: &[0x14e538b0],
        },
    ],
};

// ---------------------------------------------------------------------------
// Memory map
// ---------------------------------------------------------------------------
// 0x0000-0x1FFF  program ROM
// 0x2000-0x23FF  work RAM
// 0x2400-0x3FFF  video RAM, 1bpp, 256x224 rotated
// 0x4000-0xFFFF  RAM mirrors

const RAM_START: usize = 0x2000;
const RAM_END: usize = 0x4000;
pub const VRAM_START: usize = 0x2400;
const ADDRESS_SPACE: usize = 0x10000;

// ---------------------------------------------------------------------------
// I/O ports
// ---------------------------------------------------------------------------
// IN 0  unused by the game
// IN 1  coin, start buttons, player 1 controls
// IN 2  dip switches, tilt, player 2 controls
// IN 3  shift register result
// OUT 2 shift offset      OUT 4 shift data
// OUT 3 sound latch 1     OUT 5 sound latch 2
// OUT 6 watchdog

pub const PORT_INPUTS_0: u8 = 0;
pub const PORT_INPUTS_1: u8 = 1;
pub const PORT_INPUTS_2: u8 = 2;
pub const PORT_SOUND_1: u8 = 3;
pub const PORT_SOUND_2: u8 = 5;
pub const PORT_WATCHDOG: u8 = 6;

/// Bit 3 of port 1 is tied high on the board.
const PORT1_DEFAULT: u8 = 0b0000_1000;

// ---------------------------------------------------------------------------
// Input button IDs
// ---------------------------------------------------------------------------
pub const INPUT_COIN: u8 = 0;
pub const INPUT_P1_START: u8 = 1;
pub const INPUT_P2_START: u8 = 2;
pub const INPUT_P1_FIRE: u8 = 3;
pub const INPUT_P1_LEFT: u8 = 4;
pub const INPUT_P1_RIGHT: u8 = 5;
pub const INPUT_P2_FIRE: u8 = 6;
pub const INPUT_P2_LEFT: u8 = 7;
pub const INPUT_P2_RIGHT: u8 = 8;
pub const INPUT_TILT: u8 = 9;

const INVADERS_INPUT_MAP: &[InputButton] = &[
    InputButton { id: INPUT_COIN, name: "Coin" },
    InputButton { id: INPUT_P1_START, name: "P1 Start" },
    InputButton { id: INPUT_P2_START, name: "P2 Start" },
    InputButton { id: INPUT_P1_FIRE, name: "P1 Fire" },
    InputButton { id: INPUT_P1_LEFT, name: "P1 Left" },
    InputButton { id: INPUT_P1_RIGHT, name: "P1 Right" },
    InputButton { id: INPUT_P2_FIRE, name: "P2 Fire" },
    InputButton { id: INPUT_P2_LEFT, name: "P2 Left" },
    InputButton { id: INPUT_P2_RIGHT, name: "P2 Right" },
    InputButton { id: INPUT_TILT, name: "Tilt" },
];

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
// CPU clock:  2 MHz
// Frame:      2000000 / 60 = 33333 cycles
// RST 1 (0xCF) when the beam reaches mid-screen, RST 2 (0xD7) at VBLANK.

const CPU_CLOCK_HZ: u64 = 2_000_000;
pub const CYCLES_PER_FRAME: u64 = CPU_CLOCK_HZ / 60;
pub const HALF_FRAME: u64 = CYCLES_PER_FRAME / 2;

const RST_1: u8 = 0xCF;
const RST_2: u8 = 0xD7;

// ---------------------------------------------------------------------------
// Dip switches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lives {
    #[default]
    Three,
    Four,
    Five,
    Six,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BonusLifeAt {
    #[default]
    Points1500,
    Points1000,
}

/// Port 2 dip switch bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvadersDipSwitches {
    pub lives: Lives,
    pub bonus_life_at: BonusLifeAt,
    /// Show coin info on the attract screen.
    pub coin_info: bool,
}

impl Default for InvadersDipSwitches {
    fn default() -> Self {
        Self {
            lives: Lives::Three,
            bonus_life_at: BonusLifeAt::Points1500,
            coin_info: true,
        }
    }
}

impl InvadersDipSwitches {
    /// Port 2 bits 0, 1, 3 and 7.
    pub fn to_port_bits(self) -> u8 {
        let lives = match self.lives {
            Lives::Three => 0b00,
            Lives::Four => 0b01,
            Lives::Five => 0b10,
            Lives::Six => 0b11,
        };
        let bonus = match self.bonus_life_at {
            BonusLifeAt::Points1500 => 0,
            BonusLifeAt::Points1000 => 1 << 3,
        };
        let coin_info = if self.coin_info { 0 } else { 1 << 7 };
        lives | bonus | coin_info
    }
}

/// Space Invaders (Taito/Midway, 1978)
///
/// Hardware: Intel 8080 @ 2 MHz, MB14241 shift register, discrete sound.
/// Video: 256x224 1bpp bitmap at 0x2400, displayed rotated 90° CCW.
pub struct InvadersMachine {
    controller: ExecutionController<I8080>,
    timer: FrameTimer,
    dip_switches: InvadersDipSwitches,
    // Active-high input bits, before dip switches are merged in.
    port1: u8,
    port2: u8,
}

impl InvadersMachine {
    /// Build the board around an assembled 8KB program image.
    pub fn new(program: &[u8], dip_switches: InvadersDipSwitches) -> Result<Self, RomLoadError> {
        if program.len() > RAM_START {
            return Err(RomLoadError::ProgramTooLarge {
                size: program.len(),
                capacity: RAM_START,
            });
        }

        let mut memory = EmulatorMemory::new();
        let mut rom = program.to_vec();
        rom.resize(RAM_START, 0);
        memory.add(&rom);
        memory.add(&[0u8; RAM_END - RAM_START]);
        while memory.size() < ADDRESS_SPACE {
            memory.add_link(RAM_START, RAM_END)?;
        }

        let mut bus = SystemBus::new(memory);
        bus.io.add_observer(Box::new(ShiftRegister::new()));

        let mut debugger = Debugger::default();
        debugger.label_port(OFFSET_PORT, "shift (change offset)");
        debugger.label_port(PORT_SOUND_1, "out sound 1");
        debugger.label_port(DATA_PORT, "shift (do shift)");
        debugger.label_port(PORT_SOUND_2, "out sound 2");
        debugger.label_port(PORT_WATCHDOG, "watchdog");

        let mut controller = ExecutionController::new(I8080::new(), bus).with_debugger(debugger);
        controller.start();

        let mut machine = Self {
            controller,
            timer: FrameTimer::new(CYCLES_PER_FRAME),
            dip_switches,
            port1: PORT1_DEFAULT,
            port2: 0,
        };
        machine.latch_inputs();
        log::info!("invaders: {dip_switches:?}");
        Ok(machine)
    }

    /// Build the board from the four MAME dumps, verifying checksums.
    pub fn from_rom_set(
        rom_set: &RomSet,
        dip_switches: InvadersDipSwitches,
    ) -> Result<Self, RomLoadError> {
        let program = INVADERS_PROGRAM_ROM.load(rom_set)?;
        Self::new(&program, dip_switches)
    }

    pub fn controller(&self) -> &ExecutionController<I8080> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ExecutionController<I8080> {
        &mut self.controller
    }

    pub fn dip_switches(&self) -> InvadersDipSwitches {
        self.dip_switches
    }

    /// Last values written to the two sound latches.
    pub fn sound_latches(&self) -> (u8, u8) {
        let io = &self.controller.bus().io;
        (io.output(PORT_SOUND_1), io.output(PORT_SOUND_2))
    }

    /// Cycles into the current frame.
    pub fn frame_position(&self) -> u64 {
        self.timer.position()
    }

    fn latch_inputs(&mut self) {
        let io = &mut self.controller.bus_mut().io;
        io.set_input(PORT_INPUTS_0, 0);
        io.set_input(PORT_INPUTS_1, self.port1);
        io.set_input(PORT_INPUTS_2, self.port2 | self.dip_switches.to_port_bits());
    }

    fn screen_interrupt(&mut self, rst: u8) {
        // The board only asserts INT while the CPU accepts it.
        if self.controller.cpu().interrupts_enabled() {
            self.controller.interrupt(Interrupt::Maskable(rst));
        }
    }
}

impl Machine for InvadersMachine {
    fn name(&self) -> &'static str {
        "invaders"
    }

    fn run_frame(&mut self) -> EmuResult<FrameOutcome> {
        if self.timer.position() == 0 {
            self.controller.bus_mut().io.clear_activity();
        }

        loop {
            match self
                .timer
                .run_to_next_mark(&mut self.controller, &[HALF_FRAME])?
            {
                Some(HALF_FRAME) => self.screen_interrupt(RST_1),
                Some(_) => {
                    self.screen_interrupt(RST_2);
                    break;
                }
                None => break,
            }
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

    fn set_input(&mut self, button: u8, pressed: bool) {
        match button {
            INPUT_COIN => set_bit_active_high(&mut self.port1, 0, pressed),
            INPUT_P2_START => set_bit_active_high(&mut self.port1, 1, pressed),
            INPUT_P1_START => set_bit_active_high(&mut self.port1, 2, pressed),
            INPUT_P1_FIRE => set_bit_active_high(&mut self.port1, 4, pressed),
            INPUT_P1_LEFT => set_bit_active_high(&mut self.port1, 5, pressed),
            INPUT_P1_RIGHT => set_bit_active_high(&mut self.port1, 6, pressed),
            INPUT_TILT => set_bit_active_high(&mut self.port2, 2, pressed),
            INPUT_P2_FIRE => set_bit_active_high(&mut self.port2, 4, pressed),
            INPUT_P2_LEFT => set_bit_active_high(&mut self.port2, 5, pressed),
            INPUT_P2_RIGHT => set_bit_active_high(&mut self.port2, 6, pressed),
            _ => return,
        }
        self.latch_inputs();
    }

    fn input_map(&self) -> &[InputButton] {
        INVADERS_INPUT_MAP
    }

    fn reset(&mut self) -> EmuResult<()> {
        self.controller.reset();
        let memory = &mut self.controller.bus_mut().memory;
        for address in RAM_START..RAM_END {
            memory.direct_write(address as u16, 0)?;
        }
        self.timer.reset();
        self.port1 = PORT1_DEFAULT;
        self.port2 = 0;
        self.latch_inputs();
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

    fn framebuffer_region(&self) -> Option<Vec<u8>> {
        self.controller.bus().memory.to_vec(VRAM_START, RAM_END).ok()
    }

    fn frame_rate_hz(&self) -> f64 {
        CPU_CLOCK_HZ as f64 / CYCLES_PER_FRAME as f64
    }
}

/// Active-high bit manipulation: set bit on press, clear bit on release.
fn set_bit_active_high(reg: &mut u8, bit: u8, pressed: bool) {
    if pressed {
        *reg |= 1 << bit;
    } else {
        *reg &= !(1 << bit);
    }
}

// ---------------------------------------------------------------------------
// Machine registry
// ---------------------------------------------------------------------------

fn create_machine(rom_set: &RomSet) -> Result<Box<dyn Machine>, RomLoadError> {
    let machine = InvadersMachine::from_rom_set(rom_set, InvadersDipSwitches::default())?;
    Ok(Box::new(machine))
}

inventory::submit! {
    MachineEntry::new("invaders", "Space Invaders (Midway, 1978), Intel 8080", create_machine)
}

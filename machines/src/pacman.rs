use std::any::Any;
use std::collections::VecDeque;
use std::sync::mpsc::Sender;

use cathode_core::core::debug::{DebugSnapshot, Debugger};
use cathode_core::core::machine::{FrameOutcome, InputButton, Machine};
use cathode_core::core::memory::{MemoryMapper, MemoryStore};
use cathode_core::core::{EmuResult, EmulatorMemory, ExecutionController, Request, RunState, SystemBus};
use cathode_core::cpu::{Cpu, Interrupt, Z80};
use cathode_core::device::namco_wsg::BUFFER_SIZE;
use cathode_core::device::{NamcoWsg3, VoiceRegisters};

use crate::frame::FrameTimer;
use crate::registry::MachineEntry;
use crate::rom_loader::{RomEntry, RomLoadError, RomRegion, RomSet};

// ---------------------------------------------------------------------------
// Pac-Man ROM definitions ("pacman" Midway set)
// ---------------------------------------------------------------------------

/// Program ROM: 16KB at 0x0000-0x3FFF (four 4KB chips).
pub static PACMAN_PROGRAM_ROM: RomRegion = RomRegion {
    size: 0x4000,
    entries: &[
        RomEntry {
            name: "pacman.6e",
            size: 0x1000,
            offset: 0x0000,
            crc32: &[0xc1e6ab10],
        },
        RomEntry {
            name: "pacman.6f",
            size: 0x1000,
            offset: 0x1000,
            crc32: &[0x1a6fb2d4],
        },
        RomEntry {
            name: "pacman.6h",
            size: 0x1000,
            offset: 0x2000,
            crc32: &[0xbcdd1beb],
        },
        RomEntry {
            name: "pacman.6j",
            size: 0x1000,
            offset: 0x3000,
            crc32: &[0x817d94e3],
        },
    ],
};

/// Sound waveform PROM (8 waveforms x 32 samples x 4 bits).
pub static PACMAN_SOUND_PROM: RomRegion = RomRegion {
    size: 0x0100,
    entries: &[RomEntry {
        name: "82s126.1m",
        size: 0x0100,
        offset: 0x0000,
        crc32: &[0xa9cc86bf],
    }],
};

// ---------------------------------------------------------------------------
// Memory map (A15 not connected)
// ---------------------------------------------------------------------------
// 0x0000-0x3FFF  program ROM
// 0x4000-0x43FF  video RAM (tile codes)
// 0x4400-0x47FF  color RAM
// 0x4800-0x4BFF  open bus, reads 0xBF
// 0x4C00-0x4FFF  work RAM, sprite attributes at 0x4FF0
// 0x5000 page    memory-mapped I/O, see PacmanIo

const ROM_SIZE: usize = 0x4000;
const RAM_SIZE: usize = 0x1000;
const HALF_SPACE: usize = 0x8000;
pub const VRAM_START: usize = 0x4000;
pub const VRAM_END: usize = 0x4800;

// ---------------------------------------------------------------------------
// Input button IDs
// ---------------------------------------------------------------------------
pub const INPUT_P1_UP: u8 = 0;
pub const INPUT_P1_LEFT: u8 = 1;
pub const INPUT_P1_RIGHT: u8 = 2;
pub const INPUT_P1_DOWN: u8 = 3;
pub const INPUT_COIN: u8 = 4;
pub const INPUT_P1_START: u8 = 5;
pub const INPUT_P2_START: u8 = 6;
pub const INPUT_P2_UP: u8 = 7;
pub const INPUT_P2_LEFT: u8 = 8;
pub const INPUT_P2_RIGHT: u8 = 9;
pub const INPUT_P2_DOWN: u8 = 10;

const PACMAN_INPUT_MAP: &[InputButton] = &[
    InputButton { id: INPUT_P1_UP, name: "P1 Up" },
    InputButton { id: INPUT_P1_LEFT, name: "P1 Left" },
    InputButton { id: INPUT_P1_RIGHT, name: "P1 Right" },
    InputButton { id: INPUT_P1_DOWN, name: "P1 Down" },
    InputButton { id: INPUT_COIN, name: "Coin" },
    InputButton { id: INPUT_P1_START, name: "P1 Start" },
    InputButton { id: INPUT_P2_START, name: "P2 Start" },
    InputButton { id: INPUT_P2_UP, name: "P2 Up" },
    InputButton { id: INPUT_P2_LEFT, name: "P2 Left" },
    InputButton { id: INPUT_P2_RIGHT, name: "P2 Right" },
    InputButton { id: INPUT_P2_DOWN, name: "P2 Down" },
];

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
// CPU clock:     18.432 MHz / 6 = 3.072 MHz
// Scanline:      192 CPU cycles
// Frame:         264 lines = 50688 cycles, about 60.61 Hz
// VBLANK:        line 224

const CPU_CLOCK_HZ: u64 = 3_072_000;
const CYCLES_PER_SCANLINE: u64 = 192;
const VISIBLE_LINES: u64 = 224;
const TOTAL_LINES: u64 = 264;
pub const CYCLES_PER_FRAME: u64 = TOTAL_LINES * CYCLES_PER_SCANLINE;
pub const VBLANK_CYCLE: u64 = VISIBLE_LINES * CYCLES_PER_SCANLINE;

/// OUT to this port latches the IM 2 vector byte.
pub const VECTOR_PORT: u8 = 0x00;

/// Rendered audio kept for the front end, in buffers.
const AUDIO_QUEUE_BUFFERS: usize = 4;

/// The board resets after this many VBLANKs without a watchdog write.
pub const WATCHDOG_FRAMES: u32 = 16;

// ---------------------------------------------------------------------------
// Dip switches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coinage {
    FreePlay,
    #[default]
    OneCoinOneGame,
    OneCoinTwoGames,
    TwoCoinsOneGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lives {
    One,
    Two,
    #[default]
    Three,
    Five,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BonusLifeAt {
    #[default]
    Points10000,
    Points15000,
    Points20000,
    None,
}

/// DSW1 at 0x5080.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacmanDipSwitches {
    pub coinage: Coinage,
    pub lives: Lives,
    pub bonus_life_at: BonusLifeAt,
    pub hard: bool,
    pub alternate_ghost_names: bool,
}

impl PacmanDipSwitches {
    pub fn to_byte(self) -> u8 {
        let coinage = match self.coinage {
            Coinage::FreePlay => 0,
            Coinage::OneCoinOneGame => 1,
            Coinage::OneCoinTwoGames => 2,
            Coinage::TwoCoinsOneGame => 3,
        };
        let lives = match self.lives {
            Lives::One => 0,
            Lives::Two => 1,
            Lives::Three => 2,
            Lives::Five => 3,
        };
        let bonus = match self.bonus_life_at {
            BonusLifeAt::Points10000 => 0,
            BonusLifeAt::Points15000 => 1,
            BonusLifeAt::Points20000 => 2,
            BonusLifeAt::None => 3,
        };
        // Difficulty and ghost names are active low.
        let difficulty = if self.hard { 0 } else { 1 << 6 };
        let ghost_names = if self.alternate_ghost_names { 0 } else { 1 << 7 };
        coinage | (lives << 2) | (bonus << 4) | difficulty | ghost_names
    }
}

// ---------------------------------------------------------------------------
// Memory-mapped I/O
// ---------------------------------------------------------------------------

/// The 0x5000 page: input buffers, the 74LS259 latch, WSG registers,
/// sprite coordinates and the watchdog. Everything else falls through to
/// the backing store.
#[derive(Debug, Clone)]
pub struct PacmanIo {
    // Active low: 0xFF = all released.
    pub in0: u8,
    pub in1: u8,
    pub dip_switches: u8,

    // 74LS259 addressable latch outputs
    pub irq_enabled: bool,
    pub sound_enabled: bool,
    pub flip_screen: bool,

    pub voices: VoiceRegisters,
    pub sprite_coords: [u8; 0x10],
    /// Frames since the program last kicked the watchdog.
    pub watchdog_frames: u32,
}

impl PacmanIo {
    pub fn new(dip_switches: u8) -> Self {
        Self {
            in0: 0xFF,
            in1: 0xFF,
            dip_switches,
            irq_enabled: false,
            sound_enabled: false,
            flip_screen: false,
            voices: VoiceRegisters::new(),
            sprite_coords: [0; 0x10],
            watchdog_frames: 0,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.dip_switches);
    }

    /// The watchdog pulls the board's reset line: the latch clears, while
    /// inputs and sound registers keep their contents.
    fn watchdog_reset(&mut self) {
        self.irq_enabled = false;
        self.sound_enabled = false;
        self.flip_screen = false;
        self.watchdog_frames = 0;
    }

    /// Count one frame. True once the watchdog has run out.
    fn tick_watchdog(&mut self) -> bool {
        self.watchdog_frames += 1;
        self.watchdog_frames >= WATCHDOG_FRAMES
    }

    fn write_latch(&mut self, bit: u16, value: bool) {
        match bit {
            0 => self.irq_enabled = value,
            1 => self.sound_enabled = value,
            3 => self.flip_screen = value,
            // 2: unused, 4-5: LEDs, 6: coin lockout, 7: coin counter
            _ => {}
        }
    }
}

impl MemoryMapper for PacmanIo {
    fn read(&mut self, store: &mut MemoryStore, address: u16) -> EmuResult<u8> {
        let address = address & 0x7FFF;
        match address {
            0x0000..=0x47FF | 0x4C00..=0x4FFF => store.read(address),
            // Nothing drives the bus here; the game reads it anyway.
            0x4800..=0x4BFF => Ok(0xBF),
            0x5000..=0x503F => Ok(self.in0),
            0x5040..=0x507F => Ok(self.in1),
            0x5080..=0x50BF => Ok(self.dip_switches),
            _ => Ok(0xFF),
        }
    }

    fn write(&mut self, store: &mut MemoryStore, address: u16, value: u8) -> EmuResult<()> {
        let address = address & 0x7FFF;
        match address {
            0x4000..=0x47FF | 0x4C00..=0x4FFF => store.write(address, value)?,
            0x5000..=0x5007 => self.write_latch(address & 7, value & 1 != 0),
            0x5040..=0x505F => self.voices.write_register((address - 0x5040) as u8, value),
            0x5060..=0x506F => self.sprite_coords[(address - 0x5060) as usize] = value,
            0x50C0..=0x50FF => self.watchdog_frames = 0,
            // ROM and unmapped addresses
            _ => {}
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Pac-Man Arcade System (Namco/Midway, 1980)
///
/// Hardware: Zilog Z80 @ 3.072 MHz, Namco WSG 3-voice wavetable sound.
/// Video is left to the front end: [`Machine::framebuffer_region`] hands
/// out tile and color RAM.
pub struct PacmanMachine {
    controller: ExecutionController<Z80>,
    timer: FrameTimer,
    wsg: NamcoWsg3,
    audio: VecDeque<i16>,
}

impl PacmanMachine {
    pub fn new(
        program: &[u8],
        sound_prom: &[u8],
        dip_switches: PacmanDipSwitches,
    ) -> Result<Self, RomLoadError> {
        if program.len() > ROM_SIZE {
            return Err(RomLoadError::ProgramTooLarge {
                size: program.len(),
                capacity: ROM_SIZE,
            });
        }
        let wsg = NamcoWsg3::from_prom(sound_prom)?;

        let mut memory = EmulatorMemory::new();
        let mut rom = program.to_vec();
        rom.resize(ROM_SIZE, 0);
        memory.add(&rom);
        memory.add(&[0u8; RAM_SIZE]);
        // Backing for the I/O page so the upper half can mirror the lower.
        memory.add(&[0u8; HALF_SPACE - ROM_SIZE - RAM_SIZE]);
        memory.add_link(0, HALF_SPACE)?;
        memory.attach_memory_mapper(Box::new(PacmanIo::new(dip_switches.to_byte())));

        let mut debugger = Debugger::default();
        debugger.label_port(VECTOR_PORT, "interrupt vector");

        let mut controller =
            ExecutionController::new(Z80::new(), SystemBus::new(memory)).with_debugger(debugger);
        controller.start();

        log::info!("pacman: {dip_switches:?}");
        Ok(Self {
            controller,
            timer: FrameTimer::new(CYCLES_PER_FRAME),
            wsg,
            audio: VecDeque::with_capacity(BUFFER_SIZE * AUDIO_QUEUE_BUFFERS),
        })
    }

    /// Build the board from the MAME dumps, verifying checksums.
    pub fn from_rom_set(
        rom_set: &RomSet,
        dip_switches: PacmanDipSwitches,
    ) -> Result<Self, RomLoadError> {
        let program = PACMAN_PROGRAM_ROM.load(rom_set)?;
        let sound_prom = PACMAN_SOUND_PROM.load(rom_set)?;
        Self::new(&program, &sound_prom, dip_switches)
    }

    pub fn controller(&self) -> &ExecutionController<Z80> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ExecutionController<Z80> {
        &mut self.controller
    }

    /// The memory-mapped I/O page.
    pub fn io_mut(&mut self) -> Option<&mut PacmanIo> {
        self.controller.bus_mut().memory.mapper_mut::<PacmanIo>()
    }

    /// Samples waiting for [`Machine::fill_audio`].
    pub fn queued_samples(&self) -> usize {
        self.audio.len()
    }

    fn vblank(&mut self) {
        let vector = self.controller.bus().io.output(VECTOR_PORT);
        let irq_enabled = self.io_mut().is_some_and(|io| io.irq_enabled);
        if irq_enabled {
            self.controller.interrupt(Interrupt::Maskable(vector));
        }
    }

    fn tick_watchdog(&mut self) {
        let expired = self.io_mut().is_some_and(|io| io.tick_watchdog());
        if expired {
            log::warn!("pacman: watchdog expired after {WATCHDOG_FRAMES} frames, resetting");
            self.controller.reset();
            if let Some(io) = self.io_mut() {
                io.watchdog_reset();
            }
        }
    }

    fn render_audio(&mut self) {
        let Some(io) = self.controller.bus_mut().memory.mapper_mut::<PacmanIo>() else {
            return;
        };
        let samples = if io.sound_enabled {
            match self.wsg.next_tick(io.voices.voices_mut()) {
                Ok(samples) => samples,
                Err(e) => {
                    log::warn!("pacman: sound frame dropped: {e}");
                    return;
                }
            }
        } else {
            vec![0; BUFFER_SIZE]
        };

        self.audio.extend(samples);
        let limit = BUFFER_SIZE * AUDIO_QUEUE_BUFFERS;
        if self.audio.len() > limit {
            let excess = self.audio.len() - limit;
            self.audio.drain(..excess);
        }
    }
}

impl Machine for PacmanMachine {
    fn name(&self) -> &'static str {
        "pacman"
    }

    fn run_frame(&mut self) -> EmuResult<FrameOutcome> {
        if self.timer.position() == 0 {
            self.controller.bus_mut().io.clear_activity();
        }

        loop {
            match self
                .timer
                .run_to_next_mark(&mut self.controller, &[VBLANK_CYCLE])?
            {
                Some(VBLANK_CYCLE) => self.vblank(),
                Some(_) => {
                    self.render_audio();
                    self.tick_watchdog();
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
        let Some(io) = self.io_mut() else {
            return;
        };
        match button {
            // IN0
            INPUT_P1_UP => set_bit_active_low(&mut io.in0, 0, pressed),
            INPUT_P1_LEFT => set_bit_active_low(&mut io.in0, 1, pressed),
            INPUT_P1_RIGHT => set_bit_active_low(&mut io.in0, 2, pressed),
            INPUT_P1_DOWN => set_bit_active_low(&mut io.in0, 3, pressed),
            INPUT_COIN => set_bit_active_low(&mut io.in0, 5, pressed),
            // IN1
            INPUT_P2_UP => set_bit_active_low(&mut io.in1, 0, pressed),
            INPUT_P2_LEFT => set_bit_active_low(&mut io.in1, 1, pressed),
            INPUT_P2_RIGHT => set_bit_active_low(&mut io.in1, 2, pressed),
            INPUT_P2_DOWN => set_bit_active_low(&mut io.in1, 3, pressed),
            INPUT_P1_START => set_bit_active_low(&mut io.in1, 5, pressed),
            INPUT_P2_START => set_bit_active_low(&mut io.in1, 6, pressed),
            _ => {}
        }
    }

    fn input_map(&self) -> &[InputButton] {
        PACMAN_INPUT_MAP
    }

    fn reset(&mut self) -> EmuResult<()> {
        self.controller.reset();
        let memory = &mut self.controller.bus_mut().memory;
        for address in ROM_SIZE..ROM_SIZE + RAM_SIZE {
            memory.direct_write(address as u16, 0)?;
        }
        if let Some(io) = self.io_mut() {
            io.reset();
        }
        self.timer.reset();
        self.audio.clear();
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
        self.controller.bus().memory.to_vec(VRAM_START, VRAM_END).ok()
    }

    fn fill_audio(&mut self, buffer: &mut [i16]) -> usize {
        let count = buffer.len().min(self.audio.len());
        for (slot, sample) in buffer.iter_mut().zip(self.audio.drain(..count)) {
            *slot = sample;
        }
        count
    }

    fn frame_rate_hz(&self) -> f64 {
        CPU_CLOCK_HZ as f64 / CYCLES_PER_FRAME as f64
    }
}

/// Active-low bit manipulation: clear bit on press, set bit on release.
fn set_bit_active_low(reg: &mut u8, bit: u8, pressed: bool) {
    if pressed {
        *reg &= !(1 << bit);
    } else {
        *reg |= 1 << bit;
    }
}

// ---------------------------------------------------------------------------
// Machine registry
// ---------------------------------------------------------------------------

fn create_machine(rom_set: &RomSet) -> Result<Box<dyn Machine>, RomLoadError> {
    let machine = PacmanMachine::from_rom_set(rom_set, PacmanDipSwitches::default())?;
    Ok(Box::new(machine))
}

inventory::submit! {
    MachineEntry::new("pacman", "Pac-Man (Namco/Midway, 1980), Zilog Z80", create_machine)
}

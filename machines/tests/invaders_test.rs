use cathode_core::core::machine::{FrameOutcome, Machine};
use cathode_core::core::{Request, RunState};
use cathode_core::cpu::Cpu;
use cathode_machines::invaders::{
    BonusLifeAt, CYCLES_PER_FRAME, HALF_FRAME, INPUT_COIN, INPUT_P1_FIRE, INVADERS_PROGRAM_ROM,
    InvadersDipSwitches, InvadersMachine, Lives,
};
use cathode_machines::rom_loader::{RomLoadError, RomSet};

/// Place code fragments into an 8KB program image.
fn program(fragments: &[(u16, &[u8])]) -> Vec<u8> {
    let mut rom = vec![0u8; 0x2000];
    for &(address, code) in fragments {
        let start = address as usize;
        rom[start..start + code.len()].copy_from_slice(code);
    }
    rom
}

fn machine(fragments: &[(u16, &[u8])]) -> InvadersMachine {
    InvadersMachine::new(&program(fragments), InvadersDipSwitches::default()).unwrap()
}

fn ram(sys: &InvadersMachine, address: u16) -> u8 {
    sys.controller().bus().memory.direct_read(address).unwrap()
}

// =================================================================
// Machine Trait Tests
// =================================================================

#[test]
fn test_input_map_has_all_buttons() {
    let sys = machine(&[]);
    assert_eq!(sys.input_map().len(), 10);
    assert!(sys.input_map().iter().all(|b| !b.name.is_empty()));
    assert_eq!(sys.name(), "invaders");
}

#[test]
fn test_frame_rate() {
    let sys = machine(&[]);
    assert_eq!(CYCLES_PER_FRAME, 33_333);
    assert!((sys.frame_rate_hz() - 60.0).abs() < 0.01);
}

#[test]
fn test_framebuffer_is_video_ram() {
    // MVI A,FFh ; STA 2400h ; HLT
    let mut sys = machine(&[(0x0000, &[0x3E, 0xFF, 0x32, 0x00, 0x24, 0x76])]);
    sys.run_frame().unwrap();
    let framebuffer = sys.framebuffer_region().unwrap();
    assert_eq!(framebuffer.len(), 0x1C00);
    assert_eq!(framebuffer[0], 0xFF);
    assert_eq!(framebuffer[1], 0x00);
}

// =================================================================
// Memory map
// =================================================================

#[test]
fn test_ram_mirrors_up_to_64k() {
    // MVI A,5Ah ; STA 2010h ; LDA 4010h ; STA 2011h ; HLT
    let mut sys = machine(&[(
        0x0000,
        &[0x3E, 0x5A, 0x32, 0x10, 0x20, 0x3A, 0x10, 0x40, 0x32, 0x11, 0x20, 0x76],
    )]);
    sys.run_frame().unwrap();

    assert_eq!(ram(&sys, 0x2011), 0x5A);
    assert_eq!(ram(&sys, 0x6010), 0x5A);
    assert_eq!(ram(&sys, 0xE010), 0x5A);
    let memory = &sys.controller().bus().memory;
    assert_eq!(memory.size(), 0x10000);
    assert_eq!(memory.physical_size(), 0x4000);
}

#[test]
fn test_oversized_program_rejected() {
    let result = InvadersMachine::new(&vec![0u8; 0x2001], InvadersDipSwitches::default());
    assert!(matches!(result, Err(RomLoadError::ProgramTooLarge { .. })));
}

// =================================================================
// I/O ports
// =================================================================

#[test]
fn test_shift_register_ports() {
    let mut sys = machine(&[(
        0x0000,
        &[
            0x3E, 0xAB, 0xD3, 0x04, // MVI A,ABh ; OUT 4
            0x3E, 0xCD, 0xD3, 0x04, // MVI A,CDh ; OUT 4
            0x3E, 0x04, 0xD3, 0x02, // MVI A,4 ; OUT 2
            0xDB, 0x03, // IN 3
            0x32, 0x00, 0x20, // STA 2000h
            0x76, // HLT
        ],
    )]);
    sys.run_frame().unwrap();
    assert_eq!(ram(&sys, 0x2000), 0xDA);
}

#[test]
fn test_inputs_and_dip_switches() {
    let dips = InvadersDipSwitches {
        lives: Lives::Six,
        bonus_life_at: BonusLifeAt::Points1500,
        coin_info: false,
    };
    // IN 1 ; STA 2000h ; IN 2 ; STA 2001h ; HLT
    let code = [0xDB, 0x01, 0x32, 0x00, 0x20, 0xDB, 0x02, 0x32, 0x01, 0x20, 0x76];
    let mut sys = InvadersMachine::new(&program(&[(0x0000, &code)]), dips).unwrap();
    sys.set_input(INPUT_COIN, true);
    sys.set_input(INPUT_P1_FIRE, true);
    sys.set_input(INPUT_P1_FIRE, false);
    sys.run_frame().unwrap();

    assert_eq!(ram(&sys, 0x2000), 0x09);
    assert_eq!(ram(&sys, 0x2001), 0x83);
}

#[test]
fn test_dip_switch_bits() {
    assert_eq!(InvadersDipSwitches::default().to_port_bits(), 0x00);
    let dips = InvadersDipSwitches {
        lives: Lives::Four,
        bonus_life_at: BonusLifeAt::Points1000,
        coin_info: false,
    };
    assert_eq!(dips.to_port_bits(), 0x89);
}

#[test]
fn test_sound_latches_and_port_labels() {
    // MVI A,12h ; OUT 3 ; MVI A,34h ; OUT 5 ; HLT
    let mut sys = machine(&[(0x0000, &[0x3E, 0x12, 0xD3, 0x03, 0x3E, 0x34, 0xD3, 0x05, 0x76])]);
    sys.run_frame().unwrap();
    assert_eq!(sys.sound_latches(), (0x12, 0x34));

    let snapshot = sys.debug_snapshot().unwrap();
    let port = snapshot.io.iter().find(|p| p.port == 3).unwrap();
    assert_eq!(port.label.as_deref(), Some("out sound 1"));
    assert!(port.active);
    assert_eq!(port.value, 0x12);
    let watchdog = snapshot.io.iter().find(|p| p.port == 6).unwrap();
    assert!(!watchdog.active);
}

// =================================================================
// Screen interrupts
// =================================================================

const INTERRUPT_PROGRAM: &[(u16, &[u8])] = &[
    // LXI SP,2400h ; EI ; loop: JMP loop
    (0x0000, &[0x31, 0x00, 0x24, 0xFB, 0xC3, 0x04, 0x00]),
    // RST 1: MVI A,1 ; STA 2000h ; EI ; RET
    (0x0008, &[0x3E, 0x01, 0x32, 0x00, 0x20, 0xFB, 0xC9]),
    // RST 2: MVI A,2 ; STA 2001h ; EI ; RET
    (0x0010, &[0x3E, 0x02, 0x32, 0x01, 0x20, 0xFB, 0xC9]),
];

#[test]
fn test_mid_screen_and_vblank_interrupts() {
    let mut sys = machine(INTERRUPT_PROGRAM);

    assert_eq!(sys.run_frame().unwrap(), FrameOutcome::Continue);
    assert_eq!(ram(&sys, 0x2000), 0x01);
    // RST 2 is raised at the very end of the frame and taken in the next.
    assert_eq!(ram(&sys, 0x2001), 0x00);
    assert!(sys.frame_position() < 20);

    sys.run_frame().unwrap();
    assert_eq!(ram(&sys, 0x2001), 0x02);
    assert!(sys.controller().cycles() >= 2 * CYCLES_PER_FRAME);
}

#[test]
fn test_no_interrupts_while_disabled() {
    // loop: JMP loop
    let mut sys = machine(&[
        (0x0000, &[0xC3, 0x00, 0x00]),
        (0x0008, &[0x3E, 0x01, 0x32, 0x00, 0x20, 0xC9]),
    ]);
    sys.run_frame().unwrap();
    sys.run_frame().unwrap();
    assert_eq!(ram(&sys, 0x2000), 0x00);
    assert!(sys.controller().cpu().pc() < 3);
}

#[test]
fn test_breakpoint_splits_frame() {
    // loop: NOP ; JMP loop
    let mut sys = machine(&[(0x0000, &[0x00, 0xC3, 0x00, 0x00])]);
    sys.debugger_mut().add_breakpoint(0x0001);

    assert_eq!(sys.run_frame().unwrap(), FrameOutcome::Continue);
    assert_eq!(sys.run_state(), RunState::Stepping);
    assert_eq!(sys.frame_position(), 4);

    sys.request(Request::Step);
    sys.run_frame().unwrap();
    assert_eq!(sys.frame_position(), 14);
    assert_eq!(sys.controller().cpu().pc(), 0x0000);

    sys.debugger_mut().remove_breakpoint(0x0001);
    sys.request(Request::Continue);
    sys.run_frame().unwrap();
    assert_eq!(sys.run_state(), RunState::Running);
    assert!(sys.frame_position() < 14);
    assert!(sys.controller().cycles() >= CYCLES_PER_FRAME);
    assert!(HALF_FRAME < CYCLES_PER_FRAME);
}

#[test]
fn test_stop_finishes_session() {
    let mut sys = machine(INTERRUPT_PROGRAM);
    sys.control_handle().send(Request::Stop).unwrap();
    assert_eq!(sys.run_frame().unwrap(), FrameOutcome::Finished);
    assert_eq!(sys.controller().cycles(), 0);
}

#[test]
fn test_reset_clears_ram_and_frame() {
    let mut sys = machine(INTERRUPT_PROGRAM);
    sys.run_frame().unwrap();
    assert_eq!(ram(&sys, 0x2000), 0x01);

    sys.reset().unwrap();
    assert_eq!(ram(&sys, 0x2000), 0x00);
    assert_eq!(sys.frame_position(), 0);
    assert_eq!(sys.controller().cpu().pc(), 0x0000);
    assert_eq!(sys.run_state(), RunState::Running);
}

// =================================================================
// ROM loading
// =================================================================

#[test]
fn test_rom_set_checksums() {
    let chip = vec![0u8; 0x800];
    let roms = RomSet::from_slices(&[
        ("invaders.h", &chip),
        ("invaders.g", &chip),
        ("invaders.f", &chip),
        ("invaders.e", &chip),
    ]);
    assert!(matches!(
        InvadersMachine::from_rom_set(&roms, InvadersDipSwitches::default()),
        Err(RomLoadError::ChecksumMismatch { .. })
    ));

    let image = INVADERS_PROGRAM_ROM.load_skip_checksums(&roms).unwrap();
    assert_eq!(image.len(), 0x2000);
    assert!(InvadersMachine::new(&image, InvadersDipSwitches::default()).is_ok());
}

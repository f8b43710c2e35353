use cathode_core::cpu::z80::Z80;
mod common;
use common::{TestBus, run_instruction};

// --- Rotate / shift ---

#[test]
fn test_rlc_r() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 0x80;
    cpu.f = 0x00;
    bus.load(0, &[0xCB, 0x00]); // RLC B

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.b, 0x01);
    assert_eq!(cpu.f, 0x01, "C set, odd parity");
}

#[test]
fn test_sra_keeps_sign() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.d = 0x81;
    bus.load(0, &[0xCB, 0x2A]); // SRA D

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.d, 0xC0);
    assert_eq!(cpu.f, 0x85, "S, PV, C");
}

#[test]
fn test_sll_sets_bit0() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.e = 0x80;
    bus.load(0, &[0xCB, 0x33]); // SLL E (undocumented)

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.e, 0x01);
    assert_eq!(cpu.f & 0x01, 0x01);
}

#[test]
fn test_srl_hl_indirect() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    bus.load(0x4000, &[0x01]);
    bus.load(0, &[0xCB, 0x3E]); // SRL (HL)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 15);
    assert_eq!(bus.memory[0x4000], 0x00);
    assert_eq!(cpu.f, 0x45, "Z, PV, C");
}

// --- BIT ---

#[test]
fn test_bit_7_set() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x80;
    cpu.f = 0x01;
    bus.load(0, &[0xCB, 0x7F]); // BIT 7, A

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.f, 0x91, "S, H, preserved C");
}

#[test]
fn test_bit_clear_sets_z_and_pv() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.c = 0x28;
    cpu.f = 0x00;
    bus.load(0, &[0xCB, 0x41]); // BIT 0, C

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.f, 0x7C, "Z, PV, H, X/Y from operand");
}

#[test]
fn test_bit_hl_xy_from_memptr() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    cpu.memptr = 0x2800;
    cpu.f = 0x00;
    bus.load(0x4000, &[0x01]);
    bus.load(0, &[0xCB, 0x46]); // BIT 0, (HL)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 12);
    assert_eq!(cpu.f, 0x38, "H plus X/Y from MEMPTR high byte");
}

// --- SET / RES ---

#[test]
fn test_set_and_res() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    cpu.f = 0x00;
    bus.load(0x4000, &[0xFF]);
    bus.load(0, &[0xCB, 0xDE, 0xCB, 0x86, 0xCB, 0xFF]); // SET 3,(HL); RES 0,(HL); SET 7,A
    cpu.a = 0x00;

    assert_eq!(run_instruction(&mut cpu, &mut bus), 15);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 15);
    assert_eq!(bus.memory[0x4000], 0xFE);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.a, 0x80);
    assert_eq!(cpu.f, 0x00, "SET/RES leave flags");
}

use cathode_core::cpu::i8080::I8080;
mod common;
use common::{TestBus, run_instruction, run_instructions};

// --- ADD / SUB ---

#[test]
fn test_add_sets_carry_and_aux() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0x8F;
    cpu.b = 0x81;
    bus.load(0, &[0x80]); // ADD B

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 4);
    assert_eq!(cpu.a, 0x10);
    assert!(cpu.flags.carry);
    assert!(cpu.flags.aux_carry);
    assert!(!cpu.flags.zero);
    assert!(!cpu.flags.sign);
}

#[test]
fn test_add_memory_operand() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0x01;
    cpu.set_hl(0x2000);
    bus.load(0x2000, &[0x41]);
    bus.load(0, &[0x86]); // ADD M

    assert_eq!(run_instruction(&mut cpu, &mut bus), 7);
    assert_eq!(cpu.a, 0x42);
    assert!(cpu.flags.parity, "0x42 has two bits set");
}

#[test]
fn test_sub_to_zero() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0x3E;
    bus.load(0, &[0xD6, 0x3E]); // SUI 3EH

    assert_eq!(run_instruction(&mut cpu, &mut bus), 7);
    assert_eq!(cpu.a, 0);
    assert!(cpu.flags.zero);
    assert!(!cpu.flags.carry);
    assert!(cpu.flags.aux_carry, "no borrow out of bit 3");
    assert!(cpu.flags.parity);
}

#[test]
fn test_sbb_borrows_through_carry() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0x00;
    cpu.c = 0x00;
    cpu.flags.carry = true;
    bus.load(0, &[0x99]); // SBB C

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0xFF);
    assert!(cpu.flags.carry);
    assert!(cpu.flags.sign);
}

#[test]
fn test_cmp_leaves_accumulator() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0x0A;
    cpu.e = 0x05;
    bus.load(0, &[0xBB, 0xFE, 0x0B]); // CMP E; CPI 0BH

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x0A);
    assert!(!cpu.flags.carry);
    assert!(!cpu.flags.zero);

    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.flags.carry, "A < operand borrows");
}

// --- Logic ---

#[test]
fn test_ana_aux_carry_from_operand_bit3() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0xF0;
    cpu.b = 0x08;
    cpu.flags.carry = true;
    bus.load(0, &[0xA0]); // ANA B

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flags.zero);
    assert!(cpu.flags.aux_carry);
    assert!(!cpu.flags.carry, "logic ops clear CY");
}

#[test]
fn test_xra_a_clears_everything() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0x5A;
    cpu.flags.carry = true;
    cpu.flags.aux_carry = true;
    bus.load(0, &[0xAF]); // XRA A

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0);
    assert!(cpu.flags.zero);
    assert!(!cpu.flags.carry);
    assert!(!cpu.flags.aux_carry);
}

// --- INR / DCR ---

#[test]
fn test_inr_preserves_carry() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.b = 0xFF;
    cpu.flags.carry = true;
    bus.load(0, &[0x04]); // INR B

    assert_eq!(run_instruction(&mut cpu, &mut bus), 5);
    assert_eq!(cpu.b, 0x00);
    assert!(cpu.flags.zero);
    assert!(cpu.flags.aux_carry);
    assert!(cpu.flags.carry);
}

#[test]
fn test_dcr_memory() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x3000);
    bus.load(0x3000, &[0x10]);
    bus.load(0, &[0x35]); // DCR M

    assert_eq!(run_instruction(&mut cpu, &mut bus), 10);
    assert_eq!(bus.memory[0x3000], 0x0F);
    assert!(!cpu.flags.aux_carry, "borrow out of low nibble");
}

// --- DAA ---

#[test]
fn test_daa_adjusts_both_nibbles() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0x9B;
    bus.load(0, &[0x27]); // DAA

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x01);
    assert!(cpu.flags.carry);
    assert!(cpu.flags.aux_carry);
}

#[test]
fn test_daa_after_bcd_add() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0x38;
    bus.load(0, &[0xC6, 0x45, 0x27]); // ADI 45H; DAA

    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.a, 0x83);
    assert!(!cpu.flags.carry);
}

// --- Rotates ---

#[test]
fn test_rlc_period_is_eight() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0b1000_0001;
    bus.load(0, &[0x07; 8]); // RLC x8

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0b0000_0011);
    assert!(cpu.flags.carry);

    run_instructions(&mut cpu, &mut bus, 7);
    assert_eq!(cpu.a, 0b1000_0001);
}

#[test]
fn test_ral_rar_through_carry() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.a = 0x80;
    bus.load(0, &[0x17, 0x1F]); // RAL; RAR

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flags.carry);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x80);
    assert!(!cpu.flags.carry);
}

// --- 16-bit ---

#[test]
fn test_dad_sets_only_carry() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0xFFFF);
    cpu.set_de(0x0002);
    cpu.flags.zero = true;
    bus.load(0, &[0x19]); // DAD D

    assert_eq!(run_instruction(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.get_hl(), 0x0001);
    assert!(cpu.flags.carry);
    assert!(cpu.flags.zero, "DAD leaves Z alone");
}

#[test]
fn test_psw_keeps_fixed_bits() {
    let mut cpu = I8080::new();
    cpu.set_psw(0x12FF);
    assert_eq!(cpu.get_psw(), 0x12D7);
    cpu.set_psw(0x3400);
    assert_eq!(cpu.get_psw(), 0x3402);
}

#[test]
fn test_add_flags_for_every_operand_pair() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x80]); // ADD B

    for a in 0..=0xFFu8 {
        for b in 0..=0xFFu8 {
            cpu.pc = 0;
            cpu.a = a;
            cpu.b = b;
            run_instruction(&mut cpu, &mut bus);

            let sum = a as u16 + b as u16;
            let result = sum as u8;
            assert_eq!(cpu.a, result, "{a:02X}+{b:02X}");
            assert_eq!(cpu.flags.zero, result == 0, "Z for {a:02X}+{b:02X}");
            assert_eq!(cpu.flags.sign, result > 0x7F, "S for {a:02X}+{b:02X}");
            assert_eq!(cpu.flags.parity, result.count_ones() % 2 == 0, "P for {a:02X}+{b:02X}");
            assert_eq!(cpu.flags.carry, sum > 0xFF, "CY for {a:02X}+{b:02X}");
            assert_eq!(cpu.flags.aux_carry, (a & 0x0F) + (b & 0x0F) > 0x0F, "AC for {a:02X}+{b:02X}");
        }
    }
}

use cathode_core::cpu::i8080::I8080;
use cathode_core::cpu::{Cpu, Interrupt};
mod common;
use common::{TestBus, run_instruction};

const RST_1: u8 = 0xCF;

#[test]
fn test_interrupt_ignored_while_disabled() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x2000;
    cpu.signal_interrupt(Interrupt::Maskable(RST_1));

    run_instruction(&mut cpu, &mut bus); // NOP
    assert_eq!(cpu.pc, 1);
    assert_eq!(cpu.sp, 0x2000);
}

#[test]
fn test_interrupt_latched_until_enabled() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x2000;
    bus.load(0, &[0x00, 0xFB, 0x00, 0x00]); // NOP; EI; NOP; NOP
    cpu.signal_interrupt(Interrupt::Maskable(RST_1));

    run_instruction(&mut cpu, &mut bus); // NOP
    run_instruction(&mut cpu, &mut bus); // EI
    assert!(cpu.interrupts_enabled());

    run_instruction(&mut cpu, &mut bus); // NOP after EI always runs
    assert_eq!(cpu.pc, 3);

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 11);
    assert_eq!(cpu.pc, 0x0008);
    assert_eq!(bus.word(0x1FFE), 0x0003);
    assert!(!cpu.interrupts_enabled(), "acknowledge clears INTE");
}

#[test]
fn test_halt_waits_for_interrupt() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x2000;
    bus.load(0, &[0xFB, 0x76]); // EI; HLT

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 7);
    assert!(cpu.is_sleeping());

    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.pc, 2);

    cpu.signal_interrupt(Interrupt::Maskable(0xD7)); // RST 2
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.is_sleeping());
    assert_eq!(cpu.pc, 0x0010);
    assert_eq!(bus.word(0x1FFE), 0x0002);
}

#[test]
fn test_nmi_is_ignored() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.inte = true;
    cpu.signal_interrupt(Interrupt::Nmi);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 1);
}

#[test]
fn test_di_blocks_pending_interrupt() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x2000;
    bus.load(0, &[0xFB, 0xF3, 0x00]); // EI; DI; NOP
    cpu.signal_interrupt(Interrupt::Maskable(RST_1));

    run_instruction(&mut cpu, &mut bus); // EI
    run_instruction(&mut cpu, &mut bus); // DI (protected by the EI delay)
    run_instruction(&mut cpu, &mut bus); // NOP
    assert_eq!(cpu.pc, 3);
}

#[test]
fn test_reset_clears_pending_state() {
    let mut cpu = I8080::with_pc(0x0100);
    cpu.inte = true;
    cpu.halted = true;
    cpu.signal_interrupt(Interrupt::Maskable(RST_1));
    cpu.reset();

    assert_eq!(cpu.pc(), 0);
    assert!(!cpu.interrupts_enabled());
    assert!(!cpu.is_sleeping());
}

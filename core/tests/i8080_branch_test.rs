use cathode_core::cpu::Cpu;
use cathode_core::cpu::i8080::I8080;
mod common;
use common::{TestBus, run_instruction};

#[test]
fn test_jmp() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xC3, 0x34, 0x12]); // JMP 1234H

    assert_eq!(run_instruction(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn test_conditional_jump_is_ten_cycles_either_way() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.flags.zero = false;
    bus.load(0, &[0xCA, 0x00, 0x20]); // JZ 2000H

    assert_eq!(run_instruction(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.pc, 0x0003);
}

#[test]
fn test_call_and_ret() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    bus.load(0x0100, &[0xCD, 0x00, 0x02]); // CALL 0200H
    bus.load(0x0200, &[0xC9]); // RET
    cpu.pc = 0x0100;

    assert_eq!(run_instruction(&mut cpu, &mut bus), 17);
    assert_eq!(cpu.pc, 0x0200);
    assert_eq!(cpu.sp, 0x7FFE);
    assert_eq!(bus.word(0x7FFE), 0x0103);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.pc, 0x0103);
    assert_eq!(cpu.sp, 0x8000);
}

#[test]
fn test_conditional_call_timing() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.flags.carry = false;
    bus.load(0, &[0xDC, 0x00, 0x10, 0xD4, 0x00, 0x10]); // CC 1000H; CNC 1000H

    assert_eq!(run_instruction(&mut cpu, &mut bus), 11, "not taken");
    assert_eq!(cpu.pc, 0x0003);
    assert_eq!(cpu.sp, 0x8000);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 17, "taken");
    assert_eq!(cpu.pc, 0x1000);
}

#[test]
fn test_call_ret_restores_sp_and_pc() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xCD, 0x00, 0x90]); // CALL 9000H
    bus.load(0x9000, &[0xC9]); // RET

    for sp in (0..=0xFFFFu16).step_by(0x0101) {
        cpu.pc = 0x8000;
        cpu.sp = sp;

        assert_eq!(run_instruction(&mut cpu, &mut bus), 17);
        assert_eq!(cpu.pc, 0x9000);
        assert_eq!(cpu.sp, sp.wrapping_sub(2));
        assert_eq!(bus.word(sp.wrapping_sub(2)), 0x8003, "return address at SP={sp:04X}");

        assert_eq!(run_instruction(&mut cpu, &mut bus), 10);
        assert_eq!(cpu.pc, 0x8003);
        assert_eq!(cpu.sp, sp);
    }
}

type SetFlag = fn(&mut I8080, bool);

/// Conditional CALL opcodes with the flag they test and the flag value
/// that takes the branch.
const CONDITIONAL_CALLS: [(u8, SetFlag, bool); 8] = [
    (0xC4, |cpu, v| cpu.flags.zero = v, false),   // CNZ
    (0xCC, |cpu, v| cpu.flags.zero = v, true),    // CZ
    (0xD4, |cpu, v| cpu.flags.carry = v, false),  // CNC
    (0xDC, |cpu, v| cpu.flags.carry = v, true),   // CC
    (0xE4, |cpu, v| cpu.flags.parity = v, false), // CPO
    (0xEC, |cpu, v| cpu.flags.parity = v, true),  // CPE
    (0xF4, |cpu, v| cpu.flags.sign = v, false),   // CP
    (0xFC, |cpu, v| cpu.flags.sign = v, true),    // CM
];

#[test]
fn test_every_conditional_call_timing() {
    for (opcode, set_flag, taken_when) in CONDITIONAL_CALLS {
        for flag in [false, true] {
            let mut cpu = I8080::new();
            let mut bus = TestBus::new();
            cpu.sp = 0x8000;
            set_flag(&mut cpu, flag);
            bus.load(0, &[opcode, 0x00, 0x10]);

            let taken = flag == taken_when;
            let cycles = run_instruction(&mut cpu, &mut bus);
            if taken {
                assert_eq!(cycles, 17, "{opcode:02X} taken");
                assert_eq!(cpu.pc, 0x1000);
                assert_eq!(cpu.sp, 0x7FFE);
            } else {
                assert_eq!(cycles, 11, "{opcode:02X} not taken");
                assert_eq!(cpu.pc, 0x0003);
                assert_eq!(cpu.sp, 0x8000);
            }
        }
    }
}

#[test]
fn test_conditional_return_timing() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x7FFE;
    bus.load(0x7FFE, &[0x34, 0x12]);
    cpu.flags.sign = true;
    bus.load(0, &[0xF0, 0xF8]); // RP; RM

    assert_eq!(run_instruction(&mut cpu, &mut bus), 5);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 11);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn test_rst_pushes_next_pc() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x4000;
    cpu.pc = 0x0500;
    bus.load(0x0500, &[0xEF]); // RST 5

    assert_eq!(run_instruction(&mut cpu, &mut bus), 11);
    assert_eq!(cpu.pc, 0x0028);
    assert_eq!(bus.word(0x3FFE), 0x0501);
}

#[test]
fn test_pchl_and_xthl() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x3000;
    bus.load(0x3000, &[0xCD, 0xAB]);
    cpu.set_hl(0x1234);
    bus.load(0, &[0xE3, 0xE9]); // XTHL; PCHL

    assert_eq!(run_instruction(&mut cpu, &mut bus), 18);
    assert_eq!(cpu.get_hl(), 0xABCD);
    assert_eq!(bus.word(0x3000), 0x1234);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 5);
    assert_eq!(cpu.pc, 0xABCD);
}

#[test]
fn test_push_pop_psw() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x2000;
    cpu.a = 0x42;
    cpu.flags.carry = true;
    cpu.flags.zero = true;
    bus.load(0, &[0xF5, 0xC1]); // PUSH PSW; POP B

    assert_eq!(run_instruction(&mut cpu, &mut bus), 11);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.b, 0x42);
    assert_eq!(cpu.c, 0x43, "Z, fixed bit 1 and CY");
}

#[test]
fn test_undocumented_aliases_execute() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x2000;
    bus.load(0, &[0x08, 0xCB, 0x00, 0x10]); // *NOP; *JMP 1000H
    bus.load(0x1000, &[0xDD, 0x00, 0x20]); // *CALL 2000H
    bus.load(0x2000, &[0xD9]); // *RET

    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1000);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 17);
    assert_eq!(cpu.pc, 0x2000);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1003);
}

#[test]
fn test_in_out_use_port_number() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.ports[0x10] = 0x77;
    cpu.a = 0x55;
    bus.load(0, &[0xD3, 0x20, 0xDB, 0x10]); // OUT 20H; IN 10H

    assert_eq!(run_instruction(&mut cpu, &mut bus), 10);
    assert_eq!(bus.io_writes, vec![(0x2020, 0x55)]);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.a, 0x77);
    assert_eq!(cpu.pc(), 4);
}

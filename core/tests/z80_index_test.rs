use cathode_core::cpu::z80::Z80;
mod common;
use common::{TestBus, run_instruction};

// --- Loads ---

#[test]
fn test_ld_ix_nn() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xDD, 0x21, 0x00, 0x40, 0xFD, 0x21, 0x00, 0x50]); // LD IX,4000h; LD IY,5000h

    assert_eq!(run_instruction(&mut cpu, &mut bus), 14);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 14);
    assert_eq!(cpu.ix, 0x4000);
    assert_eq!(cpu.iy, 0x5000);
    assert_eq!(cpu.get_hl(), 0xFFFF, "HL untouched");
}

#[test]
fn test_ld_a_ix_displacement() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    bus.load(0x4005, &[0x99]);
    bus.load(0, &[0xDD, 0x7E, 0x05]); // LD A,(IX+5)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 19);
    assert_eq!(cpu.a, 0x99);
    assert_eq!(cpu.memptr, 0x4005);
    assert_eq!(cpu.pc, 0x0003);
}

#[test]
fn test_ld_iy_negative_displacement_b() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iy = 0x4000;
    cpu.b = 0x42;
    bus.load(0, &[0xFD, 0x70, 0xFE]); // LD (IY-2),B

    assert_eq!(run_instruction(&mut cpu, &mut bus), 19);
    assert_eq!(bus.memory[0x3FFE], 0x42);
}

#[test]
fn test_ld_ix_d_n() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    bus.load(0, &[0xDD, 0x36, 0x03, 0x77]); // LD (IX+3),77h

    assert_eq!(run_instruction(&mut cpu, &mut bus), 19);
    assert_eq!(bus.memory[0x4003], 0x77);
    assert_eq!(cpu.pc, 0x0004);
}

#[test]
fn test_ld_h_from_indexed_uses_plain_h() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    bus.load(0x4001, &[0x12]);
    bus.load(0, &[0xDD, 0x66, 0x01]); // LD H,(IX+1)

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.h, 0x12);
    assert_eq!(cpu.ix, 0x4000);
}

#[test]
fn test_undocumented_ixh_ixl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x0000;
    cpu.b = 0x34;
    bus.load(0, &[0xDD, 0x26, 0x12, 0xDD, 0x68]); // LD IXH,12h; LD IXL,B

    assert_eq!(run_instruction(&mut cpu, &mut bus), 11);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.ix, 0x1234);
    assert_eq!(cpu.h, 0xFF);
    assert_eq!(cpu.l, 0xFF);
}

// --- Arithmetic ---

#[test]
fn test_inc_ix_d() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    cpu.f = 0x00;
    bus.load(0x4010, &[0x7F]);
    bus.load(0, &[0xDD, 0x34, 0x10]); // INC (IX+10h)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 23);
    assert_eq!(bus.memory[0x4010], 0x80);
    assert_eq!(cpu.f, 0x94, "S, H, PV");
}

#[test]
fn test_add_ix_rp() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x1000;
    cpu.set_bc(0x0234);
    cpu.f = 0x00;
    bus.load(0, &[0xDD, 0x09]); // ADD IX,BC

    assert_eq!(run_instruction(&mut cpu, &mut bus), 15);
    assert_eq!(cpu.ix, 0x1234);
    assert_eq!(cpu.get_hl(), 0xFFFF);
}

#[test]
fn test_alu_with_indexed_operand() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iy = 0x4000;
    cpu.a = 0x10;
    bus.load(0x4002, &[0x05]);
    bus.load(0, &[0xFD, 0x86, 0x02]); // ADD A,(IY+2)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 19);
    assert_eq!(cpu.a, 0x15);
}

// --- Stack / jumps ---

#[test]
fn test_push_pop_ix() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x1000;
    cpu.ix = 0xBEEF;
    bus.load(0, &[0xDD, 0xE5, 0xFD, 0xE1]); // PUSH IX; POP IY

    assert_eq!(run_instruction(&mut cpu, &mut bus), 15);
    assert_eq!(bus.word(0x0FFE), 0xBEEF);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 14);
    assert_eq!(cpu.iy, 0xBEEF);
    assert_eq!(cpu.sp, 0x1000);
}

#[test]
fn test_jp_ix() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x8000;
    bus.load(0, &[0xDD, 0xE9]); // JP (IX)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.pc, 0x8000);
}

#[test]
fn test_ex_sp_ix() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x1000;
    cpu.ix = 0x1234;
    bus.load(0x1000, &[0x78, 0x56]);
    bus.load(0, &[0xDD, 0xE3]); // EX (SP),IX

    assert_eq!(run_instruction(&mut cpu, &mut bus), 23);
    assert_eq!(cpu.ix, 0x5678);
    assert_eq!(bus.word(0x1000), 0x1234);
    assert_eq!(cpu.memptr, 0x5678);
}

#[test]
fn test_ex_de_hl_ignores_prefix() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x1111;
    cpu.set_de(0x2222);
    cpu.set_hl(0x3333);
    bus.load(0, &[0xDD, 0xEB]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.get_de(), 0x3333);
    assert_eq!(cpu.get_hl(), 0x2222);
    assert_eq!(cpu.ix, 0x1111);
}

// --- DD CB / FD CB ---

#[test]
fn test_index_cb_bit() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    cpu.f = 0x00;
    bus.load(0x4004, &[0x00]);
    bus.load(0, &[0xDD, 0xCB, 0x04, 0x46]); // BIT 0,(IX+4)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 20);
    assert_eq!(cpu.f, 0x54, "Z, H, PV; X/Y from address high byte 40h");
    assert_eq!(cpu.pc, 0x0004);
}

#[test]
fn test_index_cb_rotate_copies_to_register() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iy = 0x4000;
    bus.load(0x4003, &[0x81]);
    bus.load(0, &[0xFD, 0xCB, 0x03, 0x00]); // RLC (IY+3),B

    assert_eq!(run_instruction(&mut cpu, &mut bus), 23);
    assert_eq!(bus.memory[0x4003], 0x03);
    assert_eq!(cpu.b, 0x03);
    assert_eq!(cpu.f & 0x01, 0x01);
}

#[test]
fn test_index_cb_set() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    bus.load(0, &[0xDD, 0xCB, 0xFF, 0xFE]); // SET 7,(IX-1)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 23);
    assert_eq!(bus.memory[0x3FFF], 0x80);
}

#[test]
fn test_index_cb_does_not_count_refresh_for_operands() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    cpu.r = 0;
    bus.load(0, &[0xDD, 0xCB, 0x00, 0x06]); // RLC (IX+0)

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.r, 2, "DD and CB are M1 fetches, d and op are not");
}

// --- Prefix chains ---

#[test]
fn test_prefix_on_unaffected_opcode() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.r = 0;
    bus.load(0, &[0xDD, 0x00]); // DD NOP

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.pc, 0x0002);
    assert_eq!(cpu.r, 2);
}

#[test]
fn test_last_prefix_wins() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xDD, 0xFD, 0x21, 0x34, 0x12]); // DD FD LD IY,1234h
    cpu.ix = 0;

    // The redundant DD runs on its own.
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.pc, 0x0001);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 14);
    assert_eq!(cpu.iy, 0x1234);
    assert_eq!(cpu.ix, 0);
    assert_eq!(cpu.pc, 0x0005);
}

#[test]
fn test_prefix_run_steps_one_prefix_at_a_time() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.memory[..0x1000].fill(0xDD);
    bus.load(0x0FFF, &[0xFD, 0x21, 0x78, 0x56]); // ... DD DD FD LD IY,5678h
    cpu.ix = 0xAAAA;

    for n in 1..=0x0FFF {
        assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.pc, n);
    }
    assert_eq!(cpu.r, 0x7F, "one refresh per prefix");

    assert_eq!(run_instruction(&mut cpu, &mut bus), 14);
    assert_eq!(cpu.iy, 0x5678);
    assert_eq!(cpu.ix, 0xAAAA);
    assert_eq!(cpu.pc, 0x1003);
}

#[test]
fn test_all_prefix_memory_does_not_overflow() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.memory.fill(0xFD);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.pc, 0x0001);
}

#[test]
fn test_ed_cancels_index_prefix() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x0000);
    cpu.set_bc(0x0001);
    cpu.ix = 0x1000;
    cpu.f = 0x00;
    bus.load(0, &[0xDD, 0xED, 0x42]); // DD SBC HL,BC

    assert_eq!(run_instruction(&mut cpu, &mut bus), 19);
    assert_eq!(cpu.get_hl(), 0xFFFF);
    assert_eq!(cpu.ix, 0x1000);
}

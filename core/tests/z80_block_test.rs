use cathode_core::cpu::z80::Z80;
mod common;
use common::{TestBus, run_instruction};

#[test]
fn test_ldi_flags() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    cpu.set_de(0x5000);
    cpu.set_bc(2);
    cpu.a = 0x00;
    cpu.f = 0x00;
    bus.load(0x4000, &[0x08]);
    bus.load(0, &[0xED, 0xA0]); // LDI

    assert_eq!(run_instruction(&mut cpu, &mut bus), 16);
    assert_eq!(bus.memory[0x5000], 0x08);
    assert_eq!(cpu.get_hl(), 0x4001);
    assert_eq!(cpu.get_de(), 0x5001);
    assert_eq!(cpu.get_bc(), 1);
    assert_eq!(cpu.f, 0x0C, "PV (BC != 0) and X from bit 3 of A+val");
}

#[test]
fn test_ldir_repeats_until_bc_zero() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    cpu.set_de(0x5000);
    cpu.set_bc(3);
    bus.load(0x4000, &[1, 2, 3]);
    bus.load(0, &[0xED, 0xB0]); // LDIR

    assert_eq!(run_instruction(&mut cpu, &mut bus), 21);
    assert_eq!(cpu.pc, 0x0000, "rewound onto the prefix");
    assert_eq!(cpu.memptr, 0x0001);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 21);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 16);
    assert_eq!(cpu.pc, 0x0002);
    assert_eq!(&bus.memory[0x5000..0x5003], &[1, 2, 3]);
    assert_eq!(cpu.get_bc(), 0);
    assert_eq!(cpu.f & 0x04, 0, "PV clear once BC hits zero");
}

#[test]
fn test_lddr_walks_down() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4001);
    cpu.set_de(0x5001);
    cpu.set_bc(2);
    bus.load(0x4000, &[0xAA, 0xBB]);
    bus.load(0, &[0xED, 0xB8]); // LDDR

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(&bus.memory[0x5000..0x5002], &[0xAA, 0xBB]);
    assert_eq!(cpu.get_hl(), 0x3FFF);
    assert_eq!(cpu.get_de(), 0x4FFF);
}

#[test]
fn test_cpir_stops_on_match() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x33;
    cpu.set_hl(0x4000);
    cpu.set_bc(0x10);
    bus.load(0x4000, &[0x11, 0x22, 0x33]);
    bus.load(0, &[0xED, 0xB1]); // CPIR

    assert_eq!(run_instruction(&mut cpu, &mut bus), 21);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 21);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 16);
    assert_eq!(cpu.get_hl(), 0x4003);
    assert_eq!(cpu.get_bc(), 0x0D);
    assert_ne!(cpu.f & 0x40, 0, "Z on match");
    assert_ne!(cpu.f & 0x04, 0, "PV while BC != 0");
    assert_ne!(cpu.f & 0x02, 0, "N always set");
}

#[test]
fn test_ini() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 2;
    cpu.c = 0x10;
    cpu.set_hl(0x4000);
    bus.ports[0x10] = 5;
    bus.load(0, &[0xED, 0xA2]); // INI

    assert_eq!(run_instruction(&mut cpu, &mut bus), 16);
    assert_eq!(bus.io_reads, vec![0x0210], "port read before B is decremented");
    assert_eq!(bus.memory[0x4000], 5);
    assert_eq!(cpu.b, 1);
    assert_eq!(cpu.get_hl(), 0x4001);
    assert_eq!(cpu.memptr, 0x0211);
    assert_eq!(cpu.f, 0x00);
}

#[test]
fn test_otir() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 2;
    cpu.c = 0x20;
    cpu.set_hl(0x4000);
    bus.load(0x4000, &[0xAA, 0xBB]);
    bus.load(0, &[0xED, 0xB3]); // OTIR

    assert_eq!(run_instruction(&mut cpu, &mut bus), 21);
    assert_eq!(cpu.f, 0x06);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 16);
    assert_eq!(bus.io_writes, vec![(0x0120, 0xAA), (0x0020, 0xBB)], "B decremented before the write");
    assert_eq!(cpu.f, 0x46);
    assert_eq!(cpu.pc, 0x0002);
}

#![allow(dead_code)]

use cathode_core::core::{Bus, EmuResult};
use cathode_core::cpu::Cpu;

/// Minimal bus for testing: flat 64KB read/write memory, port latches
/// and a log of every OUT.
pub struct TestBus {
    pub memory: Vec<u8>,
    pub ports: [u8; 256],
    pub io_writes: Vec<(u16, u8)>,
    pub io_reads: Vec<u16>,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: vec![0; 0x10000],
            ports: [0; 256],
            io_writes: Vec::new(),
            io_reads: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn word(&self, addr: u16) -> u16 {
        let lo = self.memory[addr as usize] as u16;
        let hi = self.memory[addr.wrapping_add(1) as usize] as u16;
        (hi << 8) | lo
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> EmuResult<u8> {
        Ok(self.memory[addr as usize])
    }

    fn write(&mut self, addr: u16, data: u8) -> EmuResult<()> {
        self.memory[addr as usize] = data;
        Ok(())
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        self.io_reads.push(addr);
        self.ports[addr as u8 as usize]
    }

    fn io_write(&mut self, addr: u16, data: u8) {
        self.io_writes.push((addr, data));
    }
}

/// Run one instruction and return its cycle count.
pub fn run_instruction<C: Cpu>(cpu: &mut C, bus: &mut TestBus) -> u32 {
    cpu.step(bus).expect("instruction should execute")
}

/// Run `n` instructions and return the total cycle count.
pub fn run_instructions<C: Cpu>(cpu: &mut C, bus: &mut TestBus, n: usize) -> u32 {
    (0..n).map(|_| run_instruction(cpu, bus)).sum()
}

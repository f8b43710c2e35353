use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use cathode_core::core::Bus;
use cathode_core::core::error::EmuResult;
use cathode_core::cpu::i8080::Flags;
use cathode_core::cpu::{CpuStateTrait, I8080, Z80};
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// --- TracingBus: flat 64KB memory that records every access ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write,
    PortRead,
    PortWrite,
}

impl BusOp {
    /// Pin-activity string in the SingleStepTests style.
    pub fn pins(self) -> &'static str {
        match self {
            BusOp::Read => "r-m-",
            BusOp::Write => "-wm-",
            BusOp::PortRead => "r--i",
            BusOp::PortWrite => "-w-i",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusAccess {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

pub struct TracingBus {
    pub memory: Box<[u8; 0x10000]>,
    pub accesses: Vec<BusAccess>,
    /// Values handed out to port reads, oldest first. Reads past the end see 0xFF.
    pub port_inputs: VecDeque<u8>,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            accesses: Vec::new(),
            port_inputs: VecDeque::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        for (offset, &byte) in data.iter().enumerate() {
            self.memory[addr.wrapping_add(offset as u16) as usize] = byte;
        }
    }

    pub fn load_ram(&mut self, ram: &[(u16, u8)]) {
        for &(addr, value) in ram {
            self.memory[addr as usize] = value;
        }
    }

    /// Queue port input values from a vector's `ports` list.
    pub fn load_ports(&mut self, ports: &[(u16, u8, String)]) {
        for (_, value, direction) in ports {
            if direction.starts_with('r') {
                self.port_inputs.push_back(*value);
            }
        }
    }

    /// Port writes seen so far, as `(port, value, "w")` triples.
    pub fn port_writes(&self) -> Vec<(u16, u8, String)> {
        self.accesses
            .iter()
            .filter(|a| a.op == BusOp::PortWrite)
            .map(|a| (a.addr, a.data, "w".to_string()))
            .collect()
    }

    pub fn clear_accesses(&mut self) {
        self.accesses.clear();
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    fn read(&mut self, addr: u16) -> EmuResult<u8> {
        let data = self.memory[addr as usize];
        self.accesses.push(BusAccess {
            addr,
            data,
            op: BusOp::Read,
        });
        Ok(data)
    }

    fn write(&mut self, addr: u16, data: u8) -> EmuResult<()> {
        self.memory[addr as usize] = data;
        self.accesses.push(BusAccess {
            addr,
            data,
            op: BusOp::Write,
        });
        Ok(())
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        let data = self.port_inputs.pop_front().unwrap_or(0xFF);
        self.accesses.push(BusAccess {
            addr,
            data,
            op: BusOp::PortRead,
        });
        data
    }

    fn io_write(&mut self, addr: u16, data: u8) {
        self.accesses.push(BusAccess {
            addr,
            data,
            op: BusOp::PortWrite,
        });
    }
}

// --- 8080 JSON test vector types (SingleStepTests/8080 format) ---

/// One cycle entry: address, data if the bus was driven, pin activity.
pub type CycleEntry = (u16, Option<u8>, String);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I8080TestCase {
    pub name: String,
    pub initial: I8080CpuState,
    #[serde(rename = "final")]
    pub final_state: I8080CpuState,
    pub cycles: Vec<CycleEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I8080CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inte: Option<u8>,
    pub ram: Vec<(u16, u8)>,
}

impl I8080CpuState {
    pub fn capture(cpu: &I8080) -> Self {
        let s = cpu.snapshot();
        Self {
            pc: s.pc,
            sp: s.sp,
            a: s.a,
            b: s.b,
            c: s.c,
            d: s.d,
            e: s.e,
            f: s.f,
            h: s.h,
            l: s.l,
            inte: Some(s.inte as u8),
            ram: Vec::new(),
        }
    }

    pub fn apply(&self, cpu: &mut I8080) {
        cpu.pc = self.pc;
        cpu.sp = self.sp;
        cpu.a = self.a;
        cpu.b = self.b;
        cpu.c = self.c;
        cpu.d = self.d;
        cpu.e = self.e;
        cpu.flags = Flags::from_byte(self.f);
        cpu.h = self.h;
        cpu.l = self.l;
        if let Some(inte) = self.inte {
            cpu.inte = inte != 0;
        }
        cpu.halted = false;
    }
}

// --- Z80 JSON test vector types (SingleStepTests/z80 format) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80TestCase {
    pub name: String,
    pub initial: Z80CpuState,
    #[serde(rename = "final")]
    pub final_state: Z80CpuState,
    pub cycles: Vec<CycleEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    pub i: u8,
    pub r: u8,
    pub ei: u8,
    pub wz: u16,
    pub ix: u16,
    pub iy: u16,
    #[serde(rename = "af_")]
    pub af_prime: u16,
    #[serde(rename = "bc_")]
    pub bc_prime: u16,
    #[serde(rename = "de_")]
    pub de_prime: u16,
    #[serde(rename = "hl_")]
    pub hl_prime: u16,
    pub im: u8,
    pub p: u8,
    pub q: u8,
    pub iff1: u8,
    pub iff2: u8,
    pub ram: Vec<(u16, u8)>,
}

fn pair(high: u8, low: u8) -> u16 {
    ((high as u16) << 8) | low as u16
}

impl Z80CpuState {
    pub fn capture(cpu: &Z80) -> Self {
        let s = cpu.snapshot();
        Self {
            pc: s.pc,
            sp: s.sp,
            a: s.a,
            b: s.b,
            c: s.c,
            d: s.d,
            e: s.e,
            f: s.f,
            h: s.h,
            l: s.l,
            i: s.i,
            r: s.r,
            // Not part of the snapshot: only meaningful mid-sequence.
            ei: cpu.ei_delay as u8,
            wz: s.memptr,
            ix: s.ix,
            iy: s.iy,
            af_prime: pair(s.a_prime, s.f_prime),
            bc_prime: pair(s.b_prime, s.c_prime),
            de_prime: pair(s.d_prime, s.e_prime),
            hl_prime: pair(s.h_prime, s.l_prime),
            im: s.im,
            p: s.p as u8,
            q: s.q,
            iff1: s.iff1 as u8,
            iff2: s.iff2 as u8,
            ram: Vec::new(),
        }
    }

    pub fn apply(&self, cpu: &mut Z80) {
        cpu.pc = self.pc;
        cpu.sp = self.sp;
        cpu.a = self.a;
        cpu.f = self.f;
        cpu.b = self.b;
        cpu.c = self.c;
        cpu.d = self.d;
        cpu.e = self.e;
        cpu.h = self.h;
        cpu.l = self.l;
        cpu.i = self.i;
        cpu.r = self.r;
        cpu.ei_delay = self.ei != 0;
        cpu.memptr = self.wz;
        cpu.ix = self.ix;
        cpu.iy = self.iy;
        cpu.a_prime = (self.af_prime >> 8) as u8;
        cpu.f_prime = self.af_prime as u8;
        cpu.b_prime = (self.bc_prime >> 8) as u8;
        cpu.c_prime = self.bc_prime as u8;
        cpu.d_prime = (self.de_prime >> 8) as u8;
        cpu.e_prime = self.de_prime as u8;
        cpu.h_prime = (self.hl_prime >> 8) as u8;
        cpu.l_prime = self.hl_prime as u8;
        cpu.im = self.im;
        cpu.p = self.p != 0;
        cpu.q = self.q;
        cpu.iff1 = self.iff1 != 0;
        cpu.iff2 = self.iff2 != 0;
        cpu.halted = false;
    }
}

// --- Vector files ---

/// Parse a vector file, transparently gunzipping `.gz` files.
pub fn load_cases<T: DeserializeOwned>(path: &Path) -> io::Result<Vec<T>> {
    let file = BufReader::new(File::open(path)?);
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    serde_json::from_reader(reader).map_err(io::Error::other)
}

/// `.json` and `.json.gz` files in `dir`, sorted by name.
pub fn vector_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            name.is_some_and(|n| n.ends_with(".json") || n.ends_with(".json.gz"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Turn recorded accesses into a cycle list, padding with idle entries to `total`.
pub fn cycle_entries(accesses: &[BusAccess], total: usize) -> Vec<CycleEntry> {
    let mut cycles: Vec<CycleEntry> = accesses
        .iter()
        .map(|a| (a.addr, Some(a.data), a.op.pins().to_string()))
        .collect();
    while cycles.len() < total {
        cycles.push((0, None, "----".to_string()));
    }
    cycles
}

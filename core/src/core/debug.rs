//! Read-only views of emulator state for debuggers and GUIs.
//!
//! A [`Debugger`] is built once per session and owned by the execution
//! controller. Collaborators pull a [`DebugSnapshot`] whenever they want
//! to draw; nothing is pushed and nothing in a snapshot aliases live
//! state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::core::controller::RunState;
use crate::core::error::EmuResult;
use crate::core::io::IoPorts;
use crate::core::memory::EmulatorMemory;
use crate::cpu::Cpu;

/// Longest instruction: four 16-bit words on the Synacor VM.
const MAX_INSTRUCTION_BYTES: usize = 8;

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassembledLine {
    pub address: u16,
    pub bytes: Vec<u8>,
    pub text: String,
}

impl DisassembledLine {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Display for DisassembledLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: Vec<String> = self.bytes.iter().map(|b| format!("{b:02X}")).collect();
        write!(f, "{:04X}  {:<11}  {}", self.address, hex.join(" "), self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterView {
    pub name: &'static str,
    pub value: u16,
    /// Shadow copy, for CPUs with an alternate register set.
    pub alternate: Option<u16>,
}

impl RegisterView {
    pub fn new(name: &'static str, value: u16) -> Self {
        Self {
            name,
            value,
            alternate: None,
        }
    }

    pub fn with_alternate(name: &'static str, value: u16, alternate: u16) -> Self {
        Self {
            name,
            value,
            alternate: Some(alternate),
        }
    }
}

/// Status byte plus the name of every bit, most significant first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagView {
    pub value: u8,
    pub bits: Vec<(&'static str, u8)>,
}

impl FlagView {
    pub fn is_set(&self, name: &str) -> bool {
        self.bits
            .iter()
            .find(|(n, _)| *n == name)
            .is_some_and(|&(_, bit)| self.value & (1 << bit) != 0)
    }
}

/// What a CPU exposes about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuView {
    pub pc: u16,
    pub sp: u16,
    pub registers: Vec<RegisterView>,
    pub flags: FlagView,
    pub interrupts_enabled: bool,
    pub halted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortView {
    pub port: u8,
    pub label: Option<String>,
    pub value: u8,
    /// Written since the last activity clear.
    pub active: bool,
}

/// Everything a debugger pane shows at one yield point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSnapshot {
    pub state: RunState,
    pub cycles: u64,
    pub pc: u16,
    pub sp: u16,
    pub registers: Vec<RegisterView>,
    pub flags: FlagView,
    pub io: Vec<PortView>,
    pub interrupts_enabled: bool,
    pub halted: bool,
    pub disassembly: Vec<DisassembledLine>,
}

impl DebugSnapshot {
    pub fn register(&self, name: &str) -> Option<u16> {
        self.registers
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value)
    }
}

impl fmt::Display for DebugSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[{:?}] cycles={} pc={:04X} sp={:04X} ie={} halt={}",
            self.state, self.cycles, self.pc, self.sp, self.interrupts_enabled, self.halted
        )?;
        for reg in &self.registers {
            match reg.alternate {
                Some(alt) => write!(f, "{}={:02X}/{:02X} ", reg.name, reg.value, alt)?,
                None => write!(f, "{}={:02X} ", reg.name, reg.value)?,
            }
        }
        writeln!(f)?;
        write!(f, "F={:02X} ", self.flags.value)?;
        for &(name, bit) in &self.flags.bits {
            let set = self.flags.value & (1 << bit) != 0;
            write!(f, "{}", if set { name.to_uppercase() } else { name.to_lowercase() })?;
        }
        writeln!(f)?;
        for port in self.io.iter().filter(|p| p.active) {
            let label = port.label.as_deref().unwrap_or("");
            writeln!(f, "out {:02X} {label} = {:02X}", port.port, port.value)?;
        }
        for line in &self.disassembly {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Debugger
// ---------------------------------------------------------------------------

/// Session-wide debugging configuration: breakpoints, port labels and
/// the disassembly window size.
#[derive(Debug, Clone)]
pub struct Debugger {
    breakpoints: BTreeSet<u16>,
    port_labels: BTreeMap<u8, String>,
    window: usize,
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Debugger {
    pub fn new(window: usize) -> Self {
        Self {
            breakpoints: BTreeSet::new(),
            port_labels: BTreeMap::new(),
            window,
        }
    }

    pub fn add_breakpoint(&mut self, address: u16) {
        self.breakpoints.insert(address);
    }

    pub fn remove_breakpoint(&mut self, address: u16) -> bool {
        self.breakpoints.remove(&address)
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn has_breakpoint(&self, address: u16) -> bool {
        self.breakpoints.contains(&address)
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = u16> + '_ {
        self.breakpoints.iter().copied()
    }

    /// Name a port so it always appears in snapshots.
    pub fn label_port(&mut self, port: u8, label: impl Into<String>) {
        self.port_labels.insert(port, label.into());
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn set_window(&mut self, lines: usize) {
        self.window = lines;
    }

    /// Decode `window` instructions starting at `pc` from a sliced copy
    /// of memory, so mapped devices never see the reads.
    pub fn disassemble_window<C: Cpu + ?Sized>(
        &self,
        cpu: &C,
        memory: &EmulatorMemory,
        pc: u16,
    ) -> EmuResult<Vec<DisassembledLine>> {
        let from = (pc as usize).min(memory.size());
        let to = (from + self.window * MAX_INSTRUCTION_BYTES).min(memory.size());
        let code = memory.slice(from, to)?.to_vec(0, to - from)?;

        let mut lines = Vec::with_capacity(self.window);
        let mut offset = 0;
        while lines.len() < self.window && offset < code.len() {
            let line = cpu.disassemble(&code[offset..], pc.wrapping_add(offset as u16));
            offset += line.len().max(1);
            lines.push(line);
        }
        Ok(lines)
    }

    pub fn ports(&self, io: &IoPorts) -> Vec<PortView> {
        let mut ports: BTreeSet<u8> = self.port_labels.keys().copied().collect();
        ports.extend((0..=255u8).filter(|&p| io.is_active(p)));
        ports
            .into_iter()
            .map(|port| PortView {
                port,
                label: self.port_labels.get(&port).cloned(),
                value: io.output(port),
                active: io.is_active(port),
            })
            .collect()
    }
}

//! Execution controller: the run / pause / step / stop state machine that
//! owns the fetch-decode-execute loop.
//!
//! External collaborators never touch the CPU directly. They post
//! [`Request`]s, either through [`ExecutionController::request`] or
//! through a cloned [`Sender`] from [`ExecutionController::handle`], and
//! the controller applies them at the next yield point (between
//! instructions).

use std::sync::mpsc::{self, Receiver, Sender};

use crate::core::bus::SystemBus;
use crate::core::debug::{DebugSnapshot, Debugger};
use crate::core::error::{EmuError, EmuResult};
use crate::cpu::{Cpu, Interrupt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
    Stepping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Start the session, or resume from Paused or Stepping.
    Run,
    /// Running -> Paused.
    Pause,
    /// Running <-> Paused; Stepping -> Paused.
    TogglePause,
    /// Enter Stepping, or grant one instruction while Stepping.
    Step,
    /// Leave Stepping or Paused and run freely.
    Continue,
    /// Terminal.
    Stop,
}

pub struct ExecutionController<C: Cpu> {
    cpu: C,
    bus: SystemBus,
    debugger: Debugger,
    state: RunState,
    finished: bool,
    step_granted: bool,
    stop_on_halt: bool,
    cycles: u64,
    last_error: Option<EmuError>,
    sender: Sender<Request>,
    requests: Receiver<Request>,
}

impl<C: Cpu> ExecutionController<C> {
    pub fn new(cpu: C, bus: SystemBus) -> Self {
        let (sender, requests) = mpsc::channel();
        Self {
            cpu,
            bus,
            debugger: Debugger::default(),
            state: RunState::Stopped,
            finished: false,
            step_granted: false,
            stop_on_halt: false,
            cycles: 0,
            last_error: None,
            sender,
            requests,
        }
    }

    pub fn with_debugger(mut self, debugger: Debugger) -> Self {
        self.debugger = debugger;
        self
    }

    /// Treat HALT as end of session instead of waiting for an interrupt.
    pub fn with_stop_on_halt(mut self, stop_on_halt: bool) -> Self {
        self.stop_on_halt = stop_on_halt;
        self
    }

    // --- Requests ---

    /// Cloneable request channel for input/GUI threads.
    pub fn handle(&self) -> Sender<Request> {
        self.sender.clone()
    }

    /// Session start: Stopped -> Running. Ignored once the session has
    /// been stopped.
    pub fn start(&mut self) {
        self.request(Request::Run);
    }

    /// Apply a request immediately. Requests that do not apply to the
    /// current state are ignored.
    pub fn request(&mut self, request: Request) {
        use RunState::*;

        let next = match (self.state, request) {
            (_, Request::Stop) => Stopped,
            (Stopped, Request::Run) if !self.finished => Running,
            (Stopped, _) => Stopped,

            (Running, Request::Pause | Request::TogglePause) => Paused,
            (Running, Request::Step) => Stepping,
            (Running, Request::Run | Request::Continue) => Running,

            (Paused, Request::Run | Request::Continue | Request::TogglePause) => Running,
            (Paused, Request::Step) => Stepping,
            (Paused, Request::Pause) => Paused,

            (Stepping, Request::Step) => {
                self.step_granted = true;
                Stepping
            }
            (Stepping, Request::Run | Request::Continue) => Running,
            (Stepping, Request::TogglePause) => Paused,
            (Stepping, Request::Pause) => Stepping,
        };

        if next != self.state {
            log::debug!("{:?} -> {:?} on {:?}", self.state, next, request);
            if next == Stopped {
                self.finished = true;
            }
            if next != Stepping {
                self.step_granted = false;
            }
            self.state = next;
        }
    }

    fn drain_requests(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            self.request(request);
        }
    }

    // --- Execution ---

    /// One yield point: apply queued requests, then run at most one
    /// instruction if the state allows it.
    ///
    /// Returns the cycles spent, or `None` when nothing executed.
    pub fn tick(&mut self) -> EmuResult<Option<u32>> {
        self.drain_requests();

        match self.state {
            RunState::Running => {}
            RunState::Stepping if self.step_granted => self.step_granted = false,
            _ => return Ok(None),
        }

        let cycles = match self.cpu.step(&mut self.bus) {
            Ok(cycles) => cycles,
            Err(e) => {
                log::error!("execution stopped at pc 0x{:04X}: {e}", self.cpu.pc());
                self.last_error = Some(e.clone());
                self.state = RunState::Stopped;
                self.finished = true;
                return Err(e);
            }
        };
        self.cycles += cycles as u64;

        if self.stop_on_halt && self.cpu.is_sleeping() {
            log::info!("HALT at pc 0x{:04X}, stopping", self.cpu.pc());
            self.request(Request::Stop);
        } else if self.state == RunState::Running && self.debugger.has_breakpoint(self.cpu.pc()) {
            log::info!("breakpoint hit: 0x{:04X}", self.cpu.pc());
            self.request(Request::Step);
        }

        Ok(Some(cycles))
    }

    /// Run until `budget` cycles have elapsed, the controller leaves
    /// Running, or an error occurs. Returns the cycles executed.
    ///
    /// In Stepping, executes only the granted instruction (if any).
    pub fn run_for(&mut self, budget: u64) -> EmuResult<u64> {
        let mut spent = 0u64;
        while spent < budget {
            match self.tick()? {
                Some(cycles) => spent += cycles as u64,
                None => break,
            }
            if self.state != RunState::Running {
                break;
            }
        }
        Ok(spent)
    }

    /// Raise an interrupt line on the CPU. Only meaningful between
    /// instructions, which is the only place this can be called from.
    pub fn interrupt(&mut self, interrupt: Interrupt) {
        self.cpu.signal_interrupt(interrupt);
    }

    /// Power-cycle the CPU and clear counters. The run state is kept.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.cycles = 0;
        self.last_error = None;
        self.bus.io.clear_activity();
    }

    // --- Accessors ---

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == RunState::Stopped
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn last_error(&self) -> Option<&EmuError> {
        self.last_error.as_ref()
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    pub fn bus(&self) -> &SystemBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SystemBus {
        &mut self.bus
    }

    pub fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    pub fn debugger_mut(&mut self) -> &mut Debugger {
        &mut self.debugger
    }

    /// Pull a read-only view of the whole session.
    pub fn snapshot(&self) -> EmuResult<DebugSnapshot> {
        let view = self.cpu.debug_view();
        let disassembly = self
            .debugger
            .disassemble_window(&self.cpu, &self.bus.memory, view.pc)?;
        Ok(DebugSnapshot {
            state: self.state,
            cycles: self.cycles,
            pc: view.pc,
            sp: view.sp,
            registers: view.registers,
            flags: view.flags,
            io: self.debugger.ports(&self.bus.io),
            interrupts_enabled: view.interrupts_enabled,
            halted: view.halted,
            disassembly,
        })
    }
}

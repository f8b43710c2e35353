//! Line-oriented terminal debugger.
//!
//! Commands are read from stdin on a helper thread and applied between
//! frames. Run-control commands go through the machine's request channel;
//! breakpoint edits touch the machine's [`Debugger`](cathode_core::core::Debugger)
//! directly since they are only ever made at a yield point.

use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use cathode_core::core::machine::Machine;
use cathode_core::core::{EmuError, Request, RunState};
use thiserror::Error;

use crate::config::parse_address;

/// How long to block for input while the machine is held.
const IDLE_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Step,
    Continue,
    TogglePause,
    Break(u16),
    Delete(u16),
    Registers,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?} (s, c, p, b <hex>, d <hex>, r, q)")]
    Unknown(String),
    #[error("expected a hex address after {0:?}")]
    MissingAddress(String),
    #[error("invalid address {0:?}")]
    BadAddress(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?;
        let address = |words: &mut std::str::SplitWhitespace<'_>| {
            let text = words
                .next()
                .ok_or_else(|| CommandError::MissingAddress(verb.to_string()))?;
            parse_address(text).ok_or_else(|| CommandError::BadAddress(text.to_string()))
        };
        match verb {
            "s" | "step" => Ok(Command::Step),
            "c" | "continue" => Ok(Command::Continue),
            "p" | "pause" => Ok(Command::TogglePause),
            "b" | "break" => Ok(Command::Break(address(&mut words)?)),
            "d" | "delete" => Ok(Command::Delete(address(&mut words)?)),
            "r" | "regs" => Ok(Command::Registers),
            "q" | "quit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

pub struct TerminalDebugger {
    lines: Receiver<String>,
    last_state: Option<RunState>,
    input_closed: bool,
}

impl TerminalDebugger {
    /// Start reading commands from stdin.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self::from_lines(rx)
    }

    pub fn from_lines(lines: Receiver<String>) -> Self {
        Self {
            lines,
            last_state: None,
            input_closed: false,
        }
    }

    /// Apply pending commands at a yield point.
    ///
    /// While the machine is Paused, or Stepping without a granted
    /// instruction, this waits briefly for input so the caller does not
    /// spin. Once stdin closes on a held machine the session is stopped.
    pub fn poll(&mut self, machine: &mut dyn Machine) -> Result<(), EmuError> {
        let state = machine.run_state();
        if self.last_state != Some(state) {
            self.last_state = Some(state);
            if matches!(state, RunState::Paused | RunState::Stepping) {
                self.print_snapshot(machine)?;
            }
        }

        let held = matches!(state, RunState::Paused | RunState::Stepping);
        loop {
            let line = if held && !self.input_closed {
                match self.lines.recv_timeout(IDLE_POLL) {
                    Ok(line) => Some(line),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => {
                        self.input_closed = true;
                        None
                    }
                }
            } else {
                match self.lines.try_recv() {
                    Ok(line) => Some(line),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => {
                        self.input_closed = true;
                        None
                    }
                }
            };

            let Some(line) = line else { break };
            match line.parse::<Command>() {
                Ok(command) => {
                    let resumes = self.apply(command, machine)?;
                    if resumes {
                        break;
                    }
                }
                Err(CommandError::Empty) => {}
                Err(e) => println!("{e}"),
            }
        }

        if held && self.input_closed {
            log::info!("stdin closed while halted in the debugger, stopping");
            machine.request(Request::Stop);
        }
        Ok(())
    }

    /// Apply one command. Returns true when it lets execution proceed.
    pub fn apply(&mut self, command: Command, machine: &mut dyn Machine) -> Result<bool, EmuError> {
        let request = match command {
            Command::Step => Request::Step,
            Command::Continue => Request::Continue,
            Command::TogglePause => Request::TogglePause,
            Command::Quit => Request::Stop,
            Command::Break(address) => {
                machine.debugger_mut().add_breakpoint(address);
                println!("breakpoint set at {address:04X}");
                return Ok(false);
            }
            Command::Delete(address) => {
                if machine.debugger_mut().remove_breakpoint(address) {
                    println!("breakpoint at {address:04X} removed");
                } else {
                    println!("no breakpoint at {address:04X}");
                }
                return Ok(false);
            }
            Command::Registers => {
                self.print_snapshot(machine)?;
                return Ok(false);
            }
        };

        // The channel only closes with the machine, which we hold.
        let _ = machine.control_handle().send(request);
        Ok(true)
    }

    fn print_snapshot(&self, machine: &dyn Machine) -> Result<(), EmuError> {
        let snapshot = machine.debug_snapshot()?;
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{snapshot}");
        let _ = stdout.flush();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cathode_core::cpu::I8080;
    use cathode_machines::CpmMachine;

    fn machine() -> CpmMachine<I8080> {
        // loop: JMP loop
        CpmMachine::new("cpm8080", I8080::new(), &[0xC3, 0x00, 0x01]).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!("s".parse::<Command>(), Ok(Command::Step));
        assert_eq!("continue".parse::<Command>(), Ok(Command::Continue));
        assert_eq!(" p ".parse::<Command>(), Ok(Command::TogglePause));
        assert_eq!("b 0x0105".parse::<Command>(), Ok(Command::Break(0x0105)));
        assert_eq!("d 105".parse::<Command>(), Ok(Command::Delete(0x0105)));
        assert_eq!("r".parse::<Command>(), Ok(Command::Registers));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_commands() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("x".parse::<Command>(), Err(CommandError::Unknown("x".into())));
        assert_eq!("b".parse::<Command>(), Err(CommandError::MissingAddress("b".into())));
        assert_eq!("b zz".parse::<Command>(), Err(CommandError::BadAddress("zz".into())));
    }

    #[test]
    fn commands_drive_the_machine() {
        let (tx, rx) = mpsc::channel();
        let mut debugger = TerminalDebugger::from_lines(rx);
        let mut machine = machine();

        tx.send("b 100".to_string()).unwrap();
        tx.send("p".to_string()).unwrap();
        debugger.poll(&mut machine).unwrap();
        assert!(machine.controller().debugger().has_breakpoint(0x0100));

        // The pause is applied at the next yield point.
        machine.run_frame().unwrap();
        assert_eq!(machine.run_state(), RunState::Paused);

        tx.send("c".to_string()).unwrap();
        debugger.poll(&mut machine).unwrap();
        machine.run_frame().unwrap();
        assert_eq!(machine.run_state(), RunState::Stepping);
        assert_eq!(machine.debug_snapshot().unwrap().pc, 0x0100);
    }

    #[test]
    fn closed_input_stops_held_machine() {
        let (tx, rx) = mpsc::channel::<String>();
        drop(tx);
        let mut debugger = TerminalDebugger::from_lines(rx);
        let mut machine = machine();
        machine.request(Request::Pause);
        machine.run_frame().unwrap();

        debugger.poll(&mut machine).unwrap();
        machine.run_frame().unwrap();
        assert_eq!(machine.run_state(), RunState::Stopped);
    }
}

use std::error::Error;
use std::path::{Path, PathBuf};

use cathode_core::core::machine::{FrameOutcome, Machine};
use cathode_core::core::{Request, RunState};
use cathode_core::cpu::{I8080, Z80};
use cathode_machines::{CpmMachine, RomSet, registry};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;

mod config;
mod debugger;
mod governor;

use config::Config;
use debugger::TerminalDebugger;
use governor::Governor;

/// Samples drained per frame; nothing plays them in a headless session.
const AUDIO_CHUNK: usize = 4096;

#[derive(Parser)]
#[command(name = "cathode", version, about = "8080, Z80, Synacor and LMC machine emulator")]
struct Cli {
    /// Config file (default: <config dir>/cathode/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the registered machines.
    List,
    /// Run a machine from a ROM directory or file.
    Run {
        machine: String,
        /// Falls back to `<rom_path>/<machine>` from the config file.
        path: Option<PathBuf>,
        /// Stop after this many frames.
        #[arg(long)]
        frames: Option<u64>,
        /// Start paused in the debugger.
        #[arg(long, requires = "debug")]
        paused: bool,
        /// Attach the terminal debugger.
        #[arg(long)]
        debug: bool,
        /// Keyboard input for console machines (synacor, lmc), read
        /// whole before the run starts.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Run a CP/M test binary to completion, printing its console output.
    Cpm {
        cpu: CpuKind,
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CpuKind {
    #[value(name = "8080")]
    I8080,
    Z80,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()))
        .init();

    match cli.command {
        Command::List => {
            for entry in registry::all() {
                println!("{:<10} {}", entry.name, entry.description);
            }
            Ok(())
        }
        Command::Run {
            machine,
            path,
            frames,
            paused,
            debug,
            input,
        } => run(&config, &machine, path, frames, paused, debug, input.as_deref()),
        Command::Cpm { cpu, file } => run_cpm(cpu, &file),
    }
}

fn run(
    config: &Config,
    name: &str,
    path: Option<PathBuf>,
    frames: Option<u64>,
    paused: bool,
    debug: bool,
    input: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let Some(entry) = registry::find(name) else {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        return Err(format!("unknown machine {name:?} (available: {})", names.join(", ")).into());
    };
    let Some(path) = path.or_else(|| config.machine_rom_path(name)) else {
        return Err(format!("no ROM path given for {name} and no rom_path configured").into());
    };

    let rom_set = RomSet::from_path(&path)?;
    let mut machine = (entry.create)(&rom_set)?;
    log::info!("loaded {} from {}", entry.name, path.display());

    if let Some(input) = input {
        let text = std::fs::read_to_string(input)?;
        log::debug!("queued {} bytes of console input", text.len());
        machine.console_input(&text, true);
    }

    machine.debugger_mut().set_window(config.disassembly_window);
    for address in config.breakpoint_addresses()? {
        machine.debugger_mut().add_breakpoint(address);
    }
    if paused {
        machine.request(Request::Pause);
    }

    let mut debugger = debug.then(TerminalDebugger::spawn);
    let mut governor = config.throttle.then(|| Governor::new(machine.frame_rate_hz()));
    if let Some(governor) = &governor {
        log::debug!("pacing frames every {:?}", governor.frame_duration());
    }
    let frame_limit = frames.or(config.frame_limit);

    let executed = drive(machine.as_mut(), frame_limit, debugger.as_mut(), governor.as_mut())?;
    log::info!("{} frames executed", executed);

    if let Some(console) = machine.console_output() {
        print!("{console}");
    }
    Ok(())
}

/// Run frames until the session finishes or `frame_limit` running frames
/// have elapsed. Returns the number of running frames.
fn drive(
    machine: &mut dyn Machine,
    frame_limit: Option<u64>,
    mut debugger: Option<&mut TerminalDebugger>,
    mut governor: Option<&mut Governor>,
) -> Result<u64, Box<dyn Error>> {
    let mut audio = vec![0i16; AUDIO_CHUNK];
    let mut executed = 0u64;

    while frame_limit.is_none_or(|limit| executed < limit) {
        if let Some(debugger) = debugger.as_deref_mut() {
            debugger.poll(machine)?;
        }

        let running = machine.run_state() == RunState::Running;
        let outcome = machine.run_frame()?;
        if running {
            executed += 1;
        }
        if outcome == FrameOutcome::Finished {
            break;
        }
        while machine.fill_audio(&mut audio) == audio.len() {}

        if let Some(governor) = governor.as_deref_mut() {
            if running {
                governor.wait();
            } else {
                governor.resync();
            }
        }
    }
    Ok(executed)
}

fn run_cpm(cpu: CpuKind, file: &Path) -> Result<(), Box<dyn Error>> {
    let program = std::fs::read(file)?;
    log::info!("running {} ({} bytes)", file.display(), program.len());

    let cycles = match cpu {
        CpuKind::I8080 => {
            let mut machine = CpmMachine::new("cpm8080", I8080::new(), &program)?.with_echo(true);
            machine.run_to_completion()?;
            machine.controller().cycles()
        }
        CpuKind::Z80 => {
            let mut machine = CpmMachine::new("cpmz80", Z80::new(), &program)?.with_echo(true);
            machine.run_to_completion()?;
            machine.controller().cycles()
        }
    };
    println!();
    log::info!("finished after {cycles} cycles");
    Ok(())
}

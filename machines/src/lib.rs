//! Concrete systems built on `cathode-core`.

pub mod cpm;
pub mod frame;
pub mod invaders;
pub mod lmc;
pub mod pacman;
pub mod registry;
pub mod rom_loader;
pub mod synacor;

pub use cpm::CpmMachine;
pub use invaders::InvadersMachine;
pub use lmc::LmcMachine;
pub use pacman::PacmanMachine;
pub use rom_loader::{RomLoadError, RomSet};
pub use synacor::SynacorMachine;

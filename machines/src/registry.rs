//! Machine registry.
//!
//! Machines register themselves with [`inventory::submit!`]; the front end
//! lists and builds them by name without a central table.

use cathode_core::core::machine::Machine;

use crate::rom_loader::{RomLoadError, RomSet};

pub type MachineFactory = fn(&RomSet) -> Result<Box<dyn Machine>, RomLoadError>;

pub struct MachineEntry {
    /// Name used on the command line (e.g. "invaders").
    pub name: &'static str,
    /// One-line description for `list`.
    pub description: &'static str,
    pub create: MachineFactory,
}

impl MachineEntry {
    pub const fn new(name: &'static str, description: &'static str, create: MachineFactory) -> Self {
        Self {
            name,
            description,
            create,
        }
    }
}

inventory::collect!(MachineEntry);

/// All registered machines, sorted by name.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name == name)
}

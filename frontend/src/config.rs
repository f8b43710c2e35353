//! Optional user configuration read from `config.toml`.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid breakpoint address {0:?}")]
    Breakpoint(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default `env_logger` filter; `RUST_LOG` overrides it.
    pub log_level: String,
    /// Directory holding one ROM folder per machine.
    pub rom_path: Option<PathBuf>,
    /// Hex addresses, with or without a `0x` prefix.
    pub breakpoints: Vec<String>,
    pub disassembly_window: usize,
    pub frame_limit: Option<u64>,
    /// Pace frames to the machine's real refresh rate.
    pub throttle: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            rom_path: None,
            breakpoints: Vec::new(),
            disassembly_window: 10,
            frame_limit: None,
            throttle: true,
        }
    }
}

impl Config {
    /// `<config dir>/cathode/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cathode").join("config.toml"))
    }

    /// Load `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn breakpoint_addresses(&self) -> Result<Vec<u16>, ConfigError> {
        self.breakpoints
            .iter()
            .map(|text| parse_address(text).ok_or_else(|| ConfigError::Breakpoint(text.clone())))
            .collect()
    }

    /// Where a machine's ROMs live when no path is given on the command line.
    pub fn machine_rom_path(&self, machine: &str) -> Option<PathBuf> {
        self.rom_path.as_ref().map(|dir| dir.join(machine))
    }
}

/// Parse a 16-bit hex address such as `1a2b`, `0x1A2B` or `1A2Bh`.
pub fn parse_address(text: &str) -> Option<u16> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_suffix('h'))
        .or_else(|| text.strip_suffix('H'))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).ok()
}

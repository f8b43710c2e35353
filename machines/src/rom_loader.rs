//! ROM and program image loading.
//!
//! A [`RomSet`] is a bag of named files, read from a directory, from a
//! single file (CP/M programs) or from byte slices in tests. Boards describe
//! where each chip lands with a static [`RomRegion`]; loading checks sizes
//! and, unless skipped, CRC-32 checksums.

use std::collections::HashMap;
use std::path::Path;

use cathode_core::core::EmuError;
use cathode_core::cpu::lmc::AssembleError;
use cathode_core::device::DeviceError;
use thiserror::Error;

const CRC32_POLY: u32 = 0xEDB8_8320;

const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut crc = n as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ CRC32_POLY } else { crc >> 1 };
            bit += 1;
        }
        table[n] = crc;
        n += 1;
    }
    table
};

/// CRC-32 as used by ZIP and MAME ROM listings.
pub fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(!0u32, |crc, &byte| {
        (crc >> 8) ^ CRC32_TABLE[((crc ^ byte as u32) & 0xFF) as usize]
    })
}

#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing ROM file: {0}")]
    MissingFile(String),

    #[error("ROM {file}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        file: String,
        expected: usize,
        actual: usize,
    },

    #[error("ROM {file}: CRC32 0x{actual:08X} matches none of the known dumps")]
    ChecksumMismatch { file: String, actual: u32 },

    #[error("program of {size} bytes does not fit in {capacity} bytes")]
    ProgramTooLarge { size: usize, capacity: usize },

    #[error("program source is not UTF-8: {0}")]
    NotText(#[from] std::str::Utf8Error),

    #[error("assembly failed: {0}")]
    Assembly(#[from] AssembleError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Memory(#[from] EmuError),
}

// ---------------------------------------------------------------------------
// RomSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RomSet {
    files: HashMap<String, Vec<u8>>,
}

impl RomSet {
    /// Every regular file directly inside `path`, keyed by file name.
    pub fn from_directory(path: &Path) -> Result<Self, RomLoadError> {
        let mut files = HashMap::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            if let Some(name) = file_path.file_name() {
                files.insert(name.to_string_lossy().into_owned(), std::fs::read(&file_path)?);
            }
        }
        log::debug!("loaded {} files from {}", files.len(), path.display());
        Ok(Self { files })
    }

    /// A directory of ROM dumps, or a single program file.
    pub fn from_path(path: &Path) -> Result<Self, RomLoadError> {
        if path.is_dir() {
            return Self::from_directory(path);
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = std::fs::read(path)?;
        Ok(Self {
            files: HashMap::from([(name, data)]),
        })
    }

    pub fn from_slices(entries: &[(&str, &[u8])]) -> Self {
        Self {
            files: entries
                .iter()
                .map(|(name, data)| (name.to_string(), data.to_vec()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn require(&self, name: &str) -> Result<&[u8], RomLoadError> {
        self.get(name)
            .ok_or_else(|| RomLoadError::MissingFile(name.to_string()))
    }

    pub fn require_sized(&self, name: &str, expected: usize) -> Result<&[u8], RomLoadError> {
        let data = self.require(name)?;
        if data.len() != expected {
            return Err(RomLoadError::SizeMismatch {
                file: name.to_string(),
                expected,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// The only file in the set. Used for single-image machines.
    pub fn single(&self) -> Result<&[u8], RomLoadError> {
        let mut files = self.files.values();
        match (files.next(), files.next()) {
            (Some(data), None) => Ok(data),
            _ => Err(RomLoadError::MissingFile(format!(
                "expected exactly one program file, found {}",
                self.files.len()
            ))),
        }
    }

    /// File names, sorted.
    pub fn file_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.files.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RomEntry / RomRegion
// ---------------------------------------------------------------------------

/// One chip dump and where it lands inside its region.
pub struct RomEntry {
    pub name: &'static str,
    pub size: usize,
    pub offset: usize,
    /// Accepted checksums. Empty means any contents are accepted.
    pub crc32: &'static [u32],
}

pub struct RomRegion {
    pub size: usize,
    pub entries: &'static [RomEntry],
}

impl RomRegion {
    /// Assemble the region, checking sizes and checksums.
    pub fn load(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.assemble(rom_set, true)
    }

    /// Assemble the region, checking sizes only. For patched or homebrew dumps.
    pub fn load_skip_checksums(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.assemble(rom_set, false)
    }

    fn assemble(&self, rom_set: &RomSet, verify: bool) -> Result<Vec<u8>, RomLoadError> {
        let mut region = vec![0u8; self.size];
        for entry in self.entries {
            let data = rom_set.require_sized(entry.name, entry.size)?;
            if verify && !entry.crc32.is_empty() {
                let actual = crc32(data);
                if !entry.crc32.contains(&actual) {
                    return Err(RomLoadError::ChecksumMismatch {
                        file: entry.name.to_string(),
                        actual,
                    });
                }
            }
            let end = entry.offset + entry.size;
            if end > self.size {
                return Err(RomLoadError::ProgramTooLarge {
                    size: end,
                    capacity: self.size,
                });
            }
            region[entry.offset..end].copy_from_slice(data);
        }
        Ok(region)
    }
}

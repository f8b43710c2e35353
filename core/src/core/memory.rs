//! Addressable memory: a physical byte arena behind a logical index table.
//!
//! Regions are appended with [`EmulatorMemory::add`]. Hardware mirroring is
//! modelled with [`EmulatorMemory::add_link`], which appends logical
//! addresses that resolve to physical bytes that already exist. A write
//! through either address is visible through both.
//!
//! A machine can attach a [`MemoryMapper`] to intercept every CPU access
//! (memory-mapped I/O). The mapper receives the underlying [`MemoryStore`]
//! so it can fall through to plain RAM for the addresses it does not own.

use std::any::Any;
use std::fmt;

use crate::core::error::{EmuError, EmuResult};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Physical storage plus the logical-to-physical translation table.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Vec<u8>,
    index: Vec<usize>,
}

impl MemoryStore {
    /// Logical size (length of the translation table).
    pub fn size(&self) -> usize {
        self.index.len()
    }

    /// Number of physical bytes backing the logical space.
    pub fn physical_size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn physical(&self, address: usize) -> EmuResult<usize> {
        self.index
            .get(address)
            .copied()
            .ok_or(EmuError::AddressOutOfRange {
                address,
                size: self.index.len(),
            })
    }

    #[inline]
    pub fn read(&self, address: u16) -> EmuResult<u8> {
        let physical = self.physical(address as usize)?;
        Ok(self.data[physical])
    }

    #[inline]
    pub fn write(&mut self, address: u16, value: u8) -> EmuResult<()> {
        let physical = self.physical(address as usize)?;
        self.data[physical] = value;
        Ok(())
    }

    fn check_range(&self, from: usize, to: usize) -> EmuResult<()> {
        if from > to || to > self.index.len() {
            return Err(EmuError::InvalidLink {
                from,
                to,
                size: self.index.len(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryMapper
// ---------------------------------------------------------------------------

/// Intercepts CPU reads and writes for memory-mapped hardware.
///
/// Once attached, every [`EmulatorMemory::read`] and
/// [`EmulatorMemory::write`] is routed here. Addresses that are plain RAM
/// should be forwarded to `store`.
pub trait MemoryMapper {
    fn read(&mut self, store: &mut MemoryStore, address: u16) -> EmuResult<u8>;
    fn write(&mut self, store: &mut MemoryStore, address: u16, value: u8) -> EmuResult<()>;

    /// Downcast hook so the owning machine can reach its mapper state.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ---------------------------------------------------------------------------
// EmulatorMemory
// ---------------------------------------------------------------------------

/// Logical address space assembled from ROM and RAM images.
#[derive(Default)]
pub struct EmulatorMemory {
    store: MemoryStore,
    mapper: Option<Box<dyn MemoryMapper>>,
}

impl EmulatorMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a flat, identity-mapped memory from a single image.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut memory = Self::new();
        memory.add(bytes);
        memory
    }

    /// Append a region. The new logical range maps 1:1 onto new storage.
    pub fn add(&mut self, bytes: &[u8]) {
        let base = self.store.data.len();
        self.store.data.extend_from_slice(bytes);
        self.store.index.extend(base..base + bytes.len());
    }

    /// Append `to - from` logical addresses that alias the physical bytes
    /// currently mapped by `[from, to)`. No storage is allocated.
    pub fn add_link(&mut self, from: usize, to: usize) -> EmuResult<()> {
        self.store.check_range(from, to)?;
        let aliases: Vec<usize> = self.store.index[from..to].to_vec();
        self.store.index.extend(aliases);
        Ok(())
    }

    /// Logical size. Always equal to the translation table length.
    pub fn size(&self) -> usize {
        self.store.size()
    }

    pub fn physical_size(&self) -> usize {
        self.store.physical_size()
    }

    pub fn read(&mut self, address: u16) -> EmuResult<u8> {
        match self.mapper.as_mut() {
            Some(mapper) => mapper.read(&mut self.store, address),
            None => self.store.read(address),
        }
    }

    pub fn write(&mut self, address: u16, value: u8) -> EmuResult<()> {
        match self.mapper.as_mut() {
            Some(mapper) => mapper.write(&mut self.store, address, value),
            None => self.store.write(address, value),
        }
    }

    /// Read through the translation table, bypassing any mapper.
    pub fn direct_read(&self, address: u16) -> EmuResult<u8> {
        self.store.read(address)
    }

    /// Write through the translation table, bypassing any mapper.
    pub fn direct_write(&mut self, address: u16, value: u8) -> EmuResult<()> {
        self.store.write(address, value)
    }

    /// Copy the logical bytes in `[from, to)` into a new flat memory.
    ///
    /// The copy has no mapper and no links, so reading it never triggers
    /// device side effects.
    pub fn slice(&self, from: usize, to: usize) -> EmuResult<EmulatorMemory> {
        Ok(EmulatorMemory::from_bytes(&self.to_vec(from, to)?))
    }

    /// Logical bytes in `[from, to)` as a plain vector.
    pub fn to_vec(&self, from: usize, to: usize) -> EmuResult<Vec<u8>> {
        self.store.check_range(from, to)?;
        Ok(self.store.index[from..to]
            .iter()
            .map(|&physical| self.store.data[physical])
            .collect())
    }

    pub fn attach_memory_mapper(&mut self, mapper: Box<dyn MemoryMapper>) {
        self.mapper = Some(mapper);
    }

    pub fn detach_memory_mapper(&mut self) -> Option<Box<dyn MemoryMapper>> {
        self.mapper.take()
    }

    pub fn has_memory_mapper(&self) -> bool {
        self.mapper.is_some()
    }

    /// Borrow the attached mapper as its concrete type.
    pub fn mapper_mut<M: MemoryMapper + 'static>(&mut self) -> Option<&mut M> {
        self.mapper
            .as_mut()
            .and_then(|mapper| mapper.as_any_mut().downcast_mut::<M>())
    }
}

impl fmt::Debug for EmulatorMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmulatorMemory")
            .field("size", &self.size())
            .field("physical_size", &self.physical_size())
            .field("mapped", &self.mapper.is_some())
            .finish()
    }
}

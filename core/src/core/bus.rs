use crate::core::error::EmuResult;
use crate::core::io::IoPorts;
use crate::core::memory::EmulatorMemory;

/// What a CPU sees of the outside world during one instruction.
pub trait Bus {
    fn read(&mut self, addr: u16) -> EmuResult<u8>;
    fn write(&mut self, addr: u16, data: u8) -> EmuResult<()>;

    /// Read from the I/O space. The 8080 repeats the port number on both
    /// address bytes; the Z80 drives A or B on the high byte.
    fn io_read(&mut self, addr: u16) -> u8;

    /// Write to the I/O space. See [`io_read`](Self::io_read) for the address.
    fn io_write(&mut self, addr: u16, data: u8);
}

/// Memory plus port space, the standard bus for a single-CPU system.
#[derive(Debug, Default)]
pub struct SystemBus {
    pub memory: EmulatorMemory,
    pub io: IoPorts,
}

impl SystemBus {
    pub fn new(memory: EmulatorMemory) -> Self {
        Self {
            memory,
            io: IoPorts::new(),
        }
    }
}

impl Bus for SystemBus {
    #[inline]
    fn read(&mut self, addr: u16) -> EmuResult<u8> {
        self.memory.read(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, data: u8) -> EmuResult<()> {
        self.memory.write(addr, data)
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        self.io.read(addr as u8)
    }

    fn io_write(&mut self, addr: u16, data: u8) {
        self.io.write(addr as u8, data)
    }
}

//! Fujitsu MB14241 barrel shifter, as wired on the Space Invaders board.
//!
//! The 8080 has no multi-bit shift, so the board pairs it with a 16-bit
//! register: each byte written to the data port is shifted in from the
//! top, and reading the result port returns 8 bits taken `offset` bits
//! below the top.

use crate::core::io::PortObserver;
use crate::device::DeviceError;

/// Default Space Invaders wiring.
pub const OFFSET_PORT: u8 = 2;
pub const RESULT_PORT: u8 = 3;
pub const DATA_PORT: u8 = 4;

#[derive(Debug, Clone)]
pub struct ShiftRegister {
    value: u16,
    offset: u8,
    offset_port: u8,
    data_port: u8,
    result_port: u8,
}

impl Default for ShiftRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl ShiftRegister {
    pub fn new() -> Self {
        Self::with_ports(OFFSET_PORT, DATA_PORT, RESULT_PORT)
    }

    pub fn with_ports(offset_port: u8, data_port: u8, result_port: u8) -> Self {
        Self {
            value: 0,
            offset: 0,
            offset_port,
            data_port,
            result_port,
        }
    }

    /// Select the read offset. Only 0..=7 is wired; anything wider is
    /// rejected and the current offset kept.
    pub fn change_offset(&mut self, offset: u8) -> Result<(), DeviceError> {
        if offset > 7 {
            return Err(DeviceError::ShiftOffsetOutOfRange { offset });
        }
        self.offset = offset;
        Ok(())
    }

    /// Shift `data` into the high byte; the old high byte drops to the low byte.
    pub fn shift(&mut self, data: u8) {
        self.value = ((data as u16) << 8) | (self.value >> 8);
    }

    pub fn read(&self) -> u8 {
        (self.value >> (8 - self.offset)) as u8
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }
}

impl PortObserver for ShiftRegister {
    fn on_port_written(&mut self, port: u8, value: u8) -> Result<(), DeviceError> {
        if port == self.offset_port {
            self.change_offset(value)?;
        } else if port == self.data_port {
            self.shift(value);
        }
        Ok(())
    }

    fn on_port_read(&mut self, port: u8) -> Option<u8> {
        (port == self.result_port).then(|| self.read())
    }
}

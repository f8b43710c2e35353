//! I/O port space shared by IN/OUT instructions and device models.
//!
//! The 8080 and Z80 address 256 ports. Input and output are separate
//! latches: an OUT to a port does not change what a later IN returns,
//! which matches how arcade boards wire their input buffers and output
//! latches to different chips.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::device::DeviceError;

pub const PORT_COUNT: usize = 256;

/// A device that reacts to port traffic.
///
/// Observers run synchronously, in registration order, inside the
/// instruction that touched the port.
pub trait PortObserver {
    /// Called after an OUT has latched `value` on `port`.
    fn on_port_written(&mut self, port: u8, value: u8) -> Result<(), DeviceError>;

    /// Called before an IN reads `port`. Returning `Some` replaces the
    /// input latch with a freshly computed value.
    fn on_port_read(&mut self, _port: u8) -> Option<u8> {
        None
    }
}

/// Port latches plus the observers notified on access.
pub struct IoPorts {
    inputs: [u8; PORT_COUNT],
    outputs: [u8; PORT_COUNT],
    active: [bool; PORT_COUNT],
    observers: Vec<Box<dyn PortObserver>>,
}

impl Default for IoPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl IoPorts {
    pub fn new() -> Self {
        Self {
            inputs: [0; PORT_COUNT],
            outputs: [0; PORT_COUNT],
            active: [false; PORT_COUNT],
            observers: Vec::new(),
        }
    }

    /// Value seen by an IN instruction.
    pub fn read(&mut self, port: u8) -> u8 {
        for observer in &mut self.observers {
            if let Some(value) = observer.on_port_read(port) {
                self.inputs[port as usize] = value;
            }
        }
        self.inputs[port as usize]
    }

    /// Latch an OUT and notify observers.
    ///
    /// A misbehaving device payload is reported and dropped; it never
    /// aborts the instruction.
    pub fn write(&mut self, port: u8, value: u8) {
        self.outputs[port as usize] = value;
        self.active[port as usize] = true;
        for observer in &mut self.observers {
            if let Err(e) = observer.on_port_written(port, value) {
                log::warn!("port 0x{port:02X} write 0x{value:02X} ignored: {e}");
            }
        }
    }

    /// Set an input latch (keyboard, coin switch, dip switch bank).
    pub fn set_input(&mut self, port: u8, value: u8) {
        self.inputs[port as usize] = value;
    }

    pub fn input(&self, port: u8) -> u8 {
        self.inputs[port as usize]
    }

    /// Last value written to `port`.
    pub fn output(&self, port: u8) -> u8 {
        self.outputs[port as usize]
    }

    /// True if `port` was written since the last [`clear_activity`](Self::clear_activity).
    pub fn is_active(&self, port: u8) -> bool {
        self.active[port as usize]
    }

    pub fn clear_activity(&mut self) {
        self.active = [false; PORT_COUNT];
    }

    pub fn add_observer(&mut self, observer: Box<dyn PortObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl fmt::Debug for IoPorts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active: Vec<u8> = (0..=255u8).filter(|&p| self.is_active(p)).collect();
        f.debug_struct("IoPorts")
            .field("active", &active)
            .field("observers", &self.observers.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ChannelObserver
// ---------------------------------------------------------------------------

/// A single OUT event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortWrite {
    pub port: u8,
    pub value: u8,
}

/// Forwards selected port writes over a channel.
///
/// Used when servicing a port needs more than the written byte (for
/// example CPU registers); the owner drains the receiver between
/// instructions.
pub struct ChannelObserver {
    ports: Vec<u8>,
    sender: Sender<PortWrite>,
}

impl ChannelObserver {
    /// Observer for `ports` and the receiving end of its channel.
    pub fn new(ports: &[u8]) -> (Self, Receiver<PortWrite>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                ports: ports.to_vec(),
                sender,
            },
            receiver,
        )
    }
}

impl PortObserver for ChannelObserver {
    fn on_port_written(&mut self, port: u8, value: u8) -> Result<(), DeviceError> {
        if self.ports.contains(&port) {
            // A dropped receiver means nobody is listening any more.
            let _ = self.sender.send(PortWrite { port, value });
        }
        Ok(())
    }
}

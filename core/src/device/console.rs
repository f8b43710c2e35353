//! Keyboard buffer for the console-style word machines.
//!
//! The front end pushes bytes through a channel. The CPU polls the status
//! port for the number of bytes waiting (saturating at 255) and reads them
//! one at a time from the data port. Reading an empty buffer yields 0.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::core::io::PortObserver;
use crate::device::DeviceError;

pub struct ConsoleInput {
    data_port: u8,
    status_port: u8,
    incoming: Receiver<u8>,
    buffered: VecDeque<u8>,
}

impl ConsoleInput {
    /// The observer plus the sending half for whoever types.
    pub fn new(data_port: u8, status_port: u8) -> (Self, Sender<u8>) {
        let (tx, rx) = mpsc::channel();
        let input = Self {
            data_port,
            status_port,
            incoming: rx,
            buffered: VecDeque::new(),
        };
        (input, tx)
    }

    fn fill(&mut self) {
        self.buffered.extend(self.incoming.try_iter());
    }
}

impl PortObserver for ConsoleInput {
    fn on_port_written(&mut self, _port: u8, _value: u8) -> Result<(), DeviceError> {
        Ok(())
    }

    fn on_port_read(&mut self, port: u8) -> Option<u8> {
        if port == self.status_port {
            self.fill();
            Some(self.buffered.len().min(u8::MAX as usize) as u8)
        } else if port == self.data_port {
            self.fill();
            Some(self.buffered.pop_front().unwrap_or(0))
        } else {
            None
        }
    }
}

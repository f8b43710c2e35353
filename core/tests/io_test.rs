use std::cell::RefCell;
use std::rc::Rc;

use cathode_core::core::{Bus, ChannelObserver, IoPorts, PortObserver, PortWrite, SystemBus};
use cathode_core::device::{DeviceError, ShiftRegister};

type Log = Rc<RefCell<Vec<(&'static str, u8, u8)>>>;

struct Recorder {
    name: &'static str,
    log: Log,
}

impl PortObserver for Recorder {
    fn on_port_written(&mut self, port: u8, value: u8) -> Result<(), DeviceError> {
        self.log.borrow_mut().push((self.name, port, value));
        Ok(())
    }
}

#[test]
fn test_input_and_output_latches_are_separate() {
    let mut io = IoPorts::new();
    io.set_input(1, 0x0F);
    io.write(1, 0xF0);

    assert_eq!(io.read(1), 0x0F);
    assert_eq!(io.output(1), 0xF0);
    assert_eq!(io.input(1), 0x0F);
}

#[test]
fn test_activity_tracking() {
    let mut io = IoPorts::new();
    assert!(!io.is_active(3));

    io.write(3, 1);
    assert!(io.is_active(3));
    assert!(!io.is_active(4));

    io.clear_activity();
    assert!(!io.is_active(3));
    assert_eq!(io.output(3), 1, "clearing activity keeps the latch");
}

#[test]
fn test_observers_run_in_registration_order() {
    let log: Log = Rc::default();
    let mut io = IoPorts::new();
    io.add_observer(Box::new(Recorder {
        name: "first",
        log: log.clone(),
    }));
    io.add_observer(Box::new(Recorder {
        name: "second",
        log: log.clone(),
    }));

    io.write(7, 0x99);
    assert_eq!(io.observer_count(), 2);
    assert_eq!(*log.borrow(), vec![("first", 7, 0x99), ("second", 7, 0x99)]);
}

#[test]
fn test_observer_supplies_read_value() {
    let mut io = IoPorts::new();
    io.add_observer(Box::new(ShiftRegister::new()));

    io.write(4, 0xAB); // shift data
    io.write(4, 0xCD);
    io.write(2, 4); // offset
    assert_eq!(io.read(3), 0xDA);
}

#[test]
fn test_observer_error_is_dropped() {
    let log: Log = Rc::default();
    let mut io = IoPorts::new();
    io.add_observer(Box::new(ShiftRegister::new()));
    io.add_observer(Box::new(Recorder {
        name: "after",
        log: log.clone(),
    }));

    io.write(4, 0xFF);
    io.write(2, 9); // offset too wide
    assert_eq!(io.output(2), 9);
    assert_eq!(io.read(3), 0xFF, "offset unchanged at 0");
    assert_eq!(log.borrow().len(), 2, "later observers still run");
}

#[test]
fn test_channel_observer_filters_ports() {
    let (observer, events) = ChannelObserver::new(&[0, 1]);
    let mut io = IoPorts::new();
    io.add_observer(Box::new(observer));

    io.write(1, 9);
    io.write(2, 5);
    io.write(0, 0);

    let received: Vec<PortWrite> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![PortWrite { port: 1, value: 9 }, PortWrite { port: 0, value: 0 }]
    );
}

#[test]
fn test_system_bus_uses_low_port_byte() {
    let mut bus = SystemBus::default();
    bus.io.set_input(0x34, 0x77);

    bus.io_write(0x1234, 7);
    assert_eq!(bus.io.output(0x34), 7);
    assert_eq!(bus.io_read(0xFF34), 0x77);
}

//! Bus and delay double shared by the driver tests.

extern crate std;

use core::cell::RefCell;
use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};
use std::rc::Rc;
use std::vec;
use std::vec::Vec;

use crate::{LCD_ADDRESS, RGB_ADDRESS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Write(u8, Vec<u8>),
    Delay(u64),
}

/// Records bus writes and delays into one log so their order can be checked. Clones share the
/// log, one clone goes in as the bus and one as the delay.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<Event>>>,
    fail_writes: Rc<RefCell<bool>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    /// Events recorded after the first `skip` ones.
    pub fn events_after(&self, skip: usize) -> Vec<Event> {
        self.log.borrow()[skip..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    /// Make every following write fail with [`ErrorKind::Other`].
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.borrow_mut() = fail;
    }

    fn push(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }

    fn record(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if *self.fail_writes.borrow() {
            return Err(ErrorKind::Other);
        }
        for op in operations {
            if let Operation::Write(bytes) = op {
                self.push(Event::Write(address, bytes.to_vec()));
            }
        }
        Ok(())
    }
}

impl ErrorType for Recorder {
    type Error = ErrorKind;
}

impl embedded_hal::i2c::I2c for Recorder {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.record(address, operations)
    }
}

impl embedded_hal::delay::DelayNs for Recorder {
    fn delay_ns(&mut self, ns: u32) {
        self.push(Event::Delay(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        self.push(Event::Delay(us as u64 * 1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.push(Event::Delay(ms as u64 * 1_000_000));
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::i2c::I2c for Recorder {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.record(address, operations)
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for Recorder {
    async fn delay_ns(&mut self, ns: u32) {
        self.push(Event::Delay(ns as u64));
    }

    async fn delay_us(&mut self, us: u32) {
        self.push(Event::Delay(us as u64 * 1_000));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.push(Event::Delay(ms as u64 * 1_000_000));
    }
}

pub fn lcd_write(code: u8) -> Event {
    Event::Write(LCD_ADDRESS, vec![0x80, code])
}

pub fn data_write(byte: u8) -> Event {
    Event::Write(LCD_ADDRESS, vec![0x40, byte])
}

pub fn rgb_write(register: u8, value: u8) -> Event {
    Event::Write(RGB_ADDRESS, vec![register, value])
}

pub fn ms(ms: u64) -> Event {
    Event::Delay(ms * 1_000_000)
}

/// Everything a 16x2 controller puts on the bus during `begin`, waits included.
pub fn init_events() -> Vec<Event> {
    vec![
        ms(50),
        lcd_write(0x28),
        ms(5),
        lcd_write(0x28),
        ms(5),
        lcd_write(0x28),
        lcd_write(0x28),
        lcd_write(0x0C),
        lcd_write(0x01),
        ms(2),
        lcd_write(0x06),
        rgb_write(0x00, 0x00),
        rgb_write(0x08, 0xFF),
        rgb_write(0x01, 0x20),
        rgb_write(0x04, 0xFF),
        rgb_write(0x03, 0xFF),
        rgb_write(0x02, 0xFF),
    ]
}

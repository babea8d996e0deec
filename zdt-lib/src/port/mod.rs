use anyhow::Result;
use core::time::Duration;
use log::debug;
use serialport::{self, SerialPort, SerialPortType};
use std::io::Read;
use std::time::Instant;
use thiserror::Error;

use crate::protocol::receive::{ByteSource, Clock};

#[derive(Error, Debug)]
pub enum OpenPortError {
    #[error("no compatible usb serial adapter found")]
    NoCompatiblePort,
}

#[derive(PartialEq)]
struct UsbId(u16, u16);

static COMPATIBLE_IDS: &[UsbId] = &[
    UsbId(0x1a86, 0x7523), // QinHeng Electronics HL-340 USB-Serial adapter
    UsbId(0x10c4, 0xea60), // Silicon Labs CP210x
    UsbId(0x0403, 0x6001), // FTDI FT232R
];

pub fn open_port(port_name: &str, baudrate: u32) -> Result<Box<dyn SerialPort>> {
    let true_name: String = if port_name == "auto" {
        guess_port()?
    } else {
        port_name.to_string()
    };

    let mut port = serialport::new(&true_name, baudrate).open()?;
    // Short timeout keeps the receive loop's availability polling cheap.
    port.set_timeout(Duration::from_millis(10))?;

    debug!("open_port OK: {} @ {} baud", &true_name, baudrate);
    Ok(port)
}

fn guess_port() -> Result<String> {
    serialport::available_ports()?
        .into_iter()
        .filter(|info| match &info.port_type {
            SerialPortType::UsbPort(usb_info) => {
                COMPATIBLE_IDS.contains(&UsbId(usb_info.vid, usb_info.pid))
            }
            _ => false,
        })
        .map(|info| info.port_name)
        .next()
        .ok_or_else(|| OpenPortError::NoCompatiblePort.into())
}

/// [`ByteSource`] over a serial port.
pub struct SerialSource<'a> {
    port: &'a mut dyn SerialPort,
}

impl<'a> SerialSource<'a> {
    pub fn new(port: &'a mut dyn SerialPort) -> Self {
        SerialSource { port }
    }
}

impl ByteSource for SerialSource<'_> {
    fn has_data(&mut self) -> Result<bool> {
        Ok(self.port.bytes_to_read()? > 0)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.port.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}

/// Monotonic wall clock for the receive loop.
pub struct SystemClock(Instant);

impl SystemClock {
    pub fn new() -> Self {
        SystemClock(Instant::now())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.0.elapsed()
    }
}

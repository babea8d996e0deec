//! Master side of one bus address.
//!
//! Wraps a serial port with the request/reply cycle: encode a command,
//! write it, and for telemetry reads collect the reply with the silence
//! receiver and decode it. The bus is half-duplex — one outstanding
//! request per port at a time.

use anyhow::Result;
use log::debug;
use serialport::SerialPort;

use super::command::{self, HomingConfig};
use super::position::{decode_position, PositionReading};
use super::receive::{receive_frame, ReceiverConfig};
use super::{ProtocolError, SysParam};
use crate::port::{SerialSource, SystemClock};

pub struct Motor<'a> {
    port: &'a mut dyn SerialPort,
    address: u8,
    config: ReceiverConfig,
    retries: usize,
}

impl<'a> Motor<'a> {
    pub fn new(port: &'a mut dyn SerialPort, address: u8) -> Self {
        Motor {
            port,
            address,
            config: ReceiverConfig::default(),
            retries: 0,
        }
    }

    pub fn with_receiver_config(mut self, config: ReceiverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        debug!("send {:02x?}", frame);
        self.port.write_all(frame)?;
        Ok(())
    }

    pub fn enable(&mut self, enabled: bool, sync: bool) -> Result<()> {
        let frame = command::enable(self.address, enabled, sync);
        self.send(&frame)
    }

    pub fn velocity(&mut self, direction: u8, velocity: u16, acceleration: u8, sync: bool) -> Result<()> {
        let frame = command::velocity_control(self.address, direction, velocity, acceleration, sync);
        self.send(&frame)
    }

    pub fn position(
        &mut self,
        direction: u8,
        velocity: u16,
        acceleration: u8,
        pulses: u32,
        relative: bool,
        sync: bool,
    ) -> Result<()> {
        let frame = command::position_control(
            self.address,
            direction,
            velocity,
            acceleration,
            pulses,
            relative,
            sync,
        );
        self.send(&frame)
    }

    pub fn stop(&mut self, sync: bool) -> Result<()> {
        let frame = command::stop_now(self.address, sync);
        self.send(&frame)
    }

    pub fn sync_motion(&mut self) -> Result<()> {
        let frame = command::sync_motion(self.address);
        self.send(&frame)
    }

    pub fn reset_zero(&mut self) -> Result<()> {
        let frame = command::reset_position(self.address);
        self.send(&frame)
    }

    pub fn release_stall(&mut self) -> Result<()> {
        let frame = command::release_stall_protection(self.address);
        self.send(&frame)
    }

    pub fn set_control_mode(&mut self, save: bool, mode: u8) -> Result<()> {
        let frame = command::set_control_mode(self.address, save, mode);
        self.send(&frame)
    }

    pub fn set_home_point(&mut self, save: bool) -> Result<()> {
        let frame = command::set_home_point(self.address, save);
        self.send(&frame)
    }

    pub fn configure_homing(&mut self, config: &HomingConfig) -> Result<()> {
        let frame = command::configure_homing(self.address, config);
        self.send(&frame)
    }

    pub fn trigger_homing(&mut self, mode: u8, sync: bool) -> Result<()> {
        let frame = command::trigger_homing(self.address, mode, sync);
        self.send(&frame)
    }

    pub fn interrupt_homing(&mut self) -> Result<()> {
        let frame = command::interrupt_homing(self.address);
        self.send(&frame)
    }

    /// Sends a read request for one system parameter and returns the raw
    /// reply frame.
    pub fn read_raw(&mut self, param: SysParam) -> Result<Vec<u8>> {
        let request = command::read_sys_param(self.address, param);
        self.send(&request)?;

        let clock = SystemClock::new();
        let mut source = SerialSource::new(&mut *self.port);
        let frame = receive_frame(&mut source, &clock, &self.config)?;
        Ok(frame.into_bytes())
    }

    fn read_position_once(&mut self) -> Result<PositionReading> {
        let reply = self.read_raw(SysParam::Position)?;
        decode_position(self.address, &reply).ok_or_else(|| ProtocolError::NoReading.into())
    }

    /// Polls the real-time position, retrying on short or mismatched
    /// replies.
    pub fn read_position(&mut self) -> Result<PositionReading> {
        let mut error = None;

        for _ in 0..=self.retries {
            match self.read_position_once() {
                Ok(reading) => return Ok(reading),
                Err(e) => error = Some(e),
            }
        }
        Err(error.unwrap())
    }
}

use anyhow::Result;
pub use clap::StructOpt;
use clap::{Parser, Subcommand};
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp;
use std::ops::Deref;
use std::str::FromStr;
use thiserror::Error;

use zdt_lib::protocol::SysParam;

#[derive(Error, Debug)]
pub enum RangeError {
    #[error("invalid range '{0}'")]
    BadRange(String),
}

/// Device address list, e.g. `1`, `1-4` or `1-4,7`.
#[derive(Debug)]
pub struct AddrRange(Vec<u8>);

impl Deref for AddrRange {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn parse_bound(caps: &regex::Captures, index: usize, part: &str) -> Result<u8, RangeError> {
    caps[index]
        .parse()
        .map_err(|_| RangeError::BadRange(part.to_string()))
}

impl FromStr for AddrRange {
    type Err = RangeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^(\d+)(?:-(\d+))?$").unwrap();
        }

        let mut addrs: Vec<u8> = Vec::new();

        for part in input.split(',') {
            let caps = RE
                .captures(part)
                .ok_or_else(|| RangeError::BadRange(part.to_string()))?;
            let first = parse_bound(&caps, 1, part)?;
            match caps.get(2) {
                None => addrs.push(first),
                Some(_) => {
                    let second = parse_bound(&caps, 2, part)?;
                    addrs.extend(cmp::min(first, second)..=cmp::max(first, second));
                }
            }
        }

        // Duplicates would send the same command twice on the bus.
        addrs.sort_unstable();
        addrs.dedup();
        Ok(AddrRange(addrs))
    }
}

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Cli {
    /// enable debug output
    #[clap(long, short)]
    pub debug: bool,

    /// UART device or 'auto'
    #[clap(long, short, default_value = "auto")]
    pub port: String,

    /// UART baud rate
    #[clap(long, short, default_value_t = 115200)]
    pub baudrate: u32,

    /// Device address
    #[clap(long, short, default_value_t = 1)]
    pub address: u8,

    /// Telemetry read retry count
    #[clap(long, short, default_value_t = 0)]
    pub retries: usize,

    /// Use json-formatted output
    #[clap(long, short)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enable the driver stage
    Enable {
        #[clap(long, short)]
        sync: bool,
    },

    /// Disable the driver stage
    Disable {
        #[clap(long, short)]
        sync: bool,
    },

    /// Constant-velocity motion
    #[clap(visible_alias = "vel")]
    Velocity {
        /// Direction, 0 = CW
        direction: u8,
        /// Velocity in RPM
        velocity: u16,
        /// Acceleration ramp, 0 = start immediately
        #[clap(default_value_t = 0)]
        acceleration: u8,
        #[clap(long, short)]
        sync: bool,
    },

    /// Position move over a pulse count
    #[clap(visible_alias = "pos")]
    Position {
        /// Direction, 0 = CW
        direction: u8,
        /// Velocity in RPM
        velocity: u16,
        /// Acceleration ramp, 0 = start immediately
        acceleration: u8,
        /// Pulse count
        pulses: u32,
        /// Relative move instead of absolute
        #[clap(long, short)]
        relative: bool,
        #[clap(long, short)]
        sync: bool,
    },

    /// Stop immediately
    Stop {
        #[clap(long, short)]
        sync: bool,
    },

    /// Trigger motion queued with --sync (broadcast)
    SyncMotion,

    /// Queue a velocity command on several devices, then trigger them
    SyncVelocity {
        addresses: AddrRange,
        direction: u8,
        velocity: u16,
        #[clap(default_value_t = 0)]
        acceleration: u8,
    },

    /// Queue a position command on several devices, then trigger them
    SyncPosition {
        addresses: AddrRange,
        direction: u8,
        velocity: u16,
        acceleration: u8,
        pulses: u32,
        #[clap(long, short)]
        relative: bool,
    },

    /// Reset the position counter to zero
    ResetZero,

    /// Release stall protection
    ReleaseStall,

    /// Switch the control mode
    SetMode {
        mode: u8,
        /// Persist to flash
        #[clap(long, short)]
        save: bool,
    },

    /// Store the current position as the homing zero point
    SetZero {
        /// Persist to flash
        #[clap(long, short)]
        save: bool,
    },

    /// Write the homing parameter block
    ConfigureHoming {
        mode: u8,
        direction: u8,
        /// Homing velocity in RPM
        velocity: u16,
        /// Homing timeout in ms
        timeout_ms: u32,
        /// Stall detection velocity in RPM
        stall_velocity: u16,
        /// Stall detection current in mA
        stall_current: u16,
        /// Stall detection window in ms
        stall_time: u16,
        /// Home automatically on power-up
        #[clap(long)]
        auto_home: bool,
        /// Persist to flash
        #[clap(long, short)]
        save: bool,
    },

    /// Start a homing run
    Home {
        #[clap(default_value_t = 0)]
        mode: u8,
        #[clap(long, short)]
        sync: bool,
    },

    /// Interrupt a homing run
    HomeAbort,

    /// Poll the real-time position angle
    #[clap(visible_alias = "rp")]
    ReadPosition,

    /// Read a system parameter, dumping the raw reply
    Read { param: SysParam },

    /// Generate bash completion script
    Completion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_range_single_and_span() {
        let range: AddrRange = "1-3,7".parse().unwrap();
        assert_eq!(*range, vec![1, 2, 3, 7]);
    }

    #[test]
    fn addr_range_sorts_and_dedups() {
        let range: AddrRange = "7,1-3,2".parse().unwrap();
        assert_eq!(*range, vec![1, 2, 3, 7]);
    }

    #[test]
    fn addr_range_reversed_span() {
        let range: AddrRange = "4-2".parse().unwrap();
        assert_eq!(*range, vec![2, 3, 4]);
    }

    #[test]
    fn addr_range_rejects_garbage() {
        assert!("1-".parse::<AddrRange>().is_err());
        assert!("a-b".parse::<AddrRange>().is_err());
        assert!("300".parse::<AddrRange>().is_err());
    }
}

pub mod command;
pub mod motor;
pub mod position;
pub mod receive;

use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// Fixed end-marker appended as the last byte of every frame. The device
/// family uses this constant in place of a computed checksum.
pub const TERMINATOR: u8 = 0x6B;

/// Address understood by every device on the bus.
pub const BROADCAST_ADDRESS: u8 = 0x00;

pub const FUNC_RESET_POSITION: u8 = 0x0A;
pub const SUB_RESET_POSITION: u8 = 0x6D;

pub const FUNC_RELEASE_STALL: u8 = 0x0E;
pub const SUB_RELEASE_STALL: u8 = 0x52;

pub const FUNC_CONTROL_MODE: u8 = 0x46;
pub const SUB_CONTROL_MODE: u8 = 0x69;

pub const FUNC_ENABLE: u8 = 0xF3;
pub const SUB_ENABLE: u8 = 0xAB;

pub const FUNC_VELOCITY: u8 = 0xF6;
pub const FUNC_POSITION: u8 = 0xFD;

pub const FUNC_STOP: u8 = 0xFE;
pub const SUB_STOP: u8 = 0x98;

pub const FUNC_SYNC_MOTION: u8 = 0xFF;
pub const SUB_SYNC_MOTION: u8 = 0x66;

pub const FUNC_SET_HOME: u8 = 0x93;
pub const SUB_SET_HOME: u8 = 0x88;

pub const FUNC_HOMING_PARAMS: u8 = 0x4C;
pub const SUB_HOMING_PARAMS: u8 = 0xAE;

pub const FUNC_TRIGGER_HOMING: u8 = 0x9A;

pub const FUNC_INTERRUPT_HOMING: u8 = 0x9C;
pub const SUB_INTERRUPT_HOMING: u8 = 0x48;

/// Readable system parameters of the driver board. Each maps to one
/// function code of the read-request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysParam {
    /// Firmware and hardware version
    FirmwareVersion,
    /// Phase resistance and inductance
    PhaseResistance,
    /// PID parameters
    PidParams,
    /// Bus voltage
    BusVoltage,
    /// Phase current
    PhaseCurrent,
    /// Encoder value after linear calibration
    EncoderCalibrated,
    /// Target position angle
    TargetPosition,
    /// Real-time velocity
    Velocity,
    /// Real-time position angle
    Position,
    /// Position error angle
    PositionError,
    /// Enable/reached/stall status flags
    StatusFlags,
    /// Homing status flags
    HomingStatus,
    /// Driver configuration block
    DriverConfig,
    /// System status block
    SystemStatus,
}

impl SysParam {
    pub const ALL: &'static [SysParam] = &[
        SysParam::FirmwareVersion,
        SysParam::PhaseResistance,
        SysParam::PidParams,
        SysParam::BusVoltage,
        SysParam::PhaseCurrent,
        SysParam::EncoderCalibrated,
        SysParam::TargetPosition,
        SysParam::Velocity,
        SysParam::Position,
        SysParam::PositionError,
        SysParam::StatusFlags,
        SysParam::HomingStatus,
        SysParam::DriverConfig,
        SysParam::SystemStatus,
    ];

    pub fn function_code(self) -> u8 {
        match self {
            SysParam::FirmwareVersion => 0x1F,
            SysParam::PhaseResistance => 0x20,
            SysParam::PidParams => 0x21,
            SysParam::BusVoltage => 0x24,
            SysParam::PhaseCurrent => 0x27,
            SysParam::EncoderCalibrated => 0x31,
            SysParam::TargetPosition => 0x33,
            SysParam::Velocity => 0x35,
            SysParam::Position => 0x36,
            SysParam::PositionError => 0x37,
            SysParam::StatusFlags => 0x3A,
            SysParam::HomingStatus => 0x3B,
            SysParam::DriverConfig => 0x42,
            SysParam::SystemStatus => 0x43,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SysParam::FirmwareVersion => "version",
            SysParam::PhaseResistance => "resistance",
            SysParam::PidParams => "pid",
            SysParam::BusVoltage => "vbus",
            SysParam::PhaseCurrent => "current",
            SysParam::EncoderCalibrated => "encoder",
            SysParam::TargetPosition => "target",
            SysParam::Velocity => "velocity",
            SysParam::Position => "position",
            SysParam::PositionError => "position-error",
            SysParam::StatusFlags => "flags",
            SysParam::HomingStatus => "homing-status",
            SysParam::DriverConfig => "config",
            SysParam::SystemStatus => "status",
        }
    }
}

impl Display for SysParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name().fmt(f)
    }
}

#[derive(Error, Debug)]
pub enum SysParamError {
    #[error("unknown parameter '{0}'")]
    BadParam(String),
}

impl FromStr for SysParam {
    type Err = SysParamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        SysParam::ALL
            .iter()
            .copied()
            .find(|p| p.name() == input)
            .ok_or_else(|| SysParamError::BadParam(input.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("reply is not a position report")]
    NoReading,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sys_param_round_trip_names() {
        for &param in SysParam::ALL {
            assert_eq!(param.name().parse::<SysParam>().unwrap(), param);
        }
    }

    #[test]
    fn sys_param_rejects_unknown_name() {
        assert!("watts".parse::<SysParam>().is_err());
    }
}

//! Command frame builders.
//!
//! Each function maps one operation to the exact byte sequence the driver
//! board expects: address, function code, optional sub-code, parameters,
//! terminator. Multi-byte fields are big-endian; boolean flags occupy a
//! full byte (0x01/0x00). No range validation is performed — the device
//! is the authority on valid values.

use super::{
    SysParam, FUNC_CONTROL_MODE, FUNC_ENABLE, FUNC_HOMING_PARAMS, FUNC_INTERRUPT_HOMING,
    FUNC_POSITION, FUNC_RELEASE_STALL, FUNC_RESET_POSITION, FUNC_SET_HOME, FUNC_STOP,
    FUNC_SYNC_MOTION, FUNC_TRIGGER_HOMING, FUNC_VELOCITY, SUB_CONTROL_MODE, SUB_ENABLE,
    SUB_HOMING_PARAMS, SUB_INTERRUPT_HOMING, SUB_RELEASE_STALL, SUB_RESET_POSITION, SUB_SET_HOME,
    SUB_STOP, SUB_SYNC_MOTION, TERMINATOR,
};

fn flag(value: bool) -> u8 {
    if value {
        0x01
    } else {
        0x00
    }
}

/// Builds a read request for one system parameter.
pub fn read_sys_param(address: u8, param: SysParam) -> Vec<u8> {
    vec![address, param.function_code(), TERMINATOR]
}

/// Resets the position counter to zero.
pub fn reset_position(address: u8) -> Vec<u8> {
    vec![address, FUNC_RESET_POSITION, SUB_RESET_POSITION, TERMINATOR]
}

/// Releases stall protection after a stall trip.
pub fn release_stall_protection(address: u8) -> Vec<u8> {
    vec![address, FUNC_RELEASE_STALL, SUB_RELEASE_STALL, TERMINATOR]
}

/// Switches the control mode, optionally persisting it to flash.
pub fn set_control_mode(address: u8, save: bool, mode: u8) -> Vec<u8> {
    vec![
        address,
        FUNC_CONTROL_MODE,
        SUB_CONTROL_MODE,
        flag(save),
        mode,
        TERMINATOR,
    ]
}

/// Enables or disables the driver stage.
pub fn enable(address: u8, enabled: bool, sync: bool) -> Vec<u8> {
    vec![
        address,
        FUNC_ENABLE,
        SUB_ENABLE,
        flag(enabled),
        flag(sync),
        TERMINATOR,
    ]
}

/// Constant-velocity motion. Direction 0 is CW, anything else CCW;
/// velocity is in RPM, acceleration 0 means start immediately.
pub fn velocity_control(address: u8, direction: u8, velocity: u16, acceleration: u8, sync: bool) -> Vec<u8> {
    let mut cmd = vec![address, FUNC_VELOCITY, direction];
    cmd.extend_from_slice(&velocity.to_be_bytes());
    cmd.push(acceleration);
    cmd.push(flag(sync));
    cmd.push(TERMINATOR);
    cmd
}

/// Position move over `pulses` steps, relative or absolute.
pub fn position_control(
    address: u8,
    direction: u8,
    velocity: u16,
    acceleration: u8,
    pulses: u32,
    relative: bool,
    sync: bool,
) -> Vec<u8> {
    let mut cmd = vec![address, FUNC_POSITION, direction];
    cmd.extend_from_slice(&velocity.to_be_bytes());
    cmd.push(acceleration);
    cmd.extend_from_slice(&pulses.to_be_bytes());
    cmd.push(flag(relative));
    cmd.push(flag(sync));
    cmd.push(TERMINATOR);
    cmd
}

/// Stops motion immediately.
pub fn stop_now(address: u8, sync: bool) -> Vec<u8> {
    vec![address, FUNC_STOP, SUB_STOP, flag(sync), TERMINATOR]
}

/// Triggers motion on every command previously queued with the sync flag.
pub fn sync_motion(address: u8) -> Vec<u8> {
    vec![address, FUNC_SYNC_MOTION, SUB_SYNC_MOTION, TERMINATOR]
}

/// Stores the current position as the homing zero point.
pub fn set_home_point(address: u8, save: bool) -> Vec<u8> {
    vec![address, FUNC_SET_HOME, SUB_SET_HOME, flag(save), TERMINATOR]
}

/// Homing parameter block, written with [`configure_homing`].
#[derive(Debug, Clone, Copy)]
pub struct HomingConfig {
    pub save: bool,
    pub mode: u8,
    pub direction: u8,
    /// Homing velocity in RPM
    pub velocity: u16,
    /// Homing timeout in milliseconds
    pub timeout_ms: u32,
    /// Stall detection velocity threshold in RPM
    pub stall_velocity: u16,
    /// Stall detection current threshold in mA
    pub stall_current_ma: u16,
    /// Stall detection time window in milliseconds
    pub stall_time_ms: u16,
    /// Home automatically on power-up
    pub auto_home: bool,
}

/// Writes the homing parameter block.
pub fn configure_homing(address: u8, config: &HomingConfig) -> Vec<u8> {
    let mut cmd = vec![
        address,
        FUNC_HOMING_PARAMS,
        SUB_HOMING_PARAMS,
        flag(config.save),
        config.mode,
        config.direction,
    ];
    cmd.extend_from_slice(&config.velocity.to_be_bytes());
    cmd.extend_from_slice(&config.timeout_ms.to_be_bytes());
    cmd.extend_from_slice(&config.stall_velocity.to_be_bytes());
    cmd.extend_from_slice(&config.stall_current_ma.to_be_bytes());
    cmd.extend_from_slice(&config.stall_time_ms.to_be_bytes());
    cmd.push(flag(config.auto_home));
    cmd.push(TERMINATOR);
    cmd
}

/// Starts a homing run.
pub fn trigger_homing(address: u8, mode: u8, sync: bool) -> Vec<u8> {
    vec![address, FUNC_TRIGGER_HOMING, mode, flag(sync), TERMINATOR]
}

/// Force-interrupts a homing run.
pub fn interrupt_homing(address: u8) -> Vec<u8> {
    vec![
        address,
        FUNC_INTERRUPT_HOMING,
        SUB_INTERRUPT_HOMING,
        TERMINATOR,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_velocity() {
        let reference: [u8; 8] = [0x01, 0xF6, 0x00, 0x00, 0xC8, 0x0A, 0x00, 0x6B];
        assert_eq!(velocity_control(1, 0, 200, 10, false), reference);
    }

    #[test]
    fn encode_position() {
        let reference: [u8; 13] = [
            0x01, 0xFD, 0x00, 0x01, 0x2C, 0x05, 0x00, 0x00, 0x0C, 0x80, 0x01, 0x00, 0x6B,
        ];
        assert_eq!(position_control(1, 0, 300, 5, 3200, true, false), reference);
    }

    #[test]
    fn encode_read_sys_param() {
        assert_eq!(
            read_sys_param(1, SysParam::Position),
            [0x01, 0x36, 0x6B]
        );
        assert_eq!(
            read_sys_param(1, SysParam::FirmwareVersion),
            [0x01, 0x1F, 0x6B]
        );
    }

    #[test]
    fn encode_enable() {
        assert_eq!(enable(1, true, false), [0x01, 0xF3, 0xAB, 0x01, 0x00, 0x6B]);
        assert_eq!(enable(2, false, true), [0x02, 0xF3, 0xAB, 0x00, 0x01, 0x6B]);
    }

    #[test]
    fn encode_stop() {
        assert_eq!(stop_now(1, true), [0x01, 0xFE, 0x98, 0x01, 0x6B]);
    }

    #[test]
    fn encode_homing_params() {
        let config = HomingConfig {
            save: true,
            mode: 2,
            direction: 0,
            velocity: 30,
            timeout_ms: 10000,
            stall_velocity: 300,
            stall_current_ma: 800,
            stall_time_ms: 60,
            auto_home: false,
        };
        let reference: [u8; 20] = [
            0x01, 0x4C, 0xAE, 0x01, 0x02, 0x00, 0x00, 0x1E, 0x00, 0x00, 0x27, 0x10, 0x01, 0x2C,
            0x03, 0x20, 0x00, 0x3C, 0x00, 0x6B,
        ];
        assert_eq!(configure_homing(1, &config), reference);
    }

    #[test]
    fn every_frame_ends_with_terminator() {
        let frames = [
            read_sys_param(1, SysParam::BusVoltage),
            reset_position(1),
            release_stall_protection(1),
            set_control_mode(1, true, 2),
            enable(1, true, false),
            velocity_control(1, 1, 1500, 0, false),
            position_control(1, 1, 600, 10, 64000, false, true),
            stop_now(1, false),
            sync_motion(0),
            set_home_point(1, true),
            trigger_homing(1, 0, false),
            interrupt_homing(1),
        ];
        for frame in frames {
            assert_eq!(*frame.last().unwrap(), TERMINATOR);
        }
    }

    #[test]
    fn fixed_lengths() {
        assert_eq!(read_sys_param(1, SysParam::Velocity).len(), 3);
        assert_eq!(reset_position(1).len(), 4);
        assert_eq!(release_stall_protection(1).len(), 4);
        assert_eq!(set_control_mode(1, false, 1).len(), 6);
        assert_eq!(enable(1, true, true).len(), 6);
        assert_eq!(velocity_control(1, 0, 100, 5, false).len(), 8);
        assert_eq!(position_control(1, 0, 100, 5, 1, false, false).len(), 13);
        assert_eq!(stop_now(1, false).len(), 5);
        assert_eq!(sync_motion(0).len(), 4);
        assert_eq!(set_home_point(1, false).len(), 5);
        assert_eq!(trigger_homing(1, 1, true).len(), 5);
        assert_eq!(interrupt_homing(1).len(), 4);
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(
            position_control(3, 1, 65535, 255, 0xDEAD_BEEF, true, true),
            position_control(3, 1, 65535, 255, 0xDEAD_BEEF, true, true)
        );
    }

    #[test]
    fn big_endian_fields_round_trip() {
        let frame = position_control(1, 0, 0xABCD, 0, 0x0102_0304, false, false);
        assert_eq!(u16::from_be_bytes([frame[3], frame[4]]), 0xABCD);
        assert_eq!(
            u32::from_be_bytes([frame[6], frame[7], frame[8], frame[9]]),
            0x0102_0304
        );
    }
}

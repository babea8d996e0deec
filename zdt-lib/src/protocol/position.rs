//! Position-report decoding.
//!
//! A position reply echoes the device address and the 0x36 function code,
//! then carries a sign byte and a 4-byte big-endian magnitude. The
//! magnitude counts 1/65536ths of a revolution: 65536 per 360 degrees,
//! with the low bits giving sub-degree precision.

use super::SysParam;

/// Minimum reply length: address, function, sign, 4-byte magnitude.
const REPLY_LEN: usize = 7;

/// Decoded real-time position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionReading {
    pub degrees: f64,
}

/// Decodes a position reply from `address`. Returns `None` when the frame
/// is too short or is not a position report echoed from that address — a
/// recoverable no-data outcome, distinct from a real zero-degree reading.
pub fn decode_position(address: u8, reply: &[u8]) -> Option<PositionReading> {
    if reply.len() < REPLY_LEN {
        return None;
    }
    if reply[0] != address || reply[1] != SysParam::Position.function_code() {
        return None;
    }

    let magnitude = u32::from_be_bytes([reply[3], reply[4], reply[5], reply[6]]);
    let mut degrees = f64::from(magnitude) * 360.0 / 65536.0;
    if reply[2] != 0 {
        degrees = -degrees;
    }
    Some(PositionReading { degrees })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: [u8; 7] = [0x01, 0x36, 0x00, 0x00, 0x00, 0x1C, 0x20];

    #[test]
    fn decode_positive_angle() {
        // 0x00001C20 = 7200 counts = 7200 * 360 / 65536 degrees.
        let reading = decode_position(1, &REPLY).unwrap();
        assert!((reading.degrees - 39.55078125).abs() < 1e-9);
    }

    #[test]
    fn sign_byte_negates() {
        let mut reply = REPLY;
        reply[2] = 0x01;
        let reading = decode_position(1, &reply).unwrap();
        assert!((reading.degrees + 39.55078125).abs() < 1e-9);
    }

    #[test]
    fn decoding_is_pure() {
        assert_eq!(decode_position(1, &REPLY), decode_position(1, &REPLY));
    }

    #[test]
    fn short_reply_gives_no_reading() {
        assert_eq!(decode_position(1, &REPLY[..6]), None);
        assert_eq!(decode_position(1, &[]), None);
    }

    #[test]
    fn mismatched_header_gives_no_reading() {
        let mut reply = REPLY;
        reply[0] = 0x02;
        assert_eq!(decode_position(1, &reply), None);

        let mut reply = REPLY;
        reply[1] = 0x35;
        assert_eq!(decode_position(1, &reply), None);

        // Echo from the right device, queried address differs.
        assert_eq!(decode_position(2, &REPLY), None);
    }

    #[test]
    fn zero_magnitude_is_a_real_reading() {
        let reply = [0x01, 0x36, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(decode_position(1, &reply), Some(PositionReading { degrees: 0.0 }));
    }
}

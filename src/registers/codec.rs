// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Float encoding across holding register pairs
//!
//! A sensor value is stored as an IEEE-754 single precision float spread over two
//! consecutive 16-bit registers. The byte order is big-endian and the high word
//! comes first, which is the usual holding register convention for Modbus devices.
//!
//! | Register | Content |
//! |----------|---------|
//! | n        | bytes 0-1 of the big-endian `f32` (high word) |
//! | n + 1    | bytes 2-3 of the big-endian `f32` (low word) |
//!
//! Decoding rounds the value to two decimal places. Callers must not expect
//! sub-hundredths precision to survive a round trip.

/// Encode `value` into two registers, high word first.
///
/// ### Examples
///
/// ```
/// use rust_weather_modbus::registers::float_to_registers;
///
/// assert_eq!(float_to_registers(65.0), [0x4282, 0x0000]);
/// ```
pub fn float_to_registers(value: f32) -> [u16; 2] {
    let bytes = value.to_be_bytes();
    [
        u16::from_be_bytes([bytes[0], bytes[1]]),
        u16::from_be_bytes([bytes[2], bytes[3]]),
    ]
}

/// Decode a register pair back into a float rounded to two decimals.
///
/// ### Examples
///
/// ```
/// use rust_weather_modbus::registers::{float_to_registers, registers_to_float};
///
/// let [hi, lo] = float_to_registers(23.456);
/// assert_eq!(registers_to_float(hi, lo), 23.46);
/// ```
pub fn registers_to_float(reg_hi: u16, reg_lo: u16) -> f32 {
    let hi = reg_hi.to_be_bytes();
    let lo = reg_lo.to_be_bytes();
    round_to_hundredths(f32::from_be_bytes([hi[0], hi[1], lo[0], lo[1]]))
}

/// Round to two decimal places.
///
/// The rounding is carried out in double precision so that the scaling by 100
/// does not overflow for large single precision values.
pub fn round_to_hundredths(value: f32) -> f32 {
    ((value as f64 * 100.0).round() / 100.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        assert_eq!(float_to_registers(0.0), [0x0000, 0x0000]);
        assert_eq!(float_to_registers(65.0), [0x4282, 0x0000]);
        assert_eq!(float_to_registers(-12.5), [0xC148, 0x0000]);
        assert_eq!(float_to_registers(23.456), [0x41BB, 0xA5E3]);
    }

    #[test]
    fn test_temperature_is_rounded_on_decode() {
        let [hi, lo] = float_to_registers(23.456);
        assert_eq!(registers_to_float(hi, lo), 23.46);
    }

    #[test]
    fn test_round_trip_matches_rounded_input() {
        let samples = [
            0.0_f32, 0.004, 0.005, 1.0, -1.0, 3.14159, 23.456, 65.0, -40.125, 99.999,
            1013.25, 12345.678, -0.01, 1.0e-6, 4.0e6,
        ];
        for value in samples {
            let [hi, lo] = float_to_registers(value);
            assert_eq!(
                registers_to_float(hi, lo),
                round_to_hundredths(value),
                "round trip failed for {value}"
            );
        }
    }

    #[test]
    fn test_decode_handles_non_finite_words() {
        let [hi, lo] = float_to_registers(f32::INFINITY);
        assert_eq!(registers_to_float(hi, lo), f32::INFINITY);

        let [hi, lo] = float_to_registers(f32::NAN);
        assert!(registers_to_float(hi, lo).is_nan());
    }
}

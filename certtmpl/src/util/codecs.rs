//! Stateless conversions applied to raw directory attribute values

use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;

use der::DateTime;
use subtle_encoding::hex;

use crate::{Error, Result};

/// Number of 100-nanosecond ticks in one second
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// `decode_big_endian_u32` reconstructs an unsigned integer from a byte sequence stored most
/// significant byte first. Any length is accepted; when more than four bytes are presented only the
/// last four contribute to the result.
pub fn decode_big_endian_u32(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

/// `decode_negative_interval_duration` interprets the first eight bytes of the presented value as a
/// little-endian signed count of 100-nanosecond ticks, where relative intervals are stored as
/// negative numbers, and returns the corresponding duration in whole seconds.
///
/// Absent or short input, and values that do not describe a positive interval, yield a zero
/// duration.
pub fn decode_negative_interval_duration(bytes: Option<&[u8]>) -> Duration {
    let raw = match bytes
        .and_then(|b| b.get(..8))
        .and_then(|b| <[u8; 8]>::try_from(b).ok())
    {
        Some(raw) => raw,
        None => return Duration::ZERO,
    };
    let seconds = i64::from_le_bytes(raw) / -TICKS_PER_SECOND;
    if seconds > 0 {
        Duration::from_secs(seconds as u64)
    } else {
        Duration::ZERO
    }
}

/// `encode_negative_interval_duration` produces the eight byte representation read by
/// [`decode_negative_interval_duration`]. Sub-second precision is discarded.
pub fn encode_negative_interval_duration(duration: Duration) -> [u8; 8] {
    let seconds = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
    seconds.saturating_mul(-TICKS_PER_SECOND).to_le_bytes()
}

/// `extract_masked_field` returns the sub-range of a flag word selected by `mask`.
pub fn extract_masked_field(value: u32, mask: u32) -> u32 {
    value & mask
}

fn digits(text: &str, start: usize, len: usize) -> Result<u16> {
    text.get(start..start + len)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|d| d.parse::<u16>().ok())
        .ok_or(Error::ParseError)
}

/// `parse_generalized_time` converts a directory generalized time value, i.e., `20230115093000.0Z`,
/// to seconds since the Unix epoch.
pub fn parse_generalized_time(text: &str) -> Result<u64> {
    if !text.ends_with('Z') {
        return Err(Error::ParseError);
    }
    let dt = DateTime::new(
        digits(text, 0, 4)?,
        digits(text, 4, 2)? as u8,
        digits(text, 6, 2)? as u8,
        digits(text, 8, 2)? as u8,
        digits(text, 10, 2)? as u8,
        digits(text, 12, 2)? as u8,
    )?;
    Ok(dt.unix_duration().as_secs())
}

/// `guid_bytes_to_string` renders the 16-byte binary form of a directory GUID in the canonical
/// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` form. The first three groups are stored little-endian.
pub fn guid_bytes_to_string(bytes: &[u8]) -> Result<String> {
    let b: [u8; 16] = bytes.try_into().map_err(|_| Error::ParseError)?;
    let ordered = [
        b[3], b[2], b[1], b[0], b[5], b[4], b[7], b[6], b[8], b[9], b[10], b[11], b[12], b[13],
        b[14], b[15],
    ];
    let hex: Vec<u8> = hex::encode(ordered);
    let hex = String::from_utf8(hex).map_err(|_| Error::ParseError)?;
    let mut guid = String::with_capacity(36);
    for (i, group) in [0..8, 8..12, 12..16, 16..20, 20..32].into_iter().enumerate() {
        if i > 0 {
            guid.push('-');
        }
        guid.push_str(&hex[group]);
    }
    Ok(guid)
}

#[test]
fn big_endian_test() {
    assert_eq!(0xA0, decode_big_endian_u32(&[0xA0]));
    assert_eq!(0xA000, decode_big_endian_u32(&[0xA0, 0x00]));
    assert_eq!(0x0102_0304, decode_big_endian_u32(&[0x01, 0x02, 0x03, 0x04]));
    assert_eq!(0x0203_0405, decode_big_endian_u32(&[0x01, 0x02, 0x03, 0x04, 0x05]));
    assert_eq!(0, decode_big_endian_u32(&[]));
}

#[test]
fn negative_interval_test() {
    use hex_literal::hex;

    // one year, as stored for the default User template
    let year = hex!("00 40 39 87 2E E1 FE FF");
    assert_eq!(
        Duration::from_secs(365 * 24 * 60 * 60),
        decode_negative_interval_duration(Some(&year))
    );
    // two weeks
    let weeks = hex!("00 80 37 AE FF F4 FF FF");
    assert_eq!(
        Duration::from_secs(14 * 24 * 60 * 60),
        decode_negative_interval_duration(Some(&weeks))
    );
    assert_eq!(
        Duration::from_secs(315_360),
        decode_negative_interval_duration(Some(&(-3_153_600_000_000i64).to_le_bytes()))
    );

    assert_eq!(Duration::ZERO, decode_negative_interval_duration(None));
    assert_eq!(Duration::ZERO, decode_negative_interval_duration(Some(&[])));
    assert_eq!(
        Duration::ZERO,
        decode_negative_interval_duration(Some(&year[..7]))
    );
    assert_eq!(
        Duration::ZERO,
        decode_negative_interval_duration(Some(&(10_000_000i64).to_le_bytes()))
    );

    for days in [1u64, 7, 365, 730, 1825] {
        let d = Duration::from_secs(days * 86_400);
        let encoded = encode_negative_interval_duration(d);
        assert_eq!(d, decode_negative_interval_duration(Some(&encoded)));
    }
    assert_eq!(year, encode_negative_interval_duration(Duration::from_secs(31_536_000)));
}

#[test]
fn masked_field_test() {
    assert_eq!(0x0300_0000, extract_masked_field(0x0305_0010, 0x0F00_0000));
    assert_eq!(0x0005_0000, extract_masked_field(0x0305_0010, 0x000F_0000));
    assert_eq!(0, extract_masked_field(0x0000_2010, 0x0F00_0000));
}

#[test]
fn generalized_time_test() {
    assert_eq!(1_673_775_000, parse_generalized_time("20230115093000.0Z").unwrap());
    assert_eq!(1_673_775_000, parse_generalized_time("20230115093000Z").unwrap());
    assert_eq!(Err(Error::ParseError), parse_generalized_time("20230115093000"));
    assert_eq!(Err(Error::ParseError), parse_generalized_time("2023011509300Z"));
    assert!(parse_generalized_time("20231315093000.0Z").is_err());
}

#[test]
fn guid_test() {
    let bytes: Vec<u8> = (0u8..16).collect();
    assert_eq!(
        "03020100-0504-0706-0809-0a0b0c0d0e0f",
        guid_bytes_to_string(&bytes).unwrap()
    );
    assert_eq!(Err(Error::ParseError), guid_bytes_to_string(&bytes[..15]));
}

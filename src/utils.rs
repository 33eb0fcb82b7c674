//! Primitive readers shared by the BCD element parsers.
//!
//! GUID text conversion, inline UTF-16LE path extraction, and fixed-width
//! little-endian integer reads over byte slices.

use crate::error::{BcdError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::UTF_16LE;
use std::io::Cursor;

/// On-disk size of a GUID.
pub const GUID_SIZE: usize = 16;

/// Reads a u16 from a byte slice at the given offset.
pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    if offset + 2 > data.len() {
        return Err(BcdError::truncated(
            offset + 2,
            data.len().saturating_sub(offset),
        ));
    }

    let mut cursor = Cursor::new(&data[offset..offset + 2]);
    Ok(cursor.read_u16::<LittleEndian>()?)
}

/// Reads a u32 from a byte slice at the given offset.
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    if offset + 4 > data.len() {
        return Err(BcdError::truncated(
            offset + 4,
            data.len().saturating_sub(offset),
        ));
    }

    let mut cursor = Cursor::new(&data[offset..offset + 4]);
    Ok(cursor.read_u32::<LittleEndian>()?)
}

/// Reads a u64 from a byte slice at the given offset.
pub fn read_u64_le(data: &[u8], offset: usize) -> Result<u64> {
    if offset + 8 > data.len() {
        return Err(BcdError::truncated(
            offset + 8,
            data.len().saturating_sub(offset),
        ));
    }

    let mut cursor = Cursor::new(&data[offset..offset + 8]);
    Ok(cursor.read_u64::<LittleEndian>()?)
}

/// Decodes 16 GUID bytes into canonical uppercase text.
///
/// The on-disk encoding is mixed-endian: the first three fields are
/// little-endian (4, 2, 2 bytes), the remaining two big-endian (2, then
/// 4 + 2 rendered as one group).
///
/// # Errors
///
/// Returns a truncation error if fewer than 16 bytes are available.
pub fn guid_string(data: &[u8]) -> Result<String> {
    if data.len() < GUID_SIZE {
        return Err(BcdError::truncated(GUID_SIZE, data.len()));
    }

    let d1 = read_u32_le(data, 0)?;
    let d2 = read_u16_le(data, 4)?;
    let d3 = read_u16_le(data, 6)?;
    let d4 = u16::from_be_bytes([data[8], data[9]]);
    let d5 = u32::from_be_bytes([data[10], data[11], data[12], data[13]]);
    let d6 = u16::from_be_bytes([data[14], data[15]]);

    Ok(format!(
        "{:08X}-{:04X}-{:04X}-{:04X}-{:08X}{:04X}",
        d1, d2, d3, d4, d5, d6
    ))
}

/// Parses canonical GUID text back into its 16 mixed-endian bytes.
///
/// Accepts the `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX` form in either case.
///
/// # Errors
///
/// Returns a malformed-record error if the text is not a canonical GUID.
pub fn guid_bytes(text: &str) -> Result<[u8; GUID_SIZE]> {
    if !text.is_ascii() {
        return Err(BcdError::malformed(format!("not a canonical GUID: {}", text)));
    }

    let groups: Vec<&str> = text.split('-').collect();
    let is_canonical = groups.len() == 5
        && groups[0].len() == 8
        && groups[1].len() == 4
        && groups[2].len() == 4
        && groups[3].len() == 4
        && groups[4].len() == 12;
    if !is_canonical {
        return Err(BcdError::malformed(format!("not a canonical GUID: {}", text)));
    }

    let field = |s: &str| -> Result<u64> {
        u64::from_str_radix(s, 16)
            .map_err(|_| BcdError::malformed(format!("non-hex GUID group: {}", s)))
    };

    let d1 = field(groups[0])? as u32;
    let d2 = field(groups[1])? as u16;
    let d3 = field(groups[2])? as u16;
    let d4 = field(groups[3])? as u16;
    let d5 = field(&groups[4][..8])? as u32;
    let d6 = field(&groups[4][8..])? as u16;

    let mut bytes = [0u8; GUID_SIZE];
    bytes[0..4].copy_from_slice(&d1.to_le_bytes());
    bytes[4..6].copy_from_slice(&d2.to_le_bytes());
    bytes[6..8].copy_from_slice(&d3.to_le_bytes());
    bytes[8..10].copy_from_slice(&d4.to_be_bytes());
    bytes[10..14].copy_from_slice(&d5.to_be_bytes());
    bytes[14..16].copy_from_slice(&d6.to_be_bytes());
    Ok(bytes)
}

/// Extracts an inline UTF-16LE path terminated by three consecutive zero
/// bytes (the trailing null wide char plus the first zero byte of the next
/// field).
///
/// Returns the decoded path and the slice positioned past the third zero
/// byte. The prefix up to and including the first zero byte of the
/// terminator is decoded as an even number of UTF-16 code units; decoding
/// problems fall back to a lossy rendering of the raw bytes.
///
/// # Errors
///
/// Returns a malformed-record error if the terminator pattern is absent.
pub fn read_terminated_utf16(data: &[u8]) -> Result<(String, &[u8])> {
    let pos = data
        .windows(3)
        .position(|w| w == [0, 0, 0])
        .ok_or_else(|| BcdError::malformed("missing UTF-16 path terminator"))?;

    // Keep whole code units only.
    let path_bytes = &data[..(pos + 1) & !1];
    let (decoded, _, had_errors) = UTF_16LE.decode(path_bytes);
    let path = if had_errors {
        String::from_utf8_lossy(path_bytes).into_owned()
    } else {
        decoded.into_owned()
    };

    Ok((path, &data[pos + 3..]))
}

/// Decodes a registry string payload (`REG_SZ` / `REG_EXPAND_SZ`) as
/// UTF-16LE, stripping trailing null code units.
///
/// A payload that cannot be decoded (odd length, invalid code units) is
/// kept as a lossy rendering of the raw bytes instead of failing.
pub fn decode_reg_string(data: &[u8]) -> String {
    if data.len() % 2 != 0 {
        return String::from_utf8_lossy(data)
            .trim_end_matches('\0')
            .to_string();
    }

    let (decoded, _, had_errors) = UTF_16LE.decode(data);
    if had_errors {
        return String::from_utf8_lossy(data)
            .trim_end_matches('\0')
            .to_string();
    }

    decoded.trim_end_matches('\0').to_string()
}

/// Renders bytes as continuous uppercase hex.
pub(crate) fn hex_upper(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        out.push_str(&format!("{:02X}", b));
    }
    out
}

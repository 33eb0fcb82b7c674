//! Generic framed packet used by BCD device elements.
//!
//! Every device element is built from packets with a 16-byte header of four
//! little-endian DWORDs:
//!
//! ```text
//! [Packet Header - 16 bytes]
//!   +0x00  ptype     - packet type (selects the trailer shape)
//!   +0x04  sub_tag   - secondary tag (only meaningful for ptype 0)
//!   +0x08  data_end  - offset where the framed data region ends
//!   +0x0C  reserved
//!
//! [Data - bytes 0x10 .. data_end]
//! [Tail - bytes data_end ..]
//! ```

use crate::error::{BcdError, Result};
use crate::utils::read_u32_le;

/// Size of the packet header in bytes.
pub const PACKET_HEADER_SIZE: usize = 16;

/// A framed packet: the four header DWORDs plus the data region they frame.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    /// Packet type.
    pub ptype: u32,

    /// Secondary sub-tag; distinguishes file from ramdisk when `ptype` is 0.
    pub sub_tag: u32,

    /// Offset at which the framed data ends and the tail begins.
    pub data_end: u32,

    /// Reserved header DWORD.
    pub reserved: u32,

    /// Framed data region (`bytes[0x10 .. data_end]`).
    pub data: &'a [u8],
}

impl<'a> Packet<'a> {
    /// Parses a packet, returning it together with the unframed tail
    /// (`bytes[data_end ..]`).
    ///
    /// # Errors
    ///
    /// Returns a truncation error if fewer than 16 bytes are available, and
    /// a malformed-record error if `data_end` lies before the header or
    /// past the end of the input.
    pub fn parse(data: &'a [u8]) -> Result<(Self, &'a [u8])> {
        if data.len() < PACKET_HEADER_SIZE {
            return Err(BcdError::truncated(PACKET_HEADER_SIZE, data.len()));
        }

        let ptype = read_u32_le(data, 0x00)?;
        let sub_tag = read_u32_le(data, 0x04)?;
        let data_end = read_u32_le(data, 0x08)?;
        let reserved = read_u32_le(data, 0x0C)?;

        let end = data_end as usize;
        if end < PACKET_HEADER_SIZE || end > data.len() {
            return Err(BcdError::malformed(format!(
                "packet data end {:#x} out of bounds (packet length {:#x})",
                data_end,
                data.len()
            )));
        }

        Ok((
            Packet {
                ptype,
                sub_tag,
                data_end,
                reserved,
                data: &data[PACKET_HEADER_SIZE..end],
            },
            &data[end..],
        ))
    }
}

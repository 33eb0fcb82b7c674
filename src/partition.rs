//! Disk/partition reference records.
//!
//! A partition record is a fixed 0x38-byte structure identifying a disk and
//! a partition on it:
//!
//! ```text
//! +0x00  partition id field (16 bytes; GUID or low u64)
//! +0x10  reserved DWORD (must be zero)
//! +0x14  table type (0 = GPT, 1 = MBR)
//! +0x18  disk id field (16 bytes; GUID or low u64)
//! +0x28  four reserved DWORDs (must be zero)
//! ```

use crate::error::{BcdError, Result};
use crate::utils::{guid_string, read_u32_le, read_u64_le};
use serde::Serialize;

/// Size of a partition record in bytes.
pub const PARTITION_RECORD_SIZE: usize = 0x38;

/// Partition-table type tag for GPT disks.
const TABLE_TYPE_GPT: u32 = 0;
/// Partition-table type tag for MBR disks.
const TABLE_TYPE_MBR: u32 = 1;

/// A decoded disk/partition reference.
///
/// On GPT disks both identifiers are canonical uppercase GUIDs. On MBR
/// disks `disk_id` is the decimal rendering of the 32-bit disk signature
/// and `part_id` the decimal rendering of the partition's byte offset,
/// both read as little-endian u64s from the low halves of their fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionRef {
    /// Partition identifier.
    pub part_id: String,

    /// True when the identifiers follow the GPT convention.
    pub gpt: bool,

    /// Disk identifier.
    pub disk_id: String,
}

impl PartitionRef {
    /// Parses a 0x38-byte partition record, returning the reference and
    /// the remaining bytes.
    ///
    /// # Errors
    ///
    /// Returns a truncation error on short input and a malformed-record
    /// error when a reserved DWORD is nonzero or the table-type tag is
    /// outside the known set.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < PARTITION_RECORD_SIZE {
            return Err(BcdError::truncated(PARTITION_RECORD_SIZE, data.len()));
        }

        let part_field = &data[0x00..0x10];
        let reserved = read_u32_le(data, 0x10)?;
        let table_type = read_u32_le(data, 0x14)?;
        let disk_field = &data[0x18..0x28];

        if reserved != 0 {
            return Err(BcdError::malformed(format!(
                "nonzero reserved dword in partition record: {:#x}",
                reserved
            )));
        }
        for i in 0..4 {
            let tail = read_u32_le(data, 0x28 + i * 4)?;
            if tail != 0 {
                return Err(BcdError::malformed(format!(
                    "nonzero reserved dword in partition record trailer: {:#x}",
                    tail
                )));
            }
        }

        let reference = match table_type {
            TABLE_TYPE_GPT => PartitionRef {
                part_id: guid_string(part_field)?,
                gpt: true,
                disk_id: guid_string(disk_field)?,
            },
            TABLE_TYPE_MBR => PartitionRef {
                part_id: read_u64_le(part_field, 0)?.to_string(),
                gpt: false,
                disk_id: read_u64_le(disk_field, 0)?.to_string(),
            },
            other => {
                return Err(BcdError::malformed(format!(
                    "unknown partition table type: {}",
                    other
                )))
            }
        };

        Ok((reference, &data[PARTITION_RECORD_SIZE..]))
    }
}

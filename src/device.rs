//! BCD device element decoding.
//!
//! A device element (`device`, `osdevice`, `ramdisksdidevice`, …) is an
//! owning-object GUID followed by a framed packet whose type selects one of
//! several trailer shapes:
//!
//! ```text
//! [Object GUID - 16 bytes, all zero when absent]
//! [Outer Packet]
//!   ptype 0, sub 0   - file trailer
//!   ptype 0, sub !=0 - ramdisk trailer
//!   ptype 5          - boot (terminal)
//!   ptype 6          - partition record
//!   ptype 8          - VHD: disk trailer -> file trailer -> file trailer
//! ```
//!
//! File and ramdisk trailers carry an inline UTF-16LE path and a nested
//! packet whose type decides whether the backing medium is the boot device
//! or an explicit partition record.

use crate::error::{BcdError, Result};
use crate::packet::Packet;
use crate::partition::PartitionRef;
use crate::utils::{guid_string, read_terminated_utf16, read_u32_le, GUID_SIZE};
use serde::Serialize;
use std::fmt;

/// Packet type for file/ramdisk devices.
const PTYPE_FILE: u32 = 0;
/// Packet type for the boot device.
const PTYPE_BOOT: u32 = 5;
/// Packet type for partition devices.
const PTYPE_PARTITION: u32 = 6;
/// Packet type for VHD/locate devices.
const PTYPE_VHD: u32 = 8;

/// Size of the fixed header preceding the nested packet in a file trailer.
const FILE_TRAILER_HEADER_SIZE: usize = 0x10;
/// Size of the counter array opening a ramdisk trailer.
const RAMDISK_COUNTER_SIZE: usize = 0x24;
/// Size of the fixed header preceding the nested packet in a VHD disk trailer.
const VHD_DISK_HEADER_SIZE: usize = 0x0E;
/// Size of the fixed header preceding the nested packet in a VHD file trailer.
const VHD_FILE_HEADER_SIZE: usize = 0x18;

/// The kind of device a BCD element describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// A file on some medium.
    File,

    /// A ramdisk image.
    RamDisk,

    /// The device the system booted from.
    Boot,

    /// A disk partition.
    Partition,

    /// A virtual hard disk.
    Vhd,
}

impl DeviceType {
    /// Returns the lowercase name of this device type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::File => "file",
            DeviceType::RamDisk => "ramdisk",
            DeviceType::Boot => "boot",
            DeviceType::Partition => "partition",
            DeviceType::Vhd => "vhd",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminating medium a device resolves to after following any VHD
/// indirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskType {
    /// The boot device.
    Boot,

    /// An explicit partition reference.
    Partition,

    /// Locate semantics: the backing file is found by search.
    Locate,
}

impl DiskType {
    /// Returns the lowercase name of this disk type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskType::Boot => "boot",
            DiskType::Partition => "partition",
            DiskType::Locate => "locate",
        }
    }
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps decoded disk/partition identifiers to host block devices.
///
/// Identifiers arrive uppercase: GUIDs for GPT disks, decimal strings for
/// MBR disks (the partition id is the partition's start offset in bytes,
/// the disk id the 32-bit MBR signature).
pub trait DeviceResolver {
    /// Returns the host block device name for the pair, if the host knows
    /// one.
    fn resolve_device(&self, disk_id: &str, part_id: &str) -> Option<String>;
}

/// Resolver for hosts without block-device enumeration; never matches.
pub struct NoHostDevices;

impl DeviceResolver for NoHostDevices {
    fn resolve_device(&self, _disk_id: &str, _part_id: &str) -> Option<String> {
        None
    }
}

/// A fully decoded BCD device element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BcdDevice {
    /// The kind of device described.
    #[serde(rename = "type")]
    pub device_type: DeviceType,

    /// The terminating medium.
    pub disk: DiskType,

    /// Owning-object GUID; absent when the leading 16 bytes are all zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,

    /// Inline path (file, ramdisk and VHD devices).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// True when the partition identifiers follow the GPT convention.
    #[serde(skip_serializing_if = "is_false")]
    pub gpt: bool,

    /// Disk identifier, present when `disk` is a partition.
    #[serde(rename = "diskID", skip_serializing_if = "Option::is_none")]
    pub disk_id: Option<String>,

    /// Partition identifier, present when `disk` is a partition.
    #[serde(rename = "partID", skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,

    /// Locate-custom DWORD carried by VHD devices.
    #[serde(rename = "locateCustom", skip_serializing_if = "Option::is_none")]
    pub locate_custom: Option<u32>,

    /// Resolved host block device name, when the host recognizes the
    /// partition identifiers.
    #[serde(rename = "device", skip_serializing_if = "Option::is_none")]
    pub host_device: Option<String>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// File trailer: a 16-byte header, a nested packet and an inline path.
struct FileTrailer<'a> {
    inner_ptype: u32,
    path: String,
    remaining: &'a [u8],
}

fn file_trailer(data: &[u8]) -> Result<FileTrailer<'_>> {
    if data.len() < FILE_TRAILER_HEADER_SIZE {
        return Err(BcdError::truncated(FILE_TRAILER_HEADER_SIZE, data.len()));
    }

    let (packet, tail) = Packet::parse(&data[FILE_TRAILER_HEADER_SIZE..])?;
    let (path, remaining) = read_terminated_utf16(tail)?;

    Ok(FileTrailer {
        inner_ptype: packet.ptype,
        path,
        remaining,
    })
}

/// Ramdisk trailer: a nine-DWORD counter array, a nested packet and an
/// inline path. The first counter must be 3.
fn ramdisk_trailer(data: &[u8]) -> Result<FileTrailer<'_>> {
    if data.len() < RAMDISK_COUNTER_SIZE {
        return Err(BcdError::truncated(RAMDISK_COUNTER_SIZE, data.len()));
    }

    let lead_counter = read_u32_le(data, 0)?;
    if lead_counter != 3 {
        return Err(BcdError::malformed(format!(
            "unexpected leading ramdisk counter: {}",
            lead_counter
        )));
    }

    let (packet, tail) = Packet::parse(&data[RAMDISK_COUNTER_SIZE..])?;
    let (path, remaining) = read_terminated_utf16(tail)?;

    Ok(FileTrailer {
        inner_ptype: packet.ptype,
        path,
        remaining,
    })
}

/// VHD disk trailer: a 14-byte header carrying the locate-custom DWORD at
/// offset 4, then a nested packet whose data region holds the next stage.
fn vhd_disk_trailer(data: &[u8]) -> Result<(u32, &[u8])> {
    if data.len() < VHD_DISK_HEADER_SIZE {
        return Err(BcdError::truncated(VHD_DISK_HEADER_SIZE, data.len()));
    }

    let locate_custom = read_u32_le(data, 0x04)?;
    let (packet, _) = Packet::parse(&data[VHD_DISK_HEADER_SIZE..])?;
    Ok((locate_custom, packet.data))
}

/// VHD file trailer: a 0x18-byte header, then a nested packet whose data
/// region holds the file trailer.
fn vhd_file_trailer(data: &[u8]) -> Result<&[u8]> {
    if data.len() < VHD_FILE_HEADER_SIZE {
        return Err(BcdError::truncated(VHD_FILE_HEADER_SIZE, data.len()));
    }

    let (packet, _) = Packet::parse(&data[VHD_FILE_HEADER_SIZE..])?;
    Ok(packet.data)
}

impl BcdDevice {
    /// Decodes a device element without host device resolution.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bcd_parser::{BcdDevice, DeviceType, DiskType};
    ///
    /// // A boot device: zeroed GUID field, then a ptype-5 packet.
    /// let mut bytes = vec![0u8; 16];
    /// bytes.extend_from_slice(&5u32.to_le_bytes());
    /// bytes.extend_from_slice(&0u32.to_le_bytes());
    /// bytes.extend_from_slice(&16u32.to_le_bytes());
    /// bytes.extend_from_slice(&0u32.to_le_bytes());
    ///
    /// let device = BcdDevice::parse(&bytes).unwrap();
    /// assert_eq!(device.device_type, DeviceType::Boot);
    /// assert_eq!(device.disk, DiskType::Boot);
    /// ```
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with(data, &NoHostDevices)
    }

    /// Decodes a device element, consulting `resolver` to attach a host
    /// block device name to top-level partition devices. Resolution failure
    /// is non-fatal and leaves the field empty.
    ///
    /// # Errors
    ///
    /// Returns an error when any record in the element is truncated,
    /// structurally invalid, or carries an unknown packet type.
    pub fn parse_with(data: &[u8], resolver: &dyn DeviceResolver) -> Result<Self> {
        if data.len() < GUID_SIZE {
            return Err(BcdError::truncated(GUID_SIZE, data.len()));
        }

        let guid_field = &data[..GUID_SIZE];
        let guid = if guid_field.iter().any(|&b| b != 0) {
            Some(guid_string(guid_field)?)
        } else {
            None
        };

        let (outer, _) = Packet::parse(&data[GUID_SIZE..])?;
        let inner = outer.data;

        let mut device = match outer.ptype {
            PTYPE_FILE => {
                let device_type = if outer.sub_tag == 0 {
                    DeviceType::File
                } else {
                    DeviceType::RamDisk
                };
                let trailer = if device_type == DeviceType::File {
                    file_trailer(inner)?
                } else {
                    ramdisk_trailer(inner)?
                };

                let mut device = BcdDevice {
                    device_type,
                    disk: DiskType::Boot,
                    guid,
                    path: Some(trailer.path),
                    gpt: false,
                    disk_id: None,
                    part_id: None,
                    locate_custom: None,
                    host_device: None,
                };
                if trailer.inner_ptype != PTYPE_BOOT {
                    let (partition, _) = PartitionRef::parse(trailer.remaining)?;
                    device.disk = DiskType::Partition;
                    device.gpt = partition.gpt;
                    device.disk_id = Some(partition.disk_id);
                    device.part_id = Some(partition.part_id);
                }
                device
            }

            PTYPE_BOOT => BcdDevice {
                device_type: DeviceType::Boot,
                disk: DiskType::Boot,
                guid,
                path: None,
                gpt: false,
                disk_id: None,
                part_id: None,
                locate_custom: None,
                host_device: None,
            },

            PTYPE_PARTITION => {
                let (partition, _) = PartitionRef::parse(inner)?;
                BcdDevice {
                    device_type: DeviceType::Partition,
                    disk: DiskType::Partition,
                    guid,
                    path: None,
                    gpt: partition.gpt,
                    disk_id: Some(partition.disk_id),
                    part_id: Some(partition.part_id),
                    locate_custom: None,
                    host_device: None,
                }
            }

            PTYPE_VHD => {
                let (locate_custom, disk_stage) = vhd_disk_trailer(inner)?;
                let file_stage = vhd_file_trailer(disk_stage)?;
                let trailer = file_trailer(file_stage)?;

                let mut device = BcdDevice {
                    device_type: DeviceType::Vhd,
                    disk: DiskType::Boot,
                    guid,
                    path: Some(trailer.path),
                    gpt: false,
                    disk_id: None,
                    part_id: None,
                    locate_custom: Some(locate_custom),
                    host_device: None,
                };
                match trailer.inner_ptype {
                    PTYPE_BOOT => device.disk = DiskType::Boot,
                    PTYPE_VHD => device.disk = DiskType::Locate,
                    PTYPE_PARTITION => {
                        let (partition, _) = PartitionRef::parse(trailer.remaining)?;
                        device.disk = DiskType::Partition;
                        device.gpt = partition.gpt;
                        device.disk_id = Some(partition.disk_id);
                        device.part_id = Some(partition.part_id);
                    }
                    other => return Err(BcdError::UnknownPacket(other)),
                }
                device
            }

            other => return Err(BcdError::UnknownPacket(other)),
        };

        if device.device_type == DeviceType::Partition {
            if let (Some(disk_id), Some(part_id)) = (&device.disk_id, &device.part_id) {
                device.host_device = resolver.resolve_device(disk_id, part_id);
            }
        }

        Ok(device)
    }
}

impl fmt::Display for BcdDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host_device {
            Some(name) => write!(f, "/dev/{}:", name)?,
            None => write!(f, "MISSING:")?,
        }
        f.write_str(if self.gpt { "GPT" } else { "MBR" })?;

        if self.device_type.as_str() == self.disk.as_str() {
            write!(f, " Type:{}", self.device_type)?;
        } else {
            write!(f, " Type:{} DiskType:{}", self.device_type, self.disk)?;
        }

        if let Some(disk_id) = &self.disk_id {
            write!(f, " Disk:{}", disk_id)?;
        }
        if let Some(part_id) = &self.part_id {
            write!(f, " Partition:{}", part_id)?;
        }
        if let Some(guid) = &self.guid {
            write!(f, " GUID:{}", guid)?;
        }
        if let Some(path) = &self.path {
            write!(f, " Path:{}", path)?;
        }
        if let Some(locate_custom) = self.locate_custom {
            if locate_custom != 0 {
                write!(f, " LocateCustom:{}", locate_custom)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::guid_bytes;

    fn packet(ptype: u32, sub_tag: u32, data: &[u8], tail: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&ptype.to_le_bytes());
        bytes.extend_from_slice(&sub_tag.to_le_bytes());
        bytes.extend_from_slice(&(16 + data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(tail);
        bytes
    }

    fn utf16_path(path: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        for unit in path.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
        bytes
    }

    #[test]
    fn test_boot_device_with_guid() {
        let guid = "466F5A88-0AF2-4F76-9038-095B170DC21C";
        let mut bytes = guid_bytes(guid).unwrap().to_vec();
        bytes.extend_from_slice(&packet(5, 0, &[], &[]));

        let device = BcdDevice::parse(&bytes).unwrap();
        assert_eq!(device.device_type, DeviceType::Boot);
        assert_eq!(device.disk, DiskType::Boot);
        assert_eq!(device.guid.as_deref(), Some(guid));
        assert_eq!(
            device.to_string(),
            format!("MISSING:MBR Type:boot GUID:{}", guid)
        );
    }

    #[test]
    fn test_zeroed_guid_field_is_absent() {
        let mut bytes = vec![0u8; 16];
        bytes.extend_from_slice(&packet(5, 0, &[], &[]));

        let device = BcdDevice::parse(&bytes).unwrap();
        assert_eq!(device.guid, None);
    }

    #[test]
    fn test_unknown_outer_packet_type() {
        let mut bytes = vec![0u8; 16];
        bytes.extend_from_slice(&packet(7, 0, &[], &[]));

        assert!(matches!(
            BcdDevice::parse(&bytes),
            Err(BcdError::UnknownPacket(7))
        ));
    }

    #[test]
    fn test_ramdisk_rejects_bad_lead_counter() {
        let mut counters = vec![0u8; 0x24];
        counters[0] = 2;
        let mut inner = counters;
        inner.extend_from_slice(&packet(5, 0, &[], &utf16_path("boot.wim")));

        let mut bytes = vec![0u8; 16];
        bytes.extend_from_slice(&packet(0, 1, &inner, &[]));

        assert!(matches!(
            BcdDevice::parse(&bytes),
            Err(BcdError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_vhd_locate_device() {
        let locate_custom = 0x12u32;

        // Innermost file trailer: header, nested locate packet, path.
        let mut file_stage = vec![0u8; 0x10];
        file_stage.extend_from_slice(&packet(8, 0, &[], &utf16_path("disk.vhdx")));

        // VHD file trailer wraps the file trailer in its packet data.
        let mut vhd_file = vec![0u8; 0x18];
        vhd_file.extend_from_slice(&packet(0, 0, &file_stage, &[]));

        // VHD disk trailer carries the locate-custom DWORD.
        let mut vhd_disk = vec![0u8; 0x0E];
        vhd_disk[0x04..0x08].copy_from_slice(&locate_custom.to_le_bytes());
        vhd_disk.extend_from_slice(&packet(0, 0, &vhd_file, &[]));

        let mut bytes = vec![0u8; 16];
        bytes.extend_from_slice(&packet(8, 0, &vhd_disk, &[]));

        let device = BcdDevice::parse(&bytes).unwrap();
        assert_eq!(device.device_type, DeviceType::Vhd);
        assert_eq!(device.disk, DiskType::Locate);
        assert_eq!(device.path.as_deref(), Some("disk.vhdx"));
        assert_eq!(device.locate_custom, Some(locate_custom));
        assert!(device
            .to_string()
            .contains("Type:vhd DiskType:locate"));
    }

    #[test]
    fn test_vhd_unknown_final_discriminator() {
        let mut file_stage = vec![0u8; 0x10];
        file_stage.extend_from_slice(&packet(9, 0, &[], &utf16_path("disk.vhdx")));

        let mut vhd_file = vec![0u8; 0x18];
        vhd_file.extend_from_slice(&packet(0, 0, &file_stage, &[]));

        let mut vhd_disk = vec![0u8; 0x0E];
        vhd_disk.extend_from_slice(&packet(0, 0, &vhd_file, &[]));

        let mut bytes = vec![0u8; 16];
        bytes.extend_from_slice(&packet(8, 0, &vhd_disk, &[]));

        assert!(matches!(
            BcdDevice::parse(&bytes),
            Err(BcdError::UnknownPacket(9))
        ));
    }

    #[test]
    fn test_truncated_element() {
        assert!(matches!(
            BcdDevice::parse(&[0u8; 10]),
            Err(BcdError::TruncatedData { .. })
        ));
    }
}

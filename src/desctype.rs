//! BCD description-type decoding.
//!
//! The `Type` value under a `Description` node is a single DWORD carrying
//! four classifications behind fixed bitmasks. The image and inherit
//! classifications share bits 23..20; this mirrors the on-disk consumers
//! and is part of the documented behavior.

use crate::error::{BcdError, Result};
use crate::utils::{hex_upper, read_u32_le};
use serde::{Serialize, Serializer};
use std::fmt;

/// Bits 31..28: object classification.
const MASK_OBJECT: u32 = 0xF000_0000;
/// Bits 23..20: image classification (shared with inherit).
const MASK_IMAGE: u32 = 0x00F0_0000;
/// Bits 19..0: application classification.
const MASK_APPLICATION: u32 = 0x000F_FFFF;

/// Object classification of a BCD object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// Out-of-range or zero slice.
    Null,
    /// Boot application object.
    Application,
    /// Inheritable settings object.
    Inherit,
    /// Device object.
    Device,
}

impl ObjectType {
    /// Maps the extracted bit slice to a member; out-of-range values yield
    /// [`ObjectType::Null`].
    pub fn from_bits(bits: u32) -> Self {
        match bits {
            1 => ObjectType::Application,
            2 => ObjectType::Inherit,
            3 => ObjectType::Device,
            _ => ObjectType::Null,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectType::Application => "objectApplication",
            ObjectType::Inherit => "objectInherit",
            ObjectType::Device => "objectDevice",
            ObjectType::Null => "objectNULL",
        })
    }
}

impl Serialize for ObjectType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Image classification of a BCD object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    /// Out-of-range or zero slice.
    Null,
    /// Firmware boot application.
    Firmware,
    /// Windows boot application.
    WindowsBoot,
    /// Legacy loader.
    LegacyLoader,
    /// Real-mode application.
    RealMode,
}

impl ImageType {
    /// Maps the extracted bit slice to a member; out-of-range values yield
    /// [`ImageType::Null`].
    pub fn from_bits(bits: u32) -> Self {
        match bits {
            1 => ImageType::Firmware,
            2 => ImageType::WindowsBoot,
            3 => ImageType::LegacyLoader,
            4 => ImageType::RealMode,
            _ => ImageType::Null,
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageType::Firmware => "imageFirmware",
            ImageType::WindowsBoot => "imageWindowsBoot",
            ImageType::LegacyLoader => "imageLegacyLoader",
            ImageType::RealMode => "imageRealMode",
            ImageType::Null => "imageNULL",
        })
    }
}

impl Serialize for ImageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inherit classification of a BCD object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InheritType {
    /// Out-of-range or zero slice.
    Null,
    /// Inheritable by any object.
    AnyObject,
    /// Inheritable by application objects.
    ApplicationObject,
    /// Inheritable by device objects.
    DeviceObject,
}

impl InheritType {
    /// Maps the extracted bit slice to a member; out-of-range values yield
    /// [`InheritType::Null`].
    pub fn from_bits(bits: u32) -> Self {
        match bits {
            1 => InheritType::AnyObject,
            2 => InheritType::ApplicationObject,
            3 => InheritType::DeviceObject,
            _ => InheritType::Null,
        }
    }
}

impl fmt::Display for InheritType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InheritType::AnyObject => "inheritAnyObject",
            InheritType::ApplicationObject => "inheritApplicationObject",
            InheritType::DeviceObject => "inheritDeviceObject",
            InheritType::Null => "inheritNULL",
        })
    }
}

impl Serialize for InheritType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Application classification of a BCD object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationType {
    /// Out-of-range or zero slice.
    Null,
    /// Firmware boot manager.
    FwBootmgr,
    /// Windows boot manager.
    Bootmgr,
    /// Windows OS loader.
    OsLoader,
    /// Hibernation resume application.
    Resume,
    /// Memory diagnostic application.
    MemDiag,
    /// Legacy NTLDR.
    Ntldr,
    /// Legacy setup loader.
    Setupldr,
    /// Boot sector application.
    BootSector,
    /// Startup application.
    Startup,
    /// Generic boot application.
    BootApp,
}

impl ApplicationType {
    /// Maps the extracted bit slice to a member; out-of-range values yield
    /// [`ApplicationType::Null`].
    pub fn from_bits(bits: u32) -> Self {
        match bits {
            1 => ApplicationType::FwBootmgr,
            2 => ApplicationType::Bootmgr,
            3 => ApplicationType::OsLoader,
            4 => ApplicationType::Resume,
            5 => ApplicationType::MemDiag,
            6 => ApplicationType::Ntldr,
            7 => ApplicationType::Setupldr,
            8 => ApplicationType::BootSector,
            9 => ApplicationType::Startup,
            10 => ApplicationType::BootApp,
            _ => ApplicationType::Null,
        }
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApplicationType::FwBootmgr => "fwbootmgr",
            ApplicationType::Bootmgr => "bootmgr",
            ApplicationType::OsLoader => "osloader",
            ApplicationType::Resume => "resume",
            ApplicationType::MemDiag => "memdiag",
            ApplicationType::Ntldr => "ntldr",
            ApplicationType::Setupldr => "setupldr",
            ApplicationType::BootSector => "bootsector",
            ApplicationType::Startup => "startup",
            ApplicationType::BootApp => "bootapp",
            ApplicationType::Null => "applicationNULL",
        })
    }
}

impl Serialize for ApplicationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A decoded description-type DWORD.
///
/// Retains the raw source bytes for round-trip display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BcdDescType {
    /// Raw source bytes as stored in the hive.
    #[serde(skip)]
    pub source: [u8; 4],

    /// Object classification (bits 31..28).
    #[serde(rename = "object")]
    pub object_type: ObjectType,

    /// Image classification (bits 23..20).
    #[serde(rename = "image")]
    pub image_type: ImageType,

    /// Inherit classification (bits 23..20, shared with image).
    #[serde(rename = "inherit")]
    pub inherit_type: InheritType,

    /// Application classification (bits 19..0).
    #[serde(rename = "application")]
    pub application_type: ApplicationType,
}

impl BcdDescType {
    /// Decodes a description-type DWORD from its little-endian payload.
    ///
    /// # Errors
    ///
    /// Returns a truncation error if fewer than 4 bytes are available.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(BcdError::truncated(4, data.len()));
        }

        let word = read_u32_le(data, 0)?;
        Ok(BcdDescType {
            source: [data[0], data[1], data[2], data[3]],
            object_type: ObjectType::from_bits((word & MASK_OBJECT) >> 28),
            image_type: ImageType::from_bits((word & MASK_IMAGE) >> 20),
            inherit_type: InheritType::from_bits((word & MASK_IMAGE) >> 20),
            application_type: ApplicationType::from_bits(word & MASK_APPLICATION),
        })
    }

    /// Returns the description-type DWORD.
    pub fn word(&self) -> u32 {
        u32::from_le_bytes(self.source)
    }

    /// Renders the raw source bytes as continuous uppercase hex.
    pub fn source_hex(&self) -> String {
        hex_upper(&self.source)
    }
}

impl fmt::Display for BcdDescType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.object_type, self.image_type, self.inherit_type, self.application_type
        )
    }
}

//! Registry value representation and promotion classification.
//!
//! Raw hive values keep the registry's numeric type tags. During tree
//! decoding, selected `(parent node, value key, tag)` combinations are
//! promoted: the raw payload is replaced with a decoded record and the tag
//! with one of the two synthetic BCD tags.

use crate::alias::node_alias;
use crate::desctype::BcdDescType;
use crate::device::BcdDevice;
use crate::utils::hex_upper;
use serde::{Serialize, Serializer};
use std::fmt;

/// Registry value type tags as consumed from the hive reader, plus the two
/// synthetic tags introduced by promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegValueType {
    /// No value type.
    None,

    /// String (null-terminated UTF-16LE).
    Sz,

    /// String with environment variables.
    ExpandSz,

    /// Binary data.
    Binary,

    /// 32-bit little-endian integer.
    DwordLittle,

    /// 32-bit big-endian integer.
    DwordBig,

    /// Symbolic link.
    Link,

    /// Multiple strings.
    MultiSz,

    /// Resource list.
    ResourceList,

    /// 64-bit little-endian integer.
    QwordLittle,

    /// Synthetic tag: payload decoded into a [`BcdDevice`].
    Device,

    /// Synthetic tag: payload decoded into a [`BcdDescType`].
    DescType,

    /// Any tag outside the known set; carries the raw value.
    Unknown(u32),
}

impl RegValueType {
    /// Maps a raw registry tag to its member. Unknown tags are preserved,
    /// not rejected.
    pub fn from_u32(tag: u32) -> Self {
        match tag {
            0 => RegValueType::None,
            1 => RegValueType::Sz,
            2 => RegValueType::ExpandSz,
            3 => RegValueType::Binary,
            4 => RegValueType::DwordLittle,
            5 => RegValueType::DwordBig,
            6 => RegValueType::Link,
            7 => RegValueType::MultiSz,
            8 => RegValueType::ResourceList,
            0xB => RegValueType::QwordLittle,
            0xE => RegValueType::Device,
            0xF => RegValueType::DescType,
            other => RegValueType::Unknown(other),
        }
    }

    /// Returns the numeric tag.
    pub fn as_u32(&self) -> u32 {
        match self {
            RegValueType::None => 0,
            RegValueType::Sz => 1,
            RegValueType::ExpandSz => 2,
            RegValueType::Binary => 3,
            RegValueType::DwordLittle => 4,
            RegValueType::DwordBig => 5,
            RegValueType::Link => 6,
            RegValueType::MultiSz => 7,
            RegValueType::ResourceList => 8,
            RegValueType::QwordLittle => 0xB,
            RegValueType::Device => 0xE,
            RegValueType::DescType => 0xF,
            RegValueType::Unknown(tag) => *tag,
        }
    }

    /// Returns the registry name of this tag.
    pub fn name(&self) -> &'static str {
        match self {
            RegValueType::None => "REG_NONE",
            RegValueType::Sz => "REG_SZ",
            RegValueType::ExpandSz => "REG_EXPAND_SZ",
            RegValueType::Binary => "REG_BINARY",
            RegValueType::DwordLittle => "REG_DWORD_LITTLE",
            RegValueType::DwordBig => "REG_DWORD_BIG",
            RegValueType::Link => "REG_LINK",
            RegValueType::MultiSz => "REG_MULTI_SZ",
            RegValueType::ResourceList => "REG_RESOURCE_LIST",
            RegValueType::QwordLittle => "REG_QWORD_LITTLE",
            RegValueType::Device => "REG_BCD_DEVICE",
            RegValueType::DescType => "REG_BCD_DESCTYPE",
            RegValueType::Unknown(_) => "REG_NULL",
        }
    }
}

impl fmt::Display for RegValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for RegValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// The decoded payload of a hive value. Exactly one variant is populated;
/// promotion replaces the raw byte slot entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueData {
    /// No payload.
    None,

    /// Raw, unpromoted bytes.
    Bytes(Vec<u8>),

    /// Decoded single string.
    String(String),

    /// Decoded multi-string list.
    #[serde(rename = "strings")]
    MultiString(Vec<String>),

    /// Decoded device record.
    Device(BcdDevice),

    /// Decoded description-type record.
    DescType(BcdDescType),
}

impl ValueData {
    /// Returns true when no payload is populated.
    pub fn is_none(&self) -> bool {
        matches!(self, ValueData::None)
    }
}

/// A single value on a hive node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HiveValue {
    /// Value key.
    pub key: String,

    /// Value type tag; synthetic after promotion.
    #[serde(rename = "type")]
    pub kind: RegValueType,

    /// Decoded payload.
    #[serde(skip_serializing_if = "ValueData::is_none")]
    pub data: ValueData,
}

impl fmt::Display for HiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            ValueData::String(s) => f.write_str(&node_alias(s)),
            ValueData::MultiString(strings) => {
                let aliased: Vec<String> = strings.iter().map(|s| node_alias(s)).collect();
                f.write_str(&aliased.join(", "))
            }
            ValueData::Device(device) => write!(f, "{}", device),
            ValueData::DescType(desc) => write!(f, "{} == {}", desc.source_hex(), desc),
            ValueData::Bytes(bytes) => {
                write!(
                    f,
                    "{} == 0x{}",
                    String::from_utf8_lossy(bytes),
                    hex_upper(bytes)
                )
            }
            ValueData::None => write!(f, " == 0x"),
        }
    }
}

/// How a raw value should be decoded, chosen from its parent node name,
/// its key and its raw type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Promotion {
    /// Decode the payload as a BCD device element.
    Device,

    /// Decode the payload as a description-type DWORD.
    DescType,

    /// Decode the payload as a single UTF-16LE string.
    String,

    /// Fetch the payload through the multi-string accessor.
    MultiString,

    /// Keep the raw bytes.
    Keep,
}

/// Parent node names whose binary values carry device elements.
const DEVICE_PARENTS: [&str; 3] = ["device", "osdevice", "ramdisksdidevice"];

/// Classifies a value for promotion. Names compare lowercased.
pub(crate) fn classify(parent_name: &str, key: &str, kind: RegValueType) -> Promotion {
    let parent = parent_name.to_lowercase();
    match kind {
        RegValueType::Binary if DEVICE_PARENTS.contains(&parent.as_str()) => Promotion::Device,
        RegValueType::DwordLittle
            if parent == "description" && key.eq_ignore_ascii_case("type") =>
        {
            Promotion::DescType
        }
        RegValueType::Sz | RegValueType::ExpandSz => Promotion::String,
        RegValueType::MultiSz => Promotion::MultiString,
        _ => Promotion::Keep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for tag in [0u32, 1, 2, 3, 4, 5, 6, 7, 8, 0xB, 0xE, 0xF] {
            assert_eq!(RegValueType::from_u32(tag).as_u32(), tag);
        }
        assert!(matches!(
            RegValueType::from_u32(9),
            RegValueType::Unknown(9)
        ));
    }

    #[test]
    fn test_tag_names() {
        assert_eq!(RegValueType::Sz.name(), "REG_SZ");
        assert_eq!(RegValueType::DwordLittle.name(), "REG_DWORD_LITTLE");
        assert_eq!(RegValueType::Device.name(), "REG_BCD_DEVICE");
        assert_eq!(RegValueType::DescType.name(), "REG_BCD_DESCTYPE");
        assert_eq!(RegValueType::Unknown(10).name(), "REG_NULL");
    }

    #[test]
    fn test_classify_device_parents() {
        for parent in ["device", "osdevice", "ramdisksdidevice", "OSDevice"] {
            assert_eq!(
                classify(parent, "Element", RegValueType::Binary),
                Promotion::Device
            );
        }
        assert_eq!(
            classify("badmemorylist", "Element", RegValueType::Binary),
            Promotion::Keep
        );
    }

    #[test]
    fn test_classify_desctype() {
        assert_eq!(
            classify("Description", "Type", RegValueType::DwordLittle),
            Promotion::DescType
        );
        // The tag has to match as well as the names.
        assert_eq!(
            classify("Description", "Type", RegValueType::Binary),
            Promotion::Keep
        );
        assert_eq!(
            classify("Description", "SystemRoot", RegValueType::DwordLittle),
            Promotion::Keep
        );
    }

    #[test]
    fn test_classify_strings() {
        assert_eq!(classify("Elements", "x", RegValueType::Sz), Promotion::String);
        assert_eq!(
            classify("Elements", "x", RegValueType::ExpandSz),
            Promotion::String
        );
        assert_eq!(
            classify("Elements", "x", RegValueType::MultiSz),
            Promotion::MultiString
        );
    }

    #[test]
    fn test_display_bytes() {
        let value = HiveValue {
            key: "Element".into(),
            kind: RegValueType::Binary,
            data: ValueData::Bytes(vec![0x41, 0x42]),
        };
        assert_eq!(value.to_string(), "AB == 0x4142");
    }

    #[test]
    fn test_serialized_variant_names() {
        let value = HiveValue {
            key: "Element".into(),
            kind: RegValueType::Sz,
            data: ValueData::String("hello".into()),
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "REG_SZ");
        assert_eq!(json["data"]["string"], "hello");

        let value = HiveValue {
            key: "Type".into(),
            kind: RegValueType::DescType,
            data: ValueData::DescType(BcdDescType::parse(&0x1020_0003u32.to_le_bytes()).unwrap()),
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "REG_BCD_DESCTYPE");
        assert!(json["data"].get("desctype").is_some());

        let value = HiveValue {
            key: "Element".into(),
            kind: RegValueType::MultiSz,
            data: ValueData::MultiString(vec!["{current}".into()]),
        };
        let json = serde_json::to_value(&value).unwrap();
        assert!(json["data"].get("strings").is_some());

        let value = HiveValue {
            key: "Element".into(),
            kind: RegValueType::Binary,
            data: ValueData::Bytes(vec![1, 2]),
        };
        let json = serde_json::to_value(&value).unwrap();
        assert!(json["data"].get("bytes").is_some());
    }
}

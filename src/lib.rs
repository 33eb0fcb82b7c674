//! # Windows BCD Decoder
//!
//! A decoder for Windows Boot Configuration Data (BCD) stores written in
//! Rust.
//!
//! A BCD store is a registry hive holding boot-time objects (boot manager,
//! OS loaders, resume applications, memory diagnostics). Most of their
//! interesting state hides in opaque `REG_BINARY` elements: tagged,
//! variable-length records describing boot devices, and packed DWORDs
//! classifying the objects themselves. This crate walks the hive into a
//! structured tree and decodes those payloads into semantic records.
//!
//! ## Features
//!
//! - **Device element decoding**: file, ramdisk, boot, partition and VHD
//!   devices, including the VHD locate indirection
//! - **Mixed-endian GUIDs**: canonical uppercase text in both directions
//! - **Description-type decoding**: object/image/inherit/application
//!   classification from the packed `Type` DWORD
//! - **Order-preserving tree**: nodes and values keep the hive's own
//!   enumeration order
//! - **Friendly names**: lazy, case-insensitive aliasing between BCD
//!   element identifiers and readable names
//!
//! ## Architecture
//!
//! Hive access is delegated to a [`HiveReader`] oracle (any hivex-style
//! backend will do); everything above it is pure byte-slice parsing:
//!
//! 1. **Primitive readers**: GUIDs, inline UTF-16LE paths, LE integers
//! 2. **Packet framer**: the generic 16-byte header framing every record
//! 3. **Trailer parsers**: file / ramdisk / VHD-stage records
//! 4. **Assemblers**: [`BcdDevice`] and [`BcdDescType`]
//! 5. **Tree walker**: [`Registry`] materialization plus value promotion
//!
//! ## Binary Layout
//!
//! A device element follows this structure:
//!
//! ```text
//! [Object GUID - 16 bytes]
//!   - All zero when no owning object
//!
//! [Packet - 16 byte header + data]
//!   - ptype, sub-tag, data end offset, reserved
//!
//!   [Trailer - shape selected by ptype]
//!     - ptype 0: file or ramdisk trailer (nested packet + UTF-16LE path)
//!     - ptype 5: boot, terminal
//!     - ptype 6: 0x38-byte disk/partition record
//!     - ptype 8: VHD chain (three nested packets deep)
//! ```
//!
//! ## Examples
//!
//! ### Decoding a device element
//!
//! ```rust
//! use bcd_parser::{BcdDevice, DeviceType, DiskType};
//!
//! // Boot device: zeroed owning-object GUID, then a ptype-5 packet.
//! let mut element = vec![0u8; 16];
//! element.extend_from_slice(&5u32.to_le_bytes());
//! element.extend_from_slice(&0u32.to_le_bytes());
//! element.extend_from_slice(&16u32.to_le_bytes());
//! element.extend_from_slice(&0u32.to_le_bytes());
//!
//! let device = BcdDevice::parse(&element)?;
//! assert_eq!(device.device_type, DeviceType::Boot);
//! assert_eq!(device.disk, DiskType::Boot);
//! # Ok::<(), bcd_parser::BcdError>(())
//! ```
//!
//! ### Decoding a description type
//!
//! ```rust
//! use bcd_parser::{ApplicationType, BcdDescType, ObjectType};
//!
//! let desc = BcdDescType::parse(&0x10200003u32.to_le_bytes())?;
//! assert_eq!(desc.object_type, ObjectType::Application);
//! assert_eq!(desc.application_type, ApplicationType::OsLoader);
//! # Ok::<(), bcd_parser::BcdError>(())
//! ```
//!
//! ### Walking a hive
//!
//! ```no_run
//! use bcd_parser::{HiveReader, NodeHandle, Registry, Result, ValueHandle};
//!
//! # struct Hivex; // stand-in for a real hivex binding
//! # impl HiveReader for Hivex {
//! #     fn root(&self) -> Result<NodeHandle> { Ok(0) }
//! #     fn node_name(&self, _: NodeHandle) -> Result<String> { Ok(String::new()) }
//! #     fn node_children(&self, _: NodeHandle) -> Result<Vec<NodeHandle>> { Ok(Vec::new()) }
//! #     fn node_values(&self, _: NodeHandle) -> Result<Vec<ValueHandle>> { Ok(Vec::new()) }
//! #     fn value_key(&self, _: ValueHandle) -> Result<String> { Ok(String::new()) }
//! #     fn value_value(&self, _: ValueHandle) -> Result<(u32, Vec<u8>)> { Ok((0, Vec::new())) }
//! #     fn value_multiple_strings(&self, _: ValueHandle) -> Result<Vec<String>> { Ok(Vec::new()) }
//! #     fn close(&mut self) -> Result<()> { Ok(()) }
//! # }
//! let reader = Hivex; // any HiveReader implementation
//! let mut registry = Registry::open(reader)?;
//!
//! let objects = registry.node("Objects")?;
//! println!("{}", objects);
//! registry.close()?;
//! # Ok::<(), bcd_parser::BcdError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alias;
pub mod desctype;
pub mod device;
pub mod error;
pub mod packet;
pub mod partition;
pub mod reader;
pub mod registry;
pub mod utils;
pub mod value;

// Re-export main types for convenience
pub use alias::{node_alias, node_key};
pub use desctype::{ApplicationType, BcdDescType, ImageType, InheritType, ObjectType};
pub use device::{BcdDevice, DeviceResolver, DeviceType, DiskType, NoHostDevices};
pub use error::{BcdError, Result};
pub use packet::{Packet, PACKET_HEADER_SIZE};
pub use partition::{PartitionRef, PARTITION_RECORD_SIZE};
pub use reader::{HiveReader, NodeHandle, ValueHandle};
pub use registry::{HiveNode, Registry};
pub use value::{HiveValue, RegValueType, ValueData};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Registry tree materialization and lookup.
//!
//! The walker recursively reads every node and value out of the hive
//! reader, promoting recognized values into decoded records as it goes.
//! The resulting tree is immutable and keeps the hive's enumeration order.

use crate::alias::node_alias;
use crate::desctype::BcdDescType;
use crate::device::{BcdDevice, DeviceResolver, NoHostDevices};
use crate::error::{BcdError, Result};
use crate::reader::{HiveReader, NodeHandle, ValueHandle};
use crate::utils::decode_reg_string;
use crate::value::{classify, HiveValue, Promotion, RegValueType, ValueData};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, instrument};

/// A decoded hive node: its name, its children and its values, all in
/// hive enumeration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HiveNode {
    /// Raw node name as stored in the hive.
    pub name: String,

    /// Child nodes.
    #[serde(rename = "nodes", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HiveNode>,

    /// Values on this node.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<HiveValue>,
}

impl HiveNode {
    fn render(&self, indent: usize, out: &mut String) {
        let pad = "\t".repeat(indent);
        out.push_str(&format!(
            "{}Node: {} = {}\n",
            pad,
            self.name,
            node_alias(&self.name)
        ));

        if !self.values.is_empty() {
            out.push_str(&format!("{}\tValues: {}\n", pad, self.values.len()));
            for value in &self.values {
                out.push_str(&format!(
                    "{}\t{} = {} == {}\n",
                    pad,
                    value.key,
                    node_alias(&value.key),
                    value
                ));
            }
        }

        if !self.children.is_empty() {
            out.push_str(&format!("{}\tChildren: {}\n", pad, self.children.len()));
            for child in &self.children {
                child.render(indent + 1, out);
            }
        }
    }
}

impl fmt::Display for HiveNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(0, &mut out);
        f.write_str(&out)
    }
}

/// A decoded BCD registry.
///
/// Owns the underlying hive reader for its lifetime; the materialized tree
/// stays valid after [`Registry::close`].
pub struct Registry<R: HiveReader> {
    hive: HiveNode,
    reader: R,
    closed: bool,
}

impl<R: HiveReader> Registry<R> {
    /// Decodes the full tree from `reader` without host device resolution.
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_resolver(reader, &NoHostDevices)
    }

    /// Decodes the full tree from `reader`, attaching host block device
    /// names to partition devices through `resolver`.
    ///
    /// # Errors
    ///
    /// Any reader error or value decoding failure aborts the build; a BCD
    /// that cannot be fully parsed is presumed corrupt.
    #[instrument(skip_all)]
    pub fn open_with_resolver(reader: R, resolver: &dyn DeviceResolver) -> Result<Self> {
        info!("decoding BCD registry tree");
        let root = reader.root()?;
        let hive = decode_node(&reader, root, resolver)?;
        debug!(
            children = hive.children.len(),
            values = hive.values.len(),
            "registry tree materialized"
        );

        Ok(Self {
            hive,
            reader,
            closed: false,
        })
    }

    /// Returns the decoded root node.
    pub fn hive(&self) -> &HiveNode {
        &self.hive
    }

    /// Looks up a node by path.
    ///
    /// Components are separated by `/` or `\` and compared
    /// case-insensitively against each child's raw name and its aliased
    /// name. The empty path (or a bare separator) is the root.
    ///
    /// # Errors
    ///
    /// Returns a not-found error naming the first missing component.
    pub fn node(&self, path: &str) -> Result<&HiveNode> {
        let normalized = path.replace('\\', "/");

        let mut current = &self.hive;
        for component in normalized.split('/').filter(|c| !c.is_empty()) {
            let component = component.to_lowercase();
            current = current
                .children
                .iter()
                .find(|child| {
                    child.name.to_lowercase() == component || node_alias(&child.name) == component
                })
                .ok_or_else(|| BcdError::not_found("path node", &component))?;
        }

        Ok(current)
    }

    /// Releases the underlying hive reader.
    ///
    /// The materialized tree stays accessible. Closing twice is an error.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(BcdError::AlreadyClosed);
        }
        self.reader.close()?;
        self.closed = true;
        Ok(())
    }
}

/// Recursively materializes a node, children before values, both in hive
/// order.
fn decode_node<R: HiveReader>(
    reader: &R,
    node: NodeHandle,
    resolver: &dyn DeviceResolver,
) -> Result<HiveNode> {
    let name = reader.node_name(node)?;

    let child_handles = reader.node_children(node)?;
    let mut children = Vec::with_capacity(child_handles.len());
    for child in child_handles {
        children.push(decode_node(reader, child, resolver)?);
    }

    let value_handles = reader.node_values(node)?;
    let mut values = Vec::with_capacity(value_handles.len());
    for value in value_handles {
        values.push(decode_value(reader, &name, value, resolver)?);
    }

    Ok(HiveNode {
        name,
        children,
        values,
    })
}

/// Fetches one value and promotes it according to the classifier.
fn decode_value<R: HiveReader>(
    reader: &R,
    parent_name: &str,
    value: ValueHandle,
    resolver: &dyn DeviceResolver,
) -> Result<HiveValue> {
    let key = reader.value_key(value)?;
    let (raw_tag, bytes) = reader.value_value(value)?;
    let kind = RegValueType::from_u32(raw_tag);

    let (kind, data) = match classify(parent_name, &key, kind) {
        Promotion::Device => {
            debug!(parent = parent_name, key = %key, "promoting value to device record");
            (
                RegValueType::Device,
                ValueData::Device(BcdDevice::parse_with(&bytes, resolver)?),
            )
        }
        Promotion::DescType => (
            RegValueType::DescType,
            ValueData::DescType(BcdDescType::parse(&bytes)?),
        ),
        Promotion::String => (kind, ValueData::String(decode_reg_string(&bytes))),
        Promotion::MultiString => {
            let mut strings = reader.value_multiple_strings(value)?;
            if strings.last().is_some_and(|s| s.is_empty()) {
                strings.pop();
            }
            (kind, ValueData::MultiString(strings))
        }
        Promotion::Keep => {
            let data = if bytes.is_empty() {
                ValueData::None
            } else {
                ValueData::Bytes(bytes)
            };
            (kind, data)
        }
    };

    Ok(HiveValue { key, kind, data })
}

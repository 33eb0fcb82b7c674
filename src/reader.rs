//! Interface to the underlying hive reader.
//!
//! Hive parsing itself lives outside this crate. The decoder only needs an
//! oracle that enumerates nodes and values by opaque handle, in the hive's
//! own order; implementations typically wrap a hivex-style library, which
//! is where the i64 handle convention comes from.

use crate::error::Result;

/// Opaque handle to a hive node.
pub type NodeHandle = i64;

/// Opaque handle to a value on a hive node.
pub type ValueHandle = i64;

/// Oracle over an open registry hive.
///
/// Enumeration order is meaningful and must match the hive's storage
/// order; the decoded tree preserves it.
pub trait HiveReader {
    /// Returns the handle of the root node.
    fn root(&self) -> Result<NodeHandle>;

    /// Returns the name of a node.
    fn node_name(&self, node: NodeHandle) -> Result<String>;

    /// Returns the child nodes of a node, in hive order.
    fn node_children(&self, node: NodeHandle) -> Result<Vec<NodeHandle>>;

    /// Returns the values of a node, in hive order.
    fn node_values(&self, node: NodeHandle) -> Result<Vec<ValueHandle>>;

    /// Returns the key of a value.
    fn value_key(&self, value: ValueHandle) -> Result<String>;

    /// Returns a value's raw registry type tag and payload bytes.
    fn value_value(&self, value: ValueHandle) -> Result<(u32, Vec<u8>)>;

    /// Returns a `REG_MULTI_SZ` payload as its component strings,
    /// including the trailing empty-string sentinel if the hive stores
    /// one.
    fn value_multiple_strings(&self, value: ValueHandle) -> Result<Vec<String>>;

    /// Releases the underlying hive.
    fn close(&mut self) -> Result<()>;
}

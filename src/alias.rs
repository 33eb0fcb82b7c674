//! Friendly-name aliasing for BCD element identifiers.
//!
//! BCD names its elements with hex identifiers (`12000004`,
//! `23000003`, …). A JSON dictionary next to the process maps those to
//! friendly names (`description`, `resumeobject`, …). The dictionary is
//! loaded once, on first use; when it is absent the mapping degrades to
//! identity and lookups return their input lowercased.

use std::collections::HashMap;
use std::fs;
use std::sync::OnceLock;
use tracing::debug;

/// Backing dictionary, looked up relative to the working directory.
const ALIAS_SOURCE: &str = "bcdnodes.json";

static ALIASES: OnceLock<Option<HashMap<String, String>>> = OnceLock::new();

fn alias_table() -> Option<&'static HashMap<String, String>> {
    ALIASES.get_or_init(load_alias_table).as_ref()
}

/// Reads and normalizes the dictionary. A missing or unreadable source is
/// the identity fallback; malformed JSON is fatal.
fn load_alias_table() -> Option<HashMap<String, String>> {
    let bytes = match fs::read(ALIAS_SOURCE) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(source = ALIAS_SOURCE, %err, "alias source unavailable, using identity mapping");
            return None;
        }
    };

    let raw: HashMap<String, String> = match serde_json::from_slice(&bytes) {
        Ok(map) => map,
        Err(err) => panic!("malformed alias source {}: {}", ALIAS_SOURCE, err),
    };

    Some(
        raw.into_iter()
            .map(|(key, val)| (key.to_lowercase(), val.to_lowercase()))
            .collect(),
    )
}

fn lookup_forward(table: &HashMap<String, String>, lowered: &str) -> Option<String> {
    table.get(lowered).cloned()
}

fn lookup_reverse(table: &HashMap<String, String>, lowered: &str) -> Option<String> {
    table
        .iter()
        .find(|(_, friendly)| friendly.as_str() == lowered)
        .map(|(key, _)| key.clone())
}

/// Maps a BCD element identifier to its friendly name.
///
/// Lookups are case-insensitive. When no mapping exists (or no dictionary
/// is present) the lowercased input is returned, so the function is safe
/// to apply to anything.
///
/// # Panics
///
/// Panics on first use if the backing dictionary exists but is not valid
/// JSON.
pub fn node_alias(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    let lowered = input.to_lowercase();
    match alias_table().and_then(|table| lookup_forward(table, &lowered)) {
        Some(friendly) => friendly,
        None => lowered,
    }
}

/// Maps a friendly name back to its BCD element identifier.
///
/// The inverse of [`node_alias`], with the same case handling and identity
/// fallback.
///
/// # Panics
///
/// Panics on first use if the backing dictionary exists but is not valid
/// JSON.
pub fn node_key(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    let lowered = input.to_lowercase();
    match alias_table().and_then(|table| lookup_reverse(table, &lowered)) {
        Some(key) => key,
        None => lowered,
    }
}

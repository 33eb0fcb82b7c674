//! Integration tests driving the full tree walker over an in-memory hive.

use bcd_parser::utils::guid_bytes;
use bcd_parser::{
    BcdError, DeviceType, DiskType, HiveReader, NodeHandle, RegValueType, Registry, Result,
    ValueData, ValueHandle,
};

const BOOTMGR_GUID: &str = "9DEA862C-5CDD-4E70-ACC1-F32B344D4795";

#[derive(Clone)]
struct MockNode {
    name: String,
    children: Vec<NodeHandle>,
    values: Vec<ValueHandle>,
}

#[derive(Clone)]
struct MockValue {
    key: String,
    tag: u32,
    bytes: Vec<u8>,
    strings: Vec<String>,
}

/// In-memory hive oracle. Handles index the node/value tables directly.
#[derive(Clone)]
struct MockHive {
    nodes: Vec<MockNode>,
    values: Vec<MockValue>,
    closed: bool,
}

impl MockHive {
    fn new(root_name: &str) -> Self {
        MockHive {
            nodes: vec![MockNode {
                name: root_name.to_string(),
                children: Vec::new(),
                values: Vec::new(),
            }],
            values: Vec::new(),
            closed: false,
        }
    }

    fn add_node(&mut self, parent: NodeHandle, name: &str) -> NodeHandle {
        let handle = self.nodes.len() as NodeHandle;
        self.nodes.push(MockNode {
            name: name.to_string(),
            children: Vec::new(),
            values: Vec::new(),
        });
        self.nodes[parent as usize].children.push(handle);
        handle
    }

    fn add_value(&mut self, node: NodeHandle, key: &str, tag: u32, bytes: Vec<u8>) {
        let handle = self.values.len() as ValueHandle;
        self.values.push(MockValue {
            key: key.to_string(),
            tag,
            bytes,
            strings: Vec::new(),
        });
        self.nodes[node as usize].values.push(handle);
    }

    fn add_multi_value(&mut self, node: NodeHandle, key: &str, strings: &[&str]) {
        let handle = self.values.len() as ValueHandle;
        self.values.push(MockValue {
            key: key.to_string(),
            tag: 7,
            bytes: Vec::new(),
            strings: strings.iter().map(|s| s.to_string()).collect(),
        });
        self.nodes[node as usize].values.push(handle);
    }

    fn node(&self, handle: NodeHandle) -> Result<&MockNode> {
        self.nodes
            .get(handle as usize)
            .ok_or_else(|| BcdError::Hive(format!("bad node handle {}", handle)))
    }

    fn value(&self, handle: ValueHandle) -> Result<&MockValue> {
        self.values
            .get(handle as usize)
            .ok_or_else(|| BcdError::Hive(format!("bad value handle {}", handle)))
    }
}

impl HiveReader for MockHive {
    fn root(&self) -> Result<NodeHandle> {
        Ok(0)
    }

    fn node_name(&self, node: NodeHandle) -> Result<String> {
        Ok(self.node(node)?.name.clone())
    }

    fn node_children(&self, node: NodeHandle) -> Result<Vec<NodeHandle>> {
        Ok(self.node(node)?.children.clone())
    }

    fn node_values(&self, node: NodeHandle) -> Result<Vec<ValueHandle>> {
        Ok(self.node(node)?.values.clone())
    }

    fn value_key(&self, value: ValueHandle) -> Result<String> {
        Ok(self.value(value)?.key.clone())
    }

    fn value_value(&self, value: ValueHandle) -> Result<(u32, Vec<u8>)> {
        let value = self.value(value)?;
        Ok((value.tag, value.bytes.clone()))
    }

    fn value_multiple_strings(&self, value: ValueHandle) -> Result<Vec<String>> {
        Ok(self.value(value)?.strings.clone())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn utf16z(s: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

/// Element payload for a boot device owned by `guid`.
fn boot_device_bytes(guid: &str) -> Vec<u8> {
    let mut bytes = guid_bytes(guid).unwrap().to_vec();
    bytes.extend_from_slice(&5u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes
}

/// Builds a small but representative BCD hive.
fn sample_hive() -> MockHive {
    let mut hive = MockHive::new("BCD00000000");

    let description = hive.add_node(0, "Description");
    hive.add_value(description, "KeyName", 1, utf16z("BCD00000000"));

    let objects = hive.add_node(0, "Objects");
    let bootmgr = hive.add_node(objects, &format!("{{{}}}", BOOTMGR_GUID));

    let bootmgr_desc = hive.add_node(bootmgr, "Description");
    hive.add_value(bootmgr_desc, "Type", 4, 0x1010_0002u32.to_le_bytes().to_vec());

    let elements = hive.add_node(bootmgr, "Elements");

    let device = hive.add_node(elements, "device");
    hive.add_value(device, "Element", 3, boot_device_bytes(BOOTMGR_GUID));

    let description_el = hive.add_node(elements, "12000004");
    hive.add_value(description_el, "Element", 1, utf16z("Windows Boot Manager"));

    let display_order = hive.add_node(elements, "24000001");
    hive.add_multi_value(
        display_order,
        "Element",
        &["{current}", "{memdiag}", ""],
    );

    hive
}

#[test]
fn test_tree_structure_and_order() {
    let registry = Registry::open(sample_hive()).unwrap();
    let hive = registry.hive();

    assert_eq!(hive.name, "BCD00000000");
    let names: Vec<&str> = hive.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Description", "Objects"]);

    let elements = registry.node("Objects").unwrap().children[0].children[1].clone();
    assert_eq!(elements.name, "Elements");
    let names: Vec<&str> = elements.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["device", "12000004", "24000001"]);
}

#[test]
fn test_enumeration_order_matches_naive_walk() {
    fn naive_walk(
        reader: &MockHive,
        node: NodeHandle,
        path: &str,
        out: &mut Vec<(String, String)>,
    ) {
        let name = reader.node_name(node).unwrap();
        let path = format!("{}/{}", path, name);
        for value in reader.node_values(node).unwrap() {
            out.push((path.clone(), reader.value_key(value).unwrap()));
        }
        for child in reader.node_children(node).unwrap() {
            naive_walk(reader, child, &path, out);
        }
    }

    fn decoded_walk(node: &bcd_parser::HiveNode, path: &str, out: &mut Vec<(String, String)>) {
        let path = format!("{}/{}", path, node.name);
        for value in &node.values {
            out.push((path.clone(), value.key.clone()));
        }
        for child in &node.children {
            decoded_walk(child, &path, out);
        }
    }

    let hive = sample_hive();
    let mut expected = Vec::new();
    naive_walk(&hive, 0, "", &mut expected);

    let registry = Registry::open(hive).unwrap();
    let mut actual = Vec::new();
    decoded_walk(registry.hive(), "", &mut actual);

    assert_eq!(actual, expected);
    assert!(!actual.is_empty());
}

#[test]
fn test_value_promotion() {
    let registry = Registry::open(sample_hive()).unwrap();
    let root = registry.hive();

    // REG_SZ decodes to a string.
    let keyname = &root.children[0].values[0];
    assert_eq!(keyname.kind, RegValueType::Sz);
    assert_eq!(
        keyname.data,
        ValueData::String("BCD00000000".to_string())
    );

    // REG_DWORD under Description/Type promotes to a desctype record.
    let bootmgr = &root.children[1].children[0];
    let desc_value = &bootmgr.children[0].values[0];
    assert_eq!(desc_value.kind, RegValueType::DescType);
    match &desc_value.data {
        ValueData::DescType(desc) => {
            assert_eq!(desc.word(), 0x1010_0002);
            assert_eq!(desc.application_type.to_string(), "bootmgr");
        }
        other => panic!("expected desctype promotion, got {:?}", other),
    }

    // REG_BINARY under a device node promotes to a device record.
    let device_value = &bootmgr.children[1].children[0].values[0];
    assert_eq!(device_value.kind, RegValueType::Device);
    match &device_value.data {
        ValueData::Device(device) => {
            assert_eq!(device.device_type, DeviceType::Boot);
            assert_eq!(device.disk, DiskType::Boot);
            assert_eq!(device.guid.as_deref(), Some(BOOTMGR_GUID));
        }
        other => panic!("expected device promotion, got {:?}", other),
    }

    // REG_MULTI_SZ drops the trailing empty-string sentinel.
    let order_value = &bootmgr.children[1].children[2].values[0];
    assert_eq!(
        order_value.data,
        ValueData::MultiString(vec!["{current}".to_string(), "{memdiag}".to_string()])
    );
}

#[test]
fn test_node_lookup() {
    let registry = Registry::open(sample_hive()).unwrap();

    let elements = registry
        .node(&format!("Objects/{{{}}}/Elements", BOOTMGR_GUID))
        .unwrap();
    assert_eq!(elements.name, "Elements");

    // Case-insensitive, and backslashes work too.
    let elements = registry
        .node(&format!("objects\\{{{}}}\\elements", BOOTMGR_GUID.to_lowercase()))
        .unwrap();
    assert_eq!(elements.name, "Elements");

    // Empty path and bare separators name the root.
    assert_eq!(registry.node("").unwrap().name, "BCD00000000");
    assert_eq!(registry.node("/").unwrap().name, "BCD00000000");

    assert!(matches!(
        registry.node("Objects/nosuchobject"),
        Err(BcdError::NotFound(_))
    ));
}

#[test]
fn test_close_lifecycle() {
    let mut registry = Registry::open(sample_hive()).unwrap();

    registry.close().unwrap();
    assert!(matches!(registry.close(), Err(BcdError::AlreadyClosed)));

    // The materialized tree survives the close.
    assert_eq!(registry.hive().name, "BCD00000000");
}

#[test]
fn test_malformed_device_aborts_build() {
    let mut hive = MockHive::new("BCD00000000");
    let osdevice = hive.add_node(0, "osdevice");
    hive.add_value(osdevice, "Element", 3, vec![0xFF; 20]);

    assert!(Registry::open(hive).is_err());
}

#[test]
fn test_unknown_tags_keep_raw_bytes() {
    let mut hive = MockHive::new("BCD00000000");
    let node = hive.add_node(0, "Elements");
    hive.add_value(node, "Element", 0xB, vec![1, 2, 3, 4, 5, 6, 7, 8]);

    let registry = Registry::open(hive).unwrap();
    let value = &registry.hive().children[0].values[0];
    assert_eq!(value.kind, RegValueType::QwordLittle);
    assert_eq!(value.data, ValueData::Bytes(vec![1, 2, 3, 4, 5, 6, 7, 8]));
}

#[test]
fn test_tree_serialization() {
    let registry = Registry::open(sample_hive()).unwrap();
    let json = serde_json::to_value(registry.hive()).unwrap();

    assert_eq!(json["name"], "BCD00000000");
    assert_eq!(json["nodes"][0]["name"], "Description");
    assert_eq!(json["nodes"][0]["values"][0]["data"]["string"], "BCD00000000");

    let desc_value = &json["nodes"][1]["nodes"][0]["nodes"][0]["values"][0];
    assert_eq!(desc_value["type"], "REG_BCD_DESCTYPE");
    assert_eq!(desc_value["data"]["desctype"]["object"], "objectApplication");
    assert_eq!(desc_value["data"]["desctype"]["image"], "imageFirmware");
    assert_eq!(desc_value["data"]["desctype"]["inherit"], "inheritAnyObject");
    assert_eq!(desc_value["data"]["desctype"]["application"], "bootmgr");
}

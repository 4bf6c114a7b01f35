//! In-memory [`ConfigProvider`].

use crate::traits::{ConfigProvider, DeviceMap};
use crate::{Architecture, HwDevice, IfCfg, InterfaceType, Result};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A frozen view of configuration and hardware.
///
/// Serialized as JSON with configured devices grouped by sysconfig type tag:
///
/// ```json
/// {
///   "architecture": "x86_64",
///   "hardware": [{ "name": "eth0", "type": "eth" }],
///   "devices": { "br": { "br0": { "BRIDGE_PORTS": "eth0" } } },
///   "layer2": {}
/// }
/// ```
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub architecture: Architecture,
    pub hardware: Vec<HwDevice>,
    #[serde(deserialize_with = "merge_device_groups")]
    pub devices: BTreeMap<InterfaceType, DeviceMap>,
    pub layer2: BTreeMap<String, bool>,
}

/// Folds device groups whose tags name the same type (`eth` and `ethernet`, or two unknown
/// tags) into one map.
fn merge_device_groups<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<InterfaceType, DeviceMap>, D::Error>
where
    D: Deserializer<'de>,
{
    let groups = BTreeMap::<String, DeviceMap>::deserialize(deserializer)?;

    let mut devices: BTreeMap<InterfaceType, DeviceMap> = BTreeMap::new();
    for (tag, group) in groups {
        let iface_type = InterfaceType::from(tag.as_str());
        let merged = devices.entry(iface_type).or_default();
        for (name, config) in group {
            if merged.contains_key(&name) {
                warn!("{} is defined twice under {}, using {:?} group", name, iface_type, tag);
            }
            merged.insert(name, config);
        }
    }
    Ok(devices)
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn with_hardware(mut self, device: HwDevice) -> Self {
        self.hardware.push(device);
        self
    }

    pub fn with_device(
        mut self,
        iface_type: InterfaceType,
        name: impl Into<String>,
        config: IfCfg,
    ) -> Self {
        self.devices
            .entry(iface_type)
            .or_default()
            .insert(name.into(), config);
        self
    }

    pub fn with_layer2(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.layer2.insert(name.into(), enabled);
        self
    }

    /// Replaces hardware, architecture and qeth flags with what the running system reports.
    pub fn overlay_host(mut self) -> Result<Self> {
        self.architecture = Architecture::host();
        self.hardware = crate::sys::hardware()?;
        self.layer2 = if self.architecture.is_s390() {
            self.hardware
                .iter()
                .map(|hw| (hw.name.clone(), crate::sys::qeth_layer2(&hw.name)))
                .collect()
        } else {
            BTreeMap::new()
        };
        debug!(
            "host overlay: {} on {}, {} devices",
            self.architecture,
            std::env::consts::OS,
            self.hardware.len()
        );
        Ok(self)
    }
}

impl ConfigProvider for Snapshot {
    fn device_map(&self, iface_type: InterfaceType) -> DeviceMap {
        self.devices.get(&iface_type).cloned().unwrap_or_default()
    }

    fn hardware(&self) -> Vec<HwDevice> {
        self.hardware.clone()
    }

    fn architecture(&self) -> Architecture {
        self.architecture
    }

    fn s390_layer2_capable(&self, name: &str) -> bool {
        self.layer2.get(name).copied().unwrap_or(false)
    }

    fn config(&self, name: &str) -> Option<(InterfaceType, IfCfg)> {
        self.devices
            .iter()
            .find_map(|(t, devices)| devices.get(name).map(|cfg| (*t, cfg.clone())))
    }

    fn hwinfo(&self, name: &str) -> Option<HwDevice> {
        self.hardware.iter().find(|hw| hw.name == name).cloned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "architecture": "s390x",
        "hardware": [
            { "name": "eth0", "type": "eth", "driver": "qeth" },
            { "name": "wlan0", "type": "wireless" }
        ],
        "devices": {
            "bond": { "bond0": { "BONDING_SLAVE0": "eth0", "BOOTPROTO": "static" } },
            "eth": { "eth0": { "BOOTPROTO": "none" } },
            "frobnicator": { "frob0": {} }
        },
        "layer2": { "eth0": true }
    }"#;

    #[test]
    fn test_parse() {
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.architecture(), Architecture::S390x);
        assert_eq!(snapshot.hardware().len(), 2);
        assert_eq!(snapshot.hardware()[1].iface_type, InterfaceType::Wireless);
        assert_eq!(snapshot.hardware()[0].driver.as_deref(), Some("qeth"));
        assert!(snapshot.s390_layer2_capable("eth0"));
        assert!(!snapshot.s390_layer2_capable("wlan0"));

        let (t, cfg) = snapshot.config("bond0").unwrap();
        assert_eq!(t, InterfaceType::Bond);
        assert_eq!(cfg.bonding_slaves(), vec!["eth0"]);
        assert_eq!(snapshot.config("frob0").unwrap().0, InterfaceType::Other);
        assert!(snapshot.is_configured("eth0"));
        assert!(!snapshot.is_configured("wlan0"));
    }

    #[test]
    fn test_empty_document() {
        let snapshot = Snapshot::from_json("{}").unwrap();
        assert_eq!(snapshot, Snapshot::new());
        assert!(snapshot.device_map(InterfaceType::Bond).is_empty());
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(
            Snapshot::from_json(r#"{ "hardware": 3 }"#),
            Err(crate::Error::Snapshot(_))
        ));
    }

    #[test]
    fn test_aliased_groups_merge() {
        let snapshot = Snapshot::from_json(
            r#"{ "devices": { "eth": { "eth0": {} }, "ethernet": { "eth1": {} } } }"#,
        )
        .unwrap();
        let names: Vec<String> = snapshot
            .device_map(InterfaceType::Ethernet)
            .into_keys()
            .collect();
        assert_eq!(names, vec!["eth0", "eth1"]);

        let snapshot = Snapshot::from_json(
            r#"{ "devices": { "team": { "team0": {} }, "veth": { "veth0": {} } } }"#,
        )
        .unwrap();
        assert_eq!(snapshot.device_map(InterfaceType::Other).len(), 2);
        assert!(snapshot.is_configured("team0"));
        assert!(snapshot.is_configured("veth0"));
    }

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let snapshot = Snapshot::new()
            .with_hardware(HwDevice::new("eth0", InterfaceType::Ethernet))
            .with_device(
                InterfaceType::Bridge,
                "br0",
                IfCfg::new().with("BRIDGE_PORTS", "eth0"),
            );
        fs::write(&path, snapshot.to_json().unwrap()).unwrap();

        assert_eq!(Snapshot::load(&path).unwrap(), snapshot);
        assert!(matches!(
            Snapshot::load(&dir.path().join("missing.json")),
            Err(crate::Error::Io(_))
        ));
    }
}

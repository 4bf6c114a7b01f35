use crate::{Error, Result};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::str::FromStr;

/// Interface classification.
///
/// Serialized using the sysconfig type tags (`eth`, `br`, `wlan`, ...). The long names are
/// accepted when deserializing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InterfaceType {
    #[serde(rename = "eth", alias = "ethernet")]
    Ethernet,
    #[serde(rename = "br", alias = "bridge")]
    Bridge,
    #[serde(rename = "bond")]
    Bond,
    #[serde(rename = "bond-slave", alias = "bonding-slave")]
    BondSlave,
    #[serde(rename = "vlan")]
    Vlan,
    #[serde(rename = "wlan", alias = "wireless")]
    Wireless,
    #[serde(rename = "tun")]
    Tun,
    #[serde(rename = "tap")]
    Tap,
    #[serde(rename = "usb")]
    Usb,
    #[serde(rename = "ib", alias = "infiniband")]
    Infiniband,
    #[serde(rename = "dummy")]
    Dummy,
    #[serde(rename = "other", other)]
    Other,
}

impl InterfaceType {
    pub const ALL: [InterfaceType; 12] = [
        InterfaceType::Ethernet,
        InterfaceType::Bridge,
        InterfaceType::Bond,
        InterfaceType::BondSlave,
        InterfaceType::Vlan,
        InterfaceType::Wireless,
        InterfaceType::Tun,
        InterfaceType::Tap,
        InterfaceType::Usb,
        InterfaceType::Infiniband,
        InterfaceType::Dummy,
        InterfaceType::Other,
    ];

    /// sysconfig tag of the type.
    pub const fn tag(&self) -> &'static str {
        match self {
            InterfaceType::Ethernet => "eth",
            InterfaceType::Bridge => "br",
            InterfaceType::Bond => "bond",
            InterfaceType::BondSlave => "bond-slave",
            InterfaceType::Vlan => "vlan",
            InterfaceType::Wireless => "wlan",
            InterfaceType::Tun => "tun",
            InterfaceType::Tap => "tap",
            InterfaceType::Usb => "usb",
            InterfaceType::Infiniband => "ib",
            InterfaceType::Dummy => "dummy",
            InterfaceType::Other => "other",
        }
    }

    /// Guesses the type from the device name alone.
    ///
    /// Used only when neither the configuration nor the hardware inventory tags the device.
    pub fn from_name(name: &str) -> Self {
        if name.contains('.') {
            return InterfaceType::Vlan;
        }

        let prefix = name.trim_end_matches(|c: char| c.is_ascii_digit());
        let prefixes: [(&str, InterfaceType); 13] = [
            ("bond", InterfaceType::Bond),
            ("br", InterfaceType::Bridge),
            ("vlan", InterfaceType::Vlan),
            ("wlan", InterfaceType::Wireless),
            ("wl", InterfaceType::Wireless),
            ("ath", InterfaceType::Wireless),
            ("tun", InterfaceType::Tun),
            ("tap", InterfaceType::Tap),
            ("usb", InterfaceType::Usb),
            ("ib", InterfaceType::Infiniband),
            ("dummy", InterfaceType::Dummy),
            ("eth", InterfaceType::Ethernet),
            ("en", InterfaceType::Ethernet),
        ];

        prefixes
            .iter()
            .find(|(p, _)| prefix.starts_with(p))
            .map(|(_, t)| *t)
            .unwrap_or(InterfaceType::Other)
    }
}

impl Display for InterfaceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl From<&str> for InterfaceType {
    fn from(s: &str) -> Self {
        match s {
            "eth" | "ethernet" => InterfaceType::Ethernet,
            "br" | "bridge" => InterfaceType::Bridge,
            "bond" => InterfaceType::Bond,
            "bond-slave" | "bonding-slave" => InterfaceType::BondSlave,
            "vlan" => InterfaceType::Vlan,
            "wlan" | "wireless" => InterfaceType::Wireless,
            "tun" => InterfaceType::Tun,
            "tap" => InterfaceType::Tap,
            "usb" => InterfaceType::Usb,
            "ib" | "infiniband" => InterfaceType::Infiniband,
            "dummy" => InterfaceType::Dummy,
            _ => InterfaceType::Other,
        }
    }
}

/// Value of the `STARTMODE` option.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StartMode {
    Auto,
    Hotplug,
    Ifplugd,
    Manual,
    Nfsroot,
    Off,
}

impl From<&str> for StartMode {
    // Unknown modes are treated as manual, same as ifup does.
    fn from(s: &str) -> Self {
        match s {
            "auto" | "onboot" | "boot" => StartMode::Auto,
            "hotplug" => StartMode::Hotplug,
            "ifplugd" => StartMode::Ifplugd,
            "nfsroot" => StartMode::Nfsroot,
            "off" => StartMode::Off,
            _ => StartMode::Manual,
        }
    }
}

/// An ifcfg record: configuration option name to raw string value.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IfCfg(BTreeMap<String, String>);

const BONDING_SLAVE: &str = "BONDING_SLAVE";
const BRIDGE_PORTS: &str = "BRIDGE_PORTS";

impl IfCfg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn startmode(&self) -> Option<StartMode> {
        self.get("STARTMODE").map(StartMode::from)
    }

    pub fn bootproto(&self) -> Option<&str> {
        self.get("BOOTPROTO")
    }

    /// Parses `IPADDR`, taking the prefix from `PREFIXLEN` or `NETMASK` when the address
    /// carries none.
    pub fn ipaddr(&self) -> Result<Option<IpNet>> {
        let Some(value) = self.get("IPADDR").filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        let invalid = |key: &str, value: &str| Error::InvalidAttribute {
            key: key.to_string(),
            value: value.to_string(),
        };

        if value.contains('/') {
            return IpNet::from_str(value)
                .map(Some)
                .map_err(|_| invalid("IPADDR", value));
        }

        let addr = IpAddr::from_str(value).map_err(|_| invalid("IPADDR", value))?;
        let prefix = if let Some(len) = self.get("PREFIXLEN") {
            len.parse::<u8>().map_err(|_| invalid("PREFIXLEN", len))?
        } else if let Some(mask) = self.get("NETMASK") {
            IpAddr::from_str(mask)
                .ok()
                .and_then(|m| ipnet::ip_mask_to_prefix(m).ok())
                .ok_or_else(|| invalid("NETMASK", mask))?
        } else {
            match addr {
                IpAddr::V4(_) => 32,
                IpAddr::V6(_) => 128,
            }
        };

        IpNet::new(addr, prefix)
            .map(Some)
            .map_err(|_| invalid("IPADDR", value))
    }

    /// Names listed by `BONDING_SLAVE<N>` options, in ascending `N`.
    pub fn bonding_slaves(&self) -> Vec<&str> {
        let mut slaves: Vec<(u32, &str)> = self
            .0
            .iter()
            .filter_map(|(key, value)| {
                let n = key.strip_prefix(BONDING_SLAVE)?.parse::<u32>().ok()?;
                (!value.is_empty()).then_some((n, value.as_str()))
            })
            .collect();
        slaves.sort_by_key(|(n, _)| *n);
        slaves.into_iter().map(|(_, name)| name).collect()
    }

    /// Names listed by `BRIDGE_PORTS`.
    pub fn bridge_ports(&self) -> Vec<&str> {
        self.get(BRIDGE_PORTS)
            .map(|ports| {
                ports
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for IfCfg {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A device reported by the hardware inventory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwDevice {
    pub name: String,
    #[serde(rename = "type")]
    pub iface_type: InterfaceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

impl HwDevice {
    pub fn new(name: impl Into<String>, iface_type: InterfaceType) -> Self {
        Self {
            name: name.into(),
            iface_type,
            driver: None,
        }
    }
}

/// Network interface.
///
/// An interface is identified by its name alone: [`PartialEq`] and [`Hash`] look at nothing
/// else, so two values differing only in type or configuration state compare equal. Callers
/// rely on the device name being the natural key.
#[derive(Clone, Debug)]
pub struct Interface {
    name: String,
    iface_type: InterfaceType,
    hardware_present: bool,
    config: Option<IfCfg>,
}

impl Interface {
    /// Returns an error if `name` is empty or the interface is neither present nor configured.
    pub fn new(
        name: impl Into<String>,
        iface_type: InterfaceType,
        hardware_present: bool,
        config: Option<IfCfg>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        if !hardware_present && config.is_none() {
            return Err(Error::Orphan(name));
        }

        Ok(Self {
            name,
            iface_type,
            hardware_present,
            config,
        })
    }

    /// Present device without configuration.
    pub fn hardware(name: impl Into<String>, iface_type: InterfaceType) -> Result<Self> {
        Self::new(name, iface_type, true, None)
    }

    /// Configured device which is not present.
    pub fn configured(
        name: impl Into<String>,
        iface_type: InterfaceType,
        config: IfCfg,
    ) -> Result<Self> {
        Self::new(name, iface_type, false, Some(config))
    }

    /// Builds an interface from what the provider knows about `name`.
    ///
    /// The type comes from the configuration's device category, then from the hardware
    /// inventory, then from the name itself.
    pub(crate) fn resolve(
        name: &str,
        config: Option<(InterfaceType, IfCfg)>,
        hwinfo: Option<&HwDevice>,
    ) -> Result<Self> {
        let iface_type = config
            .as_ref()
            .map(|(t, _)| *t)
            .or_else(|| hwinfo.map(|hw| hw.iface_type))
            .unwrap_or_else(|| InterfaceType::from_name(name));

        Self::new(
            name,
            iface_type,
            hwinfo.is_some(),
            config.map(|(_, cfg)| cfg),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn iface_type(&self) -> InterfaceType {
        self.iface_type
    }

    pub fn is_hardware_present(&self) -> bool {
        self.hardware_present
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    pub fn config(&self) -> Option<&IfCfg> {
        self.config.as_ref()
    }

    fn required_config(&self) -> Result<&IfCfg> {
        self.config
            .as_ref()
            .ok_or_else(|| Error::NotConfigured(self.name.clone()))
    }

    /// Raw option value. `Ok(None)` means configured, but the option is not set.
    pub fn attribute(&self, key: &str) -> Result<Option<&str>> {
        Ok(self.required_config()?.get(key))
    }

    pub fn startmode(&self) -> Result<Option<StartMode>> {
        Ok(self.required_config()?.startmode())
    }

    pub fn bootproto(&self) -> Result<Option<&str>> {
        Ok(self.required_config()?.bootproto())
    }

    pub fn ipaddr(&self) -> Result<Option<IpNet>> {
        self.required_config()?.ipaddr()
    }
}

impl PartialEq for Interface {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Interface {}

impl Hash for Interface {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_identity_is_name() {
        let a = Interface::hardware("eth0", InterfaceType::Ethernet).unwrap();
        let b = Interface::configured(
            "eth0",
            InterfaceType::Bridge,
            IfCfg::new().with("BOOTPROTO", "dhcp"),
        )
        .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Interface::hardware("eth1", InterfaceType::Ethernet).unwrap());
    }

    #[test]
    fn test_invariants() {
        assert!(matches!(
            Interface::hardware("", InterfaceType::Ethernet),
            Err(Error::InvalidName)
        ));
        assert!(matches!(
            Interface::new("eth0", InterfaceType::Ethernet, false, None),
            Err(Error::Orphan(name)) if name == "eth0"
        ));
    }

    #[test]
    fn test_unconfigured_attribute_is_error() {
        let eth0 = Interface::hardware("eth0", InterfaceType::Ethernet).unwrap();
        assert!(matches!(eth0.startmode(), Err(Error::NotConfigured(_))));
        assert!(matches!(eth0.bootproto(), Err(Error::NotConfigured(_))));
        assert!(matches!(eth0.attribute("MTU"), Err(Error::NotConfigured(_))));

        let eth1 = Interface::configured("eth1", InterfaceType::Ethernet, IfCfg::new()).unwrap();
        assert_eq!(eth1.bootproto().unwrap(), None);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(InterfaceType::from_name("eth0"), InterfaceType::Ethernet);
        assert_eq!(InterfaceType::from_name("enp0s3"), InterfaceType::Ethernet);
        assert_eq!(InterfaceType::from_name("br0"), InterfaceType::Bridge);
        assert_eq!(InterfaceType::from_name("bond1"), InterfaceType::Bond);
        assert_eq!(InterfaceType::from_name("eth0.42"), InterfaceType::Vlan);
        assert_eq!(InterfaceType::from_name("wlan0"), InterfaceType::Wireless);
        assert_eq!(InterfaceType::from_name("ib0"), InterfaceType::Infiniband);
        assert_eq!(InterfaceType::from_name("lo"), InterfaceType::Other);
    }

    #[test]
    fn test_startmode() {
        let cfg = IfCfg::new().with("STARTMODE", "onboot");
        assert_eq!(cfg.startmode(), Some(StartMode::Auto));
        let cfg = IfCfg::new().with("STARTMODE", "nfsroot");
        assert_eq!(cfg.startmode(), Some(StartMode::Nfsroot));
        let cfg = IfCfg::new().with("STARTMODE", "sometimes");
        assert_eq!(cfg.startmode(), Some(StartMode::Manual));
        assert_eq!(IfCfg::new().startmode(), None);
    }

    #[test]
    fn test_bonding_slaves_order() {
        let cfg: IfCfg = [
            ("BONDING_SLAVE10", "eth10"),
            ("BONDING_SLAVE2", "eth2"),
            ("BONDING_SLAVE0", "eth0"),
            ("BONDING_SLAVE3", ""),
            ("BONDING_SLAVE_OPTS", "x"),
            ("BONDING_MODULE_OPTS", "mode=active-backup"),
        ]
        .into_iter()
        .collect();
        assert_eq!(cfg.bonding_slaves(), vec!["eth0", "eth2", "eth10"]);
    }

    #[test]
    fn test_bridge_ports() {
        let cfg = IfCfg::new().with("BRIDGE_PORTS", " eth0,eth1  eth2\ttap0 ");
        assert_eq!(cfg.bridge_ports(), vec!["eth0", "eth1", "eth2", "tap0"]);
        assert!(IfCfg::new().bridge_ports().is_empty());
    }

    #[test]
    fn test_ipaddr() {
        let cfg = IfCfg::new().with("IPADDR", "192.168.1.10/24");
        assert_eq!(cfg.ipaddr().unwrap(), Some("192.168.1.10/24".parse().unwrap()));

        let cfg = IfCfg::new()
            .with("IPADDR", "10.0.0.1")
            .with("NETMASK", "255.255.0.0");
        assert_eq!(cfg.ipaddr().unwrap(), Some("10.0.0.1/16".parse().unwrap()));

        let cfg = IfCfg::new().with("IPADDR", "fd00::1").with("PREFIXLEN", "64");
        assert_eq!(cfg.ipaddr().unwrap(), Some("fd00::1/64".parse().unwrap()));

        let cfg = IfCfg::new().with("IPADDR", "10.0.0.300");
        assert!(matches!(cfg.ipaddr(), Err(Error::InvalidAttribute { .. })));

        assert_eq!(IfCfg::new().ipaddr().unwrap(), None);
    }
}

use crate::{HwDevice, InterfaceType, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

const SYS_CLASS_NET: &str = "/sys/class/net";

const ARPHRD_ETHER: u32 = 1;
const ARPHRD_INFINIBAND: u32 = 32;
const ARPHRD_LOOPBACK: u32 = 772;

const IFF_TUN: u32 = 0x0001;
const IFF_TAP: u32 = 0x0002;

/// Reader for the `/sys/class/net` tree.
#[derive(Clone, Debug)]
pub struct SysClassNet {
    root: PathBuf,
}

impl Default for SysClassNet {
    fn default() -> Self {
        Self::with_root(SYS_CLASS_NET)
    }
}

impl SysClassNet {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lists every network device except loopback, sorted by name.
    pub fn devices(&self) -> Result<Vec<HwDevice>> {
        let mut result = vec![];

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            // bonding_masters is a plain file living next to the devices
            if !entry.path().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!("Skipping non-UTF-8 device name {:?}", entry.file_name());
                continue;
            };
            if self.arp_type(&name) == Some(ARPHRD_LOOPBACK) {
                continue;
            }

            let iface_type = self.iface_type(&name);
            debug!("hwinfo: {} is {}", name, iface_type);
            result.push(HwDevice {
                driver: self.driver(&name),
                name,
                iface_type,
            });
        }

        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    /// Classifies a present device from its sysfs attributes.
    pub fn iface_type(&self, name: &str) -> InterfaceType {
        let dir = self.root.join(name);

        if dir.join("bridge").is_dir() {
            return InterfaceType::Bridge;
        }
        if dir.join("bonding").is_dir() {
            return InterfaceType::Bond;
        }
        if dir.join("wireless").exists() || dir.join("phy80211").exists() {
            return InterfaceType::Wireless;
        }
        if let Some(flags) = read_attr(&dir.join("tun_flags")).and_then(|f| parse_hex(&f)) {
            if flags & IFF_TAP != 0 {
                return InterfaceType::Tap;
            }
            if flags & IFF_TUN != 0 {
                return InterfaceType::Tun;
            }
        }

        let arp_type = self.arp_type(name);
        if arp_type == Some(ARPHRD_INFINIBAND) {
            return InterfaceType::Infiniband;
        }

        match fs::canonicalize(dir.join("device")) {
            Ok(device) if on_usb_bus(&device) => InterfaceType::Usb,
            Ok(_) if arp_type == Some(ARPHRD_ETHER) => InterfaceType::Ethernet,
            Ok(_) => InterfaceType::Other,
            // virtual device, nothing better than its name to go by
            Err(_) => InterfaceType::from_name(name),
        }
    }

    /// Kernel driver bound to the device, if any.
    pub fn driver(&self, name: &str) -> Option<String> {
        let link = fs::read_link(self.root.join(name).join("device").join("driver")).ok()?;
        link.file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
    }

    /// Reads the qeth `layer2` attribute. Anything but `1` means layer 3.
    pub fn qeth_layer2(&self, name: &str) -> bool {
        let path = self.root.join(name).join("device").join("layer2");
        match read_attr(&path) {
            Some(value) => value == "1",
            None => {
                debug!("{} has no qeth layer2 attribute", name);
                false
            }
        }
    }

    fn arp_type(&self, name: &str) -> Option<u32> {
        read_attr(&self.root.join(name).join("type"))?.parse().ok()
    }
}

fn read_attr(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
}

fn parse_hex(value: &str) -> Option<u32> {
    u32::from_str_radix(value.trim_start_matches("0x"), 16).ok()
}

fn on_usb_bus(device: &Path) -> bool {
    device
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .filter_map(|c| c.strip_prefix("usb"))
        .any(|bus| !bus.is_empty() && bus.chars().all(|ch| ch.is_ascii_digit()))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::os::unix::fs::symlink;

    fn write(path: PathBuf, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fake_sysfs() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let net = tmp.path().join("net");
        let devices = tmp.path().join("devices");

        write(net.join("bonding_masters"), "bond0\n");

        write(net.join("lo/type"), "772\n");

        write(net.join("eth0/type"), "1\n");
        fs::create_dir_all(devices.join("pci0000:00/0000:00:19.0")).unwrap();
        fs::create_dir_all(devices.join("drivers/e1000e")).unwrap();
        symlink(devices.join("pci0000:00/0000:00:19.0"), net.join("eth0/device")).unwrap();
        symlink(
            devices.join("drivers/e1000e"),
            devices.join("pci0000:00/0000:00:19.0/driver"),
        )
        .unwrap();

        write(net.join("eth1/type"), "1\n");
        write(net.join("eth1/device/layer2"), "1\n");

        write(net.join("eth2/type"), "1\n");
        write(net.join("eth2/device/layer2"), "0\n");

        write(net.join("br0/type"), "1\n");
        fs::create_dir_all(net.join("br0/bridge")).unwrap();

        write(net.join("bond0/type"), "1\n");
        fs::create_dir_all(net.join("bond0/bonding")).unwrap();

        write(net.join("wlan0/type"), "1\n");
        fs::create_dir_all(net.join("wlan0/phy80211")).unwrap();

        write(net.join("tap0/type"), "1\n");
        write(net.join("tap0/tun_flags"), "0x1002\n");
        write(net.join("tun0/type"), "65534\n");
        write(net.join("tun0/tun_flags"), "0x1001\n");

        write(net.join("ib0/type"), "32\n");

        write(net.join("ue0/type"), "1\n");
        fs::create_dir_all(devices.join("usb1/1-1/1-1:1.0")).unwrap();
        symlink(devices.join("usb1/1-1/1-1:1.0"), net.join("ue0/device")).unwrap();

        write(net.join("eth0.42/type"), "1\n");
        write(net.join("dummy0/type"), "1\n");

        tmp
    }

    #[test]
    fn test_devices() {
        let tmp = fake_sysfs();
        let sys = SysClassNet::with_root(tmp.path().join("net"));
        let devices = sys.devices().unwrap();

        let found: Vec<(&str, InterfaceType)> = devices
            .iter()
            .map(|hw| (hw.name.as_str(), hw.iface_type))
            .collect();
        assert_eq!(
            found,
            vec![
                ("bond0", InterfaceType::Bond),
                ("br0", InterfaceType::Bridge),
                ("dummy0", InterfaceType::Dummy),
                ("eth0", InterfaceType::Ethernet),
                ("eth0.42", InterfaceType::Vlan),
                ("eth1", InterfaceType::Ethernet),
                ("eth2", InterfaceType::Ethernet),
                ("ib0", InterfaceType::Infiniband),
                ("tap0", InterfaceType::Tap),
                ("tun0", InterfaceType::Tun),
                ("ue0", InterfaceType::Usb),
                ("wlan0", InterfaceType::Wireless),
            ]
        );
        assert_eq!(devices[3].driver.as_deref(), Some("e1000e"));
        assert_eq!(devices[0].driver, None);
    }

    #[test]
    fn test_qeth_layer2() {
        let tmp = fake_sysfs();
        let sys = SysClassNet::with_root(tmp.path().join("net"));
        assert!(sys.qeth_layer2("eth1"));
        assert!(!sys.qeth_layer2("eth2"));
        assert!(!sys.qeth_layer2("eth0"));
        assert!(!sys.qeth_layer2("missing0"));
    }

    #[test]
    fn test_missing_root() {
        let sys = SysClassNet::with_root("/nonexistent/sys/class/net");
        assert!(matches!(sys.devices(), Err(crate::Error::Io(_))));
    }
}

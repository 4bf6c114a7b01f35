use crate::{Architecture, HwDevice, IfCfg, InterfaceType};
use std::collections::BTreeMap;

/// Configured devices of one category, keyed by device name.
pub type DeviceMap = BTreeMap<String, IfCfg>;

/// Source of configuration and hardware data the relationship model is computed from.
///
/// Implementations are queried on every selection; nothing is cached on the caller's side.
pub trait ConfigProvider {
    /// Configured devices of the given category.
    fn device_map(&self, iface_type: InterfaceType) -> DeviceMap;

    /// Devices currently present on the system.
    fn hardware(&self) -> Vec<HwDevice>;

    fn architecture(&self) -> Architecture;

    /// Whether the qeth device `name` runs in layer-2 mode. Meaningful on s390 only.
    fn s390_layer2_capable(&self, name: &str) -> bool;

    /// Configuration for `name` together with the category it was found in.
    fn config(&self, name: &str) -> Option<(InterfaceType, IfCfg)> {
        InterfaceType::ALL.iter().find_map(|t| {
            self.device_map(*t)
                .remove(name)
                .map(|cfg| (*t, cfg))
        })
    }

    fn is_configured(&self, name: &str) -> bool {
        self.config(name).is_some()
    }

    fn hwinfo(&self, name: &str) -> Option<HwDevice> {
        self.hardware().into_iter().find(|hw| hw.name == name)
    }
}

/// Architecture-specific test deciding whether a device may be enslaved in a bond at all.
pub trait BondCapability {
    fn supports_bonding(&self, provider: &dyn ConfigProvider, name: &str) -> bool;
}

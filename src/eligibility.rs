//! Rules deciding whether an interface may join a bridge or a bond.

use crate::index::RelationshipIndex;
use crate::traits::{BondCapability, ConfigProvider};
use crate::{IfCfg, Interface, InterfaceType, StartMode};
use log::debug;

/// Checks whether `iface` can be a port of `bridge`.
pub fn bridgeable(
    bridge: &Interface,
    iface: &Interface,
    bond_index: &RelationshipIndex,
    bridge_index: &RelationshipIndex,
) -> bool {
    if iface == bridge {
        debug!("Excluding ({}) - is the bridge itself", iface.name());
        return false;
    }

    let Some(config) = iface.config() else {
        return true;
    };

    if bond_index.contains(iface.name()) {
        debug!("Excluding ({}) - is bonded", iface.name());
        return false;
    }

    // already a port of another bridge
    if bridge_index.is_claimed_by_other(iface.name(), bridge.name()) {
        debug!("Excluding ({}) - already bridged", iface.name());
        return false;
    }

    match iface.iface_type() {
        InterfaceType::Bridge => {
            debug!("Excluding ({}) - is bridge", iface.name());
            return false;
        }
        t @ (InterfaceType::Tun | InterfaceType::Usb | InterfaceType::Wireless) => {
            debug!("Excluding ({}) - is {}", iface.name(), t);
            return false;
        }
        _ => {}
    }

    match config.startmode() {
        Some(StartMode::Nfsroot) => {
            debug!("Excluding ({}) - is nfsroot", iface.name());
            false
        }
        Some(StartMode::Ifplugd) => {
            debug!("Excluding ({}) - ifplugd", iface.name());
            false
        }
        _ => true,
    }
}

/// Checks whether `iface` can be enslaved in `bond`.
pub fn bondable(
    bond: &Interface,
    iface: &Interface,
    bond_index: &RelationshipIndex,
    capability: &dyn BondCapability,
    provider: &dyn ConfigProvider,
) -> bool {
    if iface == bond {
        debug!("Excluding ({}) - is the bond itself", iface.name());
        return false;
    }

    if !capability.supports_bonding(provider, iface.name()) {
        return false;
    }

    if bond_index.is_claimed_by_other(iface.name(), bond.name()) {
        debug!("Excluding ({}) - is already bonded", iface.name());
        return false;
    }

    match iface.config().map(IfCfg::bootproto) {
        None | Some(Some("none")) => true,
        Some(bootproto) => {
            debug!(
                "Excluding ({}) - is configured with BOOTPROTO {}",
                iface.name(),
                bootproto.unwrap_or("unset")
            );
            false
        }
    }
}

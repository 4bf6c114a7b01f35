//! Slave-to-master indices derived from bond and bridge configurations.

use crate::traits::{ConfigProvider, DeviceMap};
use crate::{IfCfg, InterfaceType};
use log::{debug, warn};
use std::collections::HashMap;

/// Maps an enslaved interface name to the name of its master.
///
/// Built from scratch for every query and never stored. A slave claimed by several masters
/// belongs to the one scanned last; masters are scanned in name order.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct RelationshipIndex {
    masters: HashMap<String, String>,
}

impl RelationshipIndex {
    fn build<'a, F>(devices: &'a DeviceMap, slaves_of: F) -> Self
    where
        F: Fn(&'a IfCfg) -> Vec<&'a str>,
    {
        let mut masters = HashMap::new();

        for (master, cfg) in devices {
            for slave in slaves_of(cfg) {
                if let Some(previous) = masters.insert(slave.to_string(), master.clone()) {
                    if previous != *master {
                        warn!(
                            "{} is claimed by both {} and {}, using {}",
                            slave, previous, master, master
                        );
                    }
                }
            }
        }

        Self { masters }
    }

    pub fn master_of(&self, name: &str) -> Option<&str> {
        self.masters.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.masters.contains_key(name)
    }

    /// Whether `name` is enslaved to something other than `master`.
    pub fn is_claimed_by_other(&self, name: &str, master: &str) -> bool {
        self.master_of(name).map_or(false, |m| m != master)
    }

    pub fn len(&self) -> usize {
        self.masters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masters.is_empty()
    }
}

/// Index of bond slaves, read from the `BONDING_SLAVE<N>` options of every bond.
pub fn bond_index(provider: &dyn ConfigProvider) -> RelationshipIndex {
    let bonds = provider.device_map(InterfaceType::Bond);
    let index = RelationshipIndex::build(&bonds, IfCfg::bonding_slaves);
    debug!("bond slaves index: {:?}", index.masters);
    index
}

/// Index of bridge ports, read from the `BRIDGE_PORTS` option of every bridge.
pub fn bridge_index(provider: &dyn ConfigProvider) -> RelationshipIndex {
    let bridges = provider.device_map(InterfaceType::Bridge);
    let index = RelationshipIndex::build(&bridges, IfCfg::bridge_ports);
    debug!("bridge ports index: {:?}", index.masters);
    index
}

use crate::eligibility::{bondable, bridgeable};
use crate::index::{bond_index, bridge_index};
use crate::traits::ConfigProvider;
use crate::{Error, IfCfg, Interface, InterfaceType, Result};
use delegate::delegate;
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A container for network devices, with mass queries over them.
///
/// Names are unique within a collection. The configuration provider is held for the lifetime
/// of the collection and consulted afresh by every selection, so relationship indices always
/// reflect the provider's current state.
///
/// ```
/// use netcompose::{IfCfg, InterfaceType, InterfacesCollection, Snapshot};
/// use std::sync::Arc;
///
/// let snapshot = Snapshot::new()
///     .with_device(InterfaceType::Bridge, "br0", IfCfg::new())
///     .with_device(InterfaceType::Ethernet, "eth0", IfCfg::new().with("BOOTPROTO", "none"));
/// let collection = InterfacesCollection::from_provider(Arc::new(snapshot)).unwrap();
///
/// let br0 = collection.find("br0").unwrap();
/// let ports = collection.select_bridgeable(br0).unwrap();
/// assert_eq!(ports.len(), 1);
/// assert_eq!(ports[0].name(), "eth0");
/// ```
pub struct InterfacesCollection {
    provider: Arc<dyn ConfigProvider>,
    interfaces: Vec<Interface>,
}

impl InterfacesCollection {
    /// Returns [`Error::DuplicateInterface`] if two interfaces share a name.
    pub fn new(provider: Arc<dyn ConfigProvider>, interfaces: Vec<Interface>) -> Result<Self> {
        let mut seen = HashSet::new();
        for iface in &interfaces {
            if !seen.insert(iface.name()) {
                return Err(Error::DuplicateInterface(iface.name().to_string()));
            }
        }

        Ok(Self {
            provider,
            interfaces,
        })
    }

    /// Reconstructs the collection from the provider: present devices first, in inventory
    /// order, then devices which are only configured, by name.
    pub fn from_provider(provider: Arc<dyn ConfigProvider>) -> Result<Self> {
        let hardware = provider.hardware();

        let mut configs: BTreeMap<String, (InterfaceType, IfCfg)> = BTreeMap::new();
        for iface_type in InterfaceType::ALL {
            for (name, cfg) in provider.device_map(iface_type) {
                configs.entry(name).or_insert((iface_type, cfg));
            }
        }

        let mut interfaces = Vec::with_capacity(hardware.len() + configs.len());
        for hw in &hardware {
            if interfaces.iter().any(|i: &Interface| i.name() == hw.name) {
                continue;
            }
            let config = configs.remove(&hw.name);
            interfaces.push(Interface::resolve(&hw.name, config, Some(hw))?);
        }
        for (name, config) in configs {
            interfaces.push(Interface::resolve(&name, Some(config), None)?);
        }

        debug!("collection rebuilt with {} interfaces", interfaces.len());
        Self::new(provider, interfaces)
    }

    delegate! {
        to self.interfaces {
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
            pub fn iter(&self) -> std::slice::Iter<'_, Interface>;
            pub fn as_slice(&self) -> &[Interface];
        }
    }

    pub fn provider(&self) -> &Arc<dyn ConfigProvider> {
        &self.provider
    }

    /// Returns the interface with the given name if present.
    pub fn find(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.name() == name)
    }

    /// Adds an interface named `name`, built from what the provider knows about it.
    ///
    /// A name unknown to the provider yields a configured interface with an empty ifcfg: a
    /// device which is being defined.
    pub fn add(&mut self, name: &str) -> Result<&Interface> {
        if name.is_empty() {
            return Err(Error::InvalidName);
        }

        let iface = match (self.provider.config(name), self.provider.hwinfo(name)) {
            (None, None) => {
                Interface::configured(name, InterfaceType::from_name(name), IfCfg::new())?
            }
            (config, hwinfo) => Interface::resolve(name, config, hwinfo.as_ref())?,
        };

        self.insert(iface)?;
        Ok(&self.interfaces[self.interfaces.len() - 1])
    }

    pub fn insert(&mut self, iface: Interface) -> Result<()> {
        if self.find(iface.name()).is_some() {
            return Err(Error::DuplicateInterface(iface.name().to_string()));
        }
        self.interfaces.push(iface);
        Ok(())
    }

    /// Removes interfaces named `name` and returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.interfaces.len();
        self.interfaces.retain(|iface| iface.name() != name);
        before - self.interfaces.len()
    }

    /// Keeps only the interfaces matching `f`.
    pub fn retain<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(&Interface) -> bool,
    {
        self.interfaces.retain(f);
        self
    }

    pub fn of_type(&self, iface_type: InterfaceType) -> Vec<&Interface> {
        self.interfaces
            .iter()
            .filter(|iface| iface.iface_type() == iface_type)
            .collect()
    }

    /// Interface names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.interfaces.iter().map(Interface::name).collect();
        names.sort_unstable();
        names
    }

    /// Interfaces usable as ports of `bridge`.
    pub fn select_bridgeable(&self, bridge: &Interface) -> Result<Vec<&Interface>> {
        if bridge.iface_type() != InterfaceType::Bridge {
            return Err(Error::InvalidArgument {
                name: bridge.name().to_string(),
                expected: InterfaceType::Bridge,
            });
        }

        let bonds = bond_index(self.provider.as_ref());
        let bridges = bridge_index(self.provider.as_ref());

        Ok(self
            .interfaces
            .iter()
            .filter(|iface| bridgeable(bridge, iface, &bonds, &bridges))
            .collect())
    }

    /// Interfaces which can be enslaved in `bond`.
    pub fn select_bondable(&self, bond: &Interface) -> Result<Vec<&Interface>> {
        if bond.iface_type() != InterfaceType::Bond {
            return Err(Error::InvalidArgument {
                name: bond.name().to_string(),
                expected: InterfaceType::Bond,
            });
        }

        let bonds = bond_index(self.provider.as_ref());
        let capability = self.provider.architecture().bond_capability();

        Ok(self
            .interfaces
            .iter()
            .filter(|iface| {
                bondable(
                    bond,
                    iface,
                    &bonds,
                    capability.as_ref(),
                    self.provider.as_ref(),
                )
            })
            .collect())
    }

    /// Names configured as slaves of the bond `bond`.
    pub fn bond_slaves(&self, bond: &str) -> Vec<String> {
        self.provider
            .device_map(InterfaceType::Bond)
            .get(bond)
            .map(|cfg| cfg.bonding_slaves().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Names configured as ports of the bridge `bridge`.
    pub fn bridge_ports(&self, bridge: &str) -> Vec<String> {
        self.provider
            .device_map(InterfaceType::Bridge)
            .get(bridge)
            .map(|cfg| cfg.bridge_ports().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Configured members of a bond or a bridge.
    pub fn members(&self, master: &Interface) -> Result<Vec<String>> {
        match master.iface_type() {
            InterfaceType::Bond => Ok(self.bond_slaves(master.name())),
            InterfaceType::Bridge => Ok(self.bridge_ports(master.name())),
            _ => Err(Error::NotAMaster(master.name().to_string())),
        }
    }
}

/// Two collections are equal when they hold the same interface names, in any order.
impl PartialEq for InterfacesCollection {
    fn eq(&self, other: &Self) -> bool {
        let ours: HashSet<&Interface> = self.interfaces.iter().collect();
        let theirs: HashSet<&Interface> = other.interfaces.iter().collect();
        ours == theirs
    }
}

impl Eq for InterfacesCollection {}

impl Debug for InterfacesCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfacesCollection")
            .field("interfaces", &self.interfaces)
            .finish_non_exhaustive()
    }
}

impl<'a> IntoIterator for &'a InterfacesCollection {
    type Item = &'a Interface;
    type IntoIter = std::slice::Iter<'a, Interface>;

    fn into_iter(self) -> Self::IntoIter {
        self.interfaces.iter()
    }
}

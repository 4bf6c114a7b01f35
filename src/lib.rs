//! Interface relationship model for composing Linux network interfaces into bridges and bonds.
//!
//! An [`InterfacesCollection`] holds the known interfaces together with the
//! [`ConfigProvider`] they were read from. Selection queries rebuild the bond and bridge
//! membership indices from the provider on every call and filter the collection through the
//! [`bridgeable`] and [`bondable`] rules.

mod arch;
mod collection;
mod eligibility;
mod error;
mod index;
mod interface;
mod snapshot;
mod traits;
pub mod sys;

pub use arch::{Architecture, QethLayer2, Unrestricted};
pub use collection::InterfacesCollection;
pub use eligibility::{bondable, bridgeable};
pub use error::{Error, Result};
pub use index::{bond_index, bridge_index, RelationshipIndex};
pub use interface::{HwDevice, IfCfg, Interface, InterfaceType, StartMode};
pub use ipnet;
pub use snapshot::Snapshot;
pub use traits::{BondCapability, ConfigProvider, DeviceMap};

//! Host probing: hardware inventory, qeth flags and machine architecture.

use crate::{HwDevice, Result};

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod linux;
        pub use linux::SysClassNet;

        /// Network devices present on the system.
        pub fn hardware() -> Result<Vec<HwDevice>> {
            SysClassNet::default().devices()
        }

        /// Whether the qeth device `name` runs in layer-2 mode.
        pub fn qeth_layer2(name: &str) -> bool {
            SysClassNet::default().qeth_layer2(name)
        }
    } else {
        pub fn hardware() -> Result<Vec<HwDevice>> {
            Ok(vec![])
        }

        pub fn qeth_layer2(_name: &str) -> bool {
            false
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod posix;
        pub(crate) use posix::machine;
    } else {
        pub(crate) fn machine() -> Option<String> {
            None
        }
    }
}

//! Hardware architecture and the bonding rules that depend on it.

use crate::traits::{BondCapability, ConfigProvider};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    X86_64,
    I386,
    Aarch64,
    Arm,
    Ppc64,
    Ppc64le,
    S390,
    S390x,
    Riscv64,
    #[default]
    #[serde(other)]
    Other,
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        const TARGET: Architecture = Architecture::X86_64;
    } else if #[cfg(target_arch = "x86")] {
        const TARGET: Architecture = Architecture::I386;
    } else if #[cfg(target_arch = "aarch64")] {
        const TARGET: Architecture = Architecture::Aarch64;
    } else if #[cfg(target_arch = "arm")] {
        const TARGET: Architecture = Architecture::Arm;
    } else if #[cfg(all(target_arch = "powerpc64", target_endian = "little"))] {
        const TARGET: Architecture = Architecture::Ppc64le;
    } else if #[cfg(target_arch = "powerpc64")] {
        const TARGET: Architecture = Architecture::Ppc64;
    } else if #[cfg(target_arch = "s390x")] {
        const TARGET: Architecture = Architecture::S390x;
    } else if #[cfg(target_arch = "riscv64")] {
        const TARGET: Architecture = Architecture::Riscv64;
    } else {
        const TARGET: Architecture = Architecture::Other;
    }
}

impl Architecture {
    /// Maps a `uname -m` machine string.
    pub fn from_machine(machine: &str) -> Self {
        match machine {
            "x86_64" | "amd64" => Architecture::X86_64,
            "i386" | "i486" | "i586" | "i686" => Architecture::I386,
            "aarch64" | "arm64" => Architecture::Aarch64,
            "ppc64" => Architecture::Ppc64,
            "ppc64le" => Architecture::Ppc64le,
            "s390" => Architecture::S390,
            "s390x" => Architecture::S390x,
            "riscv64" => Architecture::Riscv64,
            m if m.starts_with("arm") => Architecture::Arm,
            _ => Architecture::Other,
        }
    }

    /// Architecture of the running kernel, or of the build target when it cannot be queried.
    pub fn host() -> Self {
        match crate::sys::machine() {
            Some(machine) => Self::from_machine(&machine),
            None => TARGET,
        }
    }

    pub fn is_s390(&self) -> bool {
        matches!(self, Architecture::S390 | Architecture::S390x)
    }

    /// Capability check applied to every bond slave candidate on this architecture.
    pub fn bond_capability(&self) -> Box<dyn BondCapability> {
        if self.is_s390() {
            Box::new(QethLayer2)
        } else {
            Box::new(Unrestricted)
        }
    }
}

impl Display for Architecture {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Architecture::X86_64 => "x86_64",
            Architecture::I386 => "i386",
            Architecture::Aarch64 => "aarch64",
            Architecture::Arm => "arm",
            Architecture::Ppc64 => "ppc64",
            Architecture::Ppc64le => "ppc64le",
            Architecture::S390 => "s390",
            Architecture::S390x => "s390x",
            Architecture::Riscv64 => "riscv64",
            Architecture::Other => "other",
        };
        f.write_str(s)
    }
}

/// Every device may be bonded.
#[derive(Debug, Default, Copy, Clone)]
pub struct Unrestricted;

impl BondCapability for Unrestricted {
    fn supports_bonding(&self, _provider: &dyn ConfigProvider, _name: &str) -> bool {
        true
    }
}

/// s390: only qeth devices running in layer-2 mode can be enslaved (bnc#719881).
#[derive(Debug, Default, Copy, Clone)]
pub struct QethLayer2;

impl BondCapability for QethLayer2 {
    fn supports_bonding(&self, provider: &dyn ConfigProvider, name: &str) -> bool {
        let capable = provider.s390_layer2_capable(name);
        if !capable {
            debug!("Excluding ({}) - no qeth layer2 support", name);
        }
        capable
    }
}

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::ReconcileError;

/// Device operating system family; selects the relay command dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// Cisco IOS
    Ios,
    /// Cisco IOS-XE
    #[value(name = "ios-xe")]
    IosXe,
    /// Cisco NX-OS
    Nxos,
    /// Cisco ASA / ASAv
    Asa,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Ios,
        Platform::IosXe,
        Platform::Nxos,
        Platform::Asa,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::IosXe => "ios-xe",
            Platform::Nxos => "nxos",
            Platform::Asa => "asa",
        }
    }

    /// Detect the platform from an SNMP sysDescr string.
    ///
    /// IOS-XE must be checked before IOS since most IOS-XE descriptions
    /// also contain "IOS".
    pub fn from_sys_descr(descr: &str) -> Result<Platform, ReconcileError> {
        if descr.contains("Adaptive Security") {
            Ok(Platform::Asa)
        } else if descr.contains("NX-OS") {
            Ok(Platform::Nxos)
        } else if ["IOSXE", "IOS-XE", "IOS XE", "LINUX_IOSD", "CAT3K_"]
            .iter()
            .any(|marker| descr.contains(marker))
        {
            Ok(Platform::IosXe)
        } else if descr.contains("IOS") {
            Ok(Platform::Ios)
        } else {
            Err(ReconcileError::UnsupportedPlatform(descr.trim().to_string()))
        }
    }
}

impl FromStr for Platform {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Platform::ALL
            .into_iter()
            .find(|p| p.tag().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ReconcileError::UnsupportedPlatform(tag.to_string()))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

//! Artifact registry types.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::utils::{require_one_of, ValidationError};

/// Package format a registry stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistryType {
    Docker,
    Debian,
    Rpm,
}

impl RegistryType {
    pub const NAMES: &'static [&'static str] = &["DOCKER", "DEBIAN", "RPM"];

    pub fn as_str(self) -> &'static str {
        match self {
            RegistryType::Docker => "DOCKER",
            RegistryType::Debian => "DEBIAN",
            RegistryType::Rpm => "RPM",
        }
    }
}

impl FromStr for RegistryType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match require_one_of("registry_type", s, Self::NAMES)? {
            "DOCKER" => RegistryType::Docker,
            "DEBIAN" => RegistryType::Debian,
            _ => RegistryType::Rpm,
        })
    }
}

impl fmt::Display for RegistryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

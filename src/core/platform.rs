//! Target platform handling
//!
//! Decides how the object file and static library are linked into a
//! loadable Python extension on each supported host.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Platform the extension is linked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux / ELF shared object
    Linux,
    /// macOS / Mach-O bundle
    #[serde(rename = "macos")]
    MacOs,
}

impl Platform {
    /// Platform of the machine spicebind was built for
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }

    /// Flags placed before the output and inputs on the link line
    pub fn default_link_flags(self) -> Vec<String> {
        match self {
            Self::Linux => vec!["-shared".to_string()],
            Self::MacOs => vec![
                "-bundle".to_string(),
                "-undefined".to_string(),
                "dynamic_lookup".to_string(),
            ],
        }
    }

    /// Libraries appended after the static toolkit library
    pub fn trailing_libs(self) -> Vec<String> {
        match self {
            Self::Linux => vec!["-lm".to_string()],
            Self::MacOs => Vec::new(),
        }
    }

    /// Whether position-independent code must be requested explicitly
    pub fn needs_pic(self) -> bool {
        matches!(self, Self::Linux)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "macos"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" | "osx" => Ok(Self::MacOs),
            _ => Err(ConfigError::UnknownPlatform {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_aliases() {
        assert_eq!("linux".parse::<Platform>().unwrap(), Platform::Linux);
        assert_eq!("Darwin".parse::<Platform>().unwrap(), Platform::MacOs);
        assert_eq!("macos".parse::<Platform>().unwrap(), Platform::MacOs);
    }

    #[test]
    fn test_platform_parse_unknown() {
        let err = "windows".parse::<Platform>().unwrap_err();
        assert!(err.to_string().contains("windows"));
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for platform in [Platform::Linux, Platform::MacOs] {
            assert_eq!(platform.to_string().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_link_flags_per_platform() {
        assert_eq!(Platform::Linux.default_link_flags(), vec!["-shared"]);
        assert!(Platform::MacOs
            .default_link_flags()
            .contains(&"-bundle".to_string()));
        assert_eq!(Platform::Linux.trailing_libs(), vec!["-lm"]);
        assert!(Platform::MacOs.trailing_libs().is_empty());
    }
}

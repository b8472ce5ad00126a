//! Enumerated values that appear in generated documents or on the command line.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Clash proxy-group `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyGroupType {
    Select,
    Relay,
    UrlTest,
    Fallback,
    LoadBalance,
}

impl ProxyGroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Relay => "relay",
            Self::UrlTest => "url-test",
            Self::Fallback => "fallback",
            Self::LoadBalance => "load-balance",
        }
    }

    /// Group types that take a health-check `url`/`interval`.
    pub fn is_benchmarked(&self) -> bool {
        matches!(self, Self::UrlTest | Self::Fallback | Self::LoadBalance)
    }
}

impl fmt::Display for ProxyGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyGroupType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(Self::Select),
            "relay" => Ok(Self::Relay),
            "url-test" => Ok(Self::UrlTest),
            "fallback" => Ok(Self::Fallback),
            "load-balance" => Ok(Self::LoadBalance),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown proxy group type: {other}"
            ))),
        }
    }
}

/// Clash proxy-provider `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    File,
    Http,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown provider type: {other}"
            ))),
        }
    }
}

/// Shape of the written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Generator {
    /// Complete Clash configuration (template + proxies + groups + rules).
    #[default]
    Clash,
    /// Proxy-provider file holding only `proxies`.
    Provider,
}

impl Generator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clash => "clash",
            Self::Provider => "provider",
        }
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Generator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clash" | "config" => Ok(Self::Clash),
            "provider" | "proxy-provider" => Ok(Self::Provider),
            other => Err(ConfigError::InvalidValue(format!("unknown generator: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_type_names() {
        for t in [
            ProxyGroupType::Select,
            ProxyGroupType::Relay,
            ProxyGroupType::UrlTest,
            ProxyGroupType::Fallback,
            ProxyGroupType::LoadBalance,
        ] {
            assert_eq!(t.as_str().parse::<ProxyGroupType>().unwrap(), t);
            let yaml = serde_yaml::to_string(&t).unwrap();
            assert_eq!(yaml.trim(), t.as_str());
        }
    }

    #[test]
    fn unknown_values_are_invalid() {
        assert!(matches!(
            "round-robin".parse::<ProxyGroupType>(),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            "ftp".parse::<ProviderType>(),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            "surge".parse::<Generator>(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn generator_aliases() {
        assert_eq!("CONFIG".parse::<Generator>().unwrap(), Generator::Clash);
        assert_eq!(
            "proxy-provider".parse::<Generator>().unwrap(),
            Generator::Provider
        );
        assert_eq!(Generator::default(), Generator::Clash);
    }

    #[test]
    fn only_health_checked_types_are_benchmarked() {
        assert!(ProxyGroupType::UrlTest.is_benchmarked());
        assert!(!ProxyGroupType::Select.is_benchmarked());
        assert!(!ProxyGroupType::Relay.is_benchmarked());
    }
}

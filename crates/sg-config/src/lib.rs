//! Configuration for subgen.
//!
//! A single YAML file carries two things:
//! - `emoji`: location name → glyph, used when emoji naming is on.
//! - `providers`: one entry per subscription provider describing how its
//!   proxy names are structured (pattern + capture mapping), how groups are
//!   merged and which prefix generated groups get.
//!
//! ```yaml
//! emoji:
//!   HK: "🇭🇰"
//! providers:
//!   example:
//!     name_parser: '(\w+?)(\d+)?(\|Netflix)?'
//!     definition: { location_name: 1, position: 2, netflix: 3, amplification: -1 }
//!     group_merge: { MO: HK }
//!     prefix: Example
//! ```
//!
//! Run-level switches that come from the command line live in
//! [`GenerateOptions`].

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod de;
pub mod defaults;
pub mod model;
pub mod options;

pub use de::{CaptureRef, GroupMerge};
pub use model::{Generator, ProviderType, ProxyGroupType};
pub use options::GenerateOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("missing key: {0}")]
    MissingKey(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Maps logical name attributes to capture groups of `name_parser`.
///
/// Integer entries index the ordered capture list (0 is the whole match,
/// `-1` disables the field). With `regex_collapse` on, empty captures are
/// removed from that list first, so the same index may point at a different
/// group depending on the name. String entries look up a named capture group
/// and are not affected by collapsing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Definition {
    pub location_name: CaptureRef,
    pub position: CaptureRef,
    pub netflix: CaptureRef,
    pub amplification: CaptureRef,
}

impl Definition {
    /// True when no field points at a capture group.
    pub fn is_unset(&self) -> bool {
        [
            &self.location_name,
            &self.position,
            &self.netflix,
            &self.amplification,
        ]
        .iter()
        .all(|r| r.is_unused())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Case-insensitive pattern matched against the whole proxy name.
    pub name_parser: String,
    /// Drop empty captures before index lookup.
    pub regex_collapse: bool,
    pub definition: Definition,
    /// Ordered `source → target` directives.
    pub group_merge: GroupMerge,
    pub prefix: Option<String>,
}

impl ProviderConfig {
    pub fn prefix(&self) -> &str {
        self.prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults::DEFAULT_GROUP_PREFIX)
    }

    /// Checks the fields grouping depends on.
    pub fn validate(&self) -> Result<()> {
        if self.name_parser.trim().is_empty() {
            return Err(ConfigError::MissingKey("name_parser".into()));
        }
        if matches!(self.definition.location_name, CaptureRef::Index(i) if i < -1) {
            return Err(ConfigError::InvalidValue(format!(
                "definition.location_name: {:?}",
                self.definition.location_name
            )));
        }
        if self.definition.is_unset() {
            tracing::warn!("provider definition maps no capture group; every proxy will be ungroupable");
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderFile {
    pub emoji: BTreeMap<String, String>,
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl ProviderFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::from_yaml(&text)?;
        tracing::debug!(
            path = %path.display(),
            providers = file.providers.len(),
            emoji = file.emoji.len(),
            "loaded provider file"
        );
        Ok(file)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn provider(&self, name: &str) -> Result<&ProviderConfig> {
        self.providers
            .get(name)
            .ok_or_else(|| ConfigError::MissingKey(format!("providers.{name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
emoji:
  HK: "🇭🇰"
  US: "🇺🇸"
providers:
  example:
    name_parser: '(\w+?)(\d+)?(\|Netflix)?'
    definition:
      location_name: 1
      position: 2
      netflix: 3
      amplification: -1
    group_merge:
      MO: HK
      TW: HK
    prefix: Example
  bare:
    name_parser: '.*'
"#;

    #[test]
    fn parses_sample_file() {
        let file = ProviderFile::from_yaml(SAMPLE).unwrap();
        assert_eq!(file.emoji.get("HK").map(String::as_str), Some("🇭🇰"));

        let p = file.provider("example").unwrap();
        assert_eq!(p.definition.location_name, CaptureRef::Index(1));
        assert_eq!(p.definition.amplification, CaptureRef::Index(-1));
        assert_eq!(p.prefix(), "Example");
        let pairs: Vec<_> = p.group_merge.iter().collect();
        assert_eq!(pairs, vec![("MO", "HK"), ("TW", "HK")]);
        p.validate().unwrap();
    }

    #[test]
    fn defaults_apply_to_sparse_provider() {
        let file = ProviderFile::from_yaml(SAMPLE).unwrap();
        let p = file.provider("bare").unwrap();
        assert_eq!(p.prefix(), "Generated");
        assert!(p.definition.is_unset());
        assert!(p.group_merge.is_empty());
        assert!(!p.regex_collapse);
    }

    #[test]
    fn unknown_provider_is_missing_key() {
        let file = ProviderFile::from_yaml(SAMPLE).unwrap();
        let err = file.provider("nope").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(ref k) if k == "providers.nope"));
    }

    #[test]
    fn empty_pattern_fails_validation() {
        let p = ProviderConfig::default();
        assert!(matches!(p.validate(), Err(ConfigError::MissingKey(_))));
    }

    #[test]
    fn empty_text_is_default() {
        let file = ProviderFile::from_yaml("  \n").unwrap();
        assert!(file.providers.is_empty());
        assert!(file.emoji.is_empty());
    }
}

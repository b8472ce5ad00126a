use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubsError {
    #[error("invalid uri: {0}")]
    InvalidUri(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
    #[error("missing key: {0}")]
    MissingKey(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T, E = SubsError> = std::result::Result<T, E>;

impl From<sg_config::ConfigError> for SubsError {
    fn from(err: sg_config::ConfigError) -> Self {
        match err {
            sg_config::ConfigError::MissingKey(k) => SubsError::MissingKey(k),
            other => SubsError::InvalidValue(other.to_string()),
        }
    }
}

/// Attributes derived from a proxy name by [`crate::name::NameParser`].
#[derive(Debug, Clone, PartialEq)]
pub struct NameAttribute {
    pub location: String,
    /// `-1` means "number me when rendering".
    pub id: i64,
    pub netflix: bool,
    pub amplification: f64,
}

impl NameAttribute {
    /// Attribute for a name the pattern could not structure.
    pub fn ungrouped(name: &str) -> Self {
        Self {
            location: name.to_string(),
            id: -1,
            netflix: false,
            amplification: 1.0,
        }
    }
}

/// One proxy server entry in Clash field layout.
///
/// `fields` holds everything except `name` in insertion order. `attributes`
/// only lives while grouping and rendering; it is never serialized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProxyRecord {
    pub name: String,
    pub fields: Mapping,
    pub attributes: Option<NameAttribute>,
}

impl ProxyRecord {
    pub fn new(name: impl Into<String>, kind: &str) -> Self {
        let mut fields = Mapping::new();
        fields.insert(Value::from("type"), Value::from(kind));
        Self {
            name: name.into(),
            fields,
            attributes: None,
        }
    }

    /// Builder-style [`ProxyRecord::set`].
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(Value::from(key), value.into());
    }

    /// Sets `key` only when `value` is a non-empty string.
    pub fn set_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            self.set(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn kind(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str)
    }

    pub fn trim_name(&mut self) {
        let trimmed = self.name.trim();
        if trimmed.len() != self.name.len() {
            self.name = trimmed.to_string();
        }
    }

    /// Builds a record from a Clash `proxies` entry; `name` is required.
    pub fn from_mapping(map: Mapping) -> Result<Self> {
        let mut name = None;
        let mut fields = Mapping::with_capacity(map.len());
        for (k, v) in map {
            if k.as_str() == Some("name") {
                name = Some(match v {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    other => {
                        return Err(SubsError::InvalidValue(format!(
                            "proxy name must be a scalar, got {other:?}"
                        )))
                    }
                });
            } else {
                fields.insert(k, v);
            }
        }
        let name = name.ok_or_else(|| SubsError::MissingKey("name".into()))?;
        Ok(Self {
            name,
            fields,
            attributes: None,
        })
    }

    /// Emitted form: `name` first, then the scheme fields.
    pub fn to_mapping(&self) -> Mapping {
        let mut map = Mapping::with_capacity(self.fields.len() + 1);
        map.insert(Value::from("name"), Value::from(self.name.as_str()));
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        map
    }
}

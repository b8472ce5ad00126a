//! Serde helpers for fields that accept more than one YAML shape.

use serde::{de::Error as DeError, Deserialize, Deserializer};

/// Reference to a capture group of the name pattern: either a position in
/// the capture list or the name of a named group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureRef {
    Index(i64),
    Name(String),
}

impl CaptureRef {
    pub fn is_unused(&self) -> bool {
        match self {
            CaptureRef::Index(i) => *i < 0,
            CaptureRef::Name(n) => n.is_empty(),
        }
    }
}

impl Default for CaptureRef {
    fn default() -> Self {
        CaptureRef::Index(-1)
    }
}

impl<'de> Deserialize<'de> for CaptureRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(i) => Ok(CaptureRef::Index(i)),
            // "2" written as a string is still an index
            Raw::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => Ok(CaptureRef::Index(i)),
                Err(_) => Ok(CaptureRef::Name(s.trim().to_string())),
            },
        }
    }
}

/// Ordered list of `source → target` merge directives.
///
/// Accepts a mapping (`{MO: HK}`, document order is kept) or a sequence of
/// pairs (`[[MO, HK]]` / `[{from: MO, to: HK}]`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMerge(Vec<(String, String)>);

impl GroupMerge {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for GroupMerge {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Directive {
            #[serde(alias = "source")]
            from: String,
            #[serde(alias = "target")]
            to: String,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Entry {
            Pair([String; 2]),
            Obj(Directive),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Map(serde_yaml::Mapping),
            Seq(Vec<Entry>),
            Null(()),
        }

        let pairs = match Raw::deserialize(deserializer)? {
            Raw::Null(()) => Vec::new(),
            Raw::Seq(entries) => entries
                .into_iter()
                .map(|e| match e {
                    Entry::Pair([from, to]) => (from, to),
                    Entry::Obj(Directive { from, to }) => (from, to),
                })
                .collect(),
            Raw::Map(map) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (k, v) in map {
                    let from = scalar_string(&k)
                        .ok_or_else(|| D::Error::custom("group_merge keys must be scalars"))?;
                    let to = scalar_string(&v)
                        .ok_or_else(|| D::Error::custom("group_merge values must be scalars"))?;
                    pairs.push((from, to));
                }
                pairs
            }
        };
        Ok(GroupMerge(pairs))
    }
}

fn scalar_string(v: &serde_yaml::Value) -> Option<String> {
    match v {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

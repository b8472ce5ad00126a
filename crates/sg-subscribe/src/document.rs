//! Renders a [`Grouping`] into Clash `proxy-groups` / `proxies`.

use crate::grouping::{BucketKind, Grouping};
use crate::model::ProxyRecord;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use sg_config::{GenerateOptions, ProviderConfig, ProxyGroupType};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyGroup {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProxyGroupType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    pub proxies: Vec<String>,
}

/// Empty group of `kind`; health-check fields are only kept for types that
/// use them.
pub fn create_proxy_group(
    name: impl Into<String>,
    kind: ProxyGroupType,
    url: &str,
    interval: u32,
) -> ProxyGroup {
    let benchmarked = kind.is_benchmarked();
    ProxyGroup {
        name: name.into(),
        kind,
        url: benchmarked.then(|| url.to_string()),
        interval: benchmarked.then_some(interval),
        proxies: Vec::new(),
    }
}

/// Assembled output. Every name referenced by a group is present in
/// `proxies`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputDocument {
    pub groups: Vec<ProxyGroup>,
    pub proxies: Vec<Mapping>,
    pub group_name: Vec<String>,
}

impl OutputDocument {
    pub fn to_value(&self) -> Value {
        // plain data, serialization cannot fail
        serde_yaml::to_value(self).unwrap_or(Value::Null)
    }

    pub fn proxy_names(&self) -> Vec<&str> {
        self.proxies
            .iter()
            .filter_map(|p| p.get("name").and_then(Value::as_str))
            .collect()
    }
}

pub struct Assembler<'a> {
    provider: &'a ProviderConfig,
    emoji: &'a BTreeMap<String, String>,
    options: &'a GenerateOptions,
}

impl<'a> Assembler<'a> {
    pub fn new(
        provider: &'a ProviderConfig,
        emoji: &'a BTreeMap<String, String>,
        options: &'a GenerateOptions,
    ) -> Self {
        Self {
            provider,
            emoji,
            options,
        }
    }

    pub fn render(&self, grouping: &Grouping) -> OutputDocument {
        let records = grouping.records();
        let buckets = grouping.buckets();

        // names are fixed by the owning bucket; netflix only refers to them
        let mut resolved: Vec<Option<String>> = vec![None; records.len()];
        for bucket in buckets.values().filter(|b| b.kind != BucketKind::Netflix) {
            let mut counter = 0i64;
            for &idx in &bucket.members {
                resolved[idx] = Some(self.display_name(&records[idx], &mut counter));
            }
        }

        let mut doc = OutputDocument::default();
        let mut emitted = HashSet::new();
        for (key, bucket) in buckets {
            let name = format!("{}-{}", self.provider.prefix(), key);
            let mut group = create_proxy_group(
                name.as_str(),
                bucket.kind.group_type(),
                &self.options.benchmarking_url,
                self.options.benchmarking_interval,
            );
            for &idx in &bucket.members {
                let record = &records[idx];
                let proxy_name = resolved[idx]
                    .clone()
                    .unwrap_or_else(|| record.name.clone());
                if bucket.kind != BucketKind::Netflix {
                    if !emitted.insert(proxy_name.clone()) {
                        warn!(name = %proxy_name, group = %key, "duplicate proxy name in output");
                    }
                    doc.proxies.push(emit(record, &proxy_name));
                }
                group.proxies.push(proxy_name);
            }
            debug!(group = %name, size = group.proxies.len(), "rendered group");
            doc.group_name.push(name);
            doc.groups.push(group);
        }
        doc
    }

    fn display_name(&self, record: &ProxyRecord, counter: &mut i64) -> String {
        match &record.attributes {
            Some(attr) if self.options.use_emoji => {
                let id = if attr.id == -1 {
                    *counter += 1;
                    *counter
                } else {
                    attr.id
                };
                format!("{}{:02}", self.emoji(&attr.location), id)
            }
            _ => record.name.clone(),
        }
    }

    /// Glyph for `location`, or `location` itself when unmapped.
    pub fn emoji<'s>(&'s self, location: &'s str) -> &'s str {
        match self.emoji.get(location) {
            Some(glyph) => glyph,
            None => {
                warn!(location, "no emoji configured for location");
                location
            }
        }
    }
}

/// Emitted mapping for `record` under `name`, without attributes.
fn emit(record: &ProxyRecord, name: &str) -> Mapping {
    let mut map = record.to_mapping();
    map.insert(Value::from("name"), Value::from(name));
    map
}

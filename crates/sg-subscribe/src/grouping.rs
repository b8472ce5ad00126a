//! Buckets proxy records by the location encoded in their names.
//!
//! Records are kept in one arena; buckets hold indices into it, so a record
//! flagged for netflix can sit in its location bucket and in the netflix
//! bucket without being cloned.

use crate::model::ProxyRecord;
use crate::name::NameParser;
use crate::Result;
use sg_config::{GenerateOptions, ProviderConfig, ProxyGroupType};
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

pub const NETFLIX: &str = "netflix";
pub const LEFTOVER: &str = "leftover";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    Regular,
    Netflix,
    Leftover,
}

impl BucketKind {
    pub fn group_type(&self) -> ProxyGroupType {
        match self {
            BucketKind::Leftover => ProxyGroupType::Select,
            BucketKind::Regular | BucketKind::Netflix => ProxyGroupType::UrlTest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBucket {
    pub kind: BucketKind,
    /// Indices into [`Grouping::records`].
    pub members: Vec<usize>,
}

impl GroupBucket {
    fn new(kind: BucketKind) -> Self {
        Self {
            kind,
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Result of [`Grouper::group`]. Buckets iterate in key order.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    records: Vec<ProxyRecord>,
    buckets: BTreeMap<String, GroupBucket>,
}

impl Grouping {
    pub fn records(&self) -> &[ProxyRecord] {
        &self.records
    }

    pub fn buckets(&self) -> &BTreeMap<String, GroupBucket> {
        &self.buckets
    }

    pub fn bucket(&self, name: &str) -> Option<&GroupBucket> {
        self.buckets.get(name)
    }

    /// Records of bucket `name`, in bucket order.
    pub fn members(&self, name: &str) -> Vec<&ProxyRecord> {
        self.bucket(name)
            .map(|b| b.members.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    pub fn into_parts(self) -> (Vec<ProxyRecord>, BTreeMap<String, GroupBucket>) {
        (self.records, self.buckets)
    }
}

pub struct Grouper<'a> {
    provider: &'a ProviderConfig,
    options: &'a GenerateOptions,
    parser: Option<NameParser>,
}

impl<'a> Grouper<'a> {
    /// The name pattern is only compiled when grouping is enabled.
    pub fn new(provider: &'a ProviderConfig, options: &'a GenerateOptions) -> Result<Self> {
        let parser = if options.enable_grouping {
            Some(NameParser::from_provider(provider, options.regex_collapse)?)
        } else {
            None
        };
        Ok(Self {
            provider,
            options,
            parser,
        })
    }

    pub fn group(&self, records: Vec<ProxyRecord>, min_group_size: usize) -> Grouping {
        let Some(parser) = &self.parser else {
            return ungrouped(records);
        };

        let mut arena = Vec::with_capacity(records.len());
        let mut buckets: BTreeMap<String, GroupBucket> = BTreeMap::new();
        let mut netflix = GroupBucket::new(BucketKind::Netflix);
        let mut leftover = GroupBucket::new(BucketKind::Leftover);

        for mut record in records {
            record.trim_name();
            let Some(attr) = parser.parse(&record.name) else {
                trace!(name = %record.name, "name did not match, ungroupable");
                record.attributes = None;
                leftover.members.push(arena.len());
                arena.push(record);
                continue;
            };
            if self.options.exclude_amplified && attr.amplification > 1.0 {
                debug!(name = %record.name, amplification = attr.amplification, "excluding amplified proxy");
                continue;
            }

            let idx = arena.len();
            if is_reserved(&attr.location) {
                warn!(name = %record.name, location = %attr.location, "location collides with a synthetic group; moved to leftover");
                leftover.members.push(idx);
            } else {
                buckets
                    .entry(attr.location.clone())
                    .or_insert_with(|| GroupBucket::new(BucketKind::Regular))
                    .members
                    .push(idx);
            }
            if attr.netflix {
                netflix.members.push(idx);
            }
            record.attributes = Some(attr);
            arena.push(record);
        }

        for (source, target) in self.provider.group_merge.iter() {
            if source == target {
                warn!(source, "ignoring merge directive into itself");
                continue;
            }
            if !buckets.contains_key(target) {
                trace!(source, target, "merge target missing, skipped");
                continue;
            }
            let Some(moved) = buckets.remove(source) else {
                trace!(source, target, "merge source missing, skipped");
                continue;
            };
            debug!(source, target, count = moved.len(), "merging groups");
            if let Some(dest) = buckets.get_mut(target) {
                dest.members.extend(moved.members);
            }
        }

        buckets.retain(|name, bucket| {
            if bucket.len() >= min_group_size {
                return true;
            }
            debug!(group = %name, size = bucket.len(), min_group_size, "group below minimum size, dissolved");
            leftover.members.append(&mut bucket.members);
            false
        });

        info!(
            proxies = arena.len(),
            groups = buckets.len(),
            netflix = netflix.len(),
            leftover = leftover.len(),
            "grouping finished"
        );
        if !netflix.is_empty() {
            buckets.insert(NETFLIX.to_string(), netflix);
        }
        if !leftover.is_empty() {
            buckets.insert(LEFTOVER.to_string(), leftover);
        }
        Grouping {
            records: arena,
            buckets,
        }
    }
}

fn is_reserved(location: &str) -> bool {
    location.eq_ignore_ascii_case(NETFLIX) || location.eq_ignore_ascii_case(LEFTOVER)
}

fn ungrouped(records: Vec<ProxyRecord>) -> Grouping {
    let mut arena = records;
    for record in &mut arena {
        record.trim_name();
        record.attributes = None;
    }
    let mut buckets = BTreeMap::new();
    if !arena.is_empty() {
        buckets.insert(
            LEFTOVER.to_string(),
            GroupBucket {
                kind: BucketKind::Leftover,
                members: (0..arena.len()).collect(),
            },
        );
    }
    debug!(proxies = arena.len(), "grouping disabled, all proxies in leftover");
    Grouping {
        records: arena,
        buckets,
    }
}

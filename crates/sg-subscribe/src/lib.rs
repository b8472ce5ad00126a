//! Subscription → Clash conversion core.
//!
//! Pipeline:
//! 1. [`parse_subscription`] turns raw subscription text into
//!    [`ProxyRecord`]s (share links via [`decoder`], or Clash YAML via
//!    [`clash`]).
//! 2. [`grouping::Grouper`] buckets the records by the location encoded in
//!    their names ([`name::NameParser`]), applies merge directives and the
//!    minimum group size.
//! 3. [`document::Assembler`] names the proxies and renders groups into an
//!    [`document::OutputDocument`].
//! 4. [`generator`] wraps that document into a full configuration or a
//!    proxy-provider file.

pub mod clash;
pub mod decoder;
pub mod document;
pub mod generator;
pub mod grouping;
pub mod model;
pub mod name;
pub mod provider;
pub mod uri;

pub use document::{Assembler, OutputDocument, ProxyGroup};
pub use grouping::{Grouper, Grouping};
pub use model::{NameAttribute, ProxyRecord, Result, SubsError};
pub use uri::Uri;

use clash::SubscriptionFormat;

/// Decodes one subscription payload, whatever its format.
pub fn parse_subscription(text: &str) -> Result<Vec<ProxyRecord>> {
    match SubscriptionFormat::detect(text) {
        SubscriptionFormat::Clash => clash::parse(text),
        SubscriptionFormat::Links => decoder::decode(text),
    }
}

/// Runs grouping and rendering for already decoded records.
pub fn convert(
    records: Vec<ProxyRecord>,
    provider: &sg_config::ProviderConfig,
    emoji: &std::collections::BTreeMap<String, String>,
    options: &sg_config::GenerateOptions,
) -> Result<OutputDocument> {
    let grouping = Grouper::new(provider, options)?.group(records, options.group_min_size);
    Ok(Assembler::new(provider, emoji, options).render(&grouping))
}

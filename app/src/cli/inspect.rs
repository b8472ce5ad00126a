//! `subgen inspect`: show what the provider pattern makes of proxy names.
//! Useful while tuning `definition` indices, especially with collapse on.

use anyhow::{bail, Context, Result};
use clap::Parser;
use sg_subscribe::name::NameParser;
use sg_subscribe::parse_subscription;

use super::{ProviderArgs, SourceArgs};
use crate::fetch;

#[derive(Parser, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Remove empty captures before index lookup
    #[arg(long)]
    pub regex_collapse: bool,

    /// Proxy names to test directly
    pub names: Vec<String>,
}

pub async fn run(args: InspectArgs) -> Result<()> {
    let Some((_, provider)) = args.provider.load()? else {
        bail!("inspect needs a provider definition; use --config");
    };
    let parser = NameParser::from_provider(&provider, args.regex_collapse)?;

    let mut names = args.names.clone();
    let sources = args.source.sources()?;
    if !sources.is_empty() {
        for (source, text) in sources.iter().zip(fetch::fetch_all(&sources).await?) {
            let records = parse_subscription(&text)
                .with_context(|| format!("decoding subscription {}", source.describe()))?;
            names.extend(records.into_iter().map(|r| r.name));
        }
    }
    if names.is_empty() {
        bail!("nothing to inspect; pass names or --url/--file");
    }

    for name in names {
        let name = name.trim();
        match parser.parse(name) {
            Some(a) => println!(
                "{name}\tlocation={} id={} netflix={} amplification={}",
                a.location, a.id, a.netflix, a.amplification
            ),
            None => println!("{name}\tungroupable"),
        }
    }
    Ok(())
}

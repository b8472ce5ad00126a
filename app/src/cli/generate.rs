//! `subgen generate`: fetch → decode → group → render → write.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_yaml::{Mapping, Value};
use sg_config::defaults::{
    DEFAULT_BENCHMARKING_INTERVAL, DEFAULT_BENCHMARKING_URL, DEFAULT_GROUP_MIN_SIZE,
};
use sg_config::{GenerateOptions, Generator, ProviderConfig, ProviderType};
use sg_subscribe::{generator, parse_subscription, provider::create_provider_group, ProxyRecord};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::{ProviderArgs, SourceArgs};
use crate::fetch::{self, Source};
use crate::output;

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Output file, `-` for stdout
    #[arg(short = 'o', long, default_value = output::STDOUT)]
    pub output: String,

    /// Document kind: `clash` (full config) or `provider` (proxies only)
    #[arg(short = 'g', long, default_value = "clash")]
    pub generator: Generator,

    /// Clash config template (file or http(s) URL)
    #[arg(long)]
    pub template: Option<String>,

    /// Rules document (file or http(s) URL), replaces the template rules
    #[arg(long)]
    pub rules: Option<String>,

    /// Health-check URL for url-test groups
    #[arg(long, default_value = DEFAULT_BENCHMARKING_URL)]
    pub benchmark_url: String,

    /// Health-check interval in seconds
    #[arg(long, default_value_t = DEFAULT_BENCHMARKING_INTERVAL)]
    pub benchmark_interval: u32,

    /// Groups smaller than this are dissolved into leftover
    #[arg(long, default_value_t = DEFAULT_GROUP_MIN_SIZE)]
    pub min_group_size: usize,

    /// Put every proxy into the leftover group
    #[arg(long)]
    pub no_grouping: bool,

    /// Rename proxies to `<emoji><id>`
    #[arg(long)]
    pub emoji: bool,

    /// Drop proxies whose amplification is above 1.0
    #[arg(long)]
    pub exclude_amplified: bool,

    /// Remove empty captures before index lookup
    #[arg(long)]
    pub regex_collapse: bool,

    /// proxy-providers entry type printed for the provider generator
    #[arg(long, default_value = "file")]
    pub provider_type: ProviderType,

    /// URL clients poll for an `http` provider
    #[arg(long)]
    pub provider_url: Option<String>,
}

impl GenerateArgs {
    fn options(&self, grouping: bool) -> GenerateOptions {
        GenerateOptions {
            enable_grouping: grouping,
            use_emoji: self.emoji,
            exclude_amplified: self.exclude_amplified,
            regex_collapse: self.regex_collapse,
            group_min_size: self.min_group_size,
            benchmarking_url: self.benchmark_url.clone(),
            benchmarking_interval: self.benchmark_interval,
        }
    }
}

pub async fn run(args: GenerateArgs) -> Result<()> {
    let sources = args.source.sources()?;
    if sources.is_empty() {
        bail!("no subscription given; use --url or --file");
    }
    if args.generator == Generator::Provider && args.output == output::STDOUT {
        bail!("the provider generator needs --output <file>; the path is referenced by proxy-providers");
    }

    let (emoji, provider) = match args.provider.load()? {
        Some((file, provider)) => (file.emoji, provider),
        None => (BTreeMap::new(), ProviderConfig::default()),
    };
    let mut grouping = !args.no_grouping;
    if grouping && provider.name_parser.trim().is_empty() {
        warn!("no provider definition given; grouping disabled");
        grouping = false;
    }
    let options = args.options(grouping);

    let texts = fetch::fetch_all(&sources).await?;
    let mut records: Vec<ProxyRecord> = Vec::new();
    for (source, text) in sources.iter().zip(&texts) {
        let decoded = parse_subscription(text)
            .with_context(|| format!("decoding subscription {}", source.describe()))?;
        info!(source = %source.describe(), proxies = decoded.len(), "decoded subscription");
        records.extend(decoded);
    }

    let doc = sg_subscribe::convert(records, &provider, &emoji, &options)?;
    info!(
        proxies = doc.proxies.len(),
        groups = doc.groups.len(),
        "document assembled"
    );

    let value = match args.generator {
        Generator::Clash => {
            let client = fetch::http_client()?;
            let template = match &args.template {
                Some(loc) => {
                    let text = fetch::load(&client, &Source::detect(loc)?).await?;
                    let value: Value = serde_yaml::from_str(&text)
                        .with_context(|| format!("parsing template {loc}"))?;
                    Some(value)
                }
                None => None,
            };
            let rules = match &args.rules {
                Some(loc) => {
                    let text = fetch::load(&client, &Source::detect(loc)?).await?;
                    Some(
                        generator::parse_rules(&text)
                            .with_context(|| format!("parsing rules {loc}"))?,
                    )
                }
                None => None,
            };
            generator::clash_config(&doc, template, rules)?
        }
        Generator::Provider => {
            let entry = create_provider_group(
                args.provider_type,
                &args.output,
                args.provider_url.as_deref().unwrap_or_default(),
                true,
                &options.benchmarking_url,
                options.benchmarking_interval,
            )?;
            print_provider_snippet(provider.prefix(), &entry)?;
            generator::provider_file(&doc)
        }
    };

    output::write_yaml(&value, &args.output)
}

fn print_provider_snippet(
    name: &str,
    entry: &sg_subscribe::provider::ProviderGroup,
) -> Result<()> {
    let mut providers = Mapping::new();
    providers.insert(Value::from(name), serde_yaml::to_value(entry)?);
    let mut root = Mapping::new();
    root.insert(Value::from("proxy-providers"), Value::Mapping(providers));
    print!("{}", serde_yaml::to_string(&root)?);
    Ok(())
}

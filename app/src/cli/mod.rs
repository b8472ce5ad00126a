pub mod generate;
pub mod inspect;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use sg_config::{ProviderConfig, ProviderFile};
use std::path::PathBuf;

use crate::fetch::Source;

#[derive(Parser, Debug)]
#[command(name = "subgen", version)]
#[command(about = "Proxy subscription to Clash configuration generator", long_about = None)]
pub struct Args {
    /// Force debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert subscriptions into a Clash config or a proxy-provider file
    Generate(generate::GenerateArgs),
    /// Print the attributes the provider pattern extracts from proxy names
    Inspect(inspect::InspectArgs),
}

/// Where subscriptions come from; may be repeated and mixed.
#[derive(ClapArgs, Debug, Default)]
pub struct SourceArgs {
    /// Subscription URL (http/https)
    #[arg(short = 'u', long = "url")]
    pub urls: Vec<String>,
    /// Local subscription file
    #[arg(short = 'f', long = "file")]
    pub files: Vec<PathBuf>,
}

impl SourceArgs {
    pub fn sources(&self) -> Result<Vec<Source>> {
        let mut out = Vec::with_capacity(self.urls.len() + self.files.len());
        for url in &self.urls {
            out.push(Source::remote(url)?);
        }
        out.extend(self.files.iter().cloned().map(Source::Local));
        Ok(out)
    }
}

/// Provider definition + emoji table selection.
#[derive(ClapArgs, Debug, Default)]
pub struct ProviderArgs {
    /// Provider definition file (YAML)
    #[arg(short = 'c', long, env = "SG_CONFIG")]
    pub config: Option<PathBuf>,
    /// Provider entry to use; optional when the file defines exactly one
    #[arg(short = 'p', long)]
    pub provider: Option<String>,
}

impl ProviderArgs {
    /// Loads the file and picks the provider. `None` when no file was given.
    pub fn load(&self) -> Result<Option<(ProviderFile, ProviderConfig)>> {
        let Some(path) = &self.config else {
            if self.provider.is_some() {
                bail!("--provider requires --config");
            }
            return Ok(None);
        };
        let file = ProviderFile::load(path)
            .with_context(|| format!("loading provider file {}", path.display()))?;
        let provider = match &self.provider {
            Some(name) => file.provider(name)?.clone(),
            None => match file.providers.len() {
                1 => file.providers.values().next().cloned().unwrap_or_default(),
                0 => bail!("{} defines no providers", path.display()),
                n => bail!(
                    "{} defines {n} providers; choose one with --provider ({})",
                    path.display(),
                    file.providers.keys().cloned().collect::<Vec<_>>().join(", ")
                ),
            },
        };
        Ok(Some((file, provider)))
    }
}

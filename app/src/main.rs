//! subgen — entrypoint
//! - tracing initialization (stderr)
//! - `generate`: subscriptions → grouped Clash config / proxy-provider file
//! - `inspect`: show what the name pattern extracts

mod cli;
mod fetch;
mod logging;
mod output;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logging::init_logging(args.debug)?;

    match args.command {
        cli::Commands::Generate(a) => cli::generate::run(a).await,
        cli::Commands::Inspect(a) => cli::inspect::run(a).await,
    }
}

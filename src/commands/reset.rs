use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;

use crate::config::Config;
use crate::store::StateStore;

#[derive(ClapArgs)]
pub struct Args {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: Args) -> Result<()> {
    let config = Config::load(args.config)?;
    let store = StateStore::new(config.store_path());

    store.reset(env!("CARGO_PKG_VERSION")).await?;
    println!("Persisted state re-seeded at {}", config.store_path().display());

    Ok(())
}

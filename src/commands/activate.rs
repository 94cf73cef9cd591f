use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;

use crate::config::Config;
use crate::host::{Activator, SimTabs};

#[derive(ClapArgs)]
pub struct Args {
    /// Location of the currently focused tab, if any
    #[arg(long)]
    pub current_url: Option<String>,

    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Walk the activation path against sim tabs: focus or create the target view
/// tab, then run the three injection stages in order.
pub async fn execute(args: Args) -> Result<()> {
    let config = Config::load(args.config)?;

    let tabs = SimTabs::new();
    if let Some(url) = &args.current_url {
        tabs.open_tab(url.clone());
    }

    let activator = Activator::new(tabs.clone(), &config)?;
    let tab = activator.activate().await?;

    let urls = tabs.tab_urls();
    println!(
        "Activated tab {} at {}",
        tab,
        urls.get(&tab).map(String::as_str).unwrap_or("unknown")
    );
    println!("Injection stages:");
    for (target, stage) in tabs.injections() {
        println!("  tab {} <- {:?}", target, stage);
    }

    Ok(())
}

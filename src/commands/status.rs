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

    let Some(state) = store.load_optional().await? else {
        println!(
            "No persisted state at {} (nothing has run yet)",
            config.store_path().display()
        );
        return Ok(());
    };

    println!("Version: {}", state.version);
    println!("Installed: {}", state.install_date);
    if let Some(updated) = state.last_update {
        println!("Updated: {}", updated);
    }
    println!("Total unfollowed: {}", state.total_unfollowed);
    if let Some(at) = state.last_unfollow {
        println!("Last unfollow: {}", at);
    }
    if let Some(at) = state.last_analysis {
        println!("Last analysis: {}", at);
    }

    if state.analysis_history.is_empty() {
        println!("\nNo analyses recorded");
    } else {
        println!("\nAnalysis history (most recent last):");
        for entry in &state.analysis_history {
            println!("  {} - {} channels", entry.date, entry.total_channels);
        }
    }

    Ok(())
}

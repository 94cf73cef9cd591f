use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::host::{HostPage, LogNotifier, Scenario, ScenarioDriver, ScriptedPage};
use crate::models::GenerationCounter;
use crate::orchestrator::{InjectionController, NavigationWatcher, ReadinessDetector};
use crate::router::{ActivityIndicator, StatusRouter};
use crate::store::StateStore;

const STATUS_CHANNEL_CAPACITY: usize = 64;

#[derive(ClapArgs)]
pub struct Args {
    /// Scenario file describing the scripted host page
    pub scenario: PathBuf,

    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Grace period after the last scenario step before shutdown (ms)
    #[arg(long, default_value_t = 1000)]
    pub drain_ms: u64,
}

pub async fn execute(args: Args) -> Result<()> {
    let config = Config::load(args.config)?;
    let scenario = Scenario::load(&args.scenario)?;

    println!("Running scenario: {}", args.scenario.display());

    let page = ScriptedPage::new(scenario.page_config());
    let page_handle: Arc<dyn HostPage> = Arc::new(page.clone());

    let store = StateStore::new(config.store_path());
    store
        .initialize(env!("CARGO_PKG_VERSION"))
        .await
        .context("Failed to initialize persisted state")?;

    // Router side: its own task, reached only through the status channel.
    let (statuses, inbox) = mpsc::channel(STATUS_CHANNEL_CAPACITY);
    let indicator = ActivityIndicator::new();
    let router = StatusRouter::new(store.clone(), indicator.clone(), LogNotifier);
    let router_task = tokio::spawn(router.run(inbox));

    // Orchestrator side.
    let generations = GenerationCounter::new();
    let detector = ReadinessDetector::new(
        config.target_view_regex()?,
        config.selectors.clone(),
        config.timeouts.clone(),
    );
    let controller = Arc::new(InjectionController::new(
        Arc::clone(&page_handle),
        detector,
        generations.clone(),
        config.selectors.clone(),
        config.timeouts.clone(),
        config.retry.clone(),
    ));
    let watcher = NavigationWatcher::new(
        page_handle,
        Arc::clone(&controller),
        generations.clone(),
        config.target_view_regex()?,
        config.selectors.overlay.clone(),
        config.timeouts.nav_settle(),
    );
    let watcher_task = tokio::spawn(async move { watcher.run().await });

    // First cycle for the initial page load, like any fresh activation.
    let initial_cycle = {
        let controller = Arc::clone(&controller);
        let generation = generations.current();
        tokio::spawn(async move { controller.run_cycle(generation).await })
    };

    let driver = ScenarioDriver::new(page.clone(), statuses);
    driver.run(scenario.steps.clone()).await?;

    let initial_outcome = initial_cycle
        .await
        .context("Initial injection cycle panicked")?;

    // Let late retries and in-flight messages settle before tearing down.
    tokio::time::sleep(Duration::from_millis(args.drain_ms)).await;
    drop(driver);
    watcher_task.abort();
    router_task
        .await
        .context("Status router panicked")?;

    println!("\nScenario complete");
    println!("Initial cycle: {:?}", initial_outcome);
    println!(
        "Overlay present: {}",
        page.element_exists(&config.selectors.overlay).await
    );
    println!("Notices shown: {}", page.notice_log().len());

    if let Some(state) = store.load_optional().await? {
        println!(
            "State: {} analyses recorded, {} channels unfollowed in total",
            state.analysis_history.len(),
            state.total_unfollowed
        );
    }

    Ok(())
}

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::models::{StatusEnvelope, StatusMessage, TabId};

use super::page::DocumentReady;
use super::sim::{BootstrapBehavior, ScriptedPage, SimPageConfig};

/// A scripted host-page session: initial page setup plus timed steps.
///
/// Scenarios stand in for the uncontrolled rendering pipeline of a real
/// single-page app, so the whole injection pipeline can be driven end to end
/// without a browser.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub page: PageSetup,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageSetup {
    pub location: String,
    /// Whether the document starts fully loaded
    #[serde(default = "default_loaded")]
    pub loaded: bool,
    #[serde(default)]
    pub elements: Vec<String>,
    #[serde(default)]
    pub bootstrap: Option<BootstrapSpec>,
}

fn default_loaded() -> bool {
    true
}

/// How the page reacts to a bootstrap request
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapSpec {
    /// Selector of the element the bootstrap eventually creates
    pub creates: String,
    #[serde(default)]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub at_ms: u64,
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// In-app navigation to a new location
    Navigate { url: String },
    /// Back/forward traversal, optionally restoring a different location
    HistoryNavigate {
        #[serde(default)]
        url: Option<String>,
    },
    InsertElement { selector: String },
    RemoveElement { selector: String },
    /// The document finishes loading
    DocumentComplete,
    /// The overlay emits a status message
    Status {
        #[serde(default)]
        tab: TabId,
        message: StatusMessage,
    },
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {:?}", path))?;
        let scenario: Scenario = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse scenario file: {:?}", path))?;
        Ok(scenario)
    }

    pub fn page_config(&self) -> SimPageConfig {
        SimPageConfig {
            location: self.page.location.clone(),
            ready: if self.page.loaded {
                DocumentReady::Complete
            } else {
                DocumentReady::Loading
            },
            elements: self.page.elements.clone(),
            bootstrap: self.page.bootstrap.as_ref().map(|spec| BootstrapBehavior {
                creates: spec.creates.clone(),
                delay: Duration::from_millis(spec.delay_ms),
            }),
        }
    }
}

/// Applies a scenario's steps to the sim page on their schedule, forwarding
/// overlay status messages onto the router channel.
pub struct ScenarioDriver {
    page: ScriptedPage,
    statuses: mpsc::Sender<StatusEnvelope>,
}

impl ScenarioDriver {
    pub fn new(page: ScriptedPage, statuses: mpsc::Sender<StatusEnvelope>) -> Self {
        Self { page, statuses }
    }

    pub async fn run(&self, mut steps: Vec<Step>) -> Result<()> {
        steps.sort_by_key(|step| step.at_ms);
        let started = Instant::now();

        for step in steps {
            let due = Duration::from_millis(step.at_ms);
            let elapsed = started.elapsed();
            if due > elapsed {
                sleep(due - elapsed).await;
            }
            debug!(at_ms = step.at_ms, action = ?step.action, "scenario step");
            self.apply(step.action).await?;
        }
        Ok(())
    }

    async fn apply(&self, action: Action) -> Result<()> {
        match action {
            Action::Navigate { url } => self.page.navigate(url),
            Action::HistoryNavigate { url } => self.page.history_navigate(url.as_deref()),
            Action::InsertElement { selector } => self.page.insert_element(selector),
            Action::RemoveElement { selector } => self.page.remove_element(&selector),
            Action::DocumentComplete => self.page.set_ready(DocumentReady::Complete),
            Action::Status { tab, message } => {
                self.statuses
                    .send(StatusEnvelope::new(tab, message))
                    .await
                    .context("Status channel closed before the scenario finished")?;
            }
        }
        Ok(())
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use crate::config::Config;
use crate::models::TabId;

/// Ordered stages of a full injection into a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionStage {
    Styles,
    Bootstrap,
    Orchestration,
}

/// Styles first, then the overlay bootstrap, then the orchestration logic.
pub const INJECTION_ORDER: [InjectionStage; 3] = [
    InjectionStage::Styles,
    InjectionStage::Bootstrap,
    InjectionStage::Orchestration,
];

/// Host tab management boundary
#[async_trait]
pub trait TabManager: Send + Sync {
    /// Currently focused tab, if any, with its location
    async fn active_tab(&self) -> Option<(TabId, String)>;

    /// Focus an existing tab at `url` or create a new one
    async fn focus_or_create(&self, url: &str) -> Result<TabId>;

    /// Run one injection stage in the given tab
    async fn inject(&self, tab: TabId, stage: InjectionStage) -> Result<()>;
}

/// Handles user-initiated activation.
///
/// Either the user is already looking at the target view (inject straight into
/// the active tab) or a tab gets focused/created at the target URL first.
pub struct Activator<T: TabManager> {
    tabs: T,
    target_url: String,
    target_view: Regex,
}

impl<T: TabManager> Activator<T> {
    pub fn new(tabs: T, config: &Config) -> Result<Self> {
        Ok(Self {
            tabs,
            target_url: config.target_url.clone(),
            target_view: config.target_view_regex()?,
        })
    }

    /// Returns the tab that received the injection.
    pub async fn activate(&self) -> Result<TabId> {
        if let Some((tab, url)) = self.tabs.active_tab().await {
            if self.target_view.is_match(&url) {
                info!(tab, "already on target view, injecting directly");
                self.inject_all(tab).await?;
                return Ok(tab);
            }
        }

        let tab = self
            .tabs
            .focus_or_create(&self.target_url)
            .await
            .context("Failed to open target view tab")?;
        info!(tab, url = %self.target_url, "opened target view");
        self.inject_all(tab).await?;
        Ok(tab)
    }

    async fn inject_all(&self, tab: TabId) -> Result<()> {
        for stage in INJECTION_ORDER {
            self.tabs
                .inject(tab, stage)
                .await
                .with_context(|| format!("Injection stage {:?} failed", stage))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimTabs;

    fn config() -> Config {
        Config {
            target_view: r"example\.org/app/follows".to_string(),
            target_url: "https://example.org/app/follows".to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn activate_on_target_view_injects_into_active_tab() {
        let tabs = SimTabs::new();
        let tab = tabs.open_tab("https://example.org/app/follows");
        let activator = Activator::new(tabs.clone(), &config()).unwrap();

        let injected = activator.activate().await.unwrap();

        assert_eq!(
            injected, tab,
            "activation on the target view must reuse the active tab"
        );
        assert_eq!(
            tabs.injections(),
            vec![
                (tab, InjectionStage::Styles),
                (tab, InjectionStage::Bootstrap),
                (tab, InjectionStage::Orchestration),
            ],
            "stages must run in order: styles, bootstrap, orchestration"
        );
    }

    #[tokio::test]
    async fn activate_elsewhere_opens_the_target_tab_first() {
        let tabs = SimTabs::new();
        let elsewhere = tabs.open_tab("https://example.org/somestreamer");
        let activator = Activator::new(tabs.clone(), &config()).unwrap();

        let injected = activator.activate().await.unwrap();

        assert_ne!(injected, elsewhere, "a fresh tab should have been created");
        let urls = tabs.tab_urls();
        assert_eq!(
            urls.get(&injected).map(String::as_str),
            Some("https://example.org/app/follows")
        );
        assert_eq!(tabs.injections().len(), 3);
    }

    #[tokio::test]
    async fn activate_with_no_tabs_creates_one() {
        let tabs = SimTabs::new();
        let activator = Activator::new(tabs.clone(), &config()).unwrap();

        let injected = activator.activate().await.unwrap();

        assert!(tabs.tab_urls().contains_key(&injected));
    }
}

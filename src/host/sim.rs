use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::models::TabId;

use super::page::{DocumentReady, HostPage, Notice, PageEvent};
use super::tabs::{InjectionStage, TabManager};

const EVENT_BUFFER_CAPACITY: usize = 64;

/// What the sim page does when the orchestrator requests the overlay
/// bootstrap: create `creates` after `delay`, mimicking the external overlay
/// script doing its asynchronous work.
#[derive(Debug, Clone)]
pub struct BootstrapBehavior {
    pub creates: String,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct SimPageConfig {
    pub location: String,
    pub ready: DocumentReady,
    pub elements: Vec<String>,
    pub bootstrap: Option<BootstrapBehavior>,
}

impl Default for SimPageConfig {
    fn default() -> Self {
        Self {
            location: "about:blank".to_string(),
            ready: DocumentReady::Complete,
            elements: Vec::new(),
            bootstrap: None,
        }
    }
}

struct PageState {
    location: String,
    ready: DocumentReady,
    elements: HashSet<String>,
    notice_seq: u64,
    notice_log: Vec<Notice>,
    active_notices: Vec<(u64, Notice)>,
    bootstrap_requested_at: Vec<Instant>,
}

/// In-memory host page with scripted behavior.
///
/// State lives behind a mutex that is never held across an await, matching
/// the read-check-act discipline the orchestrator assumes. Structural changes
/// emit `MutationBatch` events on a broadcast channel, after the change has
/// been applied, never during it.
#[derive(Clone)]
pub struct ScriptedPage {
    state: Arc<Mutex<PageState>>,
    events: broadcast::Sender<PageEvent>,
    bootstrap: Option<BootstrapBehavior>,
}

impl ScriptedPage {
    pub fn new(config: SimPageConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(PageState {
                location: config.location,
                ready: config.ready,
                elements: config.elements.into_iter().collect(),
                notice_seq: 0,
                notice_log: Vec::new(),
                active_notices: Vec::new(),
                bootstrap_requested_at: Vec::new(),
            })),
            events,
            bootstrap: config.bootstrap,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state.lock().expect("page state lock poisoned")
    }

    fn emit(&self, event: PageEvent) {
        // Nobody subscribed yet is fine; the event is simply unobserved.
        let _ = self.events.send(event);
    }

    /// In-app navigation: the location changes, the document is not reloaded,
    /// and the resulting DOM churn surfaces as a mutation batch.
    pub fn navigate(&self, url: impl Into<String>) {
        self.lock().location = url.into();
        self.emit(PageEvent::MutationBatch);
    }

    /// Back/forward traversal; `url` is the location restored by the history
    /// entry (possibly unchanged).
    pub fn history_navigate(&self, url: Option<&str>) {
        if let Some(url) = url {
            self.lock().location = url.to_string();
        }
        self.emit(PageEvent::HistoryNavigation);
    }

    pub fn insert_element(&self, selector: impl Into<String>) {
        self.lock().elements.insert(selector.into());
        self.emit(PageEvent::MutationBatch);
    }

    pub fn remove_element(&self, selector: &str) {
        self.lock().elements.remove(selector);
        self.emit(PageEvent::MutationBatch);
    }

    pub fn set_ready(&self, ready: DocumentReady) {
        self.lock().ready = ready;
    }

    /// Every notice ever shown, in order
    pub fn notice_log(&self) -> Vec<Notice> {
        self.lock().notice_log.clone()
    }

    /// Notices currently visible (not yet expired)
    pub fn active_notices(&self) -> Vec<Notice> {
        self.lock()
            .active_notices
            .iter()
            .map(|(_, n)| n.clone())
            .collect()
    }

    /// Instants at which the overlay bootstrap was requested
    pub fn bootstrap_requests(&self) -> Vec<Instant> {
        self.lock().bootstrap_requested_at.clone()
    }
}

#[async_trait]
impl HostPage for ScriptedPage {
    async fn location(&self) -> String {
        self.lock().location.clone()
    }

    async fn ready_state(&self) -> DocumentReady {
        self.lock().ready
    }

    async fn element_exists(&self, selector: &str) -> bool {
        self.lock().elements.contains(selector)
    }

    async fn request_bootstrap(&self) -> Result<()> {
        self.lock().bootstrap_requested_at.push(Instant::now());
        debug!("overlay bootstrap requested");

        if let Some(behavior) = &self.bootstrap {
            let page = self.clone();
            let creates = behavior.creates.clone();
            let delay = behavior.delay;
            tokio::spawn(async move {
                sleep(delay).await;
                page.insert_element(creates);
            });
        }
        Ok(())
    }

    async fn show_notice(&self, notice: Notice) -> Result<()> {
        let id = {
            let mut state = self.lock();
            state.notice_seq += 1;
            let id = state.notice_seq;
            state.notice_log.push(notice.clone());
            state.active_notices.push((id, notice.clone()));
            id
        };

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            sleep(notice.ttl).await;
            let mut state = state.lock().expect("page state lock poisoned");
            state.active_notices.retain(|(nid, _)| *nid != id);
        });
        Ok(())
    }

    fn events(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }
}

#[derive(Default)]
struct TabsState {
    next_id: TabId,
    tabs: HashMap<TabId, String>,
    active: Option<TabId>,
    injections: Vec<(TabId, InjectionStage)>,
}

/// In-memory tab manager for the activation boundary
#[derive(Clone, Default)]
pub struct SimTabs {
    state: Arc<Mutex<TabsState>>,
}

impl SimTabs {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TabsState> {
        self.state.lock().expect("tabs state lock poisoned")
    }

    /// Open a tab and make it active; returns its id
    pub fn open_tab(&self, url: impl Into<String>) -> TabId {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.tabs.insert(id, url.into());
        state.active = Some(id);
        id
    }

    pub fn tab_urls(&self) -> HashMap<TabId, String> {
        self.lock().tabs.clone()
    }

    pub fn injections(&self) -> Vec<(TabId, InjectionStage)> {
        self.lock().injections.clone()
    }
}

#[async_trait]
impl TabManager for SimTabs {
    async fn active_tab(&self) -> Option<(TabId, String)> {
        let state = self.lock();
        state
            .active
            .and_then(|id| state.tabs.get(&id).map(|url| (id, url.clone())))
    }

    async fn focus_or_create(&self, url: &str) -> Result<TabId> {
        {
            let mut state = self.lock();
            if let Some((&id, _)) = state.tabs.iter().find(|(_, u)| u.as_str() == url) {
                state.active = Some(id);
                return Ok(id);
            }
        }
        Ok(self.open_tab(url))
    }

    async fn inject(&self, tab: TabId, stage: InjectionStage) -> Result<()> {
        self.lock().injections.push((tab, stage));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn navigation_changes_location_and_emits_mutation() {
        let page = ScriptedPage::new(SimPageConfig::default());
        let mut events = page.events();

        page.navigate("https://example.org/next");

        assert_eq!(page.location().await, "https://example.org/next");
        assert_eq!(events.recv().await.unwrap(), PageEvent::MutationBatch);
    }

    #[tokio::test]
    async fn history_navigation_emits_dedicated_event() {
        let page = ScriptedPage::new(SimPageConfig::default());
        let mut events = page.events();

        page.history_navigate(Some("https://example.org/back"));

        assert_eq!(events.recv().await.unwrap(), PageEvent::HistoryNavigation);
        assert_eq!(page.location().await, "https://example.org/back");
    }

    #[tokio::test]
    async fn elements_are_queryable_after_insertion() {
        let page = ScriptedPage::new(SimPageConfig::default());

        assert!(!page.element_exists("#root").await);
        page.insert_element("#root");
        assert!(page.element_exists("#root").await);
        page.remove_element("#root");
        assert!(!page.element_exists("#root").await);
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_behavior_creates_overlay_after_delay() {
        let page = ScriptedPage::new(SimPageConfig {
            bootstrap: Some(BootstrapBehavior {
                creates: "#overlay".to_string(),
                delay: Duration::from_millis(500),
            }),
            ..SimPageConfig::default()
        });

        page.request_bootstrap().await.unwrap();
        assert!(
            !page.element_exists("#overlay").await,
            "overlay must not appear synchronously"
        );

        sleep(Duration::from_millis(600)).await;
        assert!(page.element_exists("#overlay").await);
        assert_eq!(page.bootstrap_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn notices_expire_after_their_ttl() {
        let page = ScriptedPage::new(SimPageConfig::default());
        let notice = Notice {
            title: "Error".to_string(),
            body: "injection failed".to_string(),
            ttl: Duration::from_secs(10),
        };

        page.show_notice(notice.clone()).await.unwrap();
        assert_eq!(page.active_notices(), vec![notice.clone()]);

        sleep(Duration::from_secs(11)).await;
        assert!(
            page.active_notices().is_empty(),
            "notice should auto-expire after its ttl"
        );
        assert_eq!(
            page.notice_log(),
            vec![notice],
            "the log keeps expired notices"
        );
    }

    #[tokio::test]
    async fn focus_or_create_reuses_matching_tab() {
        let tabs = SimTabs::new();
        let existing = tabs.open_tab("https://example.org/app");
        tabs.open_tab("https://example.org/other");

        let focused = tabs.focus_or_create("https://example.org/app").await.unwrap();

        assert_eq!(focused, existing);
        assert_eq!(tabs.tab_urls().len(), 2, "no new tab should be created");
    }
}

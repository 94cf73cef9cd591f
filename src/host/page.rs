use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Loading state of the hosting document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentReady {
    Loading,
    Interactive,
    Complete,
}

/// Coalesced observation of the host document.
///
/// A `MutationBatch` fires some time after structural changes settle, never
/// synchronously during the mutation itself. `HistoryNavigation` covers
/// back/forward traversal, which may leave the DOM untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    MutationBatch,
    HistoryNavigation,
}

/// Transient on-page notice, dismissible and removed after `ttl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub ttl: Duration,
}

/// The narrow boundary to the host document.
///
/// The orchestrator only ever reads the location, the ready state and a small
/// fixed set of selectors, and writes one overlay bootstrap request plus (on
/// terminal failure) one transient notice. Everything else about the host's
/// rendering pipeline is unknown timing that has to be polled.
#[async_trait]
pub trait HostPage: Send + Sync {
    async fn location(&self) -> String;

    async fn ready_state(&self) -> DocumentReady;

    async fn element_exists(&self, selector: &str) -> bool;

    /// Ask the host to run the overlay bootstrap. The overlay's own logic is
    /// external; the orchestrator only waits for its element to appear.
    async fn request_bootstrap(&self) -> Result<()>;

    /// Show a transient notice; the page removes it after `notice.ttl` or on
    /// user dismissal.
    async fn show_notice(&self, notice: Notice) -> Result<()>;

    /// Subscribe to the document's coalesced change stream.
    fn events(&self) -> broadcast::Receiver<PageEvent>;
}

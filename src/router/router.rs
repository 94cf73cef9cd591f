use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::host::{NotificationKind, Notifier};
use crate::models::{StatusEnvelope, StatusMessage, TabId};
use crate::store::StateStore;
use crate::utils::truncate_str;

use super::indicator::ActivityIndicator;

/// Status texts that flag an in-progress phase
const BUSY_PHASES: [&str; 2] = ["Analyzing", "Unfollowing"];
const BUSY_TEXT: &str = "...";
const NOTIFICATION_BODY_MAX_CHARS: usize = 200;

/// Message-dispatch state machine for overlay progress.
///
/// Runs as its own task; the overlay side only ever enqueues envelopes on the
/// channel and is never blocked on anything the router does with them.
/// Persistence and notification failures are logged here and go no further;
/// a broken disk or notification facility must not stall the status pipeline.
pub struct StatusRouter<N: Notifier> {
    store: StateStore,
    indicator: ActivityIndicator,
    notifier: N,
}

impl<N: Notifier> StatusRouter<N> {
    pub fn new(store: StateStore, indicator: ActivityIndicator, notifier: N) -> Self {
        Self {
            store,
            indicator,
            notifier,
        }
    }

    /// Consume envelopes until every sender is gone.
    pub async fn run(mut self, mut statuses: mpsc::Receiver<StatusEnvelope>) {
        while let Some(envelope) = statuses.recv().await {
            self.dispatch(envelope).await;
        }
        debug!("status channel closed, router stopping");
    }

    pub async fn dispatch(&mut self, envelope: StatusEnvelope) {
        let tab = envelope.tab;
        match envelope.message {
            StatusMessage::StatusUpdate { status } => self.on_status_update(tab, &status),
            StatusMessage::AnalysisComplete { total_channels } => {
                self.on_analysis_complete(tab, total_channels).await;
            }
            StatusMessage::UnfollowComplete { count } => {
                self.on_unfollow_complete(tab, count).await;
            }
            StatusMessage::ErrorOccurred { error } => self.on_error(tab, &error).await,
        }
    }

    fn on_status_update(&self, tab: TabId, status: &str) {
        debug!(tab, status, "status update");
        if BUSY_PHASES.iter().any(|phase| status.contains(phase)) {
            self.indicator.set(tab, BUSY_TEXT);
        } else {
            self.indicator.clear(tab);
        }
    }

    async fn on_analysis_complete(&self, tab: TabId, total_channels: u64) {
        info!(tab, total_channels, "analysis complete");
        if let Err(err) = self.store.record_analysis(total_channels).await {
            warn!("failed to persist analysis result: {err:#}");
        }
        // The count doubles as the completion signal on the indicator.
        self.indicator.set(tab, total_channels.to_string());
    }

    async fn on_unfollow_complete(&self, tab: TabId, count: u64) {
        info!(tab, count, "unfollow complete");
        if let Err(err) = self.store.record_unfollow(count).await {
            warn!("failed to persist unfollow result: {err:#}");
        }
        self.indicator.clear(tab);

        let body = format!("Successfully unfollowed {count} channels");
        if let Err(err) = self
            .notifier
            .notify("Unfollow Complete", &body, NotificationKind::Info)
            .await
        {
            warn!("failed to raise success notification: {err:#}");
        }
    }

    /// Errors clear the indicator and notify; they never touch counters or
    /// history.
    async fn on_error(&self, tab: TabId, message: &str) {
        error!(tab, error = message, "overlay reported an error");
        self.indicator.clear(tab);

        let body = truncate_str(message, NOTIFICATION_BODY_MAX_CHARS);
        if let Err(err) = self
            .notifier
            .notify("Error Occurred", &body, NotificationKind::Error)
            .await
        {
            warn!("failed to raise error notification: {err:#}");
        }
    }
}

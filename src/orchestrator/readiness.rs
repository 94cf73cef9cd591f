use regex::Regex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::{SelectorConfig, TimeoutConfig};
use crate::host::{DocumentReady, HostPage};

use super::waiter::{wait_for, ConditionTimeout};

/// Verdict on whether the target view can take an injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The current location is some other view. A valid state, not an error:
    /// the orchestrator simply has nothing to do here.
    NotOnTargetView,
    /// Safe to inject. `degraded` marks a view whose child content never
    /// settled within its wait budget.
    Ready { degraded: bool },
}

/// Decides that the target view is safe to inject into.
///
/// The rendering pipeline behind the view is asynchronous and uncontrolled,
/// so every judgment is made through polling with bounded waits. Only a
/// missing root container is fatal; incomplete child content is tolerated and
/// reported as readiness anyway: partial content is a degraded state the
/// overlay can work with, not an abort condition.
pub struct ReadinessDetector {
    target_view: Regex,
    selectors: SelectorConfig,
    timeouts: TimeoutConfig,
}

impl ReadinessDetector {
    pub fn new(target_view: Regex, selectors: SelectorConfig, timeouts: TimeoutConfig) -> Self {
        Self {
            target_view,
            selectors,
            timeouts,
        }
    }

    pub async fn assess(&self, page: &dyn HostPage) -> Result<Readiness, ConditionTimeout> {
        self.wait_document_complete(page).await;

        let location = page.location().await;
        if !self.target_view.is_match(&location) {
            debug!(%location, "not on target view, skipping");
            return Ok(Readiness::NotOnTargetView);
        }

        let root = self.selectors.root_container.as_str();
        wait_for(root, self.timeouts.root_wait(), self.timeouts.poll_interval(), move || async move {
            page.element_exists(root).await.then_some(())
        })
        .await?;
        debug!(selector = root, "root container present");

        sleep(self.timeouts.content_settle()).await;

        let child = self.selectors.child_content.as_str();
        let degraded = if page.element_exists(child).await {
            false
        } else {
            debug!(selector = child, "child content absent after settle, re-waiting");
            match wait_for(child, self.timeouts.content_wait(), self.timeouts.poll_interval(), move || async move {
                page.element_exists(child).await.then_some(())
            })
            .await
            {
                Ok(()) => false,
                Err(err) => {
                    // Tolerated: report readiness with whatever rendered.
                    warn!("view content incomplete, proceeding anyway: {err}");
                    true
                }
            }
        };

        Ok(Readiness::Ready { degraded })
    }

    /// Step 1 has no deadline: the document load is waited out for as long as
    /// it takes, polling only if it is not already complete.
    async fn wait_document_complete(&self, page: &dyn HostPage) {
        while page.ready_state().await != DocumentReady::Complete {
            sleep(self.timeouts.poll_interval()).await;
        }
    }
}

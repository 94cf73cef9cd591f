use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::host::{HostPage, PageEvent};
use crate::models::{GenerationCounter, GenerationId};

use super::injector::InjectionController;

/// Detects single-page-app navigation: the document is never reloaded but its
/// visible location changes under us.
///
/// Mutation batches are compared against the last-seen location; a difference
/// advances the navigation generation. Back/forward traversal is a second
/// trigger path through the same settle-and-check logic. At most one
/// orchestration cycle is started per generation transition; duplicate
/// triggers for the same generation are idempotent no-ops.
pub struct NavigationWatcher {
    page: Arc<dyn HostPage>,
    controller: Arc<InjectionController>,
    generations: GenerationCounter,
    target_view: Regex,
    overlay_selector: String,
    settle: Duration,
}

impl NavigationWatcher {
    pub fn new(
        page: Arc<dyn HostPage>,
        controller: Arc<InjectionController>,
        generations: GenerationCounter,
        target_view: Regex,
        overlay_selector: String,
        settle: Duration,
    ) -> Self {
        Self {
            page,
            controller,
            generations,
            target_view,
            overlay_selector,
            settle,
        }
    }

    /// Run until the page's event stream closes.
    pub async fn run(&self) {
        let mut events = self.page.events();
        let mut last_location = self.page.location().await;
        let mut last_started: Option<GenerationId> = None;

        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    // Coalescing is fine: the next recv sees current state.
                    warn!(skipped, "page event stream lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let location = self.page.location().await;
            let changed = location != last_location;

            // Mutation churn without a location change is the page re-rendering
            // in place; only history traversal re-checks in that case.
            if !changed && event == PageEvent::MutationBatch {
                continue;
            }

            let generation = if changed {
                last_location = location.clone();
                self.generations.advance()
            } else {
                self.generations.current()
            };

            if last_started == Some(generation) {
                debug!(generation, "cycle already started for this generation");
                continue;
            }

            debug!(generation, %location, ?event, "navigation trigger");
            if self.settle_and_start(generation).await {
                last_started = Some(generation);
            }
        }
        debug!("page event stream closed, watcher stopping");
    }

    /// Settle, then start a cycle if this generation is still current, the
    /// location is the target view, and no overlay is live. Returns whether a
    /// cycle was started.
    async fn settle_and_start(&self, generation: GenerationId) -> bool {
        sleep(self.settle).await;

        if !self.generations.is_current(generation) {
            debug!(generation, "superseded during settle");
            return false;
        }
        let location = self.page.location().await;
        if !self.target_view.is_match(&location) {
            debug!(generation, %location, "settled on a non-target view");
            return false;
        }
        if self.page.element_exists(&self.overlay_selector).await {
            debug!(generation, "overlay already live, no cycle needed");
            return false;
        }

        info!(generation, "starting injection cycle");
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            let outcome = controller.run_cycle(generation).await;
            debug!(generation, ?outcome, "injection cycle finished");
        });
        true
    }
}

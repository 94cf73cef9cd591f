use std::sync::Arc;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{RetryConfig, SelectorConfig, TimeoutConfig};
use crate::host::{HostPage, Notice};
use crate::models::{GenerationCounter, GenerationId, InjectionAttempt};
use crate::utils::truncate_str;

use super::readiness::{Readiness, ReadinessDetector};
use super::waiter::{wait_for, ConditionTimeout};

const NOTICE_TITLE: &str = "Follow Manager Error";
const NOTICE_BODY_MAX_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum InjectError {
    #[error(transparent)]
    Timeout(#[from] ConditionTimeout),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("host boundary error: {0}")]
    Host(#[from] anyhow::Error),
}

/// How one full injection cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The overlay appeared after a fresh bootstrap
    Injected { attempts: u32 },
    /// A live overlay already existed; nothing to do
    AlreadyPresent,
    /// Not on the target view; nothing to do
    NotOnTargetView,
    /// The navigation generation advanced mid-cycle; work abandoned
    Superseded,
    /// Every attempt failed; a terminal notice was shown
    RetriesExhausted,
}

enum AttemptResult {
    NotOnTargetView,
    AlreadyPresent,
    Injected,
    Superseded,
}

/// Owns the end-to-end injection attempt lifecycle for one navigation
/// generation: readiness, duplicate guard, bootstrap, overlay wait, and the
/// linear-backoff retry schedule on top.
///
/// There is no way to interrupt a running attempt; cancellation is
/// cooperative. The captured generation id is re-checked at every suspension
/// point and the cycle abandons itself silently once superseded.
pub struct InjectionController {
    page: Arc<dyn HostPage>,
    detector: ReadinessDetector,
    generations: GenerationCounter,
    selectors: SelectorConfig,
    timeouts: TimeoutConfig,
    retry: RetryConfig,
}

impl InjectionController {
    pub fn new(
        page: Arc<dyn HostPage>,
        detector: ReadinessDetector,
        generations: GenerationCounter,
        selectors: SelectorConfig,
        timeouts: TimeoutConfig,
        retry: RetryConfig,
    ) -> Self {
        Self {
            page,
            detector,
            generations,
            selectors,
            timeouts,
            retry,
        }
    }

    /// Run attempts for `generation` until one succeeds, the retry budget is
    /// exhausted, or the generation goes stale.
    pub async fn run_cycle(&self, generation: GenerationId) -> CycleOutcome {
        let mut retry_count: u32 = 0;

        loop {
            if !self.generations.is_current(generation) {
                debug!(generation, "generation superseded, abandoning cycle");
                return CycleOutcome::Superseded;
            }

            let mut attempt = InjectionAttempt::new(retry_count + 1);
            info!(
                generation,
                attempt = attempt.attempt_number,
                "starting injection attempt"
            );

            let error = match self.attempt(generation).await {
                Ok(AttemptResult::NotOnTargetView) => return CycleOutcome::NotOnTargetView,
                Ok(AttemptResult::Superseded) => return CycleOutcome::Superseded,
                Ok(AttemptResult::AlreadyPresent) => {
                    attempt.mark_succeeded();
                    debug!(generation, "overlay already live, nothing to inject");
                    return CycleOutcome::AlreadyPresent;
                }
                Ok(AttemptResult::Injected) => {
                    attempt.mark_succeeded();
                    info!(
                        generation,
                        attempts = attempt.attempt_number,
                        "overlay injected"
                    );
                    return CycleOutcome::Injected {
                        attempts: attempt.attempt_number,
                    };
                }
                Err(error) => error,
            };

            attempt.mark_failed(error.to_string());
            retry_count += 1;
            warn!(
                generation,
                attempt = attempt.attempt_number,
                "injection attempt failed: {error}"
            );

            if retry_count >= self.retry.max_attempts {
                if !self.generations.is_current(generation) {
                    return CycleOutcome::Superseded;
                }
                self.report_terminal_failure(&error).await;
                return CycleOutcome::RetriesExhausted;
            }

            // Linear backoff: 2s, 4s, 6s, 8s with the default step.
            sleep(self.retry.backoff_step() * retry_count).await;
        }
    }

    async fn attempt(&self, generation: GenerationId) -> Result<AttemptResult, InjectError> {
        match self.detector.assess(self.page.as_ref()).await? {
            Readiness::NotOnTargetView => return Ok(AttemptResult::NotOnTargetView),
            Readiness::Ready { degraded } => {
                if degraded {
                    debug!(generation, "proceeding with partially rendered view");
                }
            }
        }

        if !self.generations.is_current(generation) {
            return Ok(AttemptResult::Superseded);
        }

        let page = self.page.as_ref();
        let overlay = self.selectors.overlay.as_str();
        if page.element_exists(overlay).await {
            return Ok(AttemptResult::AlreadyPresent);
        }

        let root = self.selectors.root_container.as_str();
        if !page.element_exists(root).await {
            return Err(InjectError::ElementNotFound(root.to_string()));
        }

        self.page.request_bootstrap().await?;

        wait_for(
            overlay,
            self.timeouts.overlay_wait(),
            self.timeouts.poll_interval(),
            move || async move { page.element_exists(overlay).await.then_some(()) },
        )
        .await?;

        Ok(AttemptResult::Injected)
    }

    /// One dismissible, auto-expiring notice per exhausted cycle. A failure
    /// to show it is logged and swallowed; there is nothing left to retry.
    async fn report_terminal_failure(&self, error: &InjectError) {
        let body = truncate_str(
            &format!(
                "Injection failed after {} attempts: {error}",
                self.retry.max_attempts
            ),
            NOTICE_BODY_MAX_CHARS,
        );
        let notice = Notice {
            title: NOTICE_TITLE.to_string(),
            body,
            ttl: self.timeouts.notice_ttl(),
        };
        if let Err(err) = self.page.show_notice(notice).await {
            warn!("failed to show terminal failure notice: {err:#}");
        }
    }
}

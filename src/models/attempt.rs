use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

/// One end-to-end injection attempt.
///
/// Owned exclusively by the retry controller: a new record is created at cycle
/// start and at each retry, superseding the previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionAttempt {
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InjectionAttempt {
    pub fn new(attempt_number: u32) -> Self {
        debug_assert!(attempt_number >= 1, "attempt numbering starts at 1");
        Self {
            attempt_number,
            started_at: Utc::now(),
            outcome: AttemptOutcome::Pending,
            error: None,
        }
    }

    pub fn mark_succeeded(&mut self) {
        self.outcome = AttemptOutcome::Succeeded;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.outcome = AttemptOutcome::Failed;
        self.error = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_attempt_is_pending() {
        let attempt = InjectionAttempt::new(1);

        assert_eq!(attempt.attempt_number, 1);
        assert_eq!(attempt.outcome, AttemptOutcome::Pending);
        assert!(attempt.error.is_none());
    }

    #[test]
    fn mark_failed_records_error() {
        let mut attempt = InjectionAttempt::new(2);
        attempt.mark_failed("overlay never appeared");

        assert_eq!(attempt.outcome, AttemptOutcome::Failed);
        assert_eq!(attempt.error.as_deref(), Some("overlay never appeared"));
    }

    #[test]
    fn mark_succeeded_clears_nothing_else() {
        let mut attempt = InjectionAttempt::new(3);
        attempt.mark_succeeded();

        assert_eq!(attempt.outcome, AttemptOutcome::Succeeded);
        assert_eq!(attempt.attempt_number, 3);
    }
}

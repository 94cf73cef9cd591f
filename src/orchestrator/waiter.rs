use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};

/// A polled condition never became true within its deadline.
///
/// Recoverable by design: this is what feeds the retry/backoff path.
#[derive(Debug, Error)]
#[error("condition '{condition}' not met after {elapsed_ms}ms")]
pub struct ConditionTimeout {
    pub condition: String,
    pub elapsed_ms: u128,
}

/// Poll `probe` at `poll_interval` until it yields a witness or `timeout`
/// elapses. The deadline is checked against the clock after each probe, so
/// the probe runs at least once even with a zero timeout.
///
/// Pure wait logic: the only side effects are whatever reads the probe does.
pub async fn wait_for<T, F, Fut>(
    condition: &str,
    timeout: Duration,
    poll_interval: Duration,
    mut probe: F,
) -> Result<T, ConditionTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let started = Instant::now();
    loop {
        if let Some(witness) = probe().await {
            return Ok(witness);
        }
        if started.elapsed() >= timeout {
            return Err(ConditionTimeout {
                condition: condition.to_string(),
                elapsed_ms: started.elapsed().as_millis(),
            });
        }
        sleep(poll_interval).await;
    }
}

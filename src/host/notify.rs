use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

/// Host notification facility.
///
/// Callers must treat failures as log-and-continue; a broken notification
/// channel never stops the status pipeline.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str, kind: NotificationKind) -> Result<()>;
}

/// Notifier that surfaces notifications through the log stream
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, message: &str, kind: NotificationKind) -> Result<()> {
        match kind {
            NotificationKind::Info => info!(title, body = message, "notification"),
            NotificationKind::Error => warn!(title, body = message, "notification"),
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

/// Identifier of the host tab an overlay instance lives in
pub type TabId = u32;

/// Progress message emitted by the injected overlay.
///
/// This is the only thing that ever crosses the channel between the
/// orchestrator side and the router side. Errors travel as plain strings in
/// `ErrorOccurred`; no error type crosses the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusMessage {
    /// Free-form phase text ("Analyzing follows...", "Done")
    StatusUpdate { status: String },
    /// A follow analysis pass finished
    AnalysisComplete { total_channels: u64 },
    /// A batch unfollow finished
    UnfollowComplete { count: u64 },
    /// Something went wrong inside the overlay
    ErrorOccurred { error: String },
}

#[allow(dead_code)]
impl StatusMessage {
    pub fn status_update(status: impl Into<String>) -> Self {
        Self::StatusUpdate { status: status.into() }
    }

    pub fn analysis_complete(total_channels: u64) -> Self {
        Self::AnalysisComplete { total_channels }
    }

    pub fn unfollow_complete(count: u64) -> Self {
        Self::UnfollowComplete { count }
    }

    pub fn error_occurred(error: impl Into<String>) -> Self {
        Self::ErrorOccurred { error: error.into() }
    }
}

/// A status message plus the tab it originated from.
///
/// The router keys its ephemeral activity indicator on the tab, so the
/// envelope carries it alongside the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEnvelope {
    pub tab: TabId,
    #[serde(flatten)]
    pub message: StatusMessage,
}

impl StatusEnvelope {
    pub fn new(tab: TabId, message: StatusMessage) -> Self {
        Self { tab, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_serializes_to_yaml() {
        let message = StatusMessage::analysis_complete(42);

        let yaml = serde_yaml::to_string(&message).unwrap();
        assert!(yaml.contains("type: analysis_complete"));
        assert!(yaml.contains("total_channels: 42"));
    }

    #[test]
    fn status_message_deserializes_from_yaml() {
        let yaml = r#"
type: unfollow_complete
count: 7
"#;

        let message: StatusMessage = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(message, StatusMessage::unfollow_complete(7));
    }

    #[test]
    fn status_update_round_trips() {
        let message = StatusMessage::status_update("Analyzing follows...");

        let yaml = serde_yaml::to_string(&message).unwrap();
        let back: StatusMessage = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn error_occurred_carries_plain_string() {
        let message = StatusMessage::error_occurred("root container vanished");

        match message {
            StatusMessage::ErrorOccurred { error } => {
                assert_eq!(error, "root container vanished");
            }
            other => panic!("expected ErrorOccurred, got {:?}", other),
        }
    }

    #[test]
    fn envelope_flattens_message_fields() {
        let envelope = StatusEnvelope::new(3, StatusMessage::analysis_complete(12));

        let yaml = serde_yaml::to_string(&envelope).unwrap();
        assert!(yaml.contains("tab: 3"));
        assert!(yaml.contains("type: analysis_complete"));

        let back: StatusEnvelope = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, envelope);
    }
}

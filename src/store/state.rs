use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// Most recent analyses kept; older entries are evicted first
pub const ANALYSIS_HISTORY_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisHistoryEntry {
    pub date: DateTime<Utc>,
    pub total_channels: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: String,
    pub install_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    /// Lifetime unfollow total; only ever grows
    #[serde(default)]
    pub total_unfollowed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_unfollow: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analysis: Option<DateTime<Utc>>,
    #[serde(default)]
    pub analysis_history: Vec<AnalysisHistoryEntry>,
}

impl PersistedState {
    fn seeded(version: &str) -> Self {
        Self {
            version: version.to_string(),
            install_date: Utc::now(),
            last_update: None,
            total_unfollowed: 0,
            last_unfollow: None,
            last_analysis: None,
            analysis_history: Vec::new(),
        }
    }

    /// Append an analysis result, evicting the oldest entries beyond the cap.
    pub fn push_analysis(&mut self, total_channels: u64) {
        let now = Utc::now();
        self.last_analysis = Some(now);
        self.analysis_history.push(AnalysisHistoryEntry {
            date: now,
            total_channels,
        });
        if self.analysis_history.len() > ANALYSIS_HISTORY_CAP {
            let overflow = self.analysis_history.len() - ANALYSIS_HISTORY_CAP;
            self.analysis_history.drain(..overflow);
        }
    }

    pub fn add_unfollowed(&mut self, count: u64) {
        self.total_unfollowed += count;
        self.last_unfollow = Some(Utc::now());
    }
}

/// Persisted state backed by a single YAML file.
///
/// Cheap to clone (it only owns the path); every operation is a full
/// load-modify-save, which is fine at this size and keeps the file the single
/// source of truth between processes.
#[derive(Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Seed the state file on first run; on later runs refresh only the
    /// version and update stamp, preserving everything else.
    pub async fn initialize(&self, version: &str) -> Result<PersistedState> {
        match self.load_optional().await? {
            None => {
                let state = PersistedState::seeded(version);
                self.save(&state).await?;
                info!(path = ?self.path, "seeded persisted state");
                Ok(state)
            }
            Some(mut state) => {
                if state.version != version {
                    state.version = version.to_string();
                    state.last_update = Some(Utc::now());
                    self.save(&state).await?;
                    info!(version, "refreshed persisted state after update");
                }
                Ok(state)
            }
        }
    }

    pub async fn load_optional(&self) -> Result<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read state file: {:?}", self.path))?;
        let state: PersistedState = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {:?}", self.path))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_yaml::to_string(state)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write state file: {:?}", self.path))?;
        Ok(())
    }

    pub async fn record_analysis(&self, total_channels: u64) -> Result<()> {
        let mut state = self.load_or_seed().await?;
        state.push_analysis(total_channels);
        self.save(&state).await
    }

    pub async fn record_unfollow(&self, count: u64) -> Result<()> {
        let mut state = self.load_or_seed().await?;
        state.add_unfollowed(count);
        self.save(&state).await
    }

    /// Discard everything and write a freshly seeded state.
    pub async fn reset(&self, version: &str) -> Result<PersistedState> {
        let state = PersistedState::seeded(version);
        self.save(&state).await?;
        Ok(state)
    }

    async fn load_or_seed(&self) -> Result<PersistedState> {
        Ok(self
            .load_optional()
            .await?
            .unwrap_or_else(|| PersistedState::seeded(env!("CARGO_PKG_VERSION"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (StateStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("state.yaml"));
        (store, tmp)
    }

    #[tokio::test]
    async fn first_initialize_seeds_the_file() {
        let (store, _tmp) = setup();

        let state = store.initialize("0.1.0").await.unwrap();

        assert_eq!(state.version, "0.1.0");
        assert_eq!(state.total_unfollowed, 0);
        assert!(state.analysis_history.is_empty());
        assert!(state.last_update.is_none());
        assert!(store.load_optional().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_refreshes_version_and_preserves_counters() {
        let (store, _tmp) = setup();
        store.initialize("0.1.0").await.unwrap();
        store.record_unfollow(12).await.unwrap();
        store.record_analysis(80).await.unwrap();

        let state = store.initialize("0.2.0").await.unwrap();

        assert_eq!(state.version, "0.2.0");
        assert!(state.last_update.is_some(), "update stamp must be set");
        assert_eq!(
            state.total_unfollowed, 12,
            "an update must not touch the counters"
        );
        assert_eq!(state.analysis_history.len(), 1);
    }

    #[tokio::test]
    async fn same_version_initialize_changes_nothing() {
        let (store, _tmp) = setup();
        store.initialize("0.1.0").await.unwrap();

        let state = store.initialize("0.1.0").await.unwrap();

        assert!(state.last_update.is_none());
    }

    #[tokio::test]
    async fn analysis_history_keeps_the_latest_ten() {
        let (store, _tmp) = setup();

        for total in 1..=12u64 {
            store.record_analysis(total).await.unwrap();
        }

        let state = store.load_optional().await.unwrap().unwrap();
        let totals: Vec<u64> = state
            .analysis_history
            .iter()
            .map(|e| e.total_channels)
            .collect();
        assert_eq!(
            totals,
            (3..=12).collect::<Vec<u64>>(),
            "twelve results must leave the last ten in arrival order"
        );
        assert!(state.last_analysis.is_some());
    }

    #[tokio::test]
    async fn unfollow_counts_accumulate() {
        let (store, _tmp) = setup();
        store.initialize("0.1.0").await.unwrap();

        for count in [3u64, 5, 2] {
            store.record_unfollow(count).await.unwrap();
        }

        let state = store.load_optional().await.unwrap().unwrap();
        assert_eq!(state.total_unfollowed, 10);
        assert!(state.last_unfollow.is_some());
    }

    #[tokio::test]
    async fn state_survives_a_reload() {
        let (store, tmp) = setup();
        store.record_analysis(42).await.unwrap();

        let reopened = StateStore::new(tmp.path().join("state.yaml"));
        let state = reopened.load_optional().await.unwrap().unwrap();

        assert_eq!(state.analysis_history[0].total_channels, 42);
    }

    #[tokio::test]
    async fn reset_discards_previous_state() {
        let (store, _tmp) = setup();
        store.record_unfollow(9).await.unwrap();

        let state = store.reset("0.1.0").await.unwrap();

        assert_eq!(state.total_unfollowed, 0);
        assert!(state.analysis_history.is_empty());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // History length never exceeds the cap and always holds the most
        // recent entries in arrival order.
        #[test]
        fn history_is_capped_fifo(totals in proptest::collection::vec(0u64..10_000, 0..40)) {
            let mut state = PersistedState::seeded("0.0.0");
            for &total in &totals {
                state.push_analysis(total);
            }

            prop_assert!(state.analysis_history.len() <= ANALYSIS_HISTORY_CAP);
            let kept: Vec<u64> = state
                .analysis_history
                .iter()
                .map(|e| e.total_channels)
                .collect();
            let expected: Vec<u64> = totals
                .iter()
                .copied()
                .skip(totals.len().saturating_sub(ANALYSIS_HISTORY_CAP))
                .collect();
            prop_assert_eq!(kept, expected);
        }

        // The lifetime counter never decreases, whatever the event mix.
        #[test]
        fn total_unfollowed_is_monotonic(counts in proptest::collection::vec(0u64..1_000, 1..30)) {
            let mut state = PersistedState::seeded("0.0.0");
            let mut previous = state.total_unfollowed;
            for &count in &counts {
                state.add_unfollowed(count);
                prop_assert!(state.total_unfollowed >= previous);
                previous = state.total_unfollowed;
            }
            prop_assert_eq!(state.total_unfollowed, counts.iter().sum::<u64>());
        }
    }
}

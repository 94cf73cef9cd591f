mod state;

#[allow(unused_imports)]
pub use state::{AnalysisHistoryEntry, PersistedState, StateStore, ANALYSIS_HISTORY_CAP};

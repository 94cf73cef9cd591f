use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::TabId;

/// Ephemeral per-tab activity text, the badge equivalent.
///
/// Purely derived state: it is never persisted and a restart simply starts
/// blank. Cloning shares the underlying map so the display side can observe
/// what the router writes.
#[derive(Debug, Clone, Default)]
pub struct ActivityIndicator {
    state: Arc<Mutex<HashMap<TabId, String>>>,
}

impl ActivityIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, tab: TabId, text: impl Into<String>) {
        self.lock().insert(tab, text.into());
    }

    pub fn clear(&self, tab: TabId) {
        self.lock().remove(&tab);
    }

    pub fn text(&self, tab: TabId) -> Option<String> {
        self.lock().get(&tab).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TabId, String>> {
        self.state.lock().expect("indicator state lock poisoned")
    }
}

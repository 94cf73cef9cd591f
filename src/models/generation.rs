use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of one navigation epoch
pub type GenerationId = u64;

/// Monotonically increasing navigation-generation counter.
///
/// Every in-app navigation advances the counter; in-flight work captures the
/// id it was started under and checks `is_current` at each suspension point,
/// abandoning itself silently once superseded. This is the only cancellation
/// mechanism; there is no token that can interrupt a running attempt.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> GenerationId {
        self.current.load(Ordering::SeqCst)
    }

    /// Advance to the next generation, returning the new id.
    pub fn advance(&self) -> GenerationId {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, id: GenerationId) -> bool {
        self.current() == id
    }
}

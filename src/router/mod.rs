mod indicator;
#[allow(clippy::module_inception)]
mod router;

pub use indicator::ActivityIndicator;
pub use router::StatusRouter;

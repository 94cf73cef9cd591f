mod injector;
mod readiness;
mod waiter;
mod watcher;

pub use injector::{CycleOutcome, InjectionController};
#[allow(unused_imports)]
pub use readiness::{Readiness, ReadinessDetector};
#[allow(unused_imports)]
pub use waiter::{wait_for, ConditionTimeout};
pub use watcher::NavigationWatcher;

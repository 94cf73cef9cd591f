mod notify;
mod page;
mod scenario;
mod sim;
mod tabs;

pub use notify::{LogNotifier, NotificationKind, Notifier};
pub use page::{DocumentReady, HostPage, Notice, PageEvent};
#[allow(unused_imports)]
pub use scenario::{Action, Scenario, ScenarioDriver, Step};
pub use sim::{BootstrapBehavior, ScriptedPage, SimPageConfig, SimTabs};
#[allow(unused_imports)]
pub use tabs::{Activator, InjectionStage, TabManager};

mod loader;

#[allow(unused_imports)]
pub use loader::{Config, RetryConfig, SelectorConfig, TimeoutConfig};

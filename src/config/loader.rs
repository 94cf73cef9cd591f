use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Element selectors the orchestrator watches on the host page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Root container of the target view
    pub root_container: String,
    /// Child content expected inside the root once rendering settles
    pub child_content: String,
    /// The overlay element the bootstrap creates
    pub overlay: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            root_container: "#following-page-main-content".to_string(),
            child_content: "[data-a-target=\"user-card-modal\"]".to_string(),
            overlay: "#followManagerContainer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Poll interval for every timed condition wait (ms)
    pub poll_interval_ms: u64,
    /// Wait for the root container to appear (secs)
    pub root_wait_secs: u64,
    /// Pause after the root appears before re-checking child content (secs)
    pub content_settle_secs: u64,
    /// Extra wait for child content when absent after the settle (secs)
    pub content_wait_secs: u64,
    /// Wait for the overlay element after requesting bootstrap (secs)
    pub overlay_wait_secs: u64,
    /// Pause after a navigation before re-checking the view (secs)
    pub nav_settle_secs: u64,
    /// Lifetime of the terminal-failure page notice (secs)
    pub notice_ttl_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            root_wait_secs: 15,
            content_settle_secs: 2,
            content_wait_secs: 10,
            overlay_wait_secs: 10,
            nav_settle_secs: 1,
            notice_ttl_secs: 10,
        }
    }
}

#[allow(dead_code)]
impl TimeoutConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn root_wait(&self) -> Duration {
        Duration::from_secs(self.root_wait_secs)
    }

    pub fn content_settle(&self) -> Duration {
        Duration::from_secs(self.content_settle_secs)
    }

    pub fn content_wait(&self) -> Duration {
        Duration::from_secs(self.content_wait_secs)
    }

    pub fn overlay_wait(&self) -> Duration {
        Duration::from_secs(self.overlay_wait_secs)
    }

    pub fn nav_settle(&self) -> Duration {
        Duration::from_secs(self.nav_settle_secs)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum injection attempts per navigation generation
    pub max_attempts: u32,
    /// Linear backoff step: attempt N waits `backoff_step_ms * (N - 1)` (ms)
    pub backoff_step_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step_ms: 2000,
        }
    }
}

impl RetryConfig {
    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Regex the current location must match for the view to be a target
    pub target_view: String,
    /// URL opened when activation happens away from the target view
    pub target_url: String,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Persisted state file; defaults next to the platform data dir
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_view: r"twitch\.tv/directory/following/channels".to_string(),
            target_url: "https://www.twitch.tv/directory/following/channels".to_string(),
            selectors: SelectorConfig::default(),
            timeouts: TimeoutConfig::default(),
            retry: RetryConfig::default(),
            store_path: None,
        }
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = config_path.unwrap_or_else(Self::default_config_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn default_config_path() -> PathBuf {
        if let Some(config_path) = std::env::var_os("GRAFT_CONFIG") {
            PathBuf::from(config_path)
        } else {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("graft")
                .join("config.yaml")
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("graft")
                .join("state.yaml")
        })
    }

    #[allow(dead_code)]
    pub fn with_store_path(mut self, path: PathBuf) -> Self {
        self.store_path = Some(path);
        self
    }

    /// Compile the target-view pattern.
    pub fn target_view_regex(&self) -> Result<regex::Regex> {
        regex::Regex::new(&self.target_view)
            .with_context(|| format!("Invalid target_view pattern: {}", self.target_view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts_match_policy() {
        let timeouts = TimeoutConfig::default();

        assert_eq!(timeouts.poll_interval(), Duration::from_millis(100));
        assert_eq!(timeouts.root_wait(), Duration::from_secs(15));
        assert_eq!(timeouts.content_settle(), Duration::from_secs(2));
        assert_eq!(timeouts.content_wait(), Duration::from_secs(10));
        assert_eq!(timeouts.overlay_wait(), Duration::from_secs(10));
        assert_eq!(timeouts.nav_settle(), Duration::from_secs(1));
        assert_eq!(timeouts.notice_ttl(), Duration::from_secs(10));
    }

    #[test]
    fn default_retry_is_five_linear() {
        let retry = RetryConfig::default();

        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.backoff_step(), Duration::from_millis(2000));
    }

    #[test]
    fn default_target_view_matches_following_page() {
        let config = Config::default();
        let pattern = config.target_view_regex().unwrap();

        assert!(pattern.is_match("https://www.twitch.tv/directory/following/channels"));
        assert!(!pattern.is_match("https://www.twitch.tv/somestreamer"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let yaml = r#"
target_view: "example\\.org/app"
target_url: "https://example.org/app"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.target_view, "example\\.org/app");
        assert_eq!(
            config.retry.max_attempts, 5,
            "unspecified sections should fall back to defaults"
        );
        assert_eq!(config.selectors.overlay, "#followManagerContainer");
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let config = Config {
            target_view: "[unclosed".to_string(),
            ..Config::default()
        };

        assert!(config.target_view_regex().is_err());
    }
}

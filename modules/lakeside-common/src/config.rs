use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::denylist::HostDenylist;
use crate::error::{LakesideError, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SITE_URL: &str = "https://phailipp.github.io/bodensee-segler-site";
pub const DEFAULT_ISSUES_URL: &str = "https://github.com/Phailipp/bodensee-segler-site/issues";

/// Curation tool configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the record files (`LAKESIDE_DATA_DIR`).
    pub data_dir: PathBuf,
    /// Optional denylist file replacing the built-in list (`LAKESIDE_DENYLIST`).
    pub denylist_path: Option<PathBuf>,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    /// Public site, used for "open on map" links.
    pub site_url: String,
    /// Issue tracker, used for pre-filled "add source" issues.
    pub issues_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            denylist_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            site_url: DEFAULT_SITE_URL.to_string(),
            issues_url: DEFAULT_ISSUES_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let fetch_timeout = match var("LAKESIDE_FETCH_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    LakesideError::Config(format!(
                        "LAKESIDE_FETCH_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                    ))
                })?;
                if secs == 0 {
                    return Err(LakesideError::Config(
                        "LAKESIDE_FETCH_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.fetch_timeout,
        };

        Ok(Self {
            data_dir: var("LAKESIDE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            denylist_path: var("LAKESIDE_DENYLIST").map(PathBuf::from),
            user_agent: var("LAKESIDE_USER_AGENT").unwrap_or(defaults.user_agent),
            fetch_timeout,
            site_url: var("LAKESIDE_SITE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            issues_url: var("LAKESIDE_ISSUES_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.issues_url),
        })
    }

    /// The configured denylist, or the built-in one.
    pub fn denylist(&self) -> Result<HostDenylist> {
        match &self.denylist_path {
            Some(path) => HostDenylist::load(path),
            None => Ok(HostDenylist::default()),
        }
    }

    pub fn log_summary(&self) {
        info!(
            data_dir = %self.data_dir.display(),
            denylist = self
                .denylist_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string()),
            fetch_timeout_secs = self.fetch_timeout.as_secs(),
            "Configuration loaded"
        );
    }
}

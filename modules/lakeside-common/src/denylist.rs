use std::path::Path;

use tracing::info;

use crate::error::{LakesideError, Result};

/// Hosts never accepted as a source: aggregators, social networks and map
/// mirrors whose pages describe a place without being operated by it.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "openstreetmap.org",
    "osm.org",
    "wikidata.org",
    "wikipedia.org",
    "wikimedia.org",
    "mapcarta.com",
    "my-sea.com",
    "tripadvisor.",
    "facebook.com",
    "instagram.com",
    "local.ch",
    "adac.",
    "marinas.info",
    "slipanlage.info",
    "slipway.de",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    /// `example.com`: the host itself and any subdomain.
    Domain(String),
    /// `tripadvisor.`: any host with this label, whatever the TLD.
    Label(String),
}

impl Rule {
    fn parse(entry: &str) -> Option<Rule> {
        let entry = entry.trim().trim_start_matches('.').to_ascii_lowercase();
        if entry.is_empty() {
            return None;
        }
        match entry.strip_suffix('.') {
            Some(label) if !label.is_empty() => Some(Rule::Label(label.to_string())),
            Some(_) => None,
            None => Some(Rule::Domain(entry)),
        }
    }

    fn denies(&self, host: &str) -> bool {
        match self {
            Rule::Domain(domain) => {
                host == domain
                    || host
                        .strip_suffix(domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
            Rule::Label(label) => {
                let needle = format!("{label}.");
                host.starts_with(&needle) || host.contains(&format!(".{needle}"))
            }
        }
    }
}

/// Host denylist applied to candidate URLs before they are queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDenylist {
    rules: Vec<Rule>,
}

impl Default for HostDenylist {
    fn default() -> Self {
        Self::from_entries(DEFAULT_DENYLIST.iter().copied())
    }
}

impl HostDenylist {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: entries
                .into_iter()
                .filter_map(|e| Rule::parse(e.as_ref()))
                .collect(),
        }
    }

    /// Parse a denylist file: one entry per line, `#` starts a comment.
    pub fn parse(text: &str) -> Self {
        Self::from_entries(
            text.lines()
                .map(|line| line.split('#').next().unwrap_or("")),
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| LakesideError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let list = Self::parse(&text);
        info!(path = %path.display(), entries = list.len(), "Loaded host denylist");
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn denies_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.rules.iter().any(|rule| rule.denies(&host))
    }

    /// Whether `url` may be used as a source. Unparseable URLs and URLs
    /// without a host are never allowed.
    pub fn allows_url(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url.trim()) else {
            return false;
        };
        match parsed.host_str() {
            Some(host) => !self.denies_host(host),
            None => false,
        }
    }
}

// Trait boundary between the promotion pipeline and the network.
//
// CandidateVerifier hides how a candidate URL is checked. The production
// implementation is PageProbeClient (one reqwest client reused for the whole
// batch); tests use MockVerifier from `testing`.

use async_trait::async_trait;
use serde::Serialize;

use page_probe::PageProbeClient;

/// Outcome of checking one candidate URL. Failures are data, not errors:
/// a failed fetch leaves `status` empty and fills `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub status: Option<u16>,
    pub final_url: Option<String>,
    pub title: Option<String>,
    pub error: Option<String>,
}

impl Verification {
    pub fn page(status: u16, title: &str) -> Self {
        Self {
            status: Some(status),
            final_url: None,
            title: Some(title.to_string()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// The page answered below 400.
    pub fn is_reachable(&self) -> bool {
        self.status.is_some_and(|s| s < 400)
    }

    /// Reachable and not an error page dressed up as a 200.
    pub fn is_valid(&self) -> bool {
        self.is_reachable() && !title_signals_error(self.title.as_deref().unwrap_or(""))
    }
}

/// Soft-404 detection on the page title.
pub fn title_signals_error(title: &str) -> bool {
    let title = title.to_lowercase();
    title.contains("not found") || title.contains("error")
}

#[async_trait]
pub trait CandidateVerifier: Send + Sync {
    async fn verify(&self, url: &str) -> Verification;
}

#[async_trait]
impl CandidateVerifier for PageProbeClient {
    async fn verify(&self, url: &str) -> Verification {
        match self.probe(url).await {
            Ok(probe) => Verification {
                status: Some(probe.status),
                final_url: Some(probe.final_url),
                title: probe.title,
                error: None,
            },
            Err(e) => Verification::failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_page_is_valid() {
        assert!(Verification::page(200, "Marina Example").is_valid());
        assert!(Verification::page(301, "").is_valid());
    }

    #[test]
    fn http_errors_are_invalid() {
        assert!(!Verification::page(404, "Marina Example").is_valid());
        assert!(!Verification::page(500, "Marina Example").is_valid());
    }

    #[test]
    fn error_titles_are_invalid() {
        assert!(!Verification::page(200, "Page Not Found").is_valid());
        assert!(!Verification::page(200, "Database ERROR").is_valid());
        assert!(Verification::page(200, "Hafen Fehlerfrei").is_valid());
    }

    #[test]
    fn network_failure_is_invalid() {
        let v = Verification::failed("connection refused");
        assert!(!v.is_reachable());
        assert!(!v.is_valid());
    }
}

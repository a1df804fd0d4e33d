pub mod error;

pub use error::{ProbeError, Result};

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

/// Only the head of a page is needed to find its title.
const MAX_BODY_BYTES: usize = 512 * 1024;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid regex"));

/// What a single GET told us about a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProbe {
    pub status: u16,
    /// URL after redirects.
    pub final_url: String,
    pub content_type: Option<String>,
    pub title: Option<String>,
}

pub struct PageProbeClient {
    client: reqwest::Client,
}

impl PageProbeClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ProbeError::Setup(e.to_string()))?;

        Ok(Self { client })
    }

    /// GET `url` and report status, final URL, content type and page title.
    /// HTTP error statuses are reported, not returned as errors.
    pub async fn probe(&self, url: &str) -> Result<PageProbe> {
        let parsed = url::Url::parse(url.trim()).map_err(|e| ProbeError::InvalidUrl(format!("{url}: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ProbeError::InvalidUrl(format!(
                "only http/https URLs allowed, got: {}",
                parsed.scheme()
            )));
        }

        debug!(url, "Probing page");

        let mut resp = self
            .client
            .get(parsed)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() >= MAX_BODY_BYTES {
                break;
            }
        }

        let title = extract_title(&String::from_utf8_lossy(&body));

        info!(url, status, final_url = final_url.as_str(), title = title.as_deref().unwrap_or(""), "Probed page");

        Ok(PageProbe {
            status,
            final_url,
            content_type,
            title,
        })
    }
}

/// The first `<title>` of an HTML document, entities decoded and whitespace collapsed.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_RE.captures(html)?.get(1)?.as_str();
    let decoded = decode_entities(raw);
    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed)
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16).ok())
                    .unwrap_or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

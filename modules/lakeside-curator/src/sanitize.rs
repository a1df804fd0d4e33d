// URL hygiene over the whole store. Never invents sources; only normalizes
// what is already there and tags candidate URLs with a coarse kind.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use lakeside_common::{Record, RecordStore, CANDIDATE_URL_KIND};

const SOCIAL_HOSTS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "fb.com",
    "tiktok.com",
    "x.com",
    "twitter.com",
];

const AGGREGATOR_MARKERS: &[&str] = &[
    "tripadvisor.",
    "google.",
    "yelp.",
    "booking.",
    "opentable.",
    "thefork.",
    "ubereats.",
    "just-eat.",
    "lieferando.",
];

static TRACKING_FRAGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#utm_.*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlKind {
    Social,
    Aggregator,
    Web,
    Other,
}

impl UrlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlKind::Social => "social",
            UrlKind::Aggregator => "aggregator",
            UrlKind::Web => "web",
            UrlKind::Other => "other",
        }
    }
}

/// Trim, drop `#utm_…` fragments and upgrade `http://` to `https://`.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let stripped = TRACKING_FRAGMENT_RE.replace(trimmed, "");
    match stripped.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => stripped.into_owned(),
    }
}

pub fn classify_url(url: &str) -> UrlKind {
    let lower = url.to_lowercase();
    if SOCIAL_HOSTS.iter().any(|d| lower.contains(d)) {
        UrlKind::Social
    } else if AGGREGATOR_MARKERS.iter().any(|d| lower.contains(d)) {
        UrlKind::Aggregator
    } else if lower.starts_with("https://") || lower.starts_with("http://") {
        UrlKind::Web
    } else {
        UrlKind::Other
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    /// Candidate URLs whose text changed.
    pub changed: usize,
    /// Records touched in any way (candidate, kind tag or url).
    pub touched: usize,
}

/// Returns (candidate URL changed, record modified).
pub fn sanitize_record(record: &mut Record) -> (bool, bool) {
    let mut candidate_changed = false;
    let mut touched = false;

    if let Some(before) = record.candidate_url.clone() {
        let after = normalize_url(&before);
        if after != before {
            candidate_changed = true;
            touched = true;
            record.candidate_url = if after.is_empty() { None } else { Some(after.clone()) };
        }
        if !after.is_empty() {
            let kind = classify_url(&after).as_str();
            if record.extra_str(CANDIDATE_URL_KIND) != Some(kind) {
                record
                    .extra
                    .insert(CANDIDATE_URL_KIND.to_string(), serde_json::Value::from(kind));
                touched = true;
            }
        }
    }

    if let Some(url) = record.url.as_deref().filter(|u| !u.is_empty()) {
        let normalized = normalize_url(url);
        if normalized != url {
            record.url = Some(normalized);
            touched = true;
        }
    }

    (candidate_changed, touched)
}

pub fn sanitize_store(store: &mut RecordStore) -> SanitizeReport {
    let mut report = SanitizeReport::default();
    for collection in store.collections_mut() {
        for record in collection.records.iter_mut() {
            let (changed, touched) = sanitize_record(record);
            if changed {
                report.changed += 1;
            }
            if touched {
                report.touched += 1;
                debug!(id = record.id.as_str(), kind = %collection.kind, "Sanitized record");
            }
        }
    }
    report
}

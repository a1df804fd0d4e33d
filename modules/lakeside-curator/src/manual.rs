// Manual verification: a curator answers a review-queue issue with "ok"
// (the candidate URL is right) or "source <url>" (use this URL instead), and
// the record is marked verified.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use lakeside_common::{Kind, RecordStore};

/// Never accepted as an official source, for any kind.
const BLOCKED_MARKERS: &[&str] = &[
    "tripadvisor.",
    "google.",
    "goo.gl",
    "facebook.",
    "instagram.",
    "yelp.",
    "booking.",
    "opentable.",
    "thefork.",
    "ubereats.",
    "just-eat.",
    "lieferando.",
    "wikipedia.",
    "wikidata.",
    "openstreetmap.",
    "osm.",
];

/// Community sites that are fine for anchorages but not for businesses.
const FORUM_MARKERS: &[&str] = &[
    "navily.",
    "noonsite.",
    "cruisersforum.",
    "forum.",
    "seglerforum.",
];

static TYPE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Type:\s*(\w+)$").expect("valid regex"));
static ID_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^ID:\s*(.+?)$").expect("valid regex"));
static CANDIDATE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Candidate URL \(found, not verified\):$").expect("valid regex")
});
static URL_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^-\s*(https?://\S+)$").expect("valid regex"));
static SOURCE_REPLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^source\s+(https?://\S+)$").expect("valid regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManualError {
    #[error("Reply must be either 'ok' or 'source <url>', got '{0}'")]
    InvalidReply(String),

    #[error("Need a type and an id (flags or template Type/ID lines)")]
    MissingTarget,

    #[error("Unknown record type '{0}'")]
    UnknownKind(String),

    #[error("Reply 'ok' needs a candidate URL in the template or on the record")]
    MissingCandidate,

    #[error("Refusing {url} as source for a {kind}: looks non-official or blocked")]
    RejectedSource { kind: Kind, url: String },

    #[error("No {kind} with id '{id}'")]
    NotFound { kind: Kind, id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Promote the candidate URL.
    Ok,
    /// Use this URL instead.
    Source(String),
}

impl Reply {
    pub fn parse(reply: &str) -> Result<Reply, ManualError> {
        let reply = reply.trim();
        if reply.eq_ignore_ascii_case("ok") {
            return Ok(Reply::Ok);
        }
        SOURCE_REPLY_RE
            .captures(reply)
            .map(|caps| Reply::Source(caps[1].to_string()))
            .ok_or_else(|| ManualError::InvalidReply(reply.to_string()))
    }
}

/// What an issue template body says about its record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateInfo {
    pub kind: Option<String>,
    pub id: Option<String>,
    pub candidate: Option<String>,
}

/// Read `Type:`, `ID:` and the candidate URL line from an issue body as
/// produced by the review queue.
pub fn parse_template(text: &str) -> TemplateInfo {
    let mut info = TemplateInfo::default();
    let mut in_candidate = false;

    for line in text.lines().map(str::trim) {
        if in_candidate {
            in_candidate = false;
            if let Some(caps) = URL_LINE_RE.captures(line) {
                info.candidate = Some(caps[1].to_string());
            }
            continue;
        }
        if info.kind.is_none() {
            if let Some(caps) = TYPE_LINE_RE.captures(line) {
                info.kind = Some(caps[1].to_lowercase());
                continue;
            }
        }
        if info.id.is_none() {
            if let Some(caps) = ID_LINE_RE.captures(line) {
                info.id = Some(caps[1].trim().to_string());
                continue;
            }
        }
        if CANDIDATE_HEADER_RE.is_match(line) {
            in_candidate = true;
        }
    }
    info
}

/// Whether `url` may be recorded as the official source of a `kind` record.
pub fn source_allowed(url: &str, kind: Kind) -> bool {
    let url = url.trim();
    let lower = url.to_lowercase();
    if !lower.starts_with("http") {
        return false;
    }
    let Some(host) = url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string))
    else {
        return false;
    };
    if !host.contains('.') {
        return false;
    }
    if BLOCKED_MARKERS.iter().any(|m| lower.contains(m)) {
        return false;
    }
    kind == Kind::Anchor || !FORUM_MARKERS.iter().any(|m| lower.contains(m))
}

/// One manual verification request.
#[derive(Debug, Clone)]
pub struct ManualPromotion {
    pub kind: Kind,
    pub id: String,
    pub reply: Reply,
    /// Candidate URL quoted in the template, if any.
    pub template_candidate: Option<String>,
}

impl ManualPromotion {
    /// Combine explicit flags with a template; flags win.
    pub fn resolve(
        kind: Option<&str>,
        id: Option<&str>,
        template: Option<&str>,
        reply: &str,
    ) -> Result<Self, ManualError> {
        let reply = Reply::parse(reply)?;
        let info = template.map(parse_template).unwrap_or_default();

        let kind_name = kind
            .map(str::to_string)
            .or(info.kind)
            .ok_or(ManualError::MissingTarget)?;
        let id = id
            .map(str::to_string)
            .or(info.id)
            .ok_or(ManualError::MissingTarget)?;
        let kind = Kind::parse(&kind_name).ok_or(ManualError::UnknownKind(kind_name))?;

        Ok(Self {
            kind,
            id,
            reply,
            template_candidate: info.candidate,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualOutcome {
    #[serde(rename = "type")]
    pub kind: Kind,
    pub id: String,
    pub file: &'static str,
    pub source: String,
    pub last_verified: String,
}

/// Mark the requested record verified in `store` (not yet persisted).
pub fn apply_manual_promotion(
    store: &mut RecordStore,
    request: &ManualPromotion,
    today: NaiveDate,
) -> Result<ManualOutcome, ManualError> {
    let not_found = || ManualError::NotFound {
        kind: request.kind,
        id: request.id.clone(),
    };
    let record = store
        .find_mut(request.kind, &request.id)
        .ok_or_else(not_found)?;

    let source = match &request.reply {
        Reply::Source(url) => url.clone(),
        Reply::Ok => request
            .template_candidate
            .clone()
            .or_else(|| record.candidate().map(str::to_string))
            .ok_or(ManualError::MissingCandidate)?,
    };

    if !source_allowed(&source, request.kind) {
        return Err(ManualError::RejectedSource {
            kind: request.kind,
            url: source,
        });
    }

    record.mark_verified(&source, today);
    info!(id = request.id.as_str(), kind = %request.kind, source = source.as_str(), "Record verified manually");

    Ok(ManualOutcome {
        kind: request.kind,
        id: request.id.clone(),
        file: request.kind.file_name(),
        source,
        last_verified: today.format("%Y-%m-%d").to_string(),
    })
}

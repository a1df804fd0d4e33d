// Bootstrap a lake from OpenStreetMap points of interest, and clean up the
// unverified gastro entries such an import leaves behind. Neither step ever
// writes source or lastVerified.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use lakeside_common::{is_verified, Kind, Record, RecordStore};

pub const OSM_TYPE_FIELD: &str = "candidateOsmType";
pub const OSM_ID_FIELD: &str = "candidateOsmId";
pub const PHONE_FIELD: &str = "candidatePhone";
pub const HOURS_FIELD: &str = "candidateHours";

const SLUG_MAX_CHARS: usize = 60;

static SLUG_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9äöüß]+").expect("valid regex"));

/// One point of interest from an OSM candidate search.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OsmCandidate {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub osm_type: Option<String>,
    /// Numeric in OSM exports, but kept as given.
    #[serde(default)]
    pub osm_id: Option<Value>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub found_at: Option<String>,
    #[serde(default)]
    pub tags: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OsmCandidateFile {
    #[serde(default)]
    pub candidates: Vec<OsmCandidate>,
}

impl OsmCandidateFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read OSM candidate file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse OSM candidate file {}", path.display()))
    }
}

/// Target collection for an OSM category; anything else is skipped.
fn target_kind(category: &str) -> Option<Kind> {
    match category {
        "marina" | "harbor" => Some(Kind::Harbor),
        "gastro" => Some(Kind::Gastro),
        "rental" => Some(Kind::Rental),
        _ => None,
    }
}

/// Lowercased `a-z0-9äöüß` words joined by `-`, at most 60 characters.
pub fn slug(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let joined = SLUG_SPLIT_RE
        .split(&lower)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let truncated: String = joined.chars().take(SLUG_MAX_CHARS).collect();
    if truncated.is_empty() {
        "poi".to_string()
    } else {
        truncated
    }
}

fn id_part(value: Option<&Value>, fallback: &str) -> String {
    match value {
        None | Some(Value::Null) => fallback.to_string(),
        Some(Value::String(s)) if s.is_empty() => fallback.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `osm-{type}-{id}-{slug(name)}`, with `x` and `0` for missing parts.
pub fn record_id(candidate: &OsmCandidate) -> String {
    let osm_type = candidate
        .osm_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or("x");
    format!(
        "osm-{osm_type}-{}-{}",
        id_part(candidate.osm_id.as_ref(), "0"),
        slug(candidate.name.as_deref().unwrap_or(""))
    )
}

fn blank_extra(record: &Record, key: &str) -> bool {
    record.extra_str(key).map_or(true, |v| v.trim().is_empty())
}

fn tag<'a>(candidate: &'a OsmCandidate, key: &str) -> Option<&'a str> {
    candidate
        .tags
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub added: usize,
    /// Added plus already-present records the import matched.
    pub touched: usize,
}

/// Merge OSM candidates into the harbor, gastro and rental collections.
/// New records get name, coordinates and OSM provenance; existing ones only
/// have empty candidate fields filled.
pub fn import_osm(store: &mut RecordStore, file: &OsmCandidateFile, today: NaiveDate) -> ImportReport {
    let today = today.format("%Y-%m-%d").to_string();
    let mut report = ImportReport::default();

    for candidate in &file.candidates {
        let Some(kind) = target_kind(&candidate.kind) else {
            continue;
        };
        let name = candidate.name.as_deref().map(str::trim).unwrap_or("");
        let (Some(lat), Some(lng)) = (candidate.lat, candidate.lng) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let Some(records) = store.records_mut(kind) else {
            continue;
        };

        let id = record_id(candidate);
        let index = match records.iter().position(|r| r.id == id) {
            Some(index) => index,
            None => {
                let mut record = Record::new(id.as_str());
                record.name = Some(name.to_string());
                record.lat = Some(lat);
                record.lng = Some(lng);
                record.candidate_source = Some("osm".to_string());
                record.candidate_found_at =
                    Some(candidate.found_at.clone().unwrap_or_else(|| today.clone()));
                record.extra.insert(
                    OSM_TYPE_FIELD.to_string(),
                    candidate.osm_type.clone().map_or(Value::Null, Value::String),
                );
                record.extra.insert(
                    OSM_ID_FIELD.to_string(),
                    candidate.osm_id.clone().unwrap_or(Value::Null),
                );
                records.push(record);
                report.added += 1;
                debug!(id = id.as_str(), kind = %kind, "OSM candidate added");
                records.len() - 1
            }
        };
        report.touched += 1;

        let record = &mut records[index];
        if let Some(website) = candidate.website.as_deref().filter(|w| !w.is_empty()) {
            if record.candidate().is_none() {
                record.candidate_url = Some(website.to_string());
            }
        }
        if let Some(phone) = tag(candidate, "contact:phone") {
            if blank_extra(record, PHONE_FIELD) {
                record.extra.insert(PHONE_FIELD.to_string(), Value::from(phone));
            }
        }
        if let Some(hours) = tag(candidate, "opening_hours") {
            if blank_extra(record, HOURS_FIELD) {
                record.extra.insert(HOURS_FIELD.to_string(), Value::from(hours));
            }
        }
    }

    info!(added = report.added, touched = report.touched, "OSM import finished");
    report
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub kept: usize,
    pub removed: usize,
}

/// Drop gastros that came from OSM and were never verified.
pub fn cleanup_osm_gastros(store: &mut RecordStore) -> CleanupReport {
    let Some(gastros) = store.records_mut(Kind::Gastro) else {
        return CleanupReport::default();
    };
    let before = gastros.len();
    gastros.retain(|r| {
        is_verified(r) || r.candidate_source.as_deref().map(str::trim) != Some("osm")
    });

    let report = CleanupReport {
        kept: gastros.len(),
        removed: before - gastros.len(),
    };
    info!(kept = report.kept, removed = report.removed, "OSM gastro cleanup finished");
    report
}

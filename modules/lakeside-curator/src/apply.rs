// Attach discovered websites to records as candidate URLs by name-token
// overlap. Only candidate fields are written; source and lastVerified are
// left for a human or the promotion pipeline.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lakeside_common::{Record, RecordStore};

/// Minimum number of shared name tokens for a match.
pub const MIN_TOKEN_OVERLAP: usize = 2;

const STOPWORDS: &[&str] = &[
    "am", "an", "bei", "zum", "zur", "und", "the", "der", "die", "das", "im", "in", "of", "a", "la",
    "le",
];

static TOKEN_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9äöüß]+").expect("valid regex"));

/// One website found by an external discovery run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    pub name: String,
    pub website: String,
    pub found_at: String,
    pub found_via: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiscoveryFile {
    #[serde(default)]
    pub candidates: Vec<Discovery>,
}

impl DiscoveryFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read discovery file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse discovery file {}", path.display()))
    }
}

/// Lowercased alphanumeric tokens longer than two characters, stopwords removed.
pub fn name_tokens(name: &str) -> HashSet<String> {
    let lower = name.to_lowercase();
    TOKEN_SPLIT_RE
        .split(&lower)
        .filter(|t| t.chars().count() > 2 && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

fn needs_candidate(record: &Record) -> bool {
    let has_source = record.source.as_deref().is_some_and(|s| !s.trim().is_empty());
    !has_source && record.candidate().is_none()
}

/// Best discovery for `name`: the first one with the highest overlap, if
/// that overlap reaches [`MIN_TOKEN_OVERLAP`].
pub fn best_match<'a>(
    name: &str,
    index: &'a [(HashSet<String>, Discovery)],
) -> Option<&'a Discovery> {
    let tokens = name_tokens(name);
    if tokens.is_empty() {
        return None;
    }
    let mut best: Option<(usize, &Discovery)> = None;
    for (candidate_tokens, discovery) in index {
        let score = tokens.intersection(candidate_tokens).count();
        if score > best.map_or(0, |(s, _)| s) {
            best = Some((score, discovery));
        }
    }
    best.filter(|(score, _)| *score >= MIN_TOKEN_OVERLAP)
        .map(|(_, d)| d)
}

/// Apply discoveries to every record still lacking a source and a candidate.
/// Returns the number of records changed.
pub fn apply_discoveries(store: &mut RecordStore, discoveries: &DiscoveryFile) -> usize {
    let index: Vec<(HashSet<String>, Discovery)> = discoveries
        .candidates
        .iter()
        .map(|d| (name_tokens(&d.name), d.clone()))
        .collect();

    let mut changed = 0;
    for collection in store.collections_mut() {
        for record in collection.records.iter_mut().filter(|r| needs_candidate(r)) {
            let Some(found) = best_match(record.name(), &index) else {
                continue;
            };
            debug!(
                id = record.id.as_str(),
                kind = %collection.kind,
                url = found.website.as_str(),
                "Candidate applied"
            );
            record.candidate_url = Some(found.website.clone());
            record.candidate_found_at = Some(found.found_at.clone());
            record.candidate_source = Some(found.found_via.clone());
            changed += 1;
        }
    }
    changed
}

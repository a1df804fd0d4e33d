// Conservative duplicate removal for OSM-imported records.
//
// Only records with candidateSource "osm" and coordinates take part. Two of
// them are duplicates when they share a kind, their normalized names contain
// one another and they lie within `max_distance_m`. Names and coordinates of
// the kept record are never changed.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::info;

use lakeside_common::{haversine_m, is_verified, Record, RecordStore};

pub const DEFAULT_MAX_DISTANCE_M: f64 = 60.0;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static NAME_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9äöüß ]+").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub removed: usize,
    /// Candidate URLs carried over from a dropped record.
    pub merged: usize,
}

pub fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let collapsed = WHITESPACE_RE.replace_all(&lower, " ");
    NAME_NOISE_RE.replace_all(&collapsed, "").into_owned()
}

fn is_osm_located(record: &Record) -> bool {
    record.candidate_source.as_deref() == Some("osm") && record.coordinates().is_some()
}

fn likely_same(a: &Record, b: &Record, max_distance_m: f64) -> bool {
    let (name_a, name_b) = (normalize_name(a.name()), normalize_name(b.name()));
    if name_a.is_empty() || name_b.is_empty() {
        return false;
    }
    if !name_a.contains(&name_b) && !name_b.contains(&name_a) {
        return false;
    }
    match (a.coordinates(), b.coordinates()) {
        (Some((lat1, lng1)), Some((lat2, lng2))) => {
            haversine_m(lat1, lng1, lat2, lng2) <= max_distance_m
        }
        _ => false,
    }
}

/// Whether `b` should be kept over `a` (which comes first in file order).
fn prefer_second(a: &Record, b: &Record) -> bool {
    match (is_verified(a), is_verified(b)) {
        (true, _) => false,
        (false, true) => true,
        (false, false) => b.candidate().is_some() && a.candidate().is_none(),
    }
}

/// Deduplicate one kind's records in place.
pub fn dedup_records(records: &mut Vec<Record>, max_distance_m: f64) -> DedupReport {
    let pool: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| is_osm_located(r))
        .map(|(i, _)| i)
        .collect();

    let mut removed: HashSet<usize> = HashSet::new();
    let mut merged = 0;

    for (pos, &i) in pool.iter().enumerate() {
        for &j in &pool[pos + 1..] {
            if removed.contains(&i) {
                break;
            }
            if removed.contains(&j) || !likely_same(&records[i], &records[j], max_distance_m) {
                continue;
            }

            let (keep, drop) = if prefer_second(&records[i], &records[j]) {
                (j, i)
            } else {
                (i, j)
            };

            if records[keep].candidate().is_none() {
                if let Some(url) = records[drop].candidate_url.clone().filter(|u| !u.trim().is_empty()) {
                    records[keep].candidate_url = Some(url);
                    merged += 1;
                }
            }

            info!(
                keep = records[keep].id.as_str(),
                drop = records[drop].id.as_str(),
                "Duplicate record dropped"
            );
            removed.insert(drop);
        }
    }

    if !removed.is_empty() {
        let mut index = 0;
        records.retain(|_| {
            let keep = !removed.contains(&index);
            index += 1;
            keep
        });
    }

    DedupReport {
        removed: removed.len(),
        merged,
    }
}

pub fn dedup_store(store: &mut RecordStore, max_distance_m: f64) -> DedupReport {
    let mut report = DedupReport::default();
    for collection in store.collections_mut() {
        let part = dedup_records(&mut collection.records, max_distance_m);
        report.removed += part.removed;
        report.merged += part.merged;
    }
    report
}

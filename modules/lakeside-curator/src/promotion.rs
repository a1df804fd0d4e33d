// Candidate promotion: check unverified records' candidate URLs one at a
// time and turn the valid ones into authoritative url/source/lastVerified.
//
// The store is mutated in memory while the batch runs and written once at
// the end, so an interrupted run writes nothing.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use lakeside_common::{HostDenylist, Kind, RecordStore, Result};

use crate::traits::CandidateVerifier;

pub const DEFAULT_BATCH_LIMIT: usize = 20;
pub const NO_CANDIDATES_NOTE: &str = "no candidates to verify";

#[derive(Debug, Clone)]
pub struct PromotionOptions {
    /// Maximum candidates checked in this run.
    pub limit: usize,
    /// Check and report, never mutate or write.
    pub dry_run: bool,
    /// Stamped into `lastVerified` of promoted records.
    pub today: NaiveDate,
}

impl PromotionOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            limit: DEFAULT_BATCH_LIMIT,
            dry_run: false,
            today,
        }
    }
}

/// A record whose candidate URL is eligible for checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCandidate {
    pub kind: Kind,
    /// Position in the kind's collection.
    pub index: usize,
    pub id: String,
    pub url: String,
}

/// Per-candidate failure as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateError {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub url: String,
    pub status: Option<u16>,
    pub title: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromotionReport {
    pub checked: usize,
    pub promoted: usize,
    /// Eligible candidates left over because of the batch limit.
    pub skipped: usize,
    pub errors: Vec<CandidateError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl std::fmt::Display for PromotionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "checked={} promoted={} skipped={} errors={}",
            self.checked,
            self.promoted,
            self.skipped,
            self.errors.len()
        )
    }
}

/// Eligible candidates in file then record order: no authoritative url yet,
/// a non-empty candidate URL, and a host the denylist accepts.
pub fn candidate_queue(store: &RecordStore, denylist: &HostDenylist) -> Vec<QueuedCandidate> {
    let mut queue = Vec::new();
    for collection in store.collections() {
        for (index, record) in collection.records.iter().enumerate() {
            if record.authoritative_url().is_some() {
                continue;
            }
            let Some(url) = record.candidate() else {
                continue;
            };
            if !denylist.allows_url(url) {
                debug!(id = record.id.as_str(), kind = %collection.kind, url, "Candidate host denied");
                continue;
            }
            queue.push(QueuedCandidate {
                kind: collection.kind,
                index,
                id: record.id.clone(),
                url: url.to_string(),
            });
        }
    }
    queue
}

/// Run one promotion batch against `store`, writing it back unless dry-run.
pub async fn promote_candidates(
    store: &mut RecordStore,
    denylist: &HostDenylist,
    verifier: &dyn CandidateVerifier,
    options: &PromotionOptions,
) -> Result<PromotionReport> {
    let queue = candidate_queue(store, denylist);
    let batch_len = queue.len().min(options.limit);

    let mut report = PromotionReport {
        skipped: queue.len() - batch_len,
        ..PromotionReport::default()
    };

    info!(
        queued = queue.len(),
        batch = batch_len,
        dry_run = options.dry_run,
        "Candidate queue built"
    );

    if batch_len == 0 {
        report.note = Some(NO_CANDIDATES_NOTE.to_string());
        return Ok(report);
    }

    for candidate in queue.into_iter().take(batch_len) {
        report.checked += 1;
        let verification = verifier.verify(&candidate.url).await;

        if !verification.is_valid() {
            warn!(
                id = candidate.id.as_str(),
                kind = %candidate.kind,
                url = candidate.url.as_str(),
                status = ?verification.status,
                title = ?verification.title,
                error = ?verification.error,
                "Candidate rejected"
            );
            report.errors.push(CandidateError {
                id: candidate.id,
                kind: candidate.kind,
                url: candidate.url,
                status: verification.status,
                title: verification.title,
                error: verification.error,
            });
            continue;
        }

        report.promoted += 1;
        info!(
            id = candidate.id.as_str(),
            kind = %candidate.kind,
            url = candidate.url.as_str(),
            "Candidate promoted"
        );

        if options.dry_run {
            continue;
        }
        if let Some(record) = store
            .records_mut(candidate.kind)
            .and_then(|records| records.get_mut(candidate.index))
        {
            record.promote_candidate(options.today);
        }
    }

    if options.dry_run {
        info!("Dry run, nothing written");
    } else {
        store.save()?;
    }

    info!("Promotion batch complete. {report}");
    Ok(report)
}

// Review queue: a short, ranked list of unverified records for manual
// verification, with a link to open each on the map and a pre-filled issue.

use std::cmp::Reverse;

use url::form_urlencoded;

use lakeside_common::{is_verified, Kind, Record, RecordStore};

pub const DEFAULT_QUEUE_LIMIT: usize = 30;

/// Higher weight = reviewed first.
fn kind_weight(kind: Kind) -> u8 {
    match kind {
        Kind::Harbor => 5,
        Kind::Rental => 4,
        Kind::Gastro => 3,
        Kind::Service => 2,
        Kind::Anchor => 1,
    }
}

fn rank(kind: Kind, record: &Record) -> (u8, bool, bool, usize) {
    (
        kind_weight(kind),
        record.candidate().is_some(),
        record.candidate_source.as_deref() == Some("osm"),
        record.name().chars().count(),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry<'a> {
    pub kind: Kind,
    pub record: &'a Record,
    pub open_url: String,
    pub issue_url: String,
}

/// Links the queue entries point at.
#[derive(Debug, Clone)]
pub struct ReviewLinks<'a> {
    pub site_url: &'a str,
    pub issues_url: &'a str,
    pub lake: Option<&'a str>,
}

impl ReviewLinks<'_> {
    /// `{site}/?lake=..&open={kind}:{id}#karte`; the `:` separator stays literal.
    pub fn open_url(&self, kind: Kind, id: &str) -> String {
        let encode = |s: &str| form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>();
        let lake = self
            .lake
            .map(|lake| format!("lake={}&", encode(lake)))
            .unwrap_or_default();
        format!("{}/?{lake}open={kind}:{}#karte", self.site_url, encode(id))
    }

    pub fn issue_url(&self, kind: Kind, record: &Record) -> String {
        let label = record
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&record.id);
        let coord = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        let body = format!(
            "Type: {kind}\n\
             ID: {id}\n\
             Name: {name}\n\
             Country: {country}\n\
             Coords: {lat}, {lng}\n\n\
             Official source link:\n- \n\n\
             Last verified (YYYY-MM-DD):\n- \n\n\
             Candidate URL (found, not verified):\n- {candidate}\n",
            id = record.id,
            name = record.name(),
            country = record.country.as_deref().unwrap_or("").to_uppercase(),
            lat = coord(record.lat),
            lng = coord(record.lng),
            candidate = record.candidate_url.as_deref().unwrap_or(""),
        );
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("title", &format!("Add source: {label}"))
            .append_pair("body", &body)
            .finish();
        format!("{}/new?{}", self.issues_url, query)
    }
}

/// Unverified records ranked by kind, candidate presence, OSM origin and
/// name length, truncated to `limit`. Ties keep store order.
pub fn review_queue<'a>(
    store: &'a RecordStore,
    links: &ReviewLinks<'_>,
    limit: usize,
) -> Vec<ReviewEntry<'a>> {
    let mut rows: Vec<(Kind, &Record)> = store
        .iter()
        .filter(|(_, r)| !is_verified(r) && !r.id.trim().is_empty())
        .collect();
    rows.sort_by_key(|(kind, record)| Reverse(rank(*kind, record)));
    rows.truncate(limit);

    rows.into_iter()
        .map(|(kind, record)| ReviewEntry {
            kind,
            record,
            open_url: links.open_url(kind, &record.id),
            issue_url: links.issue_url(kind, record),
        })
        .collect()
}

/// Plain-text rendering, one entry per line.
pub fn render_queue(entries: &[ReviewEntry<'_>], lake: Option<&str>, limit: usize) -> String {
    let mut out = vec![
        format!("Review queue: {} (top {limit})", lake.unwrap_or("all")),
        String::new(),
        "Format: Name | Type | Candidate | Open | Issue".to_string(),
        String::new(),
    ];
    for entry in entries {
        let name = entry.record.name().trim();
        let name = if name.is_empty() { entry.record.id.as_str() } else { name };
        out.push(format!(
            "{name} | {} | {} | {} | {}",
            entry.kind,
            entry.record.candidate().unwrap_or("(none)"),
            entry.open_url,
            entry.issue_url
        ));
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use lakeside_common::Collection;

    use super::*;

    const LINKS: ReviewLinks<'static> = ReviewLinks {
        site_url: "https://site.example",
        issues_url: "https://git.example/repo/issues",
        lake: Some("bodensee"),
    };

    fn named(id: &str, name: &str) -> Record {
        let mut r = Record::new(id);
        r.name = Some(name.to_string());
        r
    }

    fn store(collections: Vec<(Kind, Vec<Record>)>) -> RecordStore {
        let dir = Path::new("/nonexistent");
        RecordStore::from_collections(
            dir,
            collections
                .into_iter()
                .map(|(kind, records)| Collection::new(kind, dir.join(kind.file_name()), records))
                .collect(),
        )
    }

    #[test]
    fn ranks_kind_then_candidate_then_osm_then_name_length() {
        let anchor = named("a1", "A very long anchorage name indeed");
        let plain_harbor = named("h-plain", "Hafen");
        let mut cand_harbor = named("h-cand", "Hafen");
        cand_harbor.candidate_url = Some("https://h.example".into());
        let mut osm_harbor = named("h-osm", "Hafen");
        osm_harbor.candidate_url = Some("https://o.example".into());
        osm_harbor.candidate_source = Some("osm".into());
        let long_harbor = named("h-long", "Hafen mit langem Namen");
        let mut verified = named("h-verified", "Verified");
        verified.source = Some("https://v.example".into());
        verified.last_verified = Some("2026-01-01".into());
        let rental = named("r1", "Boote");

        let store = store(vec![
            (
                Kind::Harbor,
                vec![plain_harbor, cand_harbor, osm_harbor, long_harbor, verified],
            ),
            (Kind::Anchor, vec![anchor]),
            (Kind::Rental, vec![rental]),
        ]);

        let ids: Vec<&str> = review_queue(&store, &LINKS, 10)
            .iter()
            .map(|e| e.record.id.as_str())
            .collect();
        assert_eq!(ids, vec!["h-osm", "h-cand", "h-long", "h-plain", "r1", "a1"]);
    }

    #[test]
    fn limit_truncates() {
        let store = store(vec![(
            Kind::Service,
            (0..5).map(|i| named(&format!("s{i}"), "Werft")).collect(),
        )]);
        let entries = review_queue(&store, &LINKS, 2);
        let ids: Vec<&str> = entries.iter().map(|e| e.record.id.as_str()).collect();
        assert_eq!(ids, vec!["s0", "s1"]);
    }

    #[test]
    fn links_are_encoded() {
        let mut record = named("h 1", "Hafen & Co");
        record.country = Some("de".into());
        record.lat = Some(47.5);
        record.lng = Some(9.7);

        assert_eq!(
            LINKS.open_url(Kind::Harbor, &record.id),
            "https://site.example/?lake=bodensee&open=harbor:h+1#karte"
        );
        let unscoped = ReviewLinks { lake: None, ..LINKS };
        assert_eq!(
            unscoped.open_url(Kind::Anchor, "a/1"),
            "https://site.example/?open=anchor:a%2F1#karte"
        );

        let issue = LINKS.issue_url(Kind::Harbor, &record);
        assert!(issue.starts_with("https://git.example/repo/issues/new?title=Add+source%3A+Hafen+%26+Co&body="));
        assert!(issue.contains("Country%3A+DE"));
        assert!(issue.contains("Coords%3A+47.5%2C+9.7"));
    }

    #[test]
    fn render_marks_missing_candidates() {
        let store = store(vec![(Kind::Gastro, vec![named("g1", "Seeblick")])]);
        let entries = review_queue(&store, &LINKS, 5);
        let text = render_queue(&entries, Some("bodensee"), 5);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Review queue: bodensee (top 5)");
        assert_eq!(lines[2], "Format: Name | Type | Candidate | Open | Issue");
        assert!(lines[4].starts_with("Seeblick | gastro | (none) | https://site.example/"));
    }
}

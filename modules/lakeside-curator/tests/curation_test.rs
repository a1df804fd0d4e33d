//! Curation tools against a data directory on disk.

use std::path::Path;

use chrono::NaiveDate;
use url::form_urlencoded;

use lakeside_common::{is_verified, Kind, RecordStore, CANDIDATE_URL_KIND};
use lakeside_curator::apply::{apply_discoveries, DiscoveryFile};
use lakeside_curator::dedup::{dedup_store, DEFAULT_MAX_DISTANCE_M};
use lakeside_curator::manual::{apply_manual_promotion, ManualError, ManualPromotion};
use lakeside_curator::osm::{
    cleanup_osm_gastros, import_osm, CleanupReport, ImportReport, OsmCandidateFile,
};
use lakeside_curator::review_queue::{review_queue, ReviewLinks};
use lakeside_curator::sanitize::sanitize_store;

const GASTROS: &str = r#"[
  {
    "id": "g-seeblick",
    "name": "Restaurant Seeblick",
    "lat": 47.66,
    "lng": 9.17,
    "candidateUrl": " http://seeblick.example/#utm_source=osm",
    "candidateFoundAt": "2026-09-01",
    "candidateSource": "osm",
    "openingHours": "Mo-So 11-22"
  },
  {
    "id": "g-seeblick-2",
    "name": "Seeblick",
    "lat": 47.6601,
    "lng": 9.1701,
    "candidateUrl": null,
    "candidateFoundAt": null,
    "candidateSource": "osm"
  },
  {
    "id": "g-krone",
    "name": "Gasthof Krone Hagnau",
    "source": "https://krone.example",
    "lastVerified": "2026-06-01",
    "candidateUrl": null,
    "candidateFoundAt": null,
    "candidateSource": null
  },
  {
    "id": "g-fischer",
    "name": "Fischerstube Hagnau",
    "candidateUrl": null,
    "candidateFoundAt": null,
    "candidateSource": null
  }
]
"#;

fn write_fixture(dir: &Path) {
    for kind in Kind::ALL {
        let body = if kind == Kind::Gastro { GASTROS } else { "[]\n" };
        std::fs::write(dir.join(kind.file_name()), body).unwrap();
    }
}

#[test]
fn sanitize_then_dedup_rewrites_files() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture(tmp.path());

    let mut store = RecordStore::load(tmp.path()).unwrap();
    let sanitized = sanitize_store(&mut store);
    assert_eq!(sanitized.changed, 1);

    let deduped = dedup_store(&mut store, DEFAULT_MAX_DISTANCE_M);
    assert_eq!(deduped.removed, 1);
    assert_eq!(deduped.merged, 0);
    store.save().unwrap();

    let store = RecordStore::load(tmp.path()).unwrap();
    let ids: Vec<&str> = store
        .records(Kind::Gastro)
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(ids, vec!["g-seeblick", "g-krone", "g-fischer"]);

    let seeblick = store.find(Kind::Gastro, "g-seeblick").unwrap();
    assert_eq!(seeblick.candidate_url.as_deref(), Some("https://seeblick.example/"));
    assert_eq!(seeblick.extra_str(CANDIDATE_URL_KIND), Some("web"));
    assert_eq!(seeblick.extra_str("openingHours"), Some("Mo-So 11-22"));
}

#[test]
fn discoveries_fill_only_open_records() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture(tmp.path());
    let discovery_path = tmp.path().join("discoveries.json");
    std::fs::write(
        &discovery_path,
        r#"{"candidates": [
            {"name": "Gasthof Krone", "website": "https://krone-2.example", "foundAt": "2026-10-01", "foundVia": "osm"},
            {"name": "Fischerstube Hagnau am See", "website": "https://fischerstube.example", "foundAt": "2026-10-01", "foundVia": "search"}
        ]}"#,
    )
    .unwrap();

    let discoveries = DiscoveryFile::load(&discovery_path).unwrap();
    let mut store = RecordStore::load(tmp.path()).unwrap();
    assert_eq!(apply_discoveries(&mut store, &discoveries), 1);

    let fischer = store.find(Kind::Gastro, "g-fischer").unwrap();
    assert_eq!(fischer.candidate_url.as_deref(), Some("https://fischerstube.example"));
    assert_eq!(fischer.candidate_source.as_deref(), Some("search"));
    assert_eq!(fischer.source, None);

    let krone = store.find(Kind::Gastro, "g-krone").unwrap();
    assert_eq!(krone.candidate_url, None);
}

#[test]
fn missing_discovery_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = DiscoveryFile::load(&tmp.path().join("nope.json")).unwrap_err();
    assert!(format!("{err:#}").contains("nope.json"));
}

const LINKS: ReviewLinks<'static> = ReviewLinks {
    site_url: "https://site.example",
    issues_url: "https://git.example/issues",
    lake: None,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

#[test]
fn review_queue_lists_only_unverified_records() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture(tmp.path());
    let store = RecordStore::load(tmp.path()).unwrap();

    let links = LINKS;
    let ids: Vec<&str> = review_queue(&store, &links, 10)
        .iter()
        .map(|e| e.record.id.as_str())
        .collect();
    assert_eq!(ids, vec!["g-seeblick", "g-seeblick-2", "g-fischer"]);
}

#[test]
fn curation_tools_work_on_a_lake_with_missing_files() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("harbors.json"), "[]\n").unwrap();
    std::fs::write(tmp.path().join("rentals.json"), "[]\n").unwrap();
    std::fs::write(tmp.path().join("gastros.json"), GASTROS).unwrap();

    assert!(RecordStore::load(tmp.path()).is_err());
    let mut store = RecordStore::load_lenient(tmp.path()).unwrap();

    assert_eq!(review_queue(&store, &LINKS, 10).len(), 3);
    assert_eq!(sanitize_store(&mut store).changed, 1);
    assert_eq!(dedup_store(&mut store, DEFAULT_MAX_DISTANCE_M).removed, 1);
    store.save().unwrap();

    assert!(!tmp.path().join("anchors.json").exists());
    assert!(!tmp.path().join("services.json").exists());
    let store = RecordStore::load_lenient(tmp.path()).unwrap();
    assert_eq!(store.records(Kind::Gastro).len(), 3);
}

/// The issue body a reviewer sees for the first queued record.
fn first_issue_body(store: &RecordStore) -> String {
    let entries = review_queue(store, &LINKS, 1);
    let issue_url = &entries[0].issue_url;
    let query = issue_url.split_once('?').unwrap().1;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "body")
        .map(|(_, body)| body.into_owned())
        .unwrap()
}

#[test]
fn ok_reply_to_a_queue_issue_verifies_the_candidate() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture(tmp.path());
    let mut store = RecordStore::load(tmp.path()).unwrap();
    sanitize_store(&mut store);

    let body = first_issue_body(&store);
    let request = ManualPromotion::resolve(None, None, Some(&body), "ok").unwrap();
    assert_eq!(request.kind, Kind::Gastro);
    assert_eq!(request.id, "g-seeblick");

    let outcome = apply_manual_promotion(&mut store, &request, today()).unwrap();
    assert_eq!(outcome.source, "https://seeblick.example/");
    assert_eq!(outcome.file, "gastros.json");
    store.save().unwrap();

    let store = RecordStore::load(tmp.path()).unwrap();
    let seeblick = store.find(Kind::Gastro, "g-seeblick").unwrap();
    assert!(is_verified(seeblick));
    assert_eq!(seeblick.url.as_deref(), Some("https://seeblick.example/"));
    assert_eq!(seeblick.last_verified.as_deref(), Some("2026-10-19"));
    assert_eq!(seeblick.candidate_url, None);
    assert_eq!(seeblick.candidate_source, None);
    assert_eq!(seeblick.extra_str(CANDIDATE_URL_KIND), None);
    assert_eq!(seeblick.extra_str("openingHours"), Some("Mo-So 11-22"));
}

#[test]
fn source_reply_overrides_and_is_checked() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture(tmp.path());
    let mut store = RecordStore::load(tmp.path()).unwrap();

    let blocked = ManualPromotion::resolve(
        Some("gastro"),
        Some("g-fischer"),
        None,
        "source https://www.tripadvisor.de/fischerstube",
    )
    .unwrap();
    assert!(matches!(
        apply_manual_promotion(&mut store, &blocked, today()),
        Err(ManualError::RejectedSource { .. })
    ));

    let no_candidate =
        ManualPromotion::resolve(Some("gastro"), Some("g-fischer"), None, "ok").unwrap();
    assert_eq!(
        apply_manual_promotion(&mut store, &no_candidate, today()).unwrap_err(),
        ManualError::MissingCandidate
    );

    let unknown = ManualPromotion::resolve(Some("gastro"), Some("nope"), None, "ok").unwrap();
    assert!(matches!(
        apply_manual_promotion(&mut store, &unknown, today()),
        Err(ManualError::NotFound { .. })
    ));

    let official = ManualPromotion::resolve(
        Some("gastro"),
        Some("g-fischer"),
        None,
        "source https://fischerstube.example",
    )
    .unwrap();
    apply_manual_promotion(&mut store, &official, today()).unwrap();
    let fischer = store.find(Kind::Gastro, "g-fischer").unwrap();
    assert_eq!(fischer.source.as_deref(), Some("https://fischerstube.example"));
    assert!(is_verified(fischer));
}

const OSM_EXPORT: &str = r#"{"candidates": [
    {"kind": "marina", "name": "Hafen Prien", "lat": 47.86, "lng": 12.36, "osmType": "way", "osmId": 77,
     "website": "https://hafen-prien.example", "foundAt": "2026-10-01"},
    {"kind": "gastro", "name": "Seewirt", "lat": 47.85, "lng": 12.35, "osmType": "node", "osmId": 8,
     "tags": {"opening_hours": "Mo-Su 10:00-22:00"}},
    {"kind": "gastro", "name": "", "lat": 47.85, "lng": 12.35},
    {"kind": "fuel", "name": "Tankstelle", "lat": 47.8, "lng": 12.3}
]}"#;

#[test]
fn osm_import_bootstraps_a_new_lake_and_cleanup_removes_unverified_gastros() {
    let tmp = tempfile::tempdir().unwrap();
    let lake = tmp.path().join("lakes").join("chiemsee");
    let export = tmp.path().join("osm.json");
    std::fs::write(&export, OSM_EXPORT).unwrap();

    let file = OsmCandidateFile::load(&export).unwrap();
    let mut store = RecordStore::load_lenient(&lake).unwrap();
    assert_eq!(
        import_osm(&mut store, &file, today()),
        ImportReport { added: 2, touched: 2 }
    );
    store.save().unwrap();

    assert!(lake.join("harbors.json").exists());
    assert!(lake.join("gastros.json").exists());
    assert!(!lake.join("rentals.json").exists());
    assert!(!lake.join("anchors.json").exists());

    let mut store = RecordStore::load_lenient(&lake).unwrap();
    let harbor = store.find(Kind::Harbor, "osm-way-77-hafen-prien").unwrap();
    assert_eq!(harbor.candidate_url.as_deref(), Some("https://hafen-prien.example"));
    assert_eq!(harbor.candidate_found_at.as_deref(), Some("2026-10-01"));
    assert_eq!(harbor.source, None);
    let seewirt = store.find(Kind::Gastro, "osm-node-8-seewirt").unwrap();
    assert_eq!(seewirt.extra_str("candidateHours"), Some("Mo-Su 10:00-22:00"));

    // A second import matches the same ids instead of adding.
    assert_eq!(
        import_osm(&mut store, &file, today()),
        ImportReport { added: 0, touched: 2 }
    );

    assert_eq!(
        cleanup_osm_gastros(&mut store),
        CleanupReport { kept: 0, removed: 1 }
    );
    store.save().unwrap();
    assert_eq!(std::fs::read_to_string(lake.join("gastros.json")).unwrap(), "[]\n");
}

#[test]
fn cleanup_without_a_gastro_file_reports_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = RecordStore::load_lenient(tmp.path()).unwrap();
    assert_eq!(cleanup_osm_gastros(&mut store), CleanupReport::default());
    store.save().unwrap();
    assert!(!tmp.path().join("gastros.json").exists());
}

use serde::{Deserialize, Serialize};

use crate::types::{Kind, Record};

/// Sentinel the country selector uses for "no constraint".
pub const ALL_COUNTRIES: &str = "ALL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Overnight {
    #[default]
    Any,
    Yes,
    No,
}

impl Overnight {
    pub fn parse(s: &str) -> Overnight {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Overnight::Yes,
            "NO" => Overnight::No,
            _ => Overnight::Any,
        }
    }
}

/// Raw filter values as the UI hands them over. Everything is a string so a
/// half-typed bound like `"3,"` can sit in state without being an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterInput {
    pub q: String,
    pub country: String,
    pub overnight: Overnight,
    pub min_depth: String,
    pub min_draft: String,
    pub min_guest_berths: String,
}

impl Default for FilterInput {
    fn default() -> Self {
        Self {
            q: String::new(),
            country: ALL_COUNTRIES.to_string(),
            overnight: Overnight::Any,
            min_depth: String::new(),
            min_draft: String::new(),
            min_guest_berths: String::new(),
        }
    }
}

impl FilterInput {
    pub fn to_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            query: self.q.trim().to_string(),
            country: parse_country(&self.country),
            overnight: self.overnight,
            min_depth: parse_bound(&self.min_depth),
            min_draft: parse_bound(&self.min_draft),
            min_guest_berths: parse_bound(&self.min_guest_berths),
        }
    }
}

/// Parsed filter criteria. `None` / empty / `Any` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub query: String,
    /// Upper-cased country code; `None` for all countries.
    pub country: Option<String>,
    /// Anchors only.
    pub overnight: Overnight,
    /// Anchors only, meters.
    pub min_depth: Option<f64>,
    /// Harbors only, meters.
    pub min_draft: Option<f64>,
    /// Harbors only.
    pub min_guest_berths: Option<f64>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self == &FilterCriteria::default()
    }

    /// Whether a single record of `kind` passes every active constraint.
    pub fn matches(&self, kind: Kind, record: &Record) -> bool {
        if let Some(country) = &self.country {
            let own = record.country.as_deref().unwrap_or("").trim();
            if !own.eq_ignore_ascii_case(country) {
                return false;
            }
        }

        if !self.query.is_empty() && !matches_query(record, &self.query) {
            return false;
        }

        match kind {
            Kind::Anchor => {
                let overnight_ok = match self.overnight {
                    Overnight::Any => true,
                    Overnight::Yes => record.allows_overnight(),
                    Overnight::No => !record.allows_overnight(),
                };
                overnight_ok
                    && self
                        .min_depth
                        .map_or(true, |min| record.depth_reference_m() >= min)
            }
            Kind::Harbor => {
                self.min_draft.map_or(true, |min| record.max_draft() >= min)
                    && self
                        .min_guest_berths
                        .map_or(true, |min| f64::from(record.guest_berth_count()) >= min)
            }
            Kind::Rental | Kind::Gastro | Kind::Service => true,
        }
    }
}

/// Filter a collection of `kind` records. Stable: survivors keep their order.
pub fn apply_filters<'a, I>(records: I, kind: Kind, criteria: &FilterCriteria) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|r| criteria.matches(kind, r))
        .collect()
}

/// Parse a numeric lower bound. Accepts a comma decimal separator.
/// Anything that is not a finite number means "no bound".
pub fn parse_bound(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_country(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_COUNTRIES) {
        None
    } else {
        Some(trimmed.to_ascii_uppercase())
    }
}

/// The text a free-text query is matched against.
pub fn search_haystack(record: &Record) -> String {
    let features = record.features().join(" ");
    [
        record.name.as_deref(),
        record.location.as_deref(),
        record.region.as_deref(),
        Some(features.as_str()),
        record.details.as_deref(),
        record.ground.as_deref(),
        record.protection.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

fn matches_query(record: &Record, query: &str) -> bool {
    search_haystack(record)
        .to_lowercase()
        .contains(&query.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(id: &str, depth_max: Option<f64>) -> Record {
        let mut r = Record::new(id);
        r.depth_max_m = depth_max;
        r
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn empty_criteria_returns_input_unchanged() {
        let records = vec![Record::new("b"), Record::new("a"), Record::new("c")];
        for kind in Kind::ALL {
            let out = apply_filters(&records, kind, &FilterCriteria::default());
            assert_eq!(ids(&out), vec!["b", "a", "c"]);
        }
    }

    #[test]
    fn comma_decimal_min_depth() {
        let records = vec![anchor("shallow", Some(2.5)), anchor("deep", Some(4.0))];
        let criteria = FilterInput {
            min_depth: "3,0".into(),
            ..FilterInput::default()
        }
        .to_criteria();
        let out = apply_filters(&records, Kind::Anchor, &criteria);
        assert_eq!(ids(&out), vec!["deep"]);
    }

    #[test]
    fn min_depth_falls_back_to_min_then_zero() {
        let mut only_min = Record::new("only-min");
        only_min.depth_min_m = Some(3.5);
        let nothing = Record::new("nothing");
        let records = vec![only_min, nothing];

        let criteria = FilterCriteria {
            min_depth: Some(3.0),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply_filters(&records, Kind::Anchor, &criteria)), vec!["only-min"]);

        let zero = FilterCriteria {
            min_depth: Some(0.0),
            ..FilterCriteria::default()
        };
        assert_eq!(apply_filters(&records, Kind::Anchor, &zero).len(), 2);
    }

    #[test]
    fn non_numeric_bound_is_ignored() {
        assert_eq!(parse_bound("abc"), None);
        assert_eq!(parse_bound(""), None);
        assert_eq!(parse_bound("  "), None);
        assert_eq!(parse_bound("NaN"), None);
        assert_eq!(parse_bound("inf"), None);
        assert_eq!(parse_bound(" 2,5 "), Some(2.5));
        assert_eq!(parse_bound("4"), Some(4.0));

        let records = vec![anchor("a", Some(1.0))];
        let criteria = FilterInput {
            min_depth: "deep".into(),
            ..FilterInput::default()
        }
        .to_criteria();
        assert_eq!(apply_filters(&records, Kind::Anchor, &criteria).len(), 1);
    }

    #[test]
    fn anchor_only_constraints_do_not_touch_other_kinds() {
        let records = vec![Record::new("h1")];
        let criteria = FilterCriteria {
            overnight: Overnight::Yes,
            min_depth: Some(10.0),
            ..FilterCriteria::default()
        };
        assert_eq!(apply_filters(&records, Kind::Harbor, &criteria).len(), 1);
        assert!(apply_filters(&records, Kind::Anchor, &criteria).is_empty());
    }

    #[test]
    fn overnight_tristate() {
        let mut yes = Record::new("yes");
        yes.overnight = Some(true);
        let mut no = Record::new("no");
        no.overnight = Some(false);
        let absent = Record::new("absent");
        let records = vec![yes, no, absent];

        let only = |o: Overnight| {
            let criteria = FilterCriteria {
                overnight: o,
                ..FilterCriteria::default()
            };
            ids(&apply_filters(&records, Kind::Anchor, &criteria))
        };
        assert_eq!(only(Overnight::Any), vec!["yes", "no", "absent"]);
        assert_eq!(only(Overnight::Yes), vec!["yes"]);
        assert_eq!(only(Overnight::No), vec!["no", "absent"]);
    }

    #[test]
    fn harbor_draft_and_guest_berths() {
        let mut big = Record::new("big");
        big.max_draft_m = Some(2.8);
        big.guest_berths = Some(40);
        let mut small = Record::new("small");
        small.max_draft_m = Some(1.2);
        small.guest_berths = Some(5);
        let unknown = Record::new("unknown");
        let records = vec![big, small, unknown];

        let criteria = FilterInput {
            min_draft: "1,5".into(),
            ..FilterInput::default()
        }
        .to_criteria();
        assert_eq!(ids(&apply_filters(&records, Kind::Harbor, &criteria)), vec!["big"]);

        let criteria = FilterInput {
            min_guest_berths: "5".into(),
            ..FilterInput::default()
        }
        .to_criteria();
        assert_eq!(
            ids(&apply_filters(&records, Kind::Harbor, &criteria)),
            vec!["big", "small"]
        );
    }

    #[test]
    fn country_is_case_insensitive_and_all_disables() {
        let mut ch = Record::new("ch");
        ch.country = Some("ch".into());
        let mut de = Record::new("de");
        de.country = Some("DE".into());
        let none = Record::new("none");
        let records = vec![ch, de, none];

        let by = |country: &str| {
            let criteria = FilterInput {
                country: country.into(),
                ..FilterInput::default()
            }
            .to_criteria();
            ids(&apply_filters(&records, Kind::Gastro, &criteria))
        };
        assert_eq!(by("CH"), vec!["ch"]);
        assert_eq!(by("de"), vec!["de"]);
        assert_eq!(by("ALL"), vec!["ch", "de", "none"]);
        assert_eq!(by("all"), vec!["ch", "de", "none"]);
    }

    #[test]
    fn query_matches_any_searchable_field() {
        let mut harbor = Record::new("h");
        harbor.name = Some("Yachthafen Lindau".into());
        harbor.features = Some(vec!["Tankstelle".into(), "Kran".into()]);
        let mut anchor = Record::new("a");
        anchor.name = Some("Bucht".into());
        anchor.ground = Some("Sand / Kies".into());
        let mut service = Record::new("s");
        service.details = Some("Segelmacher mit Abholservice".into());
        let records = vec![harbor, anchor, service];

        let q = |query: &str| {
            let criteria = FilterCriteria {
                query: query.into(),
                ..FilterCriteria::default()
            };
            ids(&apply_filters(&records, Kind::Service, &criteria))
        };
        assert_eq!(q("lindau"), vec!["h"]);
        assert_eq!(q("KRAN"), vec!["h"]);
        assert_eq!(q("kies"), vec!["a"]);
        assert_eq!(q("segelmacher"), vec!["s"]);
        assert_eq!(q("tankstelle kran"), vec!["h"]);
        assert!(q("lindau yacht").is_empty());
    }

    #[test]
    fn haystack_skips_missing_fields() {
        let mut r = Record::new("x");
        r.name = Some("Alpha".into());
        r.region = Some("Ost".into());
        assert_eq!(search_haystack(&r), "Alpha Ost");
    }

    #[test]
    fn filtering_is_idempotent() {
        let mut a = anchor("a", Some(5.0));
        a.overnight = Some(true);
        a.country = Some("AT".into());
        a.name = Some("Tiefe Bucht".into());
        let b = anchor("b", Some(2.0));
        let mut c = anchor("c", Some(6.0));
        c.country = Some("AT".into());
        c.name = Some("Bucht am Riff".into());
        let records = vec![a, b, c];

        let criteria = FilterInput {
            q: "bucht".into(),
            country: "at".into(),
            min_depth: "4".into(),
            ..FilterInput::default()
        }
        .to_criteria();

        let once = apply_filters(&records, Kind::Anchor, &criteria);
        let twice = apply_filters(once.iter().copied(), Kind::Anchor, &criteria);
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec!["a", "c"]);
    }

    #[test]
    fn default_input_is_empty_criteria() {
        assert!(FilterInput::default().to_criteria().is_empty());
    }
}

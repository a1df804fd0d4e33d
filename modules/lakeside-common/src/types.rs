use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};

// --- Kinds ---

/// The five record kinds of the catalog. Each kind lives in its own file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Harbor,
    Anchor,
    Rental,
    Gastro,
    Service,
}

impl Kind {
    /// All kinds in file order. Candidate queues and persistence follow this order.
    pub const ALL: [Kind; 5] = [
        Kind::Harbor,
        Kind::Anchor,
        Kind::Rental,
        Kind::Gastro,
        Kind::Service,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Kind::Harbor => "harbors.json",
            Kind::Anchor => "anchors.json",
            Kind::Rental => "rentals.json",
            Kind::Gastro => "gastros.json",
            Kind::Service => "services.json",
        }
    }

    /// Parse a kind from its singular or plural name (`harbor`, `harbors`).
    pub fn parse(s: &str) -> Option<Kind> {
        let s = s.trim().to_ascii_lowercase();
        let singular = s.strip_suffix('s').unwrap_or(&s);
        match singular {
            "harbor" => Some(Kind::Harbor),
            "anchor" => Some(Kind::Anchor),
            "rental" => Some(Kind::Rental),
            "gastro" => Some(Kind::Gastro),
            "service" => Some(Kind::Service),
            _ => None,
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Harbor => write!(f, "harbor"),
            Kind::Anchor => write!(f, "anchor"),
            Kind::Rental => write!(f, "rental"),
            Kind::Gastro => write!(f, "gastro"),
            Kind::Service => write!(f, "service"),
        }
    }
}

// --- Records ---

/// Pass-through tag classifying a candidate URL (social, aggregator, web, other).
pub const CANDIDATE_URL_KIND: &str = "candidateUrlKind";

/// One catalog entry.
///
/// The schema is shared by all kinds; kind-specific fields are simply absent
/// on other kinds. Fields this struct does not know about are kept in `extra`
/// and written back unchanged, so a whole-file rewrite never drops curated data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "compact_f64"
    )]
    #[schemars(with = "Option<f64>")]
    pub lat: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "compact_f64"
    )]
    #[schemars(with = "Option<f64>")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    // Harbor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub berths: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_berths: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "compact_f64"
    )]
    #[schemars(with = "Option<f64>")]
    pub max_draft_m: Option<f64>,

    // Anchor
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "compact_f64"
    )]
    #[schemars(with = "Option<f64>")]
    pub depth_min_m: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "compact_f64"
    )]
    #[schemars(with = "Option<f64>")]
    pub depth_max_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overnight: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection: Option<String>,

    // Rental
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_from: Option<String>,

    // Gastro
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub berthing: Option<String>,

    // Provenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<String>,

    // Candidate fields are always written, as null when unset.
    #[serde(default)]
    pub candidate_url: Option<String>,
    #[serde(default)]
    pub candidate_found_at: Option<String>,
    #[serde(default)]
    pub candidate_source: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    /// A bare record with only an id, useful as a starting point for fixtures.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            country: None,
            region: None,
            location: None,
            lat: None,
            lng: None,
            features: None,
            details: None,
            berths: None,
            guest_berths: None,
            max_draft_m: None,
            depth_min_m: None,
            depth_max_m: None,
            overnight: None,
            ground: None,
            protection: None,
            fleet_size: None,
            price_from: None,
            price: None,
            berthing: None,
            url: None,
            source: None,
            last_verified: None,
            candidate_url: None,
            candidate_found_at: None,
            candidate_source: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn features(&self) -> &[String] {
        self.features.as_deref().unwrap_or(&[])
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lng?))
    }

    /// Overnight stays allowed. Absent means no.
    pub fn allows_overnight(&self) -> bool {
        self.overnight.unwrap_or(false)
    }

    /// Depth compared against a minimum-depth filter: max depth, else min depth, else 0.
    pub fn depth_reference_m(&self) -> f64 {
        self.depth_max_m.or(self.depth_min_m).unwrap_or(0.0)
    }

    pub fn max_draft(&self) -> f64 {
        self.max_draft_m.unwrap_or(0.0)
    }

    pub fn guest_berth_count(&self) -> u32 {
        self.guest_berths.unwrap_or(0)
    }

    /// The trimmed authoritative URL, if any.
    pub fn authoritative_url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }

    /// The trimmed candidate URL, if any.
    pub fn candidate(&self) -> Option<&str> {
        non_empty(self.candidate_url.as_deref())
    }

    /// Turn the candidate URL into the authoritative url/source, stamped with `today`.
    /// Returns false (and leaves the record alone) when there is no candidate.
    pub fn promote_candidate(&mut self, today: NaiveDate) -> bool {
        let Some(url) = self.candidate().map(str::to_string) else {
            return false;
        };
        self.mark_verified(&url, today);
        true
    }

    /// Record `source` as url and source, verified `today`, and drop every
    /// candidate field including the `candidateUrlKind` tag.
    pub fn mark_verified(&mut self, source: &str, today: NaiveDate) {
        self.url = Some(source.to_string());
        self.source = Some(source.to_string());
        self.last_verified = Some(today.format("%Y-%m-%d").to_string());
        self.candidate_url = None;
        self.candidate_found_at = None;
        self.candidate_source = None;
        self.extra.shift_remove(CANDIDATE_URL_KIND);
    }

    /// Read an unknown (pass-through) string field.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Write integral floats without a fraction (`47` rather than `47.0`), so
/// untouched coordinates and depths survive a rewrite byte-for-byte.
fn compact_f64<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
            serializer.serialize_i64(*v as i64)
        }
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_none(),
    }
}

// --- Geo ---

/// Haversine great-circle distance between two lat/lng points in meters.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

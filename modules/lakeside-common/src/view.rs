//! Explicit application state for the catalog page and the pure derive step
//! that turns (store, state) into what the page renders.
//!
//! Flow: a [`ViewEvent`] updates the [`ViewState`], [`derive_view`] recomputes
//! the per-kind lists, coverage and backlog, and the renderer draws them.
//! Preferences that outlive a page load go through a [`Preferences`] store
//! at two points only: [`ViewState::restore`] on load and
//! [`ViewState::persist`] after a change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{LakesideError, Result};
use crate::filter::{apply_filters, FilterInput, Overnight};
use crate::quality::{compute_backlog, compute_coverage, is_verified, Backlog, Coverage};
use crate::store::RecordStore;
use crate::types::{Kind, Record};

pub const PREF_LANG: &str = "bs_lang";
pub const PREF_SHOW_UNVERIFIED: &str = "bs_show_unverified";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    De,
    En,
}

impl Lang {
    /// Only `de` and `en` are supported; anything else is `None`.
    pub fn parse(s: &str) -> Option<Lang> {
        match s.trim() {
            "de" => Some(Lang::De),
            "en" => Some(Lang::En),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::De => "de",
            Lang::En => "en",
        }
    }
}

/// Key-value store for user preferences.
pub trait Preferences {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, String>>,
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| LakesideError::Preferences("lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept in a small JSON object file. The file is read on every
/// `get` and rewritten on every `set`; it holds a handful of keys.
#[derive(Debug, Clone)]
pub struct JsonFilePreferences {
    path: PathBuf,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| LakesideError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(LakesideError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Preferences for JsonFilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().ok()?.remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        let mut text = serde_json::to_string_pretty(&values)?;
        text.push('\n');
        std::fs::write(&self.path, text).map_err(|source| LakesideError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Everything the page needs to know besides the data itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub lang: Lang,
    pub filters: FilterInput,
    pub show_unverified: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            lang: Lang::De,
            filters: FilterInput::default(),
            show_unverified: true,
        }
    }
}

/// A single user interaction. The latest event for a field wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Query(String),
    Country(String),
    Overnight(Overnight),
    MinDepth(String),
    MinDraft(String),
    MinGuestBerths(String),
    ShowUnverified(bool),
    Lang(Lang),
    ResetFilters,
}

impl ViewEvent {
    /// Whether the event changes a value that is persisted across loads.
    pub fn touches_preferences(&self) -> bool {
        matches!(self, ViewEvent::ShowUnverified(_) | ViewEvent::Lang(_))
    }
}

impl ViewState {
    /// Initial state for a page load, read from stored preferences.
    pub fn restore(prefs: &dyn Preferences) -> Self {
        let lang = prefs
            .get(PREF_LANG)
            .and_then(|v| Lang::parse(&v))
            .unwrap_or_default();
        let show_unverified = prefs
            .get(PREF_SHOW_UNVERIFIED)
            .map(|v| v != "0" && v != "false")
            .unwrap_or(true);
        Self {
            lang,
            filters: FilterInput::default(),
            show_unverified,
        }
    }

    pub fn persist(&self, prefs: &dyn Preferences) -> Result<()> {
        prefs.set(PREF_LANG, self.lang.as_str())?;
        prefs.set(
            PREF_SHOW_UNVERIFIED,
            if self.show_unverified { "1" } else { "0" },
        )
    }

    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Query(q) => self.filters.q = q,
            ViewEvent::Country(c) => self.filters.country = c,
            ViewEvent::Overnight(o) => self.filters.overnight = o,
            ViewEvent::MinDepth(v) => self.filters.min_depth = v,
            ViewEvent::MinDraft(v) => self.filters.min_draft = v,
            ViewEvent::MinGuestBerths(v) => self.filters.min_guest_berths = v,
            ViewEvent::ShowUnverified(show) => self.show_unverified = show,
            ViewEvent::Lang(lang) => self.lang = lang,
            ViewEvent::ResetFilters => self.filters = FilterInput::default(),
        }
    }

    /// Apply an event and write preferences if it touched one.
    pub fn dispatch(&mut self, event: ViewEvent, prefs: &dyn Preferences) -> Result<()> {
        let persist = event.touches_preferences();
        self.apply(event);
        if persist {
            self.persist(prefs)?;
        }
        Ok(())
    }
}

/// One kind's slice of a render cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindView<'a> {
    pub kind: Kind,
    pub records: Vec<&'a Record>,
    /// Coverage of the whole collection, independent of filters.
    pub coverage: Coverage,
    pub backlog: Backlog<'a>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogView<'a> {
    pub kinds: Vec<KindView<'a>>,
}

impl<'a> CatalogView<'a> {
    pub fn kind(&self, kind: Kind) -> Option<&KindView<'a>> {
        self.kinds.iter().find(|k| k.kind == kind)
    }

    /// Coverage across all kinds.
    pub fn overall_coverage(&self) -> Coverage {
        let (total, verified) = self.kinds.iter().fold((0, 0), |(t, v), k| {
            (t + k.coverage.total, v + k.coverage.verified)
        });
        let pct = if total == 0 {
            0
        } else {
            (100.0 * verified as f64 / total as f64).round() as u32
        };
        Coverage {
            total,
            verified,
            pct,
        }
    }
}

/// Recompute everything the page shows from the store and the current state.
pub fn derive_view<'a>(store: &'a RecordStore, state: &ViewState) -> CatalogView<'a> {
    let criteria = state.filters.to_criteria();
    let kinds = Kind::ALL
        .iter()
        .map(|&kind| {
            let all = store.records(kind);
            let mut records = apply_filters(all, kind, &criteria);
            if !state.show_unverified {
                records.retain(|r| is_verified(r));
            }
            KindView {
                kind,
                records,
                coverage: compute_coverage(all),
                backlog: compute_backlog(all),
            }
        })
        .collect();
    CatalogView { kinds }
}

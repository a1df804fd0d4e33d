use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{LakesideError, Result};
use crate::types::{Kind, Record};

/// Directory holding the five record files, optionally scoped to one lake
/// (`<root>/lakes/<slug>`).
pub fn resolve_data_dir(root: &Path, lake: Option<&str>) -> PathBuf {
    match lake.map(str::trim).filter(|l| !l.is_empty()) {
        Some(slug) => root.join("lakes").join(slug),
        None => root.to_path_buf(),
    }
}

/// All records of one kind, as read from its file.
///
/// The key order each record had on disk is remembered by id, so a rewrite
/// only moves keys that were added.
#[derive(Debug, Clone)]
pub struct Collection {
    pub kind: Kind,
    pub path: PathBuf,
    pub records: Vec<Record>,
    key_orders: HashMap<String, Vec<String>>,
    on_disk: bool,
}

impl Collection {
    pub fn new(kind: Kind, path: PathBuf, records: Vec<Record>) -> Self {
        Self {
            kind,
            path,
            records,
            key_orders: HashMap::new(),
            on_disk: true,
        }
    }

    /// Stand-in for a file that does not exist. Saved only once it holds records.
    pub fn missing(kind: Kind, path: PathBuf) -> Self {
        Self {
            on_disk: false,
            ..Self::new(kind, path, Vec::new())
        }
    }

    pub fn load(kind: Kind, path: PathBuf) -> Result<Self> {
        let text = std::fs::read_to_string(&path).map_err(|source| LakesideError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_json(kind, path, &text)
    }

    /// Like [`Collection::load`], but a missing file is an empty collection.
    pub fn load_or_missing(kind: Kind, path: PathBuf) -> Result<Self> {
        if path.exists() {
            Self::load(kind, path)
        } else {
            debug!(kind = %kind, path = %path.display(), "Collection file missing, treated as empty");
            Ok(Self::missing(kind, path))
        }
    }

    pub fn from_json(kind: Kind, path: PathBuf, text: &str) -> Result<Self> {
        let parse_err = |source| LakesideError::Parse {
            path: path.clone(),
            source,
        };
        let records: Vec<Record> = serde_json::from_str(text).map_err(parse_err)?;
        let raw: Vec<Map<String, Value>> = serde_json::from_str(text).map_err(parse_err)?;

        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.id.as_str()) {
                return Err(LakesideError::DuplicateId {
                    kind,
                    id: record.id.clone(),
                    path,
                });
            }
        }

        let key_orders: HashMap<String, Vec<String>> = records
            .iter()
            .zip(&raw)
            .map(|(record, object)| (record.id.clone(), object.keys().cloned().collect()))
            .collect();

        Ok(Self {
            key_orders,
            ..Self::new(kind, path, records)
        })
    }

    /// Pretty JSON with a trailing newline, the format curators diff against.
    pub fn to_json(&self) -> Result<String> {
        let objects = self
            .records
            .iter()
            .map(|record| self.ordered(record))
            .collect::<Result<Vec<_>>>()?;
        let mut text = serde_json::to_string_pretty(&objects)?;
        text.push('\n');
        Ok(text)
    }

    /// Serialize `record` with its keys in on-disk order, new keys appended.
    fn ordered(&self, record: &Record) -> Result<Value> {
        let fresh = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            other => return Ok(other),
        };
        let Some(order) = self.key_orders.get(&record.id) else {
            return Ok(Value::Object(fresh));
        };

        let mut out = Map::with_capacity(fresh.len());
        for key in order {
            if let Some(value) = fresh.get(key) {
                out.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &fresh {
            if !out.contains_key(key) {
                out.insert(key.clone(), value.clone());
            }
        }
        Ok(Value::Object(out))
    }

    /// Rewrite the whole file. A collection whose file never existed and
    /// that is still empty is not created.
    pub fn save(&self) -> Result<()> {
        if !self.on_disk && self.records.is_empty() {
            return Ok(());
        }
        let text = self.to_json()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LakesideError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, text).map_err(|source| LakesideError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(kind = %self.kind, path = %self.path.display(), records = self.records.len(), "Wrote collection");
        Ok(())
    }
}

/// The five collections of one data directory, loaded once per run.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
    collections: Vec<Collection>,
}

impl RecordStore {
    /// Load all five files; a missing or malformed file fails the whole load.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_with(dir, Collection::load)
    }

    /// Load whatever files exist; missing kinds are empty and are not
    /// created on save unless records were added. Malformed files still fail.
    pub fn load_lenient(dir: &Path) -> Result<Self> {
        Self::load_with(dir, Collection::load_or_missing)
    }

    fn load_with<F>(dir: &Path, load: F) -> Result<Self>
    where
        F: Fn(Kind, PathBuf) -> Result<Collection>,
    {
        let collections = Kind::ALL
            .iter()
            .map(|&kind| load(kind, dir.join(kind.file_name())))
            .collect::<Result<Vec<_>>>()?;

        let store = Self {
            dir: dir.to_path_buf(),
            collections,
        };
        info!(
            dir = %dir.display(),
            records = store.iter().count(),
            "Loaded record store"
        );
        Ok(store)
    }

    /// Build a store from in-memory collections (kinds missing from the input are empty).
    pub fn from_collections(dir: &Path, mut collections: Vec<Collection>) -> Self {
        for kind in Kind::ALL {
            if !collections.iter().any(|c| c.kind == kind) {
                collections.push(Collection::missing(kind, dir.join(kind.file_name())));
            }
        }
        collections.sort_by_key(|c| c.kind);
        Self {
            dir: dir.to_path_buf(),
            collections,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn collections_mut(&mut self) -> &mut [Collection] {
        &mut self.collections
    }

    pub fn records(&self, kind: Kind) -> &[Record] {
        self.collections
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.records.as_slice())
            .unwrap_or(&[])
    }

    pub fn records_mut(&mut self, kind: Kind) -> Option<&mut Vec<Record>> {
        self.collections
            .iter_mut()
            .find(|c| c.kind == kind)
            .map(|c| &mut c.records)
    }

    /// Every record with its kind, in file then record order.
    pub fn iter(&self) -> impl Iterator<Item = (Kind, &Record)> + '_ {
        self.collections
            .iter()
            .flat_map(|c| c.records.iter().map(move |r| (c.kind, r)))
    }

    pub fn find(&self, kind: Kind, id: &str) -> Option<&Record> {
        self.records(kind).iter().find(|r| r.id == id)
    }

    pub fn find_mut(&mut self, kind: Kind, id: &str) -> Option<&mut Record> {
        self.records_mut(kind)?.iter_mut().find(|r| r.id == id)
    }

    pub fn save(&self) -> Result<()> {
        for collection in &self.collections {
            collection.save()?;
        }
        info!(dir = %self.dir.display(), "Persisted all collections");
        Ok(())
    }
}

//! Whole-document persistence.
//!
//! This module provides the `Database` document holding every project, the `Store` trait
//! callers persist it through, and `FileStore`, the JSON-file implementation. Every
//! mutation is load-entire, mutate in memory, save-entire.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{StoreError, TrackerError};
use crate::project::Project;

/// Every project, keyed by its decimal-string id.
///
/// An entry that does not decode as a project is held back as raw JSON: it is not listed
/// or editable, but it keeps its id reserved and is written back unchanged on save.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Database {
    pub projects: BTreeMap<String, Project>,
    unreadable: BTreeMap<String, Value>,
}

impl Database {
    /// Parse a document. Empty or malformed input yields an empty database.
    pub fn from_json(text: &str) -> Self {
        if text.trim().is_empty() {
            return Database::default();
        }
        match serde_json::from_str(text) {
            Ok(db) => db,
            Err(e) => {
                warn!(error = %e, "error parsing data file, starting fresh");
                Database::default()
            }
        }
    }

    /// Serialize with four-space indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut ser)?;
        // serde_json only ever emits UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Generate the next available project id: one past the largest numeric id, or `"1"`.
    ///
    /// Ids are compared and incremented as decimal strings, so there is no upper bound.
    pub fn next_id(&self) -> String {
        let max = self
            .projects
            .keys()
            .chain(self.unreadable.keys())
            .filter_map(|k| numeric_id(k))
            .max_by(|a, b| compare_digits(a, b));
        match max {
            Some(n) => increment(n),
            None => "1".to_string(),
        }
    }

    /// Projects in allocation order: numeric ids ascending, then any other keys.
    pub fn ordered(&self) -> Vec<(&str, &Project)> {
        let mut entries: Vec<(&str, &Project)> =
            self.projects.iter().map(|(k, p)| (k.as_str(), p)).collect();
        entries.sort_by(|(a, _), (b, _)| compare_ids(a, b));
        entries
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    /// Get a mutable reference to a project, or `NotFound`.
    pub fn get_mut(&mut self, id: &str) -> Result<&mut Project, TrackerError> {
        self.projects.get_mut(id).ok_or(TrackerError::NotFound)
    }

    /// Insert a new project under a freshly allocated id and return that id.
    pub fn create_project(&mut self, project: Project) -> String {
        let id = self.next_id();
        self.projects.insert(id.clone(), project);
        id
    }

    /// Remove the entry under `id`, readable or not. Returns whether anything was removed.
    pub fn delete_project(&mut self, id: &str) -> bool {
        let removed = self.projects.remove(id).is_some();
        self.unreadable.remove(id).is_some() || removed
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Ids of entries that did not decode as projects.
    pub fn unreadable_ids(&self) -> impl Iterator<Item = &str> {
        self.unreadable.keys().map(String::as_str)
    }
}

impl Serialize for Database {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut ids: Vec<&String> = self.projects.keys().chain(self.unreadable.keys()).collect();
        ids.sort_by(|a, b| compare_ids(a, b));
        let mut map = serializer.serialize_map(Some(ids.len()))?;
        for id in ids {
            if let Some(project) = self.projects.get(id) {
                map.serialize_entry(id, project)?;
            } else if let Some(raw) = self.unreadable.get(id) {
                map.serialize_entry(id, raw)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Database {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut db = Database::default();
        for (id, raw) in entries {
            match Project::deserialize(&raw) {
                Ok(project) => {
                    db.projects.insert(id, project);
                }
                Err(e) => {
                    warn!(%id, error = %e, "skipping unreadable project, keeping it as-is");
                    db.unreadable.insert(id, raw);
                }
            }
        }
        Ok(db)
    }
}

/// Ids are decimal digit strings; anything else is not a candidate for allocation.
/// Returns the digits without leading zeros.
fn numeric_id(id: &str) -> Option<&str> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = id.trim_start_matches('0');
    Some(if digits.is_empty() { "0" } else { digits })
}

/// Order two normalized digit strings by numeric value.
fn compare_digits(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Add one to a normalized digit string.
fn increment(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    for b in out.iter_mut().rev() {
        if *b == b'9' {
            *b = b'0';
        } else {
            *b += 1;
            return out.into_iter().map(char::from).collect();
        }
    }
    out.insert(0, b'1');
    out.into_iter().map(char::from).collect()
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    match (numeric_id(a), numeric_id(b)) {
        (Some(x), Some(y)) => compare_digits(x, y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Whole-document persistence. Implementations must never fail on load.
pub trait Store: Send + Sync {
    /// Read the full document; absent, empty or corrupt storage reads as empty.
    fn load(&self) -> Database;

    /// Replace the full document.
    fn save(&self, db: &Database) -> Result<(), StoreError>;
}

/// JSON file on local disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data file holding an empty document if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        self.save(&Database::default())
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl Store for FileStore {
    fn load(&self) -> Database {
        let mut buf = String::new();
        match File::open(&self.path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => Database::from_json(&buf),
            Err(e) if e.kind() == ErrorKind::NotFound => Database::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "error reading data file, starting fresh");
                Database::default()
            }
        }
    }

    /// Atomic-ish write: the new document is fully written to a temp file before it
    /// replaces the old one.
    fn save(&self, db: &Database) -> Result<(), StoreError> {
        let data = db.to_json()?;
        let tmp = self.temp_path();
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        f.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), projects = db.len(), "saved data file");
        Ok(())
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LedgerError;

/// Playback progress for one media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub current: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// The persisted media-path -> progress mapping.
///
/// Every mutation re-reads the whole file before merging a single key, so
/// edits made by an external process to *other* keys survive. The file is
/// rewritten in full via a sibling temp file and rename.
pub struct ProgressLedger {
    path: PathBuf,
}

impl ProgressLedger {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Initialise the backing store to an empty mapping on first run.
    pub fn ensure_exists(&self) -> Result<(), LedgerError> {
        if self.path.is_file() {
            return Ok(());
        }
        warn!("Progress log not found at `{}`", self.path.display());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| LedgerError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, b"{}").map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// The most recently attempted frame for `id`, or `default` when the
    /// item has no record. A missing or unreadable store also degrades to
    /// `default`; resuming too early is always safe.
    pub fn get(&self, id: &Path, default: u64) -> u64 {
        info!("Getting progress for `{}`", id.display());
        let Ok(document) = self.load_document() else {
            return default;
        };
        document
            .get(&key_for(id))
            .and_then(|value| value.get("current"))
            .and_then(Value::as_u64)
            .unwrap_or(default)
    }

    /// Merge one record into the store and rewrite it whole.
    ///
    /// A `total` of `None` or `Some(0)` leaves any previously stored total
    /// untouched. Corruption of the backing store is fatal here: blindly
    /// rewriting it would discard everyone else's progress.
    pub fn set(&self, id: &Path, current: u64, total: Option<u64>) -> Result<(), LedgerError> {
        let mut document = self.load_document()?;
        let key = key_for(id);

        debug!("Updating log for `{}` to frame #{current}", id.display());

        let total = match total {
            Some(0) | None => document
                .get(&key)
                .and_then(|value| value.get("total"))
                .and_then(Value::as_u64),
            known => known,
        };
        let record = ProgressRecord { current, total };
        document.insert(key, serde_json::to_value(record).expect("record is a plain struct"));

        let contents = serde_json::to_vec_pretty(&Value::Object(document))
            .expect("document was just built from valid values");
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents).map_err(|source| LedgerError::Io {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// All records in document order (insertion order for a file only this
    /// process writes). Values that are not progress objects are skipped.
    pub fn entries(&self) -> Result<Vec<(PathBuf, ProgressRecord)>, LedgerError> {
        let document = self.load_document()?;
        let mut records = Vec::with_capacity(document.len());
        for (key, value) in &document {
            let Some(current) = value.get("current").and_then(Value::as_u64) else {
                continue;
            };
            let total = value.get("total").and_then(Value::as_u64);
            records.push((PathBuf::from(key), ProgressRecord { current, total }));
        }
        Ok(records)
    }

    pub fn contains(&self, id: &Path) -> Result<bool, LedgerError> {
        Ok(self.load_document()?.contains_key(&key_for(id)))
    }

    fn load_document(&self) -> Result<Map<String, Value>, LedgerError> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Map::new());
            }
            Err(source) => {
                return Err(LedgerError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        match serde_json::from_slice::<Value>(&contents) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(other) => Err(LedgerError::Corrupt {
                path: self.path.clone(),
                source: serde::de::Error::custom(format!("expected an object, got {other}")),
            }),
            Err(source) => Err(LedgerError::Corrupt {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

fn key_for(id: &Path) -> String {
    id.to_string_lossy().into_owned()
}

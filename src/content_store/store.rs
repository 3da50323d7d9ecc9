//! Append-only content store
//!
//! Layout under the store directory:
//!
//! ```text
//! store.json      StoreParams
//! entries.json    ordered Vec<RecordedEntry>
//! contents/       one blob per entry, named "<n>.html"
//! snapshots/      store-local snapshots (see snapshot.rs)
//! ```

use log::{debug, info};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};
use super::types::{InsertRecord, RecordedEntry, StoreMode, StoreParams};
use crate::utils::write_atomic;

pub const STORE_PARAMS_FILE: &str = "store.json";
pub const STORE_ENTRIES_FILE: &str = "entries.json";
pub const CONTENTS_DIR: &str = "contents";
pub const SNAPSHOTS_DIR: &str = "snapshots";

pub(crate) struct StoreState {
    pub(crate) filename_counter: u64,
    /// All entries in `FullLoad`/`Fresh` mode; only unsaved ones in `Append` mode
    pub(crate) entries: Vec<RecordedEntry>,
}

/// Thread-safe store mapping a monotonically named blob to its metadata
pub struct ContentStore {
    pub(crate) dir: PathBuf,
    pub(crate) mode: StoreMode,
    pub(crate) state: Mutex<StoreState>,
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ContentStore")
            .field("dir", &self.dir)
            .field("mode", &self.mode)
            .field("filename_counter", &state.filename_counter)
            .field("in_memory_entries", &state.entries.len())
            .finish()
    }
}

pub(crate) fn read_params(path: &Path) -> StoreResult<StoreParams> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.display().to_string()));
    }
    serde_json::from_slice(&fs::read(path)?)
        .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))
}

pub(crate) fn read_entries(path: &Path) -> StoreResult<Vec<RecordedEntry>> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.display().to_string()));
    }
    serde_json::from_slice(&fs::read(path)?)
        .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))
}

pub(crate) fn write_state(dir: &Path, params: &StoreParams, entries: &[RecordedEntry]) -> StoreResult<()> {
    fs::create_dir_all(dir)?;
    write_atomic(&dir.join(STORE_PARAMS_FILE), &serde_json::to_vec_pretty(params)?)?;
    write_atomic(&dir.join(STORE_ENTRIES_FILE), &serde_json::to_vec_pretty(entries)?)?;
    Ok(())
}

impl ContentStore {
    /// Open the store at `dir` in the given mode
    ///
    /// `Fresh` removes anything already at `dir` and writes an empty,
    /// consistent store. The other modes require the parameter file and the
    /// entry log to exist.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing files and `Corrupt` for unreadable ones.
    pub fn open(dir: impl Into<PathBuf>, mode: StoreMode) -> StoreResult<Self> {
        let dir = dir.into();
        let state = match mode {
            StoreMode::Fresh => {
                if dir.exists() {
                    fs::remove_dir_all(&dir)?;
                }
                fs::create_dir_all(dir.join(CONTENTS_DIR))?;
                fs::create_dir_all(dir.join(SNAPSHOTS_DIR))?;
                write_state(&dir, &StoreParams { filename_counter: 0 }, &[])?;
                StoreState {
                    filename_counter: 0,
                    entries: Vec::new(),
                }
            }
            StoreMode::Append | StoreMode::FullLoad => {
                if !dir.exists() {
                    return Err(StoreError::NotFound(dir.display().to_string()));
                }
                let params = read_params(&dir.join(STORE_PARAMS_FILE))?;
                let entries_path = dir.join(STORE_ENTRIES_FILE);
                let entries = if mode == StoreMode::FullLoad {
                    read_entries(&entries_path)?
                } else if entries_path.exists() {
                    Vec::new()
                } else {
                    return Err(StoreError::NotFound(entries_path.display().to_string()));
                };
                fs::create_dir_all(dir.join(CONTENTS_DIR))?;
                StoreState {
                    filename_counter: params.filename_counter,
                    entries,
                }
            }
        };

        debug!(
            target: "snapcrawl::store",
            "Opened content store at {} (mode={mode}, entries in memory={})",
            dir.display(),
            state.entries.len()
        );

        Ok(Self {
            dir,
            mode,
            state: Mutex::new(state),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    #[must_use]
    pub fn contents_dir(&self) -> PathBuf {
        self.dir.join(CONTENTS_DIR)
    }

    /// Entries held in memory (in `Append` mode, only those not yet saved)
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the in-memory entries, in insertion order
    #[must_use]
    pub fn entries(&self) -> Vec<RecordedEntry> {
        self.state.lock().entries.clone()
    }

    #[must_use]
    pub fn content_path(&self, entry: &RecordedEntry) -> PathBuf {
        self.contents_dir().join(&entry.content_filename)
    }

    /// Read the stored bytes for `entry`
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` if the blob is missing.
    pub fn read_content(&self, entry: &RecordedEntry) -> StoreResult<Vec<u8>> {
        let path = self.content_path(entry);
        if !path.exists() {
            return Err(StoreError::Corrupt(format!(
                "blob {} for {} is missing",
                path.display(),
                entry.url
            )));
        }
        Ok(fs::read(path)?)
    }

    /// Persist `record`'s bytes under a fresh filename and log it
    ///
    /// Creates exactly one file. Names come from a monotonically increasing
    /// counter; a name that already exists on disk is skipped.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the blob cannot be written; the log is untouched then.
    pub fn insert(&self, record: InsertRecord) -> StoreResult<RecordedEntry> {
        let contents = self.contents_dir();
        let mut state = self.state.lock();

        let mut filename = format!("{}.html", state.filename_counter);
        state.filename_counter += 1;
        while contents.join(&filename).exists() {
            filename = format!("{}.html", state.filename_counter);
            state.filename_counter += 1;
        }

        fs::create_dir_all(&contents)?;
        fs::write(contents.join(&filename), &record.content)?;

        let entry = RecordedEntry {
            content_filename: filename,
            url: record.url,
            title: record.title,
            fetched_at: record.fetched_at,
        };
        state.entries.push(entry.clone());
        Ok(entry)
    }

    /// Flush parameters and the entry log to disk
    ///
    /// In `Append` mode this reads the on-disk log, extends it with the
    /// unsaved entries and rewrites it, then forgets the merged entries.
    /// Costly for large logs; call at epoch boundaries, not per insert.
    ///
    /// # Errors
    ///
    /// Returns IO or serialization errors, or `Corrupt` if the existing log
    /// cannot be read in `Append` mode.
    pub fn save(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        let params = StoreParams {
            filename_counter: state.filename_counter,
        };

        if self.mode == StoreMode::Append {
            let mut log = read_entries(&self.dir.join(STORE_ENTRIES_FILE))?;
            let merged = state.entries.len();
            log.extend(state.entries.drain(..));
            write_state(&self.dir, &params, &log)?;
            info!(
                target: "snapcrawl::store",
                "Saved content store {} ({merged} new, {} total)",
                self.dir.display(),
                log.len()
            );
        } else {
            write_state(&self.dir, &params, &state.entries)?;
            info!(
                target: "snapcrawl::store",
                "Saved content store {} ({} entries)",
                self.dir.display(),
                state.entries.len()
            );
        }
        Ok(())
    }

    /// Complete entry log: on-disk plus unsaved entries in `Append` mode
    pub(crate) fn full_log(&self, state: &StoreState) -> StoreResult<Vec<RecordedEntry>> {
        if self.mode == StoreMode::Append {
            let mut log = read_entries(&self.dir.join(STORE_ENTRIES_FILE))?;
            log.extend(state.entries.iter().cloned());
            Ok(log)
        } else {
            Ok(state.entries.clone())
        }
    }
}

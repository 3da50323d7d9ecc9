//! Point-in-time snapshots of a content store
//!
//! A snapshot holds the parameters and the complete entry log, never the
//! blobs. Restoring treats the snapshot log as authoritative and deletes
//! every blob it does not reference, which rolls the visible content back to
//! exactly what the snapshot recorded.

use log::info;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};
use super::store::{
    CONTENTS_DIR, ContentStore, SNAPSHOTS_DIR, STORE_ENTRIES_FILE, STORE_PARAMS_FILE, StoreState,
    read_entries, read_params, write_state,
};
use super::types::{StoreMode, StoreParams};
use crate::utils::{build_dir_atomically, prune_newer_subdirs};

impl ContentStore {
    /// Write parameters and the complete entry log into `target`
    ///
    /// # Errors
    ///
    /// Returns IO or serialization errors.
    pub fn snapshot_into(&self, target: &Path) -> StoreResult<()> {
        let state = self.state.lock();
        let params = StoreParams {
            filename_counter: state.filename_counter,
        };
        let log = self.full_log(&state)?;
        write_state(target, &params, &log)?;
        info!(
            target: "snapcrawl::store",
            "Content store snapshot written to {} ({} entries)",
            target.display(),
            log.len()
        );
        Ok(())
    }

    /// Snapshot into `<store>/snapshots/<name>`
    ///
    /// `name` must sort lexicographically in creation order; see
    /// [`crate::utils::snapshot_name`].
    ///
    /// # Errors
    ///
    /// Returns IO or serialization errors.
    pub fn snapshot(&self, name: &str) -> StoreResult<PathBuf> {
        build_dir_atomically(&self.dir.join(SNAPSHOTS_DIR), name, |staging| {
            self.snapshot_into(staging)
        })
    }

    /// Roll the store at `dir` back to the state recorded in `source`
    ///
    /// Copies the snapshot's parameters and log over the live ones, deletes
    /// unreferenced blobs and returns the store opened in `FullLoad` mode.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the snapshot is incomplete and `Corrupt` if it
    /// references a blob that no longer exists.
    pub fn restore_from(dir: impl Into<PathBuf>, source: &Path) -> StoreResult<Self> {
        let dir = dir.into();
        if !source.exists() {
            return Err(StoreError::NotFound(source.display().to_string()));
        }
        let params = read_params(&source.join(STORE_PARAMS_FILE))?;
        let entries = read_entries(&source.join(STORE_ENTRIES_FILE))?;

        let contents = dir.join(CONTENTS_DIR);
        fs::create_dir_all(&contents)?;

        let referenced: HashSet<&str> = entries
            .iter()
            .map(|e| e.content_filename.as_str())
            .collect();
        if let Some(missing) = entries
            .iter()
            .find(|e| !contents.join(&e.content_filename).exists())
        {
            return Err(StoreError::Corrupt(format!(
                "snapshot {} references missing blob {}",
                source.display(),
                missing.content_filename
            )));
        }

        write_state(&dir, &params, &entries)?;

        let mut removed = 0usize;
        for item in fs::read_dir(&contents)? {
            let item = item?;
            let name = item.file_name();
            let keep = name.to_str().is_some_and(|n| referenced.contains(n));
            if !keep && item.file_type()?.is_file() {
                fs::remove_file(item.path())?;
                removed += 1;
            }
        }

        info!(
            target: "snapcrawl::store",
            "Restored content store {} from {} ({} entries, {removed} orphaned blobs removed)",
            dir.display(),
            source.display(),
            entries.len()
        );

        Ok(Self {
            dir,
            mode: StoreMode::FullLoad,
            state: parking_lot::Mutex::new(StoreState {
                filename_counter: params.filename_counter,
                entries,
            }),
        })
    }

    /// Restore `<dir>/snapshots/<name>` and delete every newer store snapshot
    ///
    /// # Errors
    ///
    /// See [`ContentStore::restore_from`].
    pub fn restore_snapshot(dir: impl Into<PathBuf>, name: &str) -> StoreResult<Self> {
        let dir = dir.into();
        let snapshots = dir.join(SNAPSHOTS_DIR);
        let store = Self::restore_from(dir.clone(), &snapshots.join(name))?;
        let pruned = prune_newer_subdirs(&snapshots, name)?;
        if !pruned.is_empty() {
            info!(target: "snapcrawl::store", "Pruned newer store snapshots: {pruned:?}");
        }
        Ok(store)
    }
}

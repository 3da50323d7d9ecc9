//! Durable engine state: live save/open and named snapshots
//!
//! Layout of a crawl directory:
//!
//! ```text
//! <dir>/crawler.json          engine config + frontier contents
//! <dir>/met_urls/             seen sketch
//! <dir>/saved_urls/           saved sketch
//! <dir>/saved_files/          content store
//! <dir>/snapshots/<name>/     the same four entries at a point in time
//! ```
//!
//! A snapshot is assembled under `snapshots/.<name>.tmp` and renamed into
//! place when complete; dot-prefixed directories are never listed or loaded.
//! Snapshots never copy content blobs. The snapshot's store log is the
//! authority on restore and blobs it does not reference are deleted.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::engine::{CrawlEngine, EngineParts};
use super::crawl_types::{CrawlError, CrawlResult};
use super::frontier::Frontier;
use crate::config::CrawlConfig;
use crate::content_store::{ContentStore, StoreMode};
use crate::filters::FilterRegistry;
use crate::sketch::MembershipSketch;
use crate::utils::{
    build_dir_atomically, prune_newer_subdirs, replace_dir_with_copy, sorted_subdirs, write_atomic,
};

pub const ENGINE_PARAMS_FILE: &str = "crawler.json";
pub const MET_URLS_DIR: &str = "met_urls";
pub const SAVED_URLS_DIR: &str = "saved_urls";
pub const SAVED_FILES_DIR: &str = "saved_files";
pub const SNAPSHOTS_DIR: &str = "snapshots";

/// Contents of `crawler.json`
#[derive(Debug, Serialize, Deserialize)]
pub struct EngineState {
    pub config: CrawlConfig,
    pub frontier: Vec<String>,
}

/// Shared handles needed to persist an engine from a blocking task
#[derive(Clone)]
pub(crate) struct PersistHandle {
    config: CrawlConfig,
    frontier: Arc<Frontier>,
    met_urls: Arc<MembershipSketch>,
    saved_urls: Arc<MembershipSketch>,
    store: Arc<ContentStore>,
}

impl PersistHandle {
    fn write_engine_state(&self, path: &Path) -> CrawlResult<usize> {
        let state = EngineState {
            config: self.config.clone(),
            frontier: self.frontier.snapshot_contents(),
        };
        let queued = state.frontier.len();
        write_atomic(path, &serde_json::to_vec_pretty(&state)?)?;
        Ok(queued)
    }

    /// Write the live state into the crawl directory
    pub(crate) fn save(&self) -> CrawlResult<()> {
        let queued = self.write_engine_state(&self.config.storage_dir().join(ENGINE_PARAMS_FILE))?;
        self.met_urls.save(&self.config.met_urls_dir())?;
        self.saved_urls.save(&self.config.saved_urls_dir())?;
        self.store.save()?;
        info!(
            target: "snapcrawl::engine",
            "Saved crawl state to {} ({queued} queued, {} stored)",
            self.config.storage_dir().display(),
            self.store.len()
        );
        Ok(())
    }

    /// Write `snapshots/<name>` and return its path
    ///
    /// The parts are written into a hidden staging directory that only gets
    /// its final name once complete.
    pub(crate) fn snapshot(&self, name: &str) -> CrawlResult<PathBuf> {
        let snapshots = self.config.snapshots_dir();
        if snapshots.join(name).exists() {
            return Err(CrawlError::Snapshot(format!("snapshot {name} already exists")));
        }

        let mut queued = 0;
        let target = build_dir_atomically(&snapshots, name, |staging| -> CrawlResult<()> {
            queued = self.write_engine_state(&staging.join(ENGINE_PARAMS_FILE))?;
            self.met_urls.save(&staging.join(MET_URLS_DIR))?;
            self.saved_urls.save(&staging.join(SAVED_URLS_DIR))?;
            self.store.snapshot_into(&staging.join(SAVED_FILES_DIR))?;
            Ok(())
        })?;

        info!(
            target: "snapcrawl::engine",
            "Snapshot {name} created ({queued} queued, {} stored)",
            self.store.len()
        );
        Ok(target)
    }
}

fn read_engine_state(path: &Path) -> CrawlResult<EngineState> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Load a persisted config and point it at `dir`
fn restore_config(state_config: CrawlConfig, dir: &Path) -> CrawlResult<CrawlConfig> {
    let mut config = state_config;
    config.relocate(dir);
    Ok(config.validated()?)
}

impl CrawlEngine {
    pub(crate) fn persist_handle(&self) -> PersistHandle {
        PersistHandle {
            config: self.config.clone(),
            frontier: Arc::clone(&self.frontier),
            met_urls: Arc::clone(&self.met_urls),
            saved_urls: Arc::clone(&self.saved_urls),
            store: Arc::clone(&self.store),
        }
    }

    /// Persist the live state so `open` can pick it up
    ///
    /// Should not be called while workers run; the frontier copy and the
    /// sketches would not describe the same instant.
    ///
    /// # Errors
    ///
    /// Returns IO, serialization, sketch or store errors.
    pub fn save(&self) -> CrawlResult<()> {
        self.persist_handle().save()
    }

    /// Capture the engine as `snapshots/<name>`
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Snapshot` if the name is taken, otherwise IO,
    /// serialization, sketch or store errors.
    pub fn make_snapshot(&self, name: &str) -> CrawlResult<PathBuf> {
        let path = self.persist_handle().snapshot(name)?;
        self.progress.report_snapshot(name);
        Ok(path)
    }

    /// Reopen the live state last written by `save`
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::NotFound` if `dir` holds no `crawler.json`, and
    /// sketch, store or config errors if any part is missing or corrupt.
    pub fn open(dir: impl AsRef<Path>, registry: &FilterRegistry) -> CrawlResult<Self> {
        let dir = std::path::absolute(dir.as_ref())?;
        let params_path = dir.join(ENGINE_PARAMS_FILE);
        if !params_path.exists() {
            return Err(CrawlError::NotFound(params_path.display().to_string()));
        }
        let state = read_engine_state(&params_path)?;
        let config = restore_config(state.config, &dir)?;
        let profile = registry.resolve(config.filter_profile())?;

        let met_urls = MembershipSketch::load(&config.met_urls_dir())?;
        let saved_urls = MembershipSketch::load(&config.saved_urls_dir())?;
        let store = ContentStore::open(config.saved_files_dir(), StoreMode::FullLoad)?;

        info!(
            target: "snapcrawl::engine",
            "Opened crawl at {} ({} queued, {} stored)",
            dir.display(),
            state.frontier.len(),
            store.len()
        );

        Self::assemble(
            EngineParts {
                config,
                frontier_contents: state.frontier,
                met_urls,
                saved_urls,
                store,
            },
            profile,
        )
    }

    /// Roll the crawl at `dir` back to snapshot `name`
    ///
    /// The live sketches, engine parameters and store are replaced by the
    /// snapshot's, store blobs the snapshot does not reference are deleted,
    /// and every snapshot that sorts after `name` is removed.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Snapshot` if the snapshot does not exist, and
    /// sketch, store or config errors if it is incomplete or corrupt.
    pub fn load_snapshot(
        dir: impl AsRef<Path>,
        name: &str,
        registry: &FilterRegistry,
    ) -> CrawlResult<Self> {
        let dir = std::path::absolute(dir.as_ref())?;
        let snapshots = dir.join(SNAPSHOTS_DIR);
        let source = snapshots.join(name);
        if !source.is_dir() {
            return Err(CrawlError::Snapshot(format!(
                "snapshot {name} not found under {}",
                snapshots.display()
            )));
        }

        // Read everything before touching the live directory
        let state = read_engine_state(&source.join(ENGINE_PARAMS_FILE))?;
        let config = restore_config(state.config, &dir)?;
        let profile = registry.resolve(config.filter_profile())?;
        let met_urls = MembershipSketch::load(&source.join(MET_URLS_DIR))?;
        let saved_urls = MembershipSketch::load(&source.join(SAVED_URLS_DIR))?;

        let store = ContentStore::restore_from(config.saved_files_dir(), &source.join(SAVED_FILES_DIR))?;
        replace_dir_with_copy(&source.join(MET_URLS_DIR), &config.met_urls_dir())?;
        replace_dir_with_copy(&source.join(SAVED_URLS_DIR), &config.saved_urls_dir())?;
        let live_state = EngineState {
            config: config.clone(),
            frontier: state.frontier,
        };
        write_atomic(
            &dir.join(ENGINE_PARAMS_FILE),
            &serde_json::to_vec_pretty(&live_state)?,
        )?;

        let pruned = prune_newer_subdirs(&snapshots, name)?;
        if !pruned.is_empty() {
            info!(target: "snapcrawl::engine", "Pruned snapshots newer than {name}: {pruned:?}");
        }
        info!(
            target: "snapcrawl::engine",
            "Restored snapshot {name} ({} queued, {} stored)",
            live_state.frontier.len(),
            store.len()
        );

        Self::assemble(
            EngineParts {
                config: live_state.config,
                frontier_contents: live_state.frontier,
                met_urls,
                saved_urls,
                store,
            },
            profile,
        )
    }

    /// Restore the newest snapshot under `dir`
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Snapshot` if there is none, otherwise see
    /// [`CrawlEngine::load_snapshot`].
    pub fn load_latest(dir: impl AsRef<Path>, registry: &FilterRegistry) -> CrawlResult<Self> {
        let dir = dir.as_ref();
        let name = latest_snapshot(dir)?.ok_or_else(|| {
            CrawlError::Snapshot(format!("no snapshots under {}", dir.display()))
        })?;
        Self::load_snapshot(dir, &name, registry)
    }
}

/// Snapshot names under `dir`, oldest first
///
/// # Errors
///
/// Returns IO errors from reading the snapshots directory.
pub fn list_snapshots(dir: impl AsRef<Path>) -> CrawlResult<Vec<String>> {
    Ok(sorted_subdirs(&dir.as_ref().join(SNAPSHOTS_DIR))?)
}

/// Newest snapshot name under `dir`, if any
///
/// # Errors
///
/// Returns IO errors from reading the snapshots directory.
pub fn latest_snapshot(dir: impl AsRef<Path>) -> CrawlResult<Option<String>> {
    Ok(list_snapshots(dir)?.pop())
}

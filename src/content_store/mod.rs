//! Append-only, crash-consistent content store
//!
//! Maps a monotonically named blob file to its source URL, title and fetch
//! time. Supports three open modes and snapshot/restore.

pub mod errors;
pub mod snapshot;
pub mod store;
pub mod types;

pub use errors::{StoreError, StoreResult};
pub use store::{CONTENTS_DIR, ContentStore, STORE_ENTRIES_FILE, STORE_PARAMS_FILE};
pub use types::{InsertRecord, RecordedEntry, StoreMode, StoreParams};

pub mod constants;
pub mod fs_utils;
pub mod time_utils;
pub mod url_utils;

pub use constants::*;
pub use fs_utils::{
    build_dir_atomically, prune_newer_subdirs, replace_dir_with_copy, sorted_subdirs, staging_dir,
    write_atomic,
};
pub use time_utils::{SNAPSHOT_NAME_FORMAT, snapshot_name, snapshot_name_at};
pub use url_utils::{canonical_url, is_dqd_article_path, is_valid_url};

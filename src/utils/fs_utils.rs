//! Filesystem helpers shared by the sketch, store and engine persistence

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` via a sibling temp file, fsync, then rename
///
/// A crash mid-write leaves either the old file or the new one, never a torn file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    let mut file = fs::File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp_path, path)
}

/// Recursively copy `src` into `dst`, replacing whatever `dst` held
pub fn replace_dir_with_copy(src: &Path, dst: &Path) -> io::Result<()> {
    if dst.exists() {
        fs::remove_dir_all(dst)?;
    }
    copy_dir_all(src, dst)
}

fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

/// Hidden sibling of `parent/name` used while that directory is being built
pub fn staging_dir(parent: &Path, name: &str) -> PathBuf {
    parent.join(format!(".{name}.tmp"))
}

/// Build `parent/name` in a hidden staging directory, then rename it into place
///
/// `build` receives the staging path. Until the rename, `parent/name` does not
/// exist, so a crash mid-build never leaves a half-written directory under the
/// final name. Staging leftovers are dot-prefixed and ignored by
/// [`sorted_subdirs`]. An existing `parent/name` is replaced.
pub fn build_dir_atomically<E, F>(parent: &Path, name: &str, build: F) -> Result<PathBuf, E>
where
    E: From<io::Error>,
    F: FnOnce(&Path) -> Result<(), E>,
{
    let staging = staging_dir(parent, name);
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    if let Err(e) = build(&staging) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    let target = parent.join(name);
    if target.exists() {
        fs::remove_dir_all(&target)?;
    }
    fs::rename(&staging, &target)?;
    Ok(target)
}

/// Sorted names of the immediate subdirectories of `dir`; empty if `dir` is absent
///
/// Dot-prefixed names (staging leftovers) are skipped.
pub fn sorted_subdirs(dir: &Path) -> io::Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir()
            && let Some(name) = entry.file_name().to_str()
            && !name.starts_with('.')
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Remove every subdirectory of `dir` whose name sorts after `name`
///
/// Returns the removed names.
pub fn prune_newer_subdirs(dir: &Path, name: &str) -> io::Result<Vec<String>> {
    let mut removed = Vec::new();
    for other in sorted_subdirs(dir)? {
        if other.as_str() > name {
            fs::remove_dir_all(dir.join(&other))?;
            removed.push(other);
        }
    }
    Ok(removed)
}

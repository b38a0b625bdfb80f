//! Small filesystem helpers shared by the build phases.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::Result;

/// Copy the contents of `src` into `dst`, creating directories as needed.
/// Existing files in `dst` are overwritten.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Remove `dir` if it exists.
pub fn remove_dir_if_exists(dir: &Path) -> Result<bool> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Whether `dir` exists and has at least one entry.
pub fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

//! Default values shared by the CLI and the library.

use std::path::PathBuf;

/// Lines of captured output shown when an external command fails.
pub const DEFAULT_TAIL_LINES: usize = 20;

/// Returns the default storage root.
///
/// Uses the platform-appropriate local data directory:
/// - Linux: `~/.local/share/distforge`
/// - macOS: `~/Library/Application Support/distforge`
/// - Windows: `{FOLDERID_LocalAppData}\distforge`
///
/// Falls back to `.distforge` in the current directory if the platform
/// directory cannot be determined. Overridden by `--storage-dir`, the
/// `DISTFORGE_STORAGE` environment variable, or `storage_dir` in the
/// config file.
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("distforge"))
        .unwrap_or_else(|| PathBuf::from(".distforge"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_storage_dir_is_absolute_or_fallback() {
        let storage = default_storage_dir();
        assert!(
            storage.is_absolute() || storage == PathBuf::from(".distforge"),
            "Expected absolute path or fallback, got: {:?}",
            storage
        );
    }
}

//! Path utilities for tests.

use std::path::Path;

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Creates a temporary directory under `parent`, e.g. the current directory
/// for tests that need a relative data root.
pub fn temp_test_dir_in(parent: impl AsRef<Path>) -> tempfile::TempDir {
    tempfile::tempdir_in(parent).expect("Failed to create temporary test directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_test_dir_in_parent() {
        let parent = temp_test_dir();
        let dir = temp_test_dir_in(parent.path());
        assert!(dir.path().starts_with(parent.path()));
        assert!(dir.path().is_dir());
    }
}

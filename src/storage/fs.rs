use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

/// Result of an idempotent removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    AlreadyGone,
}

/// Removes a file, treating a missing file as success.
pub fn remove_file_idempotent(path: &Path) -> io::Result<Removal> {
    match fs::remove_file(path) {
        Ok(()) => Ok(Removal::Removed),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Removal::AlreadyGone),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_twice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, b"x").unwrap();

        assert_eq!(remove_file_idempotent(&path).unwrap(), Removal::Removed);
        assert_eq!(remove_file_idempotent(&path).unwrap(), Removal::AlreadyGone);
    }

    #[test]
    fn test_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d");
        fs::create_dir(&path).unwrap();

        assert!(remove_file_idempotent(&path).is_err());
        assert!(path.exists());
    }
}

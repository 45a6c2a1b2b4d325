use crate::core::{MarkerState, SegmentName};
use std::path::{Path, PathBuf};

pub const ARCHIVE_STATUS_DIR: &str = "archive_status";

/// Paths of a WAL directory and its archive-status subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalLayout {
    wal_dir: PathBuf,
    archive_status_dir: PathBuf,
}

impl WalLayout {
    pub fn new<P: AsRef<Path>>(wal_dir: P) -> Self {
        let wal_dir = wal_dir.as_ref().to_path_buf();
        let archive_status_dir = wal_dir.join(ARCHIVE_STATUS_DIR);
        Self {
            wal_dir,
            archive_status_dir,
        }
    }

    pub fn with_archive_status_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.archive_status_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn wal_dir(&self) -> &Path {
        &self.wal_dir
    }

    pub fn archive_status_dir(&self) -> &Path {
        &self.archive_status_dir
    }

    pub fn segment_path(&self, name: &SegmentName) -> PathBuf {
        self.wal_dir.join(name.as_str())
    }

    /// `None` for `MarkerState::Absent`.
    pub fn marker_path(&self, name: &SegmentName, state: MarkerState) -> Option<PathBuf> {
        state
            .suffix()
            .map(|suffix| self.archive_status_dir.join(format!("{}.{}", name, suffix)))
    }

    pub fn done_marker_path(&self, name: &SegmentName) -> PathBuf {
        self.archive_status_dir.join(format!("{}.done", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = WalLayout::new("/var/lib/pg/pg_wal");
        let name = SegmentName::from_parts(1, 0, 3);
        assert_eq!(
            layout.segment_path(&name),
            PathBuf::from("/var/lib/pg/pg_wal/000000010000000000000003")
        );
        assert_eq!(
            layout.done_marker_path(&name),
            PathBuf::from("/var/lib/pg/pg_wal/archive_status/000000010000000000000003.done")
        );
        assert_eq!(
            layout.marker_path(&name, MarkerState::Ready),
            Some(PathBuf::from(
                "/var/lib/pg/pg_wal/archive_status/000000010000000000000003.ready"
            ))
        );
        assert_eq!(layout.marker_path(&name, MarkerState::Absent), None);
    }

    #[test]
    fn test_custom_status_dir() {
        let layout = WalLayout::new("/wal").with_archive_status_dir("/status");
        assert_eq!(layout.archive_status_dir(), Path::new("/status"));
    }
}

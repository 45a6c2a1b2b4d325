//! Directory listing for segments, archive-status markers and backup labels.
//!
//! The database and the archiver keep writing while we read, so every entry
//! that disappears between `read_dir` and `metadata` is dropped quietly.

use super::layout::WalLayout;
use crate::core::segment::{is_backup_label, is_done_marker, is_segment_name, parse_marker_name};
use crate::core::{MarkerState, Result, SegmentName, SweepError, WalSegment};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{Level, event};

/// A metadata file (marker or backup label) and its modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaFile {
    pub name: String,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

/// Lists every segment in the WAL directory with its marker state, sorted by
/// name.
///
/// Failure to read the WAL directory itself is an error. A missing or
/// unreadable archive-status directory leaves every marker `Absent`.
pub fn scan_segments(layout: &WalLayout) -> Result<Vec<WalSegment>> {
    let markers = scan_markers(layout);
    let mut segments = Vec::new();

    for (file_name, path) in list_dir(layout.wal_dir())? {
        if !is_segment_name(&file_name) {
            continue;
        }
        let Ok(name) = SegmentName::parse(&file_name) else {
            continue;
        };

        let SegmentStat::File(modified) = stat_segment(&name, &path) else {
            continue;
        };

        let marker = markers.get(&name).copied().unwrap_or_default();
        segments.push(WalSegment {
            name,
            path,
            modified,
            marker,
        });
    }

    segments.sort_by(|a, b| a.name.cmp(&b.name));
    event!(
        Level::DEBUG,
        segments = segments.len(),
        markers = markers.len(),
        "scanned wal directory"
    );
    Ok(segments)
}

enum SegmentStat {
    /// A regular file; `None` when its mtime could not be read.
    File(Option<SystemTime>),
    /// Gone since the listing, or not a regular file.
    Skip,
}

fn stat_segment(name: &SegmentName, path: &Path) -> SegmentStat {
    match fs::metadata(path) {
        Ok(meta) if !meta.is_file() => SegmentStat::Skip,
        Ok(meta) => match meta.modified() {
            Ok(ts) => SegmentStat::File(Some(ts)),
            Err(e) => {
                event!(Level::WARN, segment = %name, error = %e, "cannot read modification time");
                SegmentStat::File(None)
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => {
            event!(Level::DEBUG, segment = %name, "segment vanished during scan");
            SegmentStat::Skip
        }
        Err(e) => {
            event!(Level::WARN, segment = %name, error = %e, "cannot stat segment");
            SegmentStat::File(None)
        }
    }
}

/// Marker state per segment. When both `.ready` and `.done` exist the
/// segment is reported as `Ready`: the archiver has not finished the rename
/// and nothing should be trusted yet.
pub fn scan_markers(layout: &WalLayout) -> HashMap<SegmentName, MarkerState> {
    let mut markers = HashMap::new();

    let entries = match list_dir(layout.archive_status_dir()) {
        Ok(entries) => entries,
        Err(e) => {
            event!(
                Level::WARN,
                dir = %layout.archive_status_dir().display(),
                error = %e,
                "archive status unreadable, treating all markers as absent"
            );
            return markers;
        }
    };

    for (file_name, _) in entries {
        let Some((name, state)) = parse_marker_name(&file_name) else {
            continue;
        };
        match markers.get(&name).copied() {
            Some(existing) if existing != state => {
                event!(Level::WARN, segment = %name, "both .ready and .done markers present");
                markers.insert(name, MarkerState::Ready);
            }
            _ => {
                markers.insert(name, state);
            }
        }
    }
    markers
}

/// Every `*.done` file in the archive-status directory.
pub fn scan_done_markers(layout: &WalLayout) -> Result<Vec<MetaFile>> {
    match list_dir(layout.archive_status_dir()) {
        Ok(entries) => Ok(collect_meta(entries, is_done_marker)),
        Err(SweepError::IoError(_)) if !layout.archive_status_dir().exists() => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Every `<segment>.<offset>.backup` file in the WAL directory.
pub fn scan_backup_labels(layout: &WalLayout) -> Result<Vec<MetaFile>> {
    let entries = list_dir(layout.wal_dir())?;
    Ok(collect_meta(entries, is_backup_label))
}

fn collect_meta(entries: Vec<(String, PathBuf)>, keep: fn(&str) -> bool) -> Vec<MetaFile> {
    let mut files = Vec::new();
    for (name, path) in entries {
        if !keep(&name) {
            continue;
        }
        let modified = match fs::metadata(&path) {
            Ok(meta) if !meta.is_file() => continue,
            Ok(meta) => meta.modified().ok(),
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(_) => None,
        };
        files.push(MetaFile {
            name,
            path,
            modified,
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

fn list_dir(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let read = fs::read_dir(dir).map_err(|e| {
        SweepError::IoError(format!("Failed to read directory '{}': {}", dir.display(), e))
    })?;

    let mut entries = Vec::new();
    for entry in read {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                event!(Level::WARN, dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        // Non-UTF-8 names can never match the naming convention.
        if let Ok(name) = entry.file_name().into_string() {
            entries.push((name, entry.path()));
        }
    }
    Ok(entries)
}

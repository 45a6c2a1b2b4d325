pub mod fs;
pub mod index;
pub mod layout;

pub use index::{MetaFile, scan_backup_labels, scan_done_markers, scan_markers, scan_segments};
pub use layout::{ARCHIVE_STATUS_DIR, WalLayout};

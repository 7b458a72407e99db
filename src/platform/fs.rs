// ZSleuth - platform/fs.rs
//
// Small filesystem helpers used by the app layer: bounded text reads for
// user-supplied TOML, and the native folder picker used when no scan root
// was given.

use std::io;
use std::path::{Path, PathBuf};

/// Outcome of a bounded read.
#[derive(Debug)]
pub enum BoundedRead {
    Content(String),
    TooLarge { size: u64 },
}

/// Read a UTF-8 text file, refusing files larger than `max_bytes`.
///
/// The size is checked from metadata before reading so an oversized file
/// is never loaded into memory.
pub fn read_text_bounded(path: &Path, max_bytes: u64) -> io::Result<BoundedRead> {
    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Ok(BoundedRead::TooLarge { size });
    }
    std::fs::read_to_string(path).map(BoundedRead::Content)
}

/// Ask the user for a scan directory with the native folder dialog.
///
/// Returns `None` if the dialog was cancelled.
pub fn pick_scan_folder(title: &str) -> Option<PathBuf> {
    let picked = rfd::FileDialog::new().set_title(title).pick_folder();
    match picked {
        Some(ref dir) => tracing::info!(dir = %dir.display(), "Scan folder chosen"),
        None => tracing::info!("Folder dialog cancelled"),
    }
    picked
}

// ZSleuth - core/discovery.rs
//
// Recursive directory traversal producing (directory, file names) pairs.
//
// Architecture note: this module uses `walkdir` for traversal as an OS
// abstraction. It reads directory listings only, never file contents.
//
// Rules:
//   - The root is validated up front; an unreachable root is fatal.
//   - A directory whose full path contains the exclusion marker is never
//     descended into, so its files and subdirectories are never seen.
//   - Unreadable nested directories are non-fatal and collected as warnings.
//   - The walk is exhaustive unless a depth limit is set. Directories past
//     the limit are reported as warnings and their files counted.
//   - Symlinks to directories are never listed as files.

use crate::core::model::PipelineKind;
use crate::util::constants;
use crate::util::error::DiscoveryError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a directory walk.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Substring that prunes any directory whose full path contains it.
    /// `None` walks everything.
    pub exclusion_marker: Option<String>,

    /// Deepest directory (root = 0) whose files are listed. `None` walks
    /// the whole tree. Clamped to `ABSOLUTE_MAX_DEPTH`.
    pub max_depth: Option<usize>,

    /// Follow symbolic links while walking.
    pub follow_links: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::for_pipeline(PipelineKind::ByWell)
    }
}

impl DiscoveryConfig {
    /// Defaults for a pipeline. The by-subfolder view plots the excluded
    /// runs alongside the rest, so it walks without a marker.
    pub fn for_pipeline(kind: PipelineKind) -> Self {
        let exclusion_marker = match kind {
            PipelineKind::ByWell => Some(constants::DEFAULT_EXCLUSION_MARKER.to_string()),
            PipelineKind::BySubfolder => None,
        };
        Self {
            exclusion_marker,
            max_depth: None,
            follow_links: false,
        }
    }

    /// True if `dir` must be pruned.
    pub fn is_excluded(&self, dir: &Path) -> bool {
        self.exclusion_marker
            .as_deref()
            .is_some_and(|marker| dir.to_string_lossy().contains(marker))
    }
}

// =============================================================================
// Walk
// =============================================================================

/// One visited directory and the names of the files directly inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    pub dir: PathBuf,
    pub file_names: Vec<OsString>,
}

/// Lazy walk over a directory tree, yielding one `DirectoryListing` per
/// visited directory (root first, then depth-first).
///
/// Entries are sorted files-before-directories within each directory so
/// that a directory's files arrive contiguously right after it, which lets
/// the listing be assembled without buffering the whole tree.
pub struct DirectoryWalk {
    inner: walkdir::IntoIter,
    config: DiscoveryConfig,
    pending: Option<DirectoryListing>,
    warnings: Vec<String>,
    excluded_dirs: usize,
    depth_limited_dirs: usize,
    files_beyond_depth: usize,
    failed: bool,
}

impl std::fmt::Debug for DirectoryWalk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWalk")
            .field("config", &self.config)
            .field("warnings", &self.warnings.len())
            .field("excluded_dirs", &self.excluded_dirs)
            .field("depth_limited_dirs", &self.depth_limited_dirs)
            .field("files_beyond_depth", &self.files_beyond_depth)
            .finish()
    }
}

impl DirectoryWalk {
    /// Non-fatal warnings gathered so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Number of directories pruned by the exclusion marker so far.
    pub fn excluded_dirs(&self) -> usize {
        self.excluded_dirs
    }

    /// Directories not listed because they sit below the depth limit.
    pub fn depth_limited_dirs(&self) -> usize {
        self.depth_limited_dirs
    }

    /// Files inside directories below the depth limit.
    pub fn files_beyond_depth(&self) -> usize {
        self.files_beyond_depth
    }

    /// Consume the walk, returning its warnings.
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn beyond_limit(&self, depth: usize) -> bool {
        self.config
            .max_depth
            .is_some_and(|limit| depth > limit.min(constants::ABSOLUTE_MAX_DEPTH))
    }

    fn warn(&mut self, msg: String) {
        tracing::debug!(warning = %msg, "Discovery warning");
        if self.warnings.len() < constants::MAX_WARNINGS {
            self.warnings.push(msg);
        }
    }
}

impl Iterator for DirectoryWalk {
    type Item = Result<DirectoryListing, DiscoveryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while let Some(entry_result) = self.inner.next() {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) if e.depth() == 0 => {
                    // The root itself could not be listed: nothing else can follow.
                    self.failed = true;
                    self.pending = None;
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_default();
                    return Some(Err(DiscoveryError::Traversal { path, source: e }));
                }
                Err(e) => {
                    let path_str = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "<unknown>".to_string());
                    self.warn(format!("Cannot access '{path_str}': {e}"));
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if self.config.is_excluded(entry.path()) {
                    tracing::debug!(dir = %entry.path().display(), "Excluded by marker");
                    self.excluded_dirs += 1;
                    self.inner.skip_current_dir();
                    continue;
                }
                if self.beyond_limit(entry.depth()) {
                    // Still walked so its files can be counted.
                    self.depth_limited_dirs += 1;
                    if !self.beyond_limit(entry.depth() - 1) {
                        self.warn(format!(
                            "Not listing '{}': deeper than max_depth {}",
                            entry.path().display(),
                            entry.depth() - 1
                        ));
                    }
                    continue;
                }
                let listing = DirectoryListing {
                    dir: entry.path().to_path_buf(),
                    file_names: Vec::new(),
                };
                if let Some(done) = self.pending.replace(listing) {
                    return Some(Ok(done));
                }
                continue;
            }

            if entry.path_is_symlink() && entry.path().is_dir() {
                tracing::debug!(link = %entry.path().display(), "Skipping symlink to directory");
                continue;
            }

            // A file at depth d belongs to a directory at depth d - 1.
            if self.beyond_limit(entry.depth().saturating_sub(1)) {
                self.files_beyond_depth += 1;
                continue;
            }

            match self.pending {
                Some(ref mut listing) => listing.file_names.push(entry.file_name().to_os_string()),
                // Only reachable if the root itself is a file, which the
                // pre-flight check rules out.
                None => tracing::trace!(file = %entry.path().display(), "File outside any listing"),
            }
        }

        self.pending.take().map(Ok)
    }
}

/// Start a walk of `root`.
///
/// # Fatal errors
/// Returns `Err` if the root does not exist, is not a directory, is not
/// accessible, or does not answer within `PREFLIGHT_TIMEOUT_SECS`. The
/// returned iterator yields a single `Err` if the root cannot be listed.
pub fn walk_directories(
    root: &Path,
    config: &DiscoveryConfig,
) -> Result<DirectoryWalk, DiscoveryError> {
    preflight(root)?;

    tracing::debug!(
        root = %root.display(),
        max_depth = ?config.max_depth,
        marker = ?config.exclusion_marker,
        "Discovery starting"
    );

    let inner = walkdir::WalkDir::new(root)
        .follow_links(config.follow_links)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter();

    Ok(DirectoryWalk {
        inner,
        config: config.clone(),
        pending: None,
        warnings: Vec::new(),
        excluded_dirs: 0,
        depth_limited_dirs: 0,
        files_beyond_depth: 0,
        failed: false,
    })
}

/// Validate the root on a helper thread with a wall-clock deadline.
///
/// On a network share whose host is unreachable, `fs::metadata()` can block
/// for 30+ seconds, so the check must not run on the caller's thread.
///
/// `fs::metadata()` is used rather than `Path::is_dir()` because the latter
/// maps PermissionDenied to `false`, hiding why the root is unusable.
fn preflight(root: &Path) -> Result<(), DiscoveryError> {
    enum PreflightResult {
        IsDirectory,
        IsFile,
        NotFound,
        AccessDenied(std::io::Error),
    }

    let root_buf = root.to_path_buf();
    let (tx, rx) = std::sync::mpsc::channel::<PreflightResult>();
    std::thread::spawn(move || {
        let result = match std::fs::metadata(&root_buf) {
            Ok(meta) if meta.is_dir() => PreflightResult::IsDirectory,
            Ok(_) => PreflightResult::IsFile,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                PreflightResult::AccessDenied(e)
            }
            Err(_) => PreflightResult::NotFound,
        };
        let _ = tx.send(result);
    });

    let timeout = std::time::Duration::from_secs(constants::PREFLIGHT_TIMEOUT_SECS);
    match rx.recv_timeout(timeout) {
        Ok(PreflightResult::IsDirectory) => Ok(()),
        Ok(PreflightResult::IsFile) => Err(DiscoveryError::NotADirectory {
            path: root.to_path_buf(),
        }),
        Ok(PreflightResult::NotFound) => Err(DiscoveryError::RootNotFound {
            path: root.to_path_buf(),
        }),
        Ok(PreflightResult::AccessDenied(source)) => Err(DiscoveryError::PermissionDenied {
            path: root.to_path_buf(),
            source,
        }),
        Err(_) => {
            tracing::warn!(
                root = %root.display(),
                timeout_secs = constants::PREFLIGHT_TIMEOUT_SECS,
                "Pre-flight path check timed out (unreachable network host?)"
            );
            Err(DiscoveryError::Timeout {
                path: root.to_path_buf(),
                timeout_secs: constants::PREFLIGHT_TIMEOUT_SECS,
            })
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_temp_tree() -> TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();

        fs::write(root.join("top.tif"), "").expect("write top.tif");

        let plate = root.join("Plate01_rig1");
        fs::create_dir(&plate).expect("mkdir plate");
        fs::write(plate.join("a.tif"), "").expect("write a.tif");
        fs::write(plate.join("b.tif"), "").expect("write b.tif");

        let site = plate.join("site2");
        fs::create_dir(&site).expect("mkdir site");
        fs::write(site.join("c.tif"), "").expect("write c.tif");

        let skipped = root.join("run_doNotAnalyze");
        fs::create_dir(&skipped).expect("mkdir skipped");
        fs::write(skipped.join("d.tif"), "").expect("write d.tif");
        let skipped_child = skipped.join("nested");
        fs::create_dir(&skipped_child).expect("mkdir nested");
        fs::write(skipped_child.join("e.tif"), "").expect("write e.tif");

        dir
    }

    fn collect(root: &Path, config: &DiscoveryConfig) -> Vec<DirectoryListing> {
        walk_directories(root, config)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn names(listing: &DirectoryListing) -> Vec<String> {
        listing
            .file_names
            .iter()
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_yields_root_and_subdirectories() {
        let dir = make_temp_tree();
        let listings = collect(dir.path(), &DiscoveryConfig::default());

        let dirs: Vec<_> = listings.iter().map(|l| l.dir.clone()).collect();
        assert_eq!(dirs[0], dir.path(), "root must come first");
        assert!(dirs.contains(&dir.path().join("Plate01_rig1")));
        assert!(dirs.contains(&dir.path().join("Plate01_rig1").join("site2")));
        assert_eq!(listings.len(), 3, "excluded subtree must not be listed");

        assert_eq!(names(&listings[0]), vec!["top.tif"]);
        let plate = listings
            .iter()
            .find(|l| l.dir.ends_with("Plate01_rig1"))
            .unwrap();
        assert_eq!(names(plate), vec!["a.tif", "b.tif"]);
    }

    #[test]
    fn test_exclusion_marker_prunes_subtree() {
        let dir = make_temp_tree();
        let mut walk = walk_directories(dir.path(), &DiscoveryConfig::default()).unwrap();
        let all_files: Vec<String> = walk
            .by_ref()
            .map(|l| l.unwrap())
            .flat_map(|l| names(&l))
            .collect();
        assert!(!all_files.contains(&"d.tif".to_string()));
        assert!(!all_files.contains(&"e.tif".to_string()));
        assert_eq!(walk.excluded_dirs(), 1, "nested dir is never reached");
    }

    #[test]
    fn test_no_marker_walks_everything() {
        let dir = make_temp_tree();
        let config = DiscoveryConfig::for_pipeline(PipelineKind::BySubfolder);
        let listings = collect(dir.path(), &config);
        let total: usize = listings.iter().map(|l| l.file_names.len()).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_marker_in_root_path_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("doNotAnalyze_batch");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("x.tif"), "").unwrap();
        let listings = collect(&root, &DiscoveryConfig::default());
        assert!(listings.is_empty());
    }

    #[test]
    fn test_default_walk_has_no_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut deep = dir.path().to_path_buf();
        for i in 0..80 {
            deep.push(format!("d{i}"));
        }
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("deep.tif"), "").unwrap();

        let mut walk = walk_directories(dir.path(), &DiscoveryConfig::default()).unwrap();
        let listings: Vec<_> = walk.by_ref().map(|l| l.unwrap()).collect();
        assert_eq!(listings.len(), 81);
        assert_eq!(names(listings.last().unwrap()), vec!["deep.tif"]);
        assert_eq!(walk.depth_limited_dirs(), 0);
        assert!(walk.warnings().is_empty());
    }

    #[test]
    fn test_depth_limit_lists_files_at_limit_and_reports_the_rest() {
        let dir = make_temp_tree();
        let config = DiscoveryConfig {
            max_depth: Some(0),
            ..Default::default()
        };
        let mut walk = walk_directories(dir.path(), &config).unwrap();
        let listings: Vec<_> = walk.by_ref().map(|l| l.unwrap()).collect();

        assert_eq!(listings.len(), 1);
        assert_eq!(names(&listings[0]), vec!["top.tif"]);
        // Plate01_rig1 and its site2 child; the marked subtree is pruned.
        assert_eq!(walk.depth_limited_dirs(), 2);
        assert_eq!(walk.files_beyond_depth(), 3);
        assert_eq!(walk.warnings().len(), 1, "one warning per cut subtree");
        assert!(walk.warnings()[0].contains("Plate01_rig1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let plate = dir.path().join("Plate1");
        fs::create_dir(&plate).unwrap();
        fs::write(plate.join("real_Z1.5_GFP-ref.tif"), "").unwrap();
        std::os::unix::fs::symlink(&target, plate.join("link_Z8267.25_GFP-ref.tif")).unwrap();

        let listings = collect(dir.path(), &DiscoveryConfig::default());
        let plate_listing = listings.iter().find(|l| l.dir == plate).unwrap();
        assert_eq!(names(plate_listing), vec!["real_Z1.5_GFP-ref.tif"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_a_warning() {
        use std::os::unix::fs::PermissionsExt;

        let dir = make_temp_tree();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.tif"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind a privileged user.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut walk = walk_directories(dir.path(), &DiscoveryConfig::default()).unwrap();
        let listings: Vec<_> = walk.by_ref().collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(listings.iter().all(Result::is_ok), "walk must not fail");
        assert!(listings
            .iter()
            .flatten()
            .any(|l| l.dir.ends_with("Plate01_rig1")));
        assert_eq!(walk.warnings().len(), 1);
        assert!(walk.warnings()[0].contains("locked"));
    }

    #[test]
    fn test_empty_directory_still_listed() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        let listings = collect(dir.path(), &DiscoveryConfig::default());
        assert_eq!(listings.len(), 2);
        assert!(listings.iter().all(|l| l.file_names.is_empty()));
    }

    #[test]
    fn test_root_not_found() {
        let result = walk_directories(
            Path::new("/nonexistent/path/zsleuth"),
            &DiscoveryConfig::default(),
        );
        assert!(matches!(result, Err(DiscoveryError::RootNotFound { .. })));
    }

    #[test]
    fn test_root_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not_a_dir.tif");
        fs::write(&file, "content").unwrap();
        let result = walk_directories(&file, &DiscoveryConfig::default());
        assert!(matches!(result, Err(DiscoveryError::NotADirectory { .. })));
    }
}

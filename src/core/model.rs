// ZSleuth - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Pipelines
// =============================================================================

/// The two scan pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineKind {
    /// Z position per well and per plate, split by rig.
    ByWell,
    /// Z distribution per top-level subfolder.
    BySubfolder,
}

impl PipelineKind {
    /// Identifier used for grammar ids and log fields.
    pub fn id(&self) -> &'static str {
        match self {
            PipelineKind::ByWell => "by-well",
            PipelineKind::BySubfolder => "by-subfolder",
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

// =============================================================================
// Records
// =============================================================================

/// One matched image from the by-well pipeline.
///
/// Created once during the scan and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellRecord {
    /// Fixed-length prefix of the file name identifying the plate.
    pub plate_name: String,

    /// Three-character well token (e.g. `G02`).
    pub well_position: String,

    /// Focus depth in micrometres, truncated toward zero.
    pub z_value: i64,

    /// Bare file name, kept for substring-based colouring.
    pub file_name: String,

    /// Full path of the image on disk.
    pub path: PathBuf,
}

/// One matched image from the by-subfolder pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubfolderRecord {
    /// Focus depth in micrometres, as captured.
    pub z_value: f64,

    /// First `_`-delimited token of the top-level subfolder under the root.
    pub subfolder_tag: String,

    /// Bare file name, kept for substring-based colouring.
    pub file_name: String,

    /// Full path of the image on disk.
    pub path: PathBuf,
}

// =============================================================================
// Rigs
// =============================================================================

/// One of the two imaging instruments, told apart by plate-name parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Rig {
    /// Odd rig digit.
    One,
    /// Even rig digit.
    Two,
}

impl Rig {
    pub fn label(&self) -> &'static str {
        match self {
            Rig::One => "Rig 1",
            Rig::Two => "Rig 2",
        }
    }
}

impl std::fmt::Display for Rig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Skip accounting
// =============================================================================

/// Why a visited file produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The gate substring is absent.
    MissingSubstring,
    /// The file name glob filter rejected the file.
    PatternFilter,
    /// The well pattern found nothing.
    NoWellMatch,
    /// The Z pattern found nothing.
    NoZMatch,
    /// The file name is not valid UTF-8.
    NonUtf8Name,
}

/// Per-reason tally of skipped files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub missing_substring: usize,
    pub pattern_filter: usize,
    pub no_well_match: usize,
    pub no_z_match: usize,
    pub non_utf8_name: usize,
    /// Files below the depth limit, counted by the walk.
    pub beyond_max_depth: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingSubstring => self.missing_substring += 1,
            SkipReason::PatternFilter => self.pattern_filter += 1,
            SkipReason::NoWellMatch => self.no_well_match += 1,
            SkipReason::NoZMatch => self.no_z_match += 1,
            SkipReason::NonUtf8Name => self.non_utf8_name += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_substring
            + self.pattern_filter
            + self.no_well_match
            + self.no_z_match
            + self.non_utf8_name
            + self.beyond_max_depth
    }
}

// =============================================================================
// Scan summary
// =============================================================================

/// Statistics for one completed scan pass.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub pipeline: PipelineKind,
    pub root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub dirs_visited: usize,
    pub files_visited: usize,
    pub files_matched: usize,
    pub skipped: SkipCounts,
    /// Non-fatal walk warnings (unreadable nested directories, subtrees cut
    /// by the depth limit).
    pub warnings: Vec<String>,
}

impl ScanSummary {
    /// One-line description for the status bar and the final log line.
    pub fn status_line(&self) -> String {
        format!(
            "{}: {} of {} files matched ({} skipped) in {} directories, {:.2}s",
            self.pipeline,
            self.files_matched,
            self.files_visited,
            self.skipped.total(),
            self.dirs_visited,
            self.duration.as_secs_f64()
        )
    }
}

// ZSleuth - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Run-specific defaults such as the exclusion marker and the rig reference
// lines are overridable via config.toml or the CLI.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ZSleuth";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ZSleuth";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Discovery
// =============================================================================

/// Directories whose full path contains this marker are never descended
/// into by the by-well pipeline.
pub const DEFAULT_EXCLUSION_MARKER: &str = "doNotAnalyze";

/// Upper bound on a configured depth limit. Without a configured limit the
/// walk is exhaustive.
pub const ABSOLUTE_MAX_DEPTH: usize = 256;

/// Seconds the root pre-flight check may take before the root is declared
/// unreachable. Network shares with a dead host block `metadata()` for a
/// long time.
pub const PREFLIGHT_TIMEOUT_SECS: u64 = 10;

/// Maximum number of non-fatal walk warnings retained per scan.
pub const MAX_WARNINGS: usize = 1_000;

// =============================================================================
// Filename grammar
// =============================================================================

/// Maximum size of a grammar TOML file in bytes.
pub const MAX_GRAMMAR_FILE_SIZE: u64 = 64 * 1024; // 64 KB

/// Maximum regex pattern length to prevent ReDoS.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

/// Capture group holding the Z value in every grammar.
pub const Z_GROUP: &str = "z";

/// Capture group holding the well token in grammars that define one.
pub const WELL_GROUP: &str = "well";

/// Tag given to files sitting directly in the scan root (the relative
/// path of the root to itself).
pub const ROOT_SUBFOLDER_TAG: &str = ".";

// =============================================================================
// Grouping
// =============================================================================

/// Zero-based character index of the rig digit inside a plate name.
pub const RIG_MARKER_INDEX: usize = 2;

// =============================================================================
// Plot defaults
// =============================================================================

/// Reference Z (micrometres) drawn on rig 1 charts.
pub const DEFAULT_RIG1_REFERENCE: f64 = 8267.0;

/// Reference Z (micrometres) drawn on rig 2 charts.
pub const DEFAULT_RIG2_REFERENCE: f64 = 8578.0;

/// Dataset label used in by-well chart titles.
pub const DEFAULT_DATASET_LABEL: &str = "20240304";

/// Imaging week label used in the by-subfolder chart title.
pub const DEFAULT_WEEK_LABEL: &str = "2024-03-04";

/// Fraction of a category slot a swarm may spread across.
pub const SWARM_MAX_WIDTH: f64 = 0.8;

/// Horizontal gap between neighbouring swarm points, in category units.
pub const SWARM_POINT_SPACING: f64 = 0.04;

/// Values within this fraction of the category's value range are treated
/// as overlapping when laying out a swarm.
pub const SWARM_OVERLAP_FRACTION: f64 = 0.01;

/// Box width in category units for box-and-swarm charts.
pub const BOX_WIDTH: f64 = 0.6;

// =============================================================================
// UI
// =============================================================================

/// Initial size of each chart window.
pub const CHART_WINDOW_SIZE: [f32; 2] = [900.0, 450.0];

/// Offset between successive chart windows so they cascade.
pub const CHART_WINDOW_CASCADE: f32 = 36.0;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Maximum size of config.toml in bytes.
pub const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

// ZSleuth - platform/config.rs
//
// Platform config directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::model::PipelineKind;
use crate::util::constants;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for ZSleuth configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/zsleuth/ or %APPDATA%\ZSleuth\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub scan: ScanSection,
    pub by_well: ByWellSection,
    pub by_subfolder: BySubfolderSection,
    pub labels: LabelsSection,
    pub logging: LoggingSection,
}

/// `[scan]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// Root directory of the imaging run.
    pub root: Option<String>,
    /// Exclusion marker for the by-well pipeline ("" disables).
    pub exclusion_marker: Option<String>,
    /// Deepest directory whose files are read. Unset walks everything.
    pub max_depth: Option<usize>,
    /// Follow symbolic links.
    pub follow_links: Option<bool>,
}

/// `[by_well]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ByWellSection {
    /// Grammar TOML replacing the built-in by-well grammar.
    pub grammar_file: Option<String>,
    /// Reference Z for rig 1 charts.
    pub rig1_reference: Option<f64>,
    /// Reference Z for rig 2 charts.
    pub rig2_reference: Option<f64>,
}

/// `[by_subfolder]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct BySubfolderSection {
    /// Grammar TOML replacing the built-in by-subfolder grammar.
    pub grammar_file: Option<String>,
    /// Exclusion marker for the by-subfolder pipeline ("" disables).
    pub exclusion_marker: Option<String>,
}

/// `[labels]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LabelsSection {
    /// Dataset label in by-well chart titles.
    pub dataset: Option<String>,
    /// Week label in the by-subfolder chart title.
    pub week: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Settings specific to one pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOverrides {
    pub grammar_file: Option<PathBuf>,
    pub exclusion_marker: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub scan_root: Option<PathBuf>,
    pub max_depth: Option<usize>,
    pub follow_links: bool,
    pub by_well: PipelineOverrides,
    pub by_subfolder: PipelineOverrides,
    pub rig1_reference: f64,
    pub rig2_reference: f64,
    pub dataset_label: String,
    pub week_label: String,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan_root: None,
            max_depth: None,
            follow_links: false,
            by_well: PipelineOverrides {
                grammar_file: None,
                exclusion_marker: Some(constants::DEFAULT_EXCLUSION_MARKER.to_string()),
            },
            by_subfolder: PipelineOverrides {
                grammar_file: None,
                exclusion_marker: None,
            },
            rig1_reference: constants::DEFAULT_RIG1_REFERENCE,
            rig2_reference: constants::DEFAULT_RIG2_REFERENCE,
            dataset_label: constants::DEFAULT_DATASET_LABEL.to_string(),
            week_label: constants::DEFAULT_WEEK_LABEL.to_string(),
            log_level: None,
        }
    }
}

impl AppConfig {
    pub fn pipeline(&self, kind: PipelineKind) -> &PipelineOverrides {
        match kind {
            PipelineKind::ByWell => &self.by_well,
            PipelineKind::BySubfolder => &self.by_subfolder,
        }
    }
}

/// Load and validate a config file.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// A missing file yields defaults with no warnings. An unreadable or
/// unparseable file yields defaults with a warning so the run still starts
/// but the user is told. Relative grammar paths resolve against the
/// config file's directory.
///
/// Called before logging is initialised, so warnings are returned rather
/// than logged.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        return (AppConfig::default(), warnings);
    }

    match std::fs::metadata(config_path) {
        Ok(meta) if meta.len() > constants::MAX_CONFIG_FILE_SIZE => {
            warnings.push(format!(
                "Config file '{}' is {} bytes, exceeds maximum of {} bytes. Using defaults.",
                config_path.display(),
                meta.len(),
                constants::MAX_CONFIG_FILE_SIZE
            ));
            return (AppConfig::default(), warnings);
        }
        _ => {}
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            warnings.push(format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            return (AppConfig::default(), warnings);
        }
    };

    let base_dir = config_path.parent().unwrap_or(Path::new("."));
    let (config, mut parse_warnings) = parse_config(&content, config_path, base_dir);
    warnings.append(&mut parse_warnings);
    (config, warnings)
}

/// Validate config.toml content. `config_path` is used in messages only.
pub fn parse_config(content: &str, config_path: &Path, base_dir: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    let raw: RawConfig = match toml::from_str(content) {
        Ok(r) => r,
        Err(e) => {
            warnings.push(format!(
                "Failed to parse config file '{}': {e}. Using defaults. \
                 See config.example.toml for the expected format.",
                config_path.display()
            ));
            return (AppConfig::default(), warnings);
        }
    };

    let mut config = AppConfig::default();

    // -- Scan --
    if let Some(root) = raw.scan.root.filter(|r| !r.trim().is_empty()) {
        config.scan_root = Some(PathBuf::from(root));
    }
    if let Some(marker) = raw.scan.exclusion_marker {
        config.by_well.exclusion_marker = non_empty(marker);
    }
    if let Some(depth) = raw.scan.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            config.max_depth = Some(depth);
        } else {
            warnings.push(format!(
                "[scan] max_depth = {depth} is out of range (1-{}). Walking without a depth limit.",
                constants::ABSOLUTE_MAX_DEPTH,
            ));
        }
    }
    if let Some(follow) = raw.scan.follow_links {
        config.follow_links = follow;
    }

    // -- By well --
    config.by_well.grammar_file = raw
        .by_well
        .grammar_file
        .and_then(non_empty)
        .map(|f| base_dir.join(f));
    for (field, value, target) in [
        ("rig1_reference", raw.by_well.rig1_reference, &mut config.rig1_reference),
        ("rig2_reference", raw.by_well.rig2_reference, &mut config.rig2_reference),
    ] {
        match value {
            Some(v) if v.is_finite() => *target = v,
            Some(v) => warnings.push(format!(
                "[by_well] {field} = {v} is not a finite number. Using default ({target}).",
            )),
            None => {}
        }
    }

    // -- By subfolder --
    config.by_subfolder.grammar_file = raw
        .by_subfolder
        .grammar_file
        .and_then(non_empty)
        .map(|f| base_dir.join(f));
    if let Some(marker) = raw.by_subfolder.exclusion_marker {
        config.by_subfolder.exclusion_marker = non_empty(marker);
    }

    // -- Labels --
    if let Some(dataset) = raw.labels.dataset.and_then(non_empty) {
        config.dataset_label = dataset;
    }
    if let Some(week) = raw.labels.week.and_then(non_empty) {
        config.week_label = week;
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    (config, warnings)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

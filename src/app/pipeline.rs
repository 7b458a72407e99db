// ZSleuth - app/pipeline.rs
//
// Scan orchestration for the two pipelines. Each run walks the root once,
// runs the grammar over every file name, then builds the chart specs.
//
// Error policy:
//   - An unreachable root, a matched Z capture that does not parse, or a
//     plate name without a rig digit aborts the run.
//   - Files that miss a pattern are skipped and counted per reason.
//   - Unreadable nested directories become warnings on the summary.

use crate::core::chart::{self, ChartLabels, ChartSpec};
use crate::core::discovery::{self, DiscoveryConfig};
use crate::core::extract::{self, Extraction};
use crate::core::grammar::FilenameGrammar;
use crate::core::model::{
    PipelineKind, Rig, ScanSummary, SkipCounts, SkipReason, SubfolderRecord, WellRecord,
};
use crate::core::table::{self, RecordTable, RigSplit};
use crate::platform::config::AppConfig;
use crate::util::error::{ExtractError, ZSleuthError};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Instant;

// =============================================================================
// Settings
// =============================================================================

/// Everything the by-well pipeline needs besides the root.
#[derive(Debug, Clone)]
pub struct ByWellSettings {
    pub grammar: FilenameGrammar,
    pub discovery: DiscoveryConfig,
    pub rig1_reference: f64,
    pub rig2_reference: f64,
    pub dataset_label: String,
}

impl ByWellSettings {
    pub fn from_config(config: &AppConfig, grammar: FilenameGrammar) -> Self {
        Self {
            grammar,
            discovery: discovery_config(config, PipelineKind::ByWell),
            rig1_reference: config.rig1_reference,
            rig2_reference: config.rig2_reference,
            dataset_label: config.dataset_label.clone(),
        }
    }

    fn reference(&self, rig: Rig) -> f64 {
        match rig {
            Rig::One => self.rig1_reference,
            Rig::Two => self.rig2_reference,
        }
    }
}

/// Everything the by-subfolder pipeline needs besides the root.
#[derive(Debug, Clone)]
pub struct BySubfolderSettings {
    pub grammar: FilenameGrammar,
    pub discovery: DiscoveryConfig,
    pub week_label: String,
}

impl BySubfolderSettings {
    pub fn from_config(config: &AppConfig, grammar: FilenameGrammar) -> Self {
        Self {
            grammar,
            discovery: discovery_config(config, PipelineKind::BySubfolder),
            week_label: config.week_label.clone(),
        }
    }
}

fn discovery_config(config: &AppConfig, kind: PipelineKind) -> DiscoveryConfig {
    DiscoveryConfig {
        exclusion_marker: config.pipeline(kind).exclusion_marker.clone(),
        max_depth: config.max_depth,
        follow_links: config.follow_links,
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Output of a by-well run.
#[derive(Debug, Clone)]
pub struct ByWellReport {
    pub table: RecordTable<WellRecord>,
    pub split: RigSplit,
    /// Z vs well for rig 1 and rig 2, then Z vs plate for rig 1 and rig 2.
    pub charts: Vec<ChartSpec>,
    pub summary: ScanSummary,
}

/// Output of a by-subfolder run.
#[derive(Debug, Clone)]
pub struct BySubfolderReport {
    pub table: RecordTable<SubfolderRecord>,
    pub chart: ChartSpec,
    pub summary: ScanSummary,
}

// =============================================================================
// Runs
// =============================================================================

/// Scan `root` with the by-well grammar, split by rig, and build four charts.
pub fn run_by_well(root: &Path, settings: &ByWellSettings) -> Result<ByWellReport, ZSleuthError> {
    let fields = settings.grammar.well_fields()?;
    let (table, summary) = scan(PipelineKind::ByWell, root, &settings.discovery, |name, path, _dir| {
        extract::extract_well_record(name, path, &settings.grammar, fields)
    })?;

    let split = table::split_by_rig(&table)?;

    let mut charts = Vec::with_capacity(4);
    for rig in [Rig::One, Rig::Two] {
        charts.push(chart::swarm_with_trend(
            split.table(rig),
            |r: &WellRecord| r.well_position.clone(),
            |r: &WellRecord| r.z_value as f64,
            ChartLabels {
                title: format!("Z vs Well, {rig}, {}", settings.dataset_label),
                x_label: "Well Position".to_string(),
                y_label: "Z Position".to_string(),
            },
            Some(settings.reference(rig)),
        ));
    }
    for rig in [Rig::One, Rig::Two] {
        charts.push(chart::swarm(
            split.table(rig),
            |r: &WellRecord| r.plate_name.clone(),
            |r: &WellRecord| r.z_value as f64,
            ChartLabels {
                title: format!("Z vs Plate, {rig}, {}", settings.dataset_label),
                x_label: "Plate Name".to_string(),
                y_label: "Z Position".to_string(),
            },
            Some(settings.reference(rig)),
        ));
    }

    Ok(ByWellReport {
        table,
        split,
        charts,
        summary,
    })
}

/// Scan `root` with the by-subfolder grammar and build the box chart.
pub fn run_by_subfolder(
    root: &Path,
    settings: &BySubfolderSettings,
) -> Result<BySubfolderReport, ZSleuthError> {
    let (table, summary) = scan(
        PipelineKind::BySubfolder,
        root,
        &settings.discovery,
        |name, path, dir| extract::extract_subfolder_record(name, path, dir, root, &settings.grammar),
    )?;

    let chart = chart::box_and_swarm(
        &table,
        ChartLabels {
            title: format!("Z distances for {} Imaging Week", settings.week_label),
            x_label: "Plate".to_string(),
            y_label: "Z Values (\u{3bc}m)".to_string(),
        },
    );

    Ok(BySubfolderReport {
        table,
        chart,
        summary,
    })
}

/// Render the by-subfolder table as one line of `(z, 'tag')` pairs in
/// traversal order.
pub fn format_pair_listing(table: &RecordTable<SubfolderRecord>) -> String {
    let mut out = String::from("All extracted numbers and subfolders: [");
    for (i, row) in table.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        // `{:?}` keeps the trailing `.0` on whole numbers.
        let _ = write!(out, "({:?}, '{}')", row.z_value, row.subfolder_tag);
    }
    out.push(']');
    out
}

// =============================================================================
// Shared scan loop
// =============================================================================

/// Walk `root` and run `extract(file_name, path, dir)` on every file.
fn scan<R, F>(
    kind: PipelineKind,
    root: &Path,
    config: &DiscoveryConfig,
    mut extract: F,
) -> Result<(RecordTable<R>, ScanSummary), ZSleuthError>
where
    F: FnMut(&str, &Path, &Path) -> Result<Extraction<R>, ExtractError>,
{
    let started_at = chrono::Utc::now();
    let start = Instant::now();
    tracing::info!(pipeline = %kind, root = %root.display(), "Scan starting");

    let mut walk = discovery::walk_directories(root, config)?;
    let mut table = RecordTable::new();
    let mut skipped = SkipCounts::default();
    let mut dirs_visited = 0usize;
    let mut files_visited = 0usize;

    for listing in walk.by_ref() {
        let listing = listing?;
        dirs_visited += 1;
        for os_name in &listing.file_names {
            files_visited += 1;
            let Some(name) = os_name.to_str() else {
                tracing::debug!(dir = %listing.dir.display(), name = ?os_name, "Skipping non-UTF-8 file name");
                skipped.record(SkipReason::NonUtf8Name);
                continue;
            };
            let path = listing.dir.join(name);
            match extract(name, &path, &listing.dir)? {
                Extraction::Matched(record) => table.push(record),
                Extraction::Skipped(reason) => {
                    tracing::trace!(file = %path.display(), ?reason, "Skipped");
                    skipped.record(reason);
                }
            }
        }
    }

    let excluded_dirs = walk.excluded_dirs();
    skipped.beyond_max_depth = walk.files_beyond_depth();
    let warnings = walk.into_warnings();
    for w in &warnings {
        tracing::warn!("{w}");
    }

    let summary = ScanSummary {
        pipeline: kind,
        root: root.to_path_buf(),
        started_at,
        duration: start.elapsed(),
        dirs_visited,
        files_visited,
        files_matched: table.len(),
        skipped,
        warnings,
    };
    tracing::info!(
        excluded_dirs,
        skipped_missing_substring = skipped.missing_substring,
        skipped_no_well = skipped.no_well_match,
        skipped_no_z = skipped.no_z_match,
        skipped_beyond_depth = skipped.beyond_max_depth,
        "{}",
        summary.status_line()
    );
    if table.is_empty() {
        tracing::warn!(pipeline = %kind, root = %root.display(), "No files matched; charts will be empty");
    }

    Ok((table, summary))
}

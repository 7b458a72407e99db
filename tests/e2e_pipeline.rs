// ZSleuth - tests/e2e_pipeline.rs
//
// End-to-end tests for both pipelines.
//
// These tests build real run directories on disk and drive the full path
// from file names to tables, rig split, chart specs, and export, using the
// built-in grammars and real walkdir traversal.

use std::fs;
use std::path::{Path, PathBuf};
use zsleuth::app::grammar_mgr::load_grammar;
use zsleuth::app::pipeline::{
    format_pair_listing, run_by_subfolder, run_by_well, BySubfolderSettings, ByWellSettings,
};
use zsleuth::core::export::export_to_path;
use zsleuth::core::model::PipelineKind;
use zsleuth::platform::config::AppConfig;
use zsleuth::util::error::{ExtractError, ZSleuthError};

// =============================================================================
// Helpers
// =============================================================================

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

fn by_well(config: &AppConfig) -> ByWellSettings {
    let grammar = load_grammar(PipelineKind::ByWell, None).unwrap();
    ByWellSettings::from_config(config, grammar)
}

fn by_subfolder(config: &AppConfig) -> BySubfolderSettings {
    let grammar = load_grammar(PipelineKind::BySubfolder, None).unwrap();
    BySubfolderSettings::from_config(config, grammar)
}

/// A small by-well run: two rig 1 plates, one rig 2 plate, one excluded
/// directory and some noise.
fn well_run(root: &Path) {
    touch(root, "P1345678_0001/P1345678_0001_A_A01_165dot5_Z8267.99_GFP-ref.tif");
    touch(root, "P1345678_0001/P1345678_0001_A_B02_165dot5_Z8270.2_GFP-ref.tif");
    touch(root, "P1345678_0001/P1345678_0001_A_B02_165dot5_Z8270.2_BF.tif");
    touch(root, "P1545678_0002/P1545678_0002_A_A01_165dot5_Z8268_GFP-ref.tif");
    touch(root, "P1245678_0003/P1245678_0003_A_A01_165dot5_Z8578.4_GFP-ref.tif");
    touch(root, "P1245678_0003/doNotAnalyze/P1245678_0003_A_C03_165dot5_Z9999_GFP-ref.tif");
    touch(root, "old_doNotAnalyze_run/deep/P1345678_0004_A_A01_165dot5_Z1_GFP-ref.tif");
    touch(root, "readme.txt");
}

fn row_keys(report: &zsleuth::app::pipeline::ByWellReport) -> Vec<(String, String, i64)> {
    report
        .table
        .iter()
        .map(|r| (r.plate_name.clone(), r.well_position.clone(), r.z_value))
        .collect()
}

// =============================================================================
// By-well
// =============================================================================

#[test]
fn e2e_by_well_extracts_and_truncates() {
    let dir = tempfile::tempdir().unwrap();
    well_run(dir.path());

    let report = run_by_well(dir.path(), &by_well(&AppConfig::default())).unwrap();
    let mut rows = row_keys(&report);
    rows.sort();
    assert_eq!(
        rows,
        vec![
            ("P1245678_0003".to_string(), "A01".to_string(), 8578),
            ("P1345678_0001".to_string(), "A01".to_string(), 8267),
            ("P1345678_0001".to_string(), "B02".to_string(), 8270),
            ("P1545678_0002".to_string(), "A01".to_string(), 8268),
        ]
    );
    assert_eq!(report.summary.files_matched, 4);
    assert_eq!(report.summary.skipped.missing_substring, 2);
}

#[test]
fn e2e_by_well_exclusion_marker_prunes_whole_subtree() {
    let dir = tempfile::tempdir().unwrap();
    well_run(dir.path());

    let report = run_by_well(dir.path(), &by_well(&AppConfig::default())).unwrap();
    assert!(
        report
            .table
            .iter()
            .all(|r| !r.path.to_string_lossy().contains("doNotAnalyze")),
        "excluded directory leaked into the table"
    );
}

#[test]
fn e2e_by_well_without_marker_reads_everything() {
    let dir = tempfile::tempdir().unwrap();
    well_run(dir.path());

    let mut config = AppConfig::default();
    config.by_well.exclusion_marker = None;
    let report = run_by_well(dir.path(), &by_well(&config)).unwrap();
    assert_eq!(report.table.len(), 6);
}

#[test]
fn e2e_by_well_rig_split_is_a_partition() {
    let dir = tempfile::tempdir().unwrap();
    well_run(dir.path());

    let report = run_by_well(dir.path(), &by_well(&AppConfig::default())).unwrap();
    assert_eq!(
        report.split.rig1.len() + report.split.rig2.len(),
        report.table.len()
    );
    assert!(report.split.rig2.iter().all(|r| r.plate_name == "P1245678_0003"));
    assert_eq!(report.split.rig1.len(), 3);

    // Z vs Plate for rig 1 lists its plates in ascending order.
    assert_eq!(
        report.charts[2].categories,
        vec!["P1345678_0001", "P1545678_0002"]
    );
    assert_eq!(report.charts[2].reference_line, Some(8267.0));
}

#[test]
fn e2e_by_well_keeps_duplicate_rows() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a/P1345678_0001_A_A01_165dot5_Z8267_GFP-ref.tif");
    touch(dir.path(), "b/P1345678_0001_A_A01_165dot5_Z8267_GFP-ref.tif");

    let report = run_by_well(dir.path(), &by_well(&AppConfig::default())).unwrap();
    assert_eq!(report.table.len(), 2);
    assert_eq!(report.charts[0].points.len(), 2);
}

#[test]
fn e2e_by_well_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    well_run(dir.path());
    let settings = by_well(&AppConfig::default());

    let first = run_by_well(dir.path(), &settings).unwrap();
    let second = run_by_well(dir.path(), &settings).unwrap();
    assert_eq!(first.table, second.table);
    assert_eq!(first.charts, second.charts);
}

#[test]
fn e2e_by_well_malformed_z_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "P1345678_0001_A_A01_165dot5_Z8267.5_GFP-ref.tif");
    touch(dir.path(), "P1345678_0001_A_A02_165dot5_Z1.2.3_GFP-ref.tif");

    let err = run_by_well(dir.path(), &by_well(&AppConfig::default())).unwrap_err();
    match err {
        ZSleuthError::Extract(ExtractError::InvalidZValue { raw, .. }) => {
            assert_eq!(raw, "1.2.3");
        }
        other => panic!("expected InvalidZValue, got {other}"),
    }
}

#[test]
fn e2e_by_well_empty_run_gives_empty_charts() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "plate/notes.txt");

    let report = run_by_well(dir.path(), &by_well(&AppConfig::default())).unwrap();
    assert!(report.table.is_empty());
    assert_eq!(report.charts.len(), 4);
    assert!(report.charts.iter().all(|c| c.is_empty()));
}

#[test]
fn e2e_by_well_reads_deeply_nested_files() {
    let dir = tempfile::tempdir().unwrap();
    let nesting: Vec<String> = (0..70).map(|i| format!("n{i}")).collect();
    let rel = format!(
        "{}/P1345678_0001_A_A01_165dot5_Z8267.5_GFP-ref.tif",
        nesting.join("/")
    );
    touch(dir.path(), &rel);

    let report = run_by_well(dir.path(), &by_well(&AppConfig::default())).unwrap();
    assert_eq!(report.table.len(), 1);
    assert_eq!(report.summary.dirs_visited, 71);
    assert!(report.summary.warnings.is_empty());
}

#[test]
fn e2e_depth_limit_is_reported_in_summary() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "P1345678_0001/P1345678_0001_A_A01_165dot5_Z8267_GFP-ref.tif");
    touch(dir.path(), "P1345678_0001/site/deeper/P1345678_0001_A_A02_165dot5_Z8268_GFP-ref.tif");

    let mut config = AppConfig::default();
    config.max_depth = Some(1);
    let report = run_by_well(dir.path(), &by_well(&config)).unwrap();
    assert_eq!(report.table.len(), 1);
    assert_eq!(report.summary.skipped.beyond_max_depth, 1);
    assert_eq!(report.summary.warnings.len(), 1);
}

// =============================================================================
// By-subfolder
// =============================================================================

#[test]
fn e2e_by_subfolder_tags_by_top_level_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(root, "PlateA_rig1_day1/site1/img-A_Z8267.25_GFP-ref.tif");
    touch(root, "PlateA_rig1_day1/site2/img-G_Z8268.75_GFP-ref.tif");
    touch(root, "PlateB_rig2/img-C_Z8578.5_GFP-ref.tif");
    touch(root, "PlateB_rig2/img-C_Z8578_GFP-ref.tif");
    touch(root, "PlateB_rig2/img-C_Z8578.5_GFP.tif");

    let report = run_by_subfolder(root, &by_subfolder(&AppConfig::default())).unwrap();
    let pairs: Vec<(f64, String)> = report
        .table
        .iter()
        .map(|r| (r.z_value, r.subfolder_tag.clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (8267.25, "PlateA".to_string()),
            (8268.75, "PlateA".to_string()),
            (8578.5, "PlateB".to_string()),
        ]
    );
    assert_eq!(report.summary.skipped.no_z_match, 2);
    assert_eq!(report.chart.categories, vec!["PlateA", "PlateB"]);
    assert_eq!(
        format_pair_listing(&report.table),
        "All extracted numbers and subfolders: [(8267.25, 'PlateA'), (8268.75, 'PlateA'), (8578.5, 'PlateB')]"
    );
}

#[test]
fn e2e_by_subfolder_reads_marked_directories_by_default() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "doNotAnalyze_old/img_Z1.5_GFP-ref.tif");

    let report = run_by_subfolder(dir.path(), &by_subfolder(&AppConfig::default())).unwrap();
    assert_eq!(report.table.len(), 1);
    assert_eq!(report.table.rows()[0].subfolder_tag, "doNotAnalyze");
    // The first subfolder is always drawn in the neutral hue.
    assert_eq!(
        report.chart.boxes[0].hue,
        zsleuth::core::chart::Hue::Neutral
    );
}

#[cfg(unix)]
#[test]
fn e2e_by_subfolder_ignores_symlinked_directories() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(root, "Plate1/img_Z8267.5_GFP-ref.tif");
    fs::create_dir(root.join("elsewhere")).unwrap();
    std::os::unix::fs::symlink(
        root.join("elsewhere"),
        root.join("Plate1/link_Z8267.25_GFP-ref.tif"),
    )
    .unwrap();

    let report = run_by_subfolder(root, &by_subfolder(&AppConfig::default())).unwrap();
    let names: Vec<&str> = report
        .table
        .iter()
        .map(|r| r.file_name.as_str())
        .collect();
    assert_eq!(names, vec!["img_Z8267.5_GFP-ref.tif"]);
}

#[cfg(target_os = "linux")]
#[test]
fn e2e_non_utf8_file_name_is_counted_as_skipped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    let plate = dir.path().join("Plate1");
    fs::create_dir(&plate).unwrap();
    fs::write(plate.join("img_Z1.5_GFP-ref.tif"), b"").unwrap();
    fs::write(plate.join(OsStr::from_bytes(b"img_\xff_Z2.5_GFP-ref.tif")), b"").unwrap();

    let report = run_by_subfolder(dir.path(), &by_subfolder(&AppConfig::default())).unwrap();
    assert_eq!(report.table.len(), 1);
    assert_eq!(report.summary.files_visited, 2);
    assert_eq!(report.summary.skipped.non_utf8_name, 1);
}

// =============================================================================
// Export and grammar override
// =============================================================================

#[test]
fn e2e_export_csv_round_trip_row_count() {
    let dir = tempfile::tempdir().unwrap();
    well_run(dir.path());
    let report = run_by_well(dir.path(), &by_well(&AppConfig::default())).unwrap();

    let out = tempfile::tempdir().unwrap();
    let dest = out.path().join("z.csv");
    let written = export_to_path(&report.table, &dest).unwrap();
    assert_eq!(written, 4);

    let text = fs::read_to_string(&dest).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("plate_name,well_position,z_value,rig,source_file")
    );
    assert_eq!(lines.count(), 4);
}

#[test]
fn e2e_export_json_matches_csv_columns() {
    let dir = tempfile::tempdir().unwrap();
    well_run(dir.path());
    let report = run_by_well(dir.path(), &by_well(&AppConfig::default())).unwrap();

    let out = tempfile::tempdir().unwrap();
    let dest = out.path().join("z.json");
    assert_eq!(export_to_path(&report.table, &dest).unwrap(), 4);

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&dest).unwrap()).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    for row in rows {
        let mut keys: Vec<&str> = row.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["plate_name", "rig", "source_file", "well_position", "z_value"]
        );
    }
}

#[test]
fn e2e_user_grammar_changes_what_matches() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "PlateA/img_Z12.5_RFP-ref.tif");
    touch(dir.path(), "PlateA/img_Z13.5_GFP-ref.tif");

    let grammar_dir = tempfile::tempdir().unwrap();
    let grammar_path: PathBuf = grammar_dir.path().join("rfp.toml");
    fs::write(
        &grammar_path,
        r#"
[grammar]
id = "rfp"
name = "RFP by subfolder"

[match]
z_pattern = '_Z(?P<z>\d+\.\d+)_RFP-ref\.tif'
"#,
    )
    .unwrap();

    let grammar = load_grammar(PipelineKind::BySubfolder, Some(&grammar_path)).unwrap();
    let settings = BySubfolderSettings::from_config(&AppConfig::default(), grammar);
    let report = run_by_subfolder(dir.path(), &settings).unwrap();
    assert_eq!(report.table.len(), 1);
    assert_eq!(report.table.rows()[0].z_value, 12.5);
}

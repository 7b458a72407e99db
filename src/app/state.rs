// ZSleuth - app/state.rs
//
// Viewer state: the finished run's charts, table, and summary.
// Owned by the eframe::App implementation.

use crate::app::pipeline::{BySubfolderReport, ByWellReport};
use crate::core::chart::ChartSpec;
use crate::core::export;
use crate::core::model::{ScanSummary, SubfolderRecord, WellRecord};
use crate::core::table::RecordTable;
use std::path::Path;

/// One chart and whether its window is showing.
#[derive(Debug, Clone)]
pub struct ChartWindow {
    pub spec: ChartSpec,
    pub open: bool,
}

/// The extracted table of whichever pipeline ran.
#[derive(Debug, Clone)]
pub enum RunRecords {
    ByWell(RecordTable<WellRecord>),
    BySubfolder(RecordTable<SubfolderRecord>),
}

impl RunRecords {
    pub fn len(&self) -> usize {
        match self {
            RunRecords::ByWell(t) => t.len(),
            RunRecords::BySubfolder(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Top-level viewer state.
#[derive(Debug)]
pub struct ViewerState {
    pub charts: Vec<ChartWindow>,
    pub records: RunRecords,
    pub summary: ScanSummary,

    /// Status message for the status bar.
    pub status_message: String,

    /// Whether to show the scan summary dialog.
    pub show_summary: bool,

    /// Whether to show the About dialog.
    pub show_about: bool,
}

impl ViewerState {
    pub fn from_by_well(report: ByWellReport) -> Self {
        Self::new(
            report.charts,
            RunRecords::ByWell(report.table),
            report.summary,
        )
    }

    pub fn from_by_subfolder(report: BySubfolderReport) -> Self {
        Self::new(
            vec![report.chart],
            RunRecords::BySubfolder(report.table),
            report.summary,
        )
    }

    fn new(charts: Vec<ChartSpec>, records: RunRecords, summary: ScanSummary) -> Self {
        Self {
            charts: charts
                .into_iter()
                .map(|spec| ChartWindow { spec, open: true })
                .collect(),
            records,
            status_message: summary.status_line(),
            summary,
            show_summary: false,
            show_about: false,
        }
    }

    /// Number of chart windows currently showing.
    pub fn open_count(&self) -> usize {
        self.charts.iter().filter(|c| c.open).count()
    }

    /// Reopen every closed chart window.
    pub fn reopen_all(&mut self) {
        for chart in &mut self.charts {
            chart.open = true;
        }
    }

    /// Export the table to `dest` and report the outcome in the status bar.
    pub fn export_records(&mut self, dest: &Path) {
        let result = match &self.records {
            RunRecords::ByWell(t) => export::export_to_path(t, dest),
            RunRecords::BySubfolder(t) => export::export_to_path(t, dest),
        };
        self.status_message = match result {
            Ok(n) => format!("Exported {n} rows to {}.", dest.display()),
            Err(e) => {
                tracing::warn!(error = %e, "Export from viewer failed");
                format!("Export failed: {e}")
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{run_by_subfolder, BySubfolderSettings};
    use crate::core::grammar::load_builtin_grammar;
    use crate::core::model::PipelineKind;
    use crate::platform::config::AppConfig;

    fn state_for(dir: &Path) -> ViewerState {
        let grammar = load_builtin_grammar(PipelineKind::BySubfolder).unwrap();
        let settings = BySubfolderSettings::from_config(&AppConfig::default(), grammar);
        ViewerState::from_by_subfolder(run_by_subfolder(dir, &settings).unwrap())
    }

    #[test]
    fn test_charts_start_open_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_Z1.5_GFP-ref.tif"), b"").unwrap();
        let mut state = state_for(dir.path());
        assert_eq!(state.open_count(), 1);
        state.charts[0].open = false;
        assert_eq!(state.open_count(), 0);
        state.reopen_all();
        assert_eq!(state.open_count(), 1);
        assert_eq!(state.records.len(), 1);
    }

    #[test]
    fn test_export_sets_status() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_Z1.5_GFP-ref.tif"), b"").unwrap();
        let mut state = state_for(dir.path());

        let out = tempfile::tempdir().unwrap();
        state.export_records(&out.path().join("z.csv"));
        assert!(state.status_message.starts_with("Exported 1 rows"));

        state.export_records(&out.path().join("z.xlsx"));
        assert!(state.status_message.starts_with("Export failed"));
    }
}

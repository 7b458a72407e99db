// ZSleuth - ui/panels/summary.rs
//
// Scan summary window: counts, skip reasons, and walk warnings.

use crate::app::state::ViewerState;
use crate::ui::theme;

/// Render the scan summary dialog (if state.show_summary is true).
pub fn render(ctx: &egui::Context, state: &mut ViewerState) {
    if !state.show_summary {
        return;
    }

    let mut open = true;
    let summary = &state.summary;
    egui::Window::new("Scan Summary")
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .min_width(420.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.strong("Overview");
            egui::Grid::new("summary_overview")
                .num_columns(2)
                .spacing([16.0, 4.0])
                .show(ui, |ui| {
                    ui.label("Pipeline:");
                    ui.label(summary.pipeline.to_string());
                    ui.end_row();

                    ui.label("Root:");
                    ui.label(egui::RichText::new(summary.root.display().to_string()).monospace());
                    ui.end_row();

                    ui.label("Started:");
                    ui.label(summary.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
                    ui.end_row();

                    ui.label("Directories visited:");
                    ui.label(summary.dirs_visited.to_string());
                    ui.end_row();

                    ui.label("Files visited:");
                    ui.label(summary.files_visited.to_string());
                    ui.end_row();

                    ui.label("Files matched:");
                    ui.label(summary.files_matched.to_string());
                    ui.end_row();

                    ui.label("Duration:");
                    ui.label(format!("{:.2}s", summary.duration.as_secs_f64()));
                    ui.end_row();
                });

            ui.add_space(8.0);
            ui.separator();
            ui.strong(format!("Skipped files ({})", summary.skipped.total()));
            egui::Grid::new("summary_skips")
                .num_columns(2)
                .striped(true)
                .spacing([16.0, 3.0])
                .show(ui, |ui| {
                    let skipped = &summary.skipped;
                    for (label, count) in [
                        ("Gate substring absent", skipped.missing_substring),
                        ("Rejected by file pattern", skipped.pattern_filter),
                        ("No well match", skipped.no_well_match),
                        ("No Z match", skipped.no_z_match),
                        ("Non-UTF-8 name", skipped.non_utf8_name),
                        ("Below depth limit", skipped.beyond_max_depth),
                    ] {
                        ui.label(label);
                        ui.label(count.to_string());
                        ui.end_row();
                    }
                });

            if !summary.warnings.is_empty() {
                ui.add_space(8.0);
                ui.separator();
                ui.strong(format!("Warnings ({})", summary.warnings.len()));

                egui::ScrollArea::vertical()
                    .id_salt("summary_warnings")
                    .max_height(120.0)
                    .show(ui, |ui| {
                        for warn in &summary.warnings {
                            ui.label(
                                egui::RichText::new(warn)
                                    .color(theme::WARNING_TEXT)
                                    .size(11.5),
                            );
                        }
                    });
            }
        });

    if !open {
        state.show_summary = false;
    }
}

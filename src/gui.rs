// ZSleuth - gui.rs
//
// Top-level eframe::App implementation.
// Shows one window per chart plus a status bar and summary dialogs.

use crate::app::state::ViewerState;
use crate::ui;

/// The ZSleuth chart viewer.
pub struct ZSleuthApp {
    pub state: ViewerState,
}

impl ZSleuthApp {
    pub fn new(state: ViewerState) -> Self {
        Self { state }
    }

    fn export_dialog(&mut self, filter: &str, extension: &str) {
        let default_name = format!("{}.{extension}", self.state.summary.pipeline);
        if let Some(dest) = rfd::FileDialog::new()
            .add_filter(filter, &[extension])
            .set_file_name(default_name)
            .save_file()
        {
            self.state.export_records(&dest);
        }
    }
}

impl eframe::App for ZSleuthApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let has_rows = !self.state.records.is_empty();
                    ui.add_enabled_ui(has_rows, |ui| {
                        ui.menu_button("Export", |ui| {
                            if ui.button("Export CSV...").clicked() {
                                self.export_dialog("CSV", "csv");
                                ui.close_menu();
                            }
                            if ui.button("Export JSON...").clicked() {
                                self.export_dialog("JSON", "json");
                                ui.close_menu();
                            }
                        });
                    });
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("Scan Summary").clicked() {
                        self.state.show_summary = true;
                        ui.close_menu();
                    }
                    let any_closed = self.state.open_count() < self.state.charts.len();
                    ui.add_enabled_ui(any_closed, |ui| {
                        if ui.button("Reopen All Charts").clicked() {
                            self.state.reopen_all();
                            ui.close_menu();
                        }
                    });
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("\u{2139}").on_hover_text("About").clicked() {
                        self.state.show_about = true;
                    }
                });
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.state.status_message);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("{} rows", self.state.records.len()));
                    if !self.state.summary.warnings.is_empty() {
                        ui.separator();
                        ui.colored_label(
                            ui::theme::WARNING_TEXT,
                            format!("{} warnings", self.state.summary.warnings.len()),
                        );
                    }
                });
            });
        });

        // Central panel: chart list with visibility toggles.
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Charts");
            ui.add_space(4.0);
            for chart in &mut self.state.charts {
                let label = format!(
                    "{} ({} points)",
                    chart.spec.labels.title,
                    chart.spec.points.len()
                );
                ui.checkbox(&mut chart.open, label);
            }
        });

        for (index, chart) in self.state.charts.iter_mut().enumerate() {
            ui::panels::chart::render(ctx, index, chart);
        }

        ui::panels::summary::render(ctx, &mut self.state);
        ui::panels::about::render(ctx, &mut self.state);
    }
}

// ZSleuth - ui/panels/chart.rs
//
// One floating window per chart. Turns a `ChartSpec` into egui_plot items;
// every layout and colour decision was already made in core::chart.

use crate::app::state::ChartWindow;
use crate::core::chart::{self, ChartSpec, PointStyle};
use crate::ui::theme;
use crate::util::constants;
use egui_plot::{
    BoxElem, BoxPlot, BoxSpread, GridInput, GridMark, HLine, Legend, Line, LineStyle, MarkerShape,
    Plot, PlotPoint, PlotPoints, Points,
};
use std::ops::RangeInclusive;

/// Render chart window `index` (if it is open). Windows cascade by index.
pub fn render(ctx: &egui::Context, index: usize, window: &mut ChartWindow) {
    if !window.open {
        return;
    }

    let offset = index as f32 * constants::CHART_WINDOW_CASCADE;
    let spec = &window.spec;
    egui::Window::new(spec.labels.title.as_str())
        .id(egui::Id::new(("chart_window", index)))
        .open(&mut window.open)
        .default_pos([24.0 + offset, 48.0 + offset])
        .default_size(constants::CHART_WINDOW_SIZE)
        .resizable(true)
        .collapsible(true)
        .show(ctx, |ui| {
            plot(ui, index, spec);
        });
}

/// Draw `spec` into the remaining space of `ui`.
pub fn plot(ui: &mut egui::Ui, id: usize, spec: &ChartSpec) {
    if spec.is_empty() {
        ui.centered_and_justified(|ui| {
            ui.label("No matching files for this chart.");
        });
        return;
    }

    let count = spec.categories.len();
    let axis_categories = spec.categories.clone();
    let hover_categories = spec.categories.clone();

    Plot::new(("chart_plot", id))
        .legend(Legend::default())
        .x_axis_label(spec.labels.x_label.clone())
        .y_axis_label(spec.labels.y_label.clone())
        .x_grid_spacer(move |input: GridInput| category_marks(input, count))
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            chart::category_at(&axis_categories, mark.value)
                .unwrap_or_default()
                .to_string()
        })
        .label_formatter(move |name: &str, value: &PlotPoint| {
            let slot = value.x.round();
            let category = if slot >= 0.0 {
                hover_categories.get(slot as usize).map(String::as_str)
            } else {
                None
            };
            match (name.is_empty(), category) {
                (true, Some(c)) => format!("{c}\nz = {:.2}", value.y),
                (false, Some(c)) => format!("{name}\n{c}\nz = {:.2}", value.y),
                (_, None) => format!("z = {:.2}", value.y),
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if !spec.boxes.is_empty() {
                let elems: Vec<BoxElem> = spec
                    .boxes
                    .iter()
                    .map(|b| {
                        let s = b.summary;
                        // Whiskers collapse onto the box edges: only the
                        // quartile box and median are drawn.
                        BoxElem::new(b.category as f64, BoxSpread::new(s.q1, s.q1, s.median, s.q3, s.q3))
                            .box_width(constants::BOX_WIDTH)
                            .whisker_width(0.0)
                            .fill(egui::Color32::TRANSPARENT)
                            .stroke(egui::Stroke::new(1.5, theme::box_colour(b.hue)))
                    })
                    .collect();
                plot_ui.box_plot(BoxPlot::new(elems));
            }

            for (style, points) in group_by_style(spec) {
                plot_ui.points(
                    Points::new(points)
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(theme::POINT_RADIUS)
                        .color(theme::point_colour(style)),
                );
            }

            // Legend-only entries: empty series carrying a name and colour.
            for entry in &spec.legend {
                plot_ui.points(
                    Points::new(Vec::<[f64; 2]>::new())
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(theme::POINT_RADIUS)
                        .color(theme::style_colour(entry.style))
                        .name(&entry.label),
                );
            }

            if let Some(trend) = spec.trend {
                let line: PlotPoints = vec![
                    [trend.x_start, trend.fit.at(trend.x_start)],
                    [trend.x_end, trend.fit.at(trend.x_end)],
                ]
                .into();
                plot_ui.line(
                    Line::new(line)
                        .color(theme::TREND_COLOUR)
                        .width(theme::TREND_WIDTH),
                );
            }

            if let Some(y) = spec.reference_line {
                plot_ui.hline(
                    HLine::new(y)
                        .color(theme::REFERENCE_COLOUR)
                        .style(LineStyle::Dashed {
                            length: theme::REFERENCE_DASH,
                        })
                        .name(format!("Reference {y}")),
                );
            }
        });
}

/// Grid marks on every category slot inside the visible range.
fn category_marks(input: GridInput, count: usize) -> Vec<GridMark> {
    if count == 0 {
        return Vec::new();
    }
    let (lo, hi) = input.bounds;
    let first = lo.ceil().max(0.0) as usize;
    let last = hi.floor().min((count - 1) as f64);
    if last < 0.0 {
        return Vec::new();
    }
    (first..=last as usize)
        .map(|i| GridMark {
            value: i as f64,
            step_size: 1.0,
        })
        .collect()
}

/// Points bucketed by style, buckets in first-seen order.
fn group_by_style(spec: &ChartSpec) -> Vec<(PointStyle, Vec<[f64; 2]>)> {
    let mut groups: Vec<(PointStyle, Vec<[f64; 2]>)> = Vec::new();
    for p in &spec.points {
        match groups.iter_mut().find(|(s, _)| *s == p.style) {
            Some((_, pts)) => pts.push([p.x, p.y]),
            None => groups.push((p.style, vec![[p.x, p.y]])),
        }
    }
    groups
}

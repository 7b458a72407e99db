// ZSleuth - core/chart.rs
//
// Backend-free chart descriptions. The builders here decide category
// order, point placement, trend lines and colour roles; ui::panels::chart
// only turns a `ChartSpec` into egui_plot items. Keeping the decisions here
// makes every plotting rule testable without a window.

use crate::core::model::SubfolderRecord;
use crate::core::stats::{self, BoxSummary, LinearFit};
use crate::core::table::RecordTable;
use crate::util::constants;
use std::collections::HashMap;

// =============================================================================
// Colour roles
// =============================================================================

/// Base colour family of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hue {
    /// Black/grey, reserved for the first subfolder.
    Neutral,
    Green,
    Blue,
}

/// Lightness variant within a hue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shade {
    Light,
    Base,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointStyle {
    pub hue: Hue,
    pub shade: Shade,
}

impl PointStyle {
    pub const DEFAULT: PointStyle = PointStyle {
        hue: Hue::Blue,
        shade: Shade::Base,
    };
}

/// Box colour for the subfolder first seen at `index`: the first is
/// neutral, the rest alternate blue (odd) and green (even).
pub fn subfolder_hue(index: usize) -> Hue {
    match index {
        0 => Hue::Neutral,
        i if i % 2 == 0 => Hue::Green,
        _ => Hue::Blue,
    }
}

/// Marker shade from the plate row encoded in the file name:
/// rows A/B are light, G/H dark, everything else base.
pub fn marker_shade(file_name: &str) -> Shade {
    if file_name.contains("-A") || file_name.contains("-B") {
        Shade::Light
    } else if file_name.contains("-G") || file_name.contains("-H") {
        Shade::Dark
    } else {
        Shade::Base
    }
}

/// Marker hue for a point in a subfolder drawn with `box_hue`.
/// Only green boxes get green markers; neutral and blue boxes get blue.
pub fn marker_hue(box_hue: Hue) -> Hue {
    match box_hue {
        Hue::Green => Hue::Green,
        Hue::Neutral | Hue::Blue => Hue::Blue,
    }
}

// =============================================================================
// Chart description
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    /// Index into `ChartSpec::categories`.
    pub category: usize,
    /// Plot x: category index plus any swarm offset.
    pub x: f64,
    pub y: f64,
    pub style: PointStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBox {
    pub category: usize,
    pub summary: BoxSummary,
    pub hue: Hue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    pub fit: LinearFit,
    pub x_start: f64,
    pub x_end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub style: PointStyle,
}

/// Title and axis labels of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLabels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

/// Everything needed to draw one figure.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub labels: ChartLabels,
    /// Category names; category `i` is drawn at x = i.
    pub categories: Vec<String>,
    pub points: Vec<ChartPoint>,
    pub boxes: Vec<CategoryBox>,
    pub trend: Option<TrendLine>,
    pub reference_line: Option<f64>,
    pub legend: Vec<LegendEntry>,
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Category name at plot x, if x sits on a category slot.
    pub fn category_at(&self, x: f64) -> Option<&str> {
        category_at(&self.categories, x)
    }
}

/// Name of the category slot at plot x. Off-slot positions have none.
pub fn category_at(categories: &[String], x: f64) -> Option<&str> {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return None;
    }
    categories.get(rounded as usize).map(String::as_str)
}

// =============================================================================
// Builders
// =============================================================================

/// Categorical swarm with a least-squares trend over category codes
/// (categories sorted ascending) and an optional reference line.
pub fn swarm_with_trend<R, C, V>(
    rows: &RecordTable<R>,
    category: C,
    value: V,
    labels: ChartLabels,
    reference_line: Option<f64>,
) -> ChartSpec
where
    C: Fn(&R) -> String,
    V: Fn(&R) -> f64,
{
    let mut spec = categorical_swarm(rows, category, value, labels, reference_line);

    let coded: Vec<(f64, f64)> = spec
        .points
        .iter()
        .map(|p| (p.category as f64, p.y))
        .collect();
    spec.trend = stats::linear_fit(&coded).map(|fit| {
        let (lo, hi) = coded
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| {
                (lo.min(x), hi.max(x))
            });
        TrendLine {
            fit,
            x_start: lo,
            x_end: hi,
        }
    });
    spec
}

/// Categorical swarm without a trend line.
pub fn swarm<R, C, V>(
    rows: &RecordTable<R>,
    category: C,
    value: V,
    labels: ChartLabels,
    reference_line: Option<f64>,
) -> ChartSpec
where
    C: Fn(&R) -> String,
    V: Fn(&R) -> f64,
{
    categorical_swarm(rows, category, value, labels, reference_line)
}

fn categorical_swarm<R, C, V>(
    rows: &RecordTable<R>,
    category: C,
    value: V,
    labels: ChartLabels,
    reference_line: Option<f64>,
) -> ChartSpec
where
    C: Fn(&R) -> String,
    V: Fn(&R) -> f64,
{
    let categories = rows.sorted_unique(&category);
    let index: HashMap<&str, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let tolerance = value_range(rows.iter().map(&value)) * constants::SWARM_OVERLAP_FRACTION;

    // Group values per category, remembering input order.
    let mut per_category: Vec<Vec<f64>> = vec![Vec::new(); categories.len()];
    for row in rows {
        let cat = category(row);
        if let Some(&i) = index.get(cat.as_str()) {
            per_category[i].push(value(row));
        }
    }

    let mut points = Vec::with_capacity(rows.len());
    for (i, values) in per_category.iter().enumerate() {
        let offsets = stats::swarm_offsets(
            values,
            constants::SWARM_POINT_SPACING,
            constants::SWARM_MAX_WIDTH,
            tolerance,
        );
        points.extend(values.iter().zip(offsets).map(|(&y, dx)| ChartPoint {
            category: i,
            x: i as f64 + dx,
            y,
            style: PointStyle::DEFAULT,
        }));
    }

    ChartSpec {
        labels,
        categories,
        points,
        boxes: Vec::new(),
        trend: None,
        reference_line,
        legend: Vec::new(),
    }
}

/// Box summary per subfolder (first-seen order) with every point overlaid
/// at its category centre, coloured by subfolder and file-name row.
pub fn box_and_swarm(table: &RecordTable<SubfolderRecord>, labels: ChartLabels) -> ChartSpec {
    let categories = table.first_seen_unique(|r| r.subfolder_tag.clone());
    let index: HashMap<&str, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut points = Vec::with_capacity(table.len());
    let mut per_category: Vec<Vec<f64>> = vec![Vec::new(); categories.len()];
    for row in table {
        let Some(&i) = index.get(row.subfolder_tag.as_str()) else {
            continue;
        };
        per_category[i].push(row.z_value);
        points.push(ChartPoint {
            category: i,
            x: i as f64,
            y: row.z_value,
            style: PointStyle {
                hue: marker_hue(subfolder_hue(i)),
                shade: marker_shade(&row.file_name),
            },
        });
    }

    let boxes = per_category
        .iter()
        .enumerate()
        .filter_map(|(i, values)| {
            stats::box_summary(values).map(|summary| CategoryBox {
                category: i,
                summary,
                hue: subfolder_hue(i),
            })
        })
        .collect();

    ChartSpec {
        labels,
        categories,
        points,
        boxes,
        trend: None,
        reference_line: None,
        legend: subfolder_legend(),
    }
}

fn subfolder_legend() -> Vec<LegendEntry> {
    let entry = |label: &str, hue, shade| LegendEntry {
        label: label.to_string(),
        style: PointStyle { hue, shade },
    };
    vec![
        entry(constants::DEFAULT_EXCLUSION_MARKER, Hue::Neutral, Shade::Base),
        entry("A or B (rig2)", Hue::Green, Shade::Light),
        entry("A or B (rig1)", Hue::Blue, Shade::Light),
        entry("G or H (rig2)", Hue::Green, Shade::Dark),
        entry("G or H (rig1)", Hue::Blue, Shade::Dark),
    ]
}

fn value_range(values: impl Iterator<Item = f64>) -> f64 {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo.is_finite() && hi.is_finite() {
        hi - lo
    } else {
        0.0
    }
}

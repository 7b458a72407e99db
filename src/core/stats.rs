// ZSleuth - core/stats.rs
//
// Numeric helpers behind the charts: least-squares trend, box summaries,
// and beeswarm layout. Pure functions over f64 slices.

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a line through `(x, y)` points.
///
/// Returns `None` for fewer than two points or when every x is the same
/// (a vertical line has no slope).
pub fn linear_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    if sxx.abs() < f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Five-number summary of one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: usize,
}

/// Quartiles with linear interpolation between closest ranks.
/// NaN values are ignored. Returns `None` when nothing is left.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(BoxSummary {
        min: sorted[0],
        q1: percentile_sorted(&sorted, 0.25),
        median: percentile_sorted(&sorted, 0.5),
        q3: percentile_sorted(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
        count: sorted.len(),
    })
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Horizontal offsets that fan out overlapping points of one category.
///
/// Values within `tolerance` of their neighbour (in sorted order) form a
/// cluster; inside a cluster points alternate right and left of the centre
/// in steps of `spacing`, clamped to half of `max_width`. The result is in
/// input order and is deterministic for a given input.
pub fn swarm_offsets(values: &[f64], spacing: f64, max_width: f64, tolerance: f64) -> Vec<f64> {
    let mut offsets = vec![0.0; values.len()];
    if values.is_empty() {
        return offsets;
    }

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));

    let half = max_width / 2.0;
    let mut slot = 0usize;
    let mut prev = values[order[0]];
    for &idx in &order {
        if (values[idx] - prev).abs() > tolerance {
            slot = 0;
        }
        prev = values[idx];

        // 0, +1, -1, +2, -2, ...
        let step = slot.div_ceil(2) as f64;
        let sign = if slot % 2 == 1 { 1.0 } else { -1.0 };
        offsets[idx] = (sign * step * spacing).clamp(-half, half);
        slot += 1;
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_fit_exact_line() {
        let pts = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0), (3.0, 7.0)];
        let fit = linear_fit(&pts).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.at(10.0) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_fit_degenerate() {
        assert!(linear_fit(&[(1.0, 2.0)]).is_none());
        assert!(linear_fit(&[(1.0, 2.0), (1.0, 5.0)]).is_none());
    }

    #[test]
    fn test_box_summary_interpolates() {
        let s = box_summary(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!((s.q1 - 1.75).abs() < 1e-12);
        assert!((s.median - 2.5).abs() < 1e-12);
        assert!((s.q3 - 3.25).abs() < 1e-12);
        assert_eq!(s.count, 4);
    }

    #[test]
    fn test_box_summary_single_and_empty() {
        let s = box_summary(&[7.0]).unwrap();
        assert_eq!((s.q1, s.median, s.q3), (7.0, 7.0, 7.0));
        assert!(box_summary(&[]).is_none());
        assert!(box_summary(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_swarm_spreads_ties() {
        let offsets = swarm_offsets(&[5.0, 5.0, 5.0, 9.0], 0.1, 0.8, 0.01);
        assert_eq!(offsets[0], 0.0);
        assert!((offsets[1] - 0.1).abs() < 1e-12);
        assert!((offsets[2] + 0.1).abs() < 1e-12);
        assert_eq!(offsets[3], 0.0, "isolated point stays centred");
    }

    #[test]
    fn test_swarm_clamped_to_width() {
        let values = vec![1.0; 50];
        let offsets = swarm_offsets(&values, 0.1, 0.8, 0.0);
        assert!(offsets.iter().all(|o| o.abs() <= 0.4 + 1e-12));
    }
}

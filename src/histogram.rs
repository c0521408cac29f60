//! Density histograms and Gaussian kernel density estimates.

use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};

/// Number of points the density curve is evaluated on.
pub const KDE_GRID_POINTS: usize = 200;

/// Upper bound on automatically chosen bins. Past it the Freedman-Diaconis
/// width is ignored in favour of Sturges.
pub const MAX_AUTO_BINS: usize = 10_000;

/// How many bins a histogram gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinRule {
    Fixed(usize),
    /// The narrower of the Sturges and Freedman-Diaconis bin widths.
    Auto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` ascending edges; the last bin is closed on the right.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Heights normalised so that the bar areas sum to one.
    pub density: Vec<f64>,
    /// Number of values binned (non-finite values are skipped).
    pub total: usize,
}

impl Histogram {
    pub fn compute(values: &[f64], rule: BinRule) -> Result<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Err(PlotError::input_type("no finite values to bin"));
        }

        let (mut lo, mut hi) = min_max(&finite);
        if hi - lo < f64::EPSILON {
            // Scaled so the padding survives rounding at large magnitudes.
            let pad = 0.5f64.max(lo.abs() * 1e-6);
            lo -= pad;
            hi += pad;
        }
        if !(hi - lo).is_finite() || hi <= lo {
            return Err(PlotError::input_type(format!(
                "values spanning [{}, {}] cannot be binned",
                lo, hi
            )));
        }

        let bins = match rule {
            BinRule::Fixed(0) => return Err(PlotError::config("histogram needs at least one bin")),
            BinRule::Fixed(n) => n,
            BinRule::Auto => auto_bin_count(&finite, hi - lo),
        };

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|k| lo + width * k as f64).collect();
        let mut counts = vec![0usize; bins];
        for &v in &finite {
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let total = finite.len();
        let density = counts
            .iter()
            .map(|&c| c as f64 / (total as f64 * width))
            .collect();

        Ok(Histogram {
            edges,
            counts,
            density,
            total,
        })
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }

    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    pub fn max_density(&self) -> f64 {
        self.density.iter().copied().fold(0.0, f64::max)
    }

    /// Total bar area; one for any non-empty histogram.
    pub fn area(&self) -> f64 {
        self.density.iter().sum::<f64>() * self.bin_width()
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn auto_bin_count(values: &[f64], span: f64) -> usize {
    let n = values.len() as f64;
    let sturges = span / (n.log2() + 1.0);

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);
    let fd = 2.0 * iqr / n.cbrt();

    let sturges_bins = ((span / sturges).ceil() as usize).max(1);
    if !(fd > 0.0) || fd >= sturges {
        return sturges_bins;
    }
    // Clustered data with a few distant outliers shrinks the FD width
    // without bound.
    let fd_bins = (span / fd).ceil();
    if fd_bins > MAX_AUTO_BINS as f64 {
        sturges_bins
    } else {
        (fd_bins as usize).max(1)
    }
}

/// Linear-interpolated percentile of sorted data.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Gaussian kernel density estimate sampled on an even grid.
#[derive(Debug, Clone, PartialEq)]
pub struct KdeCurve {
    pub xs: Vec<f64>,
    pub density: Vec<f64>,
    pub bandwidth: f64,
}

impl KdeCurve {
    /// Estimate over the data range with Scott's bandwidth. Returns `None`
    /// when the data has no spread to smooth.
    pub fn over_data(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.len() < 2 {
            return None;
        }
        let (lo, hi) = min_max(&finite);
        Self::estimate(&finite, lo, hi, KDE_GRID_POINTS)
    }

    pub fn estimate(values: &[f64], lo: f64, hi: f64, points: usize) -> Option<Self> {
        let bandwidth = scott_bandwidth(values)?;
        if points < 2 || !(hi > lo) {
            return None;
        }
        let n = values.len() as f64;
        let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
        let step = (hi - lo) / (points - 1) as f64;

        let xs: Vec<f64> = (0..points).map(|i| lo + step * i as f64).collect();
        let density = xs
            .iter()
            .map(|&x| {
                values
                    .iter()
                    .map(|&xi| {
                        let u = (x - xi) / bandwidth;
                        (-0.5 * u * u).exp()
                    })
                    .sum::<f64>()
                    * norm
            })
            .collect();

        Some(KdeCurve {
            xs,
            density,
            bandwidth,
        })
    }

    pub fn max_density(&self) -> f64 {
        self.density.iter().copied().fold(0.0, f64::max)
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.density.iter().copied())
    }
}

/// `std * n^(-1/5)` with the sample standard deviation.
fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();
    if std > 0.0 && std.is_finite() {
        Some(std * n.powf(-0.2))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.37).sin() * 3.0 + i as f64 * 0.01).collect()
    }

    #[test]
    fn fixed_bins_cover_every_value() {
        let values = ramp(1000);
        let hist = Histogram::compute(&values, BinRule::Fixed(30)).unwrap();
        assert_eq!(hist.bins(), 30);
        assert_eq!(hist.edges.len(), 31);
        assert_eq!(hist.counts.iter().sum::<usize>(), 1000);
        assert_eq!(hist.total, 1000);
        assert!((hist.area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn maximum_lands_in_last_bin() {
        let hist = Histogram::compute(&[0.0, 1.0, 2.0, 3.0], BinRule::Fixed(3)).unwrap();
        assert_eq!(hist.counts, vec![1, 1, 2]);
        assert_eq!(hist.range(), (0.0, 3.0));
    }

    #[test]
    fn constant_input_gets_unit_range() {
        let hist = Histogram::compute(&[2.0; 10], BinRule::Auto).unwrap();
        assert_eq!(hist.range(), (1.5, 2.5));
        assert_eq!(hist.counts.iter().sum::<usize>(), 10);
    }

    #[test]
    fn auto_rule_matches_sturges_for_small_uniform_data() {
        // IQR of 0..=7 is 3.5 -> FD width 3.5, Sturges width 7/4; the narrower wins.
        let values: Vec<f64> = (0..8).map(f64::from).collect();
        let hist = Histogram::compute(&values, BinRule::Auto).unwrap();
        assert_eq!(hist.bins(), 4);
    }

    #[test]
    fn clustered_data_with_outlier_keeps_bin_count_bounded() {
        let mut values: Vec<f64> = (0..1000).map(|i| i as f64 * 1e-9).collect();
        values[999] = 1e6;
        let hist = Histogram::compute(&values, BinRule::Auto).unwrap();
        assert!(hist.bins() <= MAX_AUTO_BINS);
        // Sturges: ceil(log2(1000) + 1)
        assert_eq!(hist.bins(), 11);
        assert_eq!(hist.counts.iter().sum::<usize>(), 1000);
    }

    #[test]
    fn constant_huge_values_keep_a_finite_width() {
        let hist = Histogram::compute(&[1e20; 10], BinRule::Auto).unwrap();
        let (lo, hi) = hist.range();
        assert!(lo < 1e20 && hi > 1e20);
        assert!(hist.bin_width() > 0.0);
        assert!(hist.density.iter().all(|d| d.is_finite()));
        assert!((hist.area() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unbinnable_span_is_rejected() {
        assert!(matches!(
            Histogram::compute(&[-f64::MAX, f64::MAX], BinRule::Fixed(4)),
            Err(PlotError::InputType { .. })
        ));
    }

    #[test]
    fn non_finite_values_are_skipped() {
        let hist =
            Histogram::compute(&[1.0, f64::NAN, 2.0, f64::INFINITY], BinRule::Fixed(2)).unwrap();
        assert_eq!(hist.total, 2);
        assert!(matches!(
            Histogram::compute(&[f64::NAN], BinRule::Auto),
            Err(PlotError::InputType { .. })
        ));
        assert!(matches!(
            Histogram::compute(&[1.0], BinRule::Fixed(0)),
            Err(PlotError::Configuration(_))
        ));
    }

    #[test]
    fn kde_integrates_to_one_over_padded_range() {
        let values = ramp(500);
        let kde = KdeCurve::estimate(&values, -10.0, 15.0, 2000).unwrap();
        let step = kde.xs[1] - kde.xs[0];
        let integral: f64 = kde.density.iter().sum::<f64>() * step;
        assert!((integral - 1.0).abs() < 1e-3, "integral was {}", integral);
    }

    #[test]
    fn kde_spans_the_data() {
        let values = ramp(100);
        let kde = KdeCurve::over_data(&values).unwrap();
        assert_eq!(kde.xs.len(), KDE_GRID_POINTS);
        let (lo, hi) = min_max(&values);
        assert_eq!(kde.xs[0], lo);
        assert!((kde.xs[KDE_GRID_POINTS - 1] - hi).abs() < 1e-9);
        assert!(KdeCurve::over_data(&[4.0; 5]).is_none());
    }
}

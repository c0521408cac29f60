use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};

/// Closed interval along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        AxisRange { min, max }
    }

    pub fn validate(&self, axis: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(PlotError::config(format!(
                "{} range must be finite, got ({}, {})",
                axis, self.min, self.max
            )));
        }
        if self.min >= self.max {
            return Err(PlotError::config(format!(
                "{} range must satisfy min < max, got ({}, {})",
                axis, self.min, self.max
            )));
        }
        Ok(())
    }
}

impl Default for AxisRange {
    fn default() -> Self {
        AxisRange::new(-5.0, 5.0)
    }
}

impl From<(f64, f64)> for AxisRange {
    fn from((min, max): (f64, f64)) -> Self {
        AxisRange::new(min, max)
    }
}

/// Regular sampling of a rectangle, meshed in `xy` order:
/// `x[[i, j]] == xs[j]` and `y[[i, j]] == ys[i]`.
#[derive(Debug, Clone)]
pub struct Grid {
    pub xs: Array1<f64>, // x axis samples (columns)
    pub ys: Array1<f64>, // y axis samples (rows)
    pub x: Array2<f64>,
    pub y: Array2<f64>,
}

impl Grid {
    pub fn new(x_range: AxisRange, y_range: AxisRange, resolution: usize) -> Result<Self> {
        x_range.validate("x")?;
        y_range.validate("y")?;
        if resolution < 2 {
            return Err(PlotError::config(format!(
                "grid resolution must be at least 2, got {}",
                resolution
            )));
        }

        let xs = Array1::linspace(x_range.min, x_range.max, resolution);
        let ys = Array1::linspace(y_range.min, y_range.max, resolution);
        let x = Array2::from_shape_fn((resolution, resolution), |(_, j)| xs[j]);
        let y = Array2::from_shape_fn((resolution, resolution), |(i, _)| ys[i]);

        Ok(Grid { xs, ys, x, y })
    }

    pub fn resolution(&self) -> usize {
        self.xs.len()
    }

    /// Spacing between neighbouring samples along x and y.
    pub fn spacing(&self) -> (f64, f64) {
        let n = (self.resolution() - 1) as f64;
        (
            (self.xs[self.xs.len() - 1] - self.xs[0]) / n,
            (self.ys[self.ys.len() - 1] - self.ys[0]) / n,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_resolution_squared_points() {
        for resolution in [2, 3, 17, 100] {
            let grid = Grid::new((-5.0, 5.0).into(), (0.0, 1.0).into(), resolution).unwrap();
            assert_eq!(grid.x.dim(), (resolution, resolution));
            assert_eq!(grid.x.dim(), grid.y.dim());
            assert_eq!(grid.x.len(), resolution * resolution);
        }
    }

    #[test]
    fn axes_hit_both_endpoints() {
        let grid = Grid::new((-2.0, 3.0).into(), (10.0, 20.0).into(), 11).unwrap();
        assert_eq!(grid.xs[0], -2.0);
        assert_eq!(grid.xs[10], 3.0);
        assert_eq!(grid.ys[0], 10.0);
        assert_eq!(grid.ys[10], 20.0);
        let (dx, dy) = grid.spacing();
        assert!((dx - 0.5).abs() < 1e-12);
        assert!((dy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mesh_uses_xy_indexing() {
        let grid = Grid::new((0.0, 2.0).into(), (0.0, 4.0).into(), 3).unwrap();
        // x varies along columns, y along rows
        assert_eq!(grid.x[[0, 2]], 2.0);
        assert_eq!(grid.x[[2, 0]], 0.0);
        assert_eq!(grid.y[[2, 0]], 4.0);
        assert_eq!(grid.y[[0, 2]], 0.0);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            Grid::new(AxisRange::default(), AxisRange::default(), 1),
            Err(PlotError::Configuration(_))
        ));
        assert!(matches!(
            Grid::new((1.0, -1.0).into(), AxisRange::default(), 10),
            Err(PlotError::Configuration(_))
        ));
        assert!(matches!(
            Grid::new(AxisRange::default(), (0.0, f64::NAN).into(), 10),
            Err(PlotError::Configuration(_))
        ));
    }
}

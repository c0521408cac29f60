//! Sampling shared by the static and interactive surface renderers.

use ndarray::Array2;

use crate::error::Result;
use crate::field::{evaluate_2d, ScalarField};
use crate::grid::{AxisRange, Grid};
use crate::trajectory::{Trajectory, TrajectorySpec};

/// A scalar field evaluated on a grid, plus any trajectories lifted onto it.
#[derive(Debug, Clone)]
pub struct SampledSurface {
    pub grid: Grid,
    pub z: Array2<f64>,
    pub trajectories: Vec<Trajectory>,
}

impl SampledSurface {
    /// Evaluates `field` once over the whole grid and once per trajectory.
    pub fn sample<F: ScalarField + ?Sized>(
        field: &F,
        x_range: AxisRange,
        y_range: AxisRange,
        resolution: usize,
        trajectories: &[TrajectorySpec],
    ) -> Result<Self> {
        for spec in trajectories {
            spec.validate()?;
        }
        let grid = Grid::new(x_range, y_range, resolution)?;
        let z = evaluate_2d(field, &grid.x, &grid.y)?;
        let trajectories = trajectories
            .iter()
            .map(|spec| spec.sample(field))
            .collect::<Result<Vec<_>>>()?;

        let (dx, dy) = grid.spacing();
        log::debug!(
            "sampled {}x{} surface (spacing {:.3e} x {:.3e}) with {} trajectories",
            grid.resolution(),
            grid.resolution(),
            dx,
            dy,
            trajectories.len()
        );
        Ok(SampledSurface {
            grid,
            z,
            trajectories,
        })
    }

    /// Range of finite heights over the surface and trajectories. Degenerate
    /// ranges are widened so the value axis always has extent.
    pub fn z_bounds(&self) -> (f64, f64) {
        let values = self
            .z
            .iter()
            .chain(self.trajectories.iter().flat_map(|t| t.z.iter()))
            .copied()
            .filter(|v| v.is_finite());
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !min.is_finite() {
            return (-1.0, 1.0);
        }
        if max - min < f64::EPSILON {
            return (min - 0.5, max + 0.5);
        }
        (min, max)
    }

    /// Height range of the sampled grid alone, used for colouring.
    pub fn surface_bounds(&self) -> (f64, f64) {
        self.z
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    }
}

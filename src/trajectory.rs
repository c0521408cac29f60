use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};
use crate::field::{evaluate_1d, ScalarField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DashStyle {
    #[default]
    Solid,
    Dash,
    Dot,
}

/// Visual properties of a trajectory line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    /// CSS colour name or `#rrggbb`.
    #[serde(default = "default_line_color")]
    pub color: String,
    #[serde(default = "default_line_width")]
    pub width: f64,
    #[serde(default)]
    pub dash: DashStyle,
    #[serde(default)]
    pub label: Option<String>,
}

fn default_line_color() -> String {
    "red".to_string()
}

fn default_line_width() -> f64 {
    2.0
}

impl Default for LineStyle {
    fn default() -> Self {
        LineStyle {
            color: default_line_color(),
            width: default_line_width(),
            dash: DashStyle::Solid,
            label: None,
        }
    }
}

/// A straight path across the (x, y) plane, drawn on top of a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySpec {
    pub start: [f64; 2],
    pub end: [f64; 2],
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default)]
    pub style: LineStyle,
}

fn default_samples() -> usize {
    15
}

impl TrajectorySpec {
    pub fn new(start: [f64; 2], end: [f64; 2], samples: usize) -> Self {
        TrajectorySpec {
            start,
            end,
            samples,
            style: LineStyle::default(),
        }
    }

    /// Build from per-axis spans, `((x0, x1), (y0, y1))`.
    pub fn from_spans(x_span: (f64, f64), y_span: (f64, f64), samples: usize) -> Self {
        Self::new([x_span.0, y_span.0], [x_span.1, y_span.1], samples)
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(PlotError::config("trajectory needs at least one sample"));
        }
        if self.start.iter().chain(self.end.iter()).any(|v| !v.is_finite()) {
            return Err(PlotError::config(format!(
                "trajectory endpoints must be finite, got {:?} -> {:?}",
                self.start, self.end
            )));
        }
        if !(self.style.width > 0.0) {
            return Err(PlotError::config(format!(
                "trajectory line width must be positive, got {}",
                self.style.width
            )));
        }
        Ok(())
    }

    /// Interpolate the path and lift it onto `field`.
    pub fn sample<F: ScalarField + ?Sized>(&self, field: &F) -> Result<Trajectory> {
        self.validate()?;
        let x = interpolate(self.start[0], self.end[0], self.samples);
        let y = interpolate(self.start[1], self.end[1], self.samples);
        let z = evaluate_1d(field, &x, &y)?;
        Ok(Trajectory { x, y, z })
    }
}

fn interpolate(from: f64, to: f64, samples: usize) -> Array1<f64> {
    if samples == 1 {
        return Array1::from_elem(1, from);
    }
    Array1::linspace(from, to, samples)
}

/// Sampled trajectory points on a surface.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub z: Array1<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.x
            .iter()
            .zip(self.y.iter())
            .zip(self.z.iter())
            .map(|((&x, &y), &z)| (x, y, z))
    }
}

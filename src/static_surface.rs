//! Static 3D surface plots rendered to an RGB bitmap with plotters.

use std::path::Path;

use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::colors::{parse_color, ColorSampler, Colormap};
use crate::error::{PlotError, Result};
use crate::field::ScalarField;
use crate::figure::{Figure, FigureSize, RenderTarget};
use crate::grid::AxisRange;
use crate::surface::SampledSurface;
use crate::trajectory::{DashStyle, LineStyle, TrajectorySpec};

const COLORBAR_STEPS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticSurfaceOptions {
    #[serde(default)]
    pub x_range: AxisRange,
    #[serde(default)]
    pub y_range: AxisRange,
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    #[serde(default)]
    pub colormap: Colormap,
    /// Paint the whole surface in one colour instead of the colormap.
    #[serde(default)]
    pub solid_color: Option<String>,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_size")]
    pub size: FigureSize,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_true")]
    pub show_colorbar: bool,
    /// Camera elevation and rotation, in radians.
    #[serde(default = "default_pitch")]
    pub pitch: f64,
    #[serde(default = "default_yaw")]
    pub yaw: f64,
    #[serde(default)]
    pub trajectory: Option<TrajectorySpec>,
    #[serde(default)]
    pub target: RenderTarget,
}

fn default_resolution() -> usize {
    100
}

fn default_alpha() -> f64 {
    0.8
}

fn default_size() -> FigureSize {
    FigureSize::new(1200, 800)
}

fn default_title() -> String {
    "3D Plot of z = f(x, y)".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pitch() -> f64 {
    0.5
}

fn default_yaw() -> f64 {
    0.7
}

impl Default for StaticSurfaceOptions {
    fn default() -> Self {
        StaticSurfaceOptions {
            x_range: AxisRange::default(),
            y_range: AxisRange::default(),
            resolution: default_resolution(),
            colormap: Colormap::default(),
            solid_color: None,
            alpha: default_alpha(),
            size: default_size(),
            title: default_title(),
            show_colorbar: true,
            pitch: default_pitch(),
            yaw: default_yaw(),
            trajectory: None,
            target: RenderTarget::Inline,
        }
    }
}

impl StaticSurfaceOptions {
    /// Overlay the conventional single trajectory: 15 samples, red dashed
    /// line of width 2, labelled "Trajectory".
    pub fn with_trajectory(mut self, x_span: (f64, f64), y_span: (f64, f64)) -> Self {
        let style = LineStyle {
            color: "red".to_string(),
            width: 2.0,
            dash: DashStyle::Dash,
            label: Some("Trajectory".to_string()),
        };
        self.trajectory = Some(TrajectorySpec::from_spans(x_span, y_span, 15).with_style(style));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(PlotError::config(format!(
                "alpha must be in [0, 1], got {}",
                self.alpha
            )));
        }
        self.size.validate()?;
        if let Some(color) = &self.solid_color {
            parse_color(color)?;
        }
        self.output_path()?;
        Ok(())
    }

    /// Where the PNG goes, if anywhere. An external viewer needs the
    /// interactive renderer.
    fn output_path(&self) -> Result<Option<&Path>> {
        match &self.target {
            RenderTarget::Inline => Ok(None),
            RenderTarget::SavedFile { path } => Ok(Some(path)),
            RenderTarget::ExternalViewer { .. } => Err(PlotError::config(
                "the static renderer cannot target an external viewer; use the interactive renderer",
            )),
        }
    }
}

/// The rendered bitmap together with the data it was drawn from.
#[derive(Debug, Clone)]
pub struct StaticSurface {
    pub figure: Figure,
    pub surface: SampledSurface,
}

pub fn render_static_surface<F: ScalarField + ?Sized>(
    field: &F,
    options: &StaticSurfaceOptions,
) -> Result<StaticSurface> {
    options.validate()?;
    let trajectories: Vec<TrajectorySpec> = options.trajectory.iter().cloned().collect();
    let surface = SampledSurface::sample(
        field,
        options.x_range,
        options.y_range,
        options.resolution,
        &trajectories,
    )?;

    let figure = draw(&surface, options)?;

    if let Some(path) = options.output_path()? {
        figure.save_png(path)?;
        log::info!("Saved surface plot: {}", path.display());
    }

    Ok(StaticSurface { figure, surface })
}

fn draw(surface: &SampledSurface, options: &StaticSurfaceOptions) -> Result<Figure> {
    let mut buffer = options.size.buffer();
    {
        let root =
            BitMapBackend::with_buffer(&mut buffer, options.size.as_tuple()).into_drawing_area();
        root.fill(&WHITE)?;

        let (plot_area, bar_area) = if options.show_colorbar {
            let split = options.size.width * 88 / 100;
            let (left, right) = root.split_horizontally(split);
            (left, Some(right))
        } else {
            (root.clone(), None)
        };

        let sampler = options.colormap.sampler();
        let solid = options.solid_color.as_deref().map(parse_color).transpose()?;
        let (z_min, z_max) = surface.z_bounds();
        let (c_min, c_max) = surface.surface_bounds();
        let x = options.x_range;
        let y = options.y_range;

        // plotters' 3D charts treat the second axis as vertical.
        let mut chart = ChartBuilder::on(&plot_area)
            .caption(&options.title, ("sans-serif", 30))
            .margin(20)
            .build_cartesian_3d(x.min..x.max, z_min..z_max, y.min..y.max)?;

        let (pitch, yaw) = (options.pitch, options.yaw);
        chart.with_projection(|mut pb| {
            pb.pitch = pitch;
            pb.yaw = yaw;
            pb.scale = 0.8;
            pb.into_matrix()
        });

        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.1))
            .max_light_lines(3)
            .draw()?;

        let axis_font = ("sans-serif", 20).into_font().color(&BLACK);
        chart.draw_series([
            Text::new("X", (x.max, z_min, y.min), axis_font.clone()),
            Text::new("Y", (x.min, z_min, y.max), axis_font.clone()),
            Text::new("Z", (x.min, z_max, y.min), axis_font),
        ])?;

        let (rows, cols) = surface.z.dim();
        let gx = &surface.grid.x;
        let gy = &surface.grid.y;
        let z = &surface.z;
        let coord = chart.as_coord_spec();
        let mut cells = Vec::with_capacity((rows - 1) * (cols - 1));
        for i in 0..rows - 1 {
            for j in 0..cols - 1 {
                let corners = [(i, j), (i, j + 1), (i + 1, j + 1), (i + 1, j)];
                if corners.iter().any(|&idx| !z[idx].is_finite()) {
                    continue;
                }
                let mean = corners.iter().map(|&idx| z[idx]).sum::<f64>() / 4.0;
                let color = solid.unwrap_or_else(|| sampler.value_to_color(mean, c_min, c_max));
                let points = corners
                    .iter()
                    .map(|&idx| (gx[idx], z[idx], gy[idx]))
                    .collect::<Vec<_>>();
                let depth: i64 = points
                    .iter()
                    .map(|(px, pz, py)| i64::from(coord.projected_depth(px, pz, py)))
                    .sum();
                cells.push((depth, points, color));
            }
        }
        // Painter's order: the deepest cells first so nearer ones cover them.
        cells.sort_by(|a, b| b.0.cmp(&a.0));
        chart.draw_series(cells.into_iter().map(|(_, points, color)| {
            Polygon::new(points, color.mix(options.alpha).filled())
        }))?;

        let mut labelled = false;
        if let (Some(spec), Some(trajectory)) = (&options.trajectory, surface.trajectories.first())
        {
            let stroke = parse_color(&spec.style.color)?
                .stroke_width(spec.style.width.round().max(1.0) as u32);
            let points: Vec<(f64, f64, f64)> =
                trajectory.points().map(|(px, py, pz)| (px, pz, py)).collect();
            let anno = chart.draw_series(
                dash_segments(&points, spec.style.dash)
                    .into_iter()
                    .map(|segment| PathElement::new(segment, stroke)),
            )?;
            if let Some(label) = &spec.style.label {
                anno.label(label.as_str()).legend(move |(lx, ly)| {
                    PathElement::new(vec![(lx, ly), (lx + 20, ly)], stroke)
                });
                labelled = true;
            }
        }
        if labelled {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        if let Some(bar_area) = bar_area {
            draw_colorbar(&bar_area, &sampler, c_min, c_max)?;
        }

        root.present()?;
    }
    Ok(Figure::from_buffer(options.size, buffer))
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    sampler: &ColorSampler,
    min: f64,
    max: f64,
) -> Result<()> {
    let (min, max) = if min.is_finite() && max > min {
        (min, max)
    } else {
        (-1.0, 1.0)
    };
    let mut chart = ChartBuilder::on(area)
        .margin_top(120)
        .margin_bottom(120)
        .margin_right(10)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..1.0, min..max)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(6)
        .draw()?;

    let step = (max - min) / COLORBAR_STEPS as f64;
    chart
        .draw_series((0..COLORBAR_STEPS).map(|k| {
            let lo = min + step * k as f64;
            let color = sampler.value_to_color(lo + step / 2.0, min, max);
            Rectangle::new([(0.0, lo), (1.0, lo + step)], color.filled())
        }))?;
    Ok(())
}

/// Break a polyline into the visible pieces of a dash pattern. Each segment
/// is subdivided so the pattern stays visible on short trajectories.
fn dash_segments(points: &[(f64, f64, f64)], dash: DashStyle) -> Vec<Vec<(f64, f64, f64)>> {
    let (pieces, on, period) = match dash {
        DashStyle::Solid => return vec![points.to_vec()],
        DashStyle::Dash => (6, 1, 2),
        DashStyle::Dot => (12, 1, 3),
    };
    let mut segments = Vec::new();
    let mut counter = 0usize;
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        for k in 0..pieces {
            let t0 = k as f64 / pieces as f64;
            let t1 = (k + 1) as f64 / pieces as f64;
            if counter % period < on {
                segments.push(vec![lerp(a, b, t0), lerp(a, b, t1)]);
            }
            counter += 1;
        }
    }
    segments
}

fn lerp(a: (f64, f64, f64), b: (f64, f64, f64), t: f64) -> (f64, f64, f64) {
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

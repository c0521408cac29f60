//! Interactive 3D surfaces rendered as plotly HTML documents.

use std::path::Path;
use std::process::Command;

use plotly::common::{ColorScale, ColorScaleElement, DashType, Line, Mode};
use plotly::layout::{Axis, Layout, LayoutScene, Margin};
use plotly::{Plot, Scatter3D, Surface};
use serde::{Deserialize, Serialize};

use crate::colors::{parse_color, ColorStop};
use crate::error::{PlotError, Result};
use crate::field::ScalarField;
use crate::figure::{ensure_parent_dir, RenderTarget};
use crate::grid::AxisRange;
use crate::surface::SampledSurface;
use crate::trajectory::{DashStyle, TrajectorySpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractiveSurfaceOptions {
    #[serde(default)]
    pub x_range: AxisRange,
    #[serde(default)]
    pub y_range: AxisRange,
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    #[serde(default = "default_color_scale")]
    pub color_scale: Vec<ColorStop>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Draw tick labels, grid lines, zero lines and axis lines.
    #[serde(default)]
    pub show_axis_chrome: bool,
    #[serde(default)]
    pub trajectories: Vec<TrajectorySpec>,
    #[serde(default)]
    pub target: RenderTarget,
}

fn default_resolution() -> usize {
    100
}

fn default_color_scale() -> Vec<ColorStop> {
    vec![ColorStop::new(0.0, "purple"), ColorStop::new(1.0, "blue")]
}

fn default_opacity() -> f64 {
    0.99
}

impl Default for InteractiveSurfaceOptions {
    fn default() -> Self {
        InteractiveSurfaceOptions {
            x_range: AxisRange::default(),
            y_range: AxisRange::default(),
            resolution: default_resolution(),
            color_scale: default_color_scale(),
            opacity: default_opacity(),
            show_axis_chrome: false,
            trajectories: Vec::new(),
            target: RenderTarget::Inline,
        }
    }
}

impl InteractiveSurfaceOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(PlotError::config(format!(
                "opacity must be in [0, 1], got {}",
                self.opacity
            )));
        }
        if self.color_scale.len() < 2 {
            return Err(PlotError::config("colour scale needs at least two stops"));
        }
        for stop in &self.color_scale {
            if !(0.0..=1.0).contains(&stop.position) {
                return Err(PlotError::config(format!(
                    "colour stop position must be in [0, 1], got {}",
                    stop.position
                )));
            }
            parse_color(&stop.color)?;
        }
        for traj in &self.trajectories {
            parse_color(&traj.style.color)?;
        }
        Ok(())
    }
}

/// The plotly figure together with the data it was built from.
pub struct InteractiveSurface {
    pub plot: Plot,
    pub surface: SampledSurface,
}

/// Render `field` as an interactive surface.
///
/// Returns `None` when the target is [`RenderTarget::ExternalViewer`]: the
/// page is written (and opened if requested) but the caller gets no figure
/// to keep working with.
pub fn render_interactive_surface<F: ScalarField + ?Sized>(
    field: &F,
    options: &InteractiveSurfaceOptions,
) -> Result<Option<InteractiveSurface>> {
    options.validate()?;
    let surface = SampledSurface::sample(
        field,
        options.x_range,
        options.y_range,
        options.resolution,
        &options.trajectories,
    )?;
    let plot = build_plot(&surface, options);

    match &options.target {
        RenderTarget::Inline => Ok(Some(InteractiveSurface { plot, surface })),
        RenderTarget::SavedFile { path } => {
            write_html(&plot, path)?;
            log::info!("Saved interactive surface: {}", path.display());
            Ok(Some(InteractiveSurface { plot, surface }))
        }
        RenderTarget::ExternalViewer { path, launch } => {
            write_html(&plot, path)?;
            if *launch {
                open_in_browser(path)?;
            }
            log::info!(
                "Plotted in external viewer ({}); no figure returned",
                path.display()
            );
            Ok(None)
        }
    }
}

fn write_html(plot: &Plot, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    std::fs::write(path, plot.to_html()).map_err(|source| PlotError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Hand the already written page to the platform's default opener. The
/// path is passed as an OS string, so it need not be UTF-8.
fn open_in_browser(path: &Path) -> Result<()> {
    viewer_command(path)
        .spawn()
        .map_err(|source| PlotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

#[cfg(target_os = "windows")]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(target_os = "macos")]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

fn build_plot(surface: &SampledSurface, options: &InteractiveSurfaceOptions) -> Plot {
    let z: Vec<Vec<f64>> = surface.z.outer_iter().map(|row| row.to_vec()).collect();
    let scale = options
        .color_scale
        .iter()
        .map(|stop| ColorScaleElement(stop.position, stop.color.clone()))
        .collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Surface::new(z)
            .x(surface.grid.xs.to_vec())
            .y(surface.grid.ys.to_vec())
            .color_scale(ColorScale::Vector(scale))
            .show_scale(false)
            .opacity(options.opacity),
    );

    for (spec, traj) in options.trajectories.iter().zip(&surface.trajectories) {
        let mut line = Line::new()
            .color(spec.style.color.clone())
            .width(spec.style.width);
        line = match spec.style.dash {
            DashStyle::Solid => line,
            DashStyle::Dash => line.dash(DashType::Dash),
            DashStyle::Dot => line.dash(DashType::Dot),
        };
        let mut trace = Scatter3D::new(traj.x.to_vec(), traj.y.to_vec(), traj.z.to_vec())
            .mode(Mode::Lines)
            .line(line);
        if let Some(label) = &spec.style.label {
            trace = trace.name(label.as_str());
        }
        plot.add_trace(trace);
    }

    let mut layout = Layout::new()
        .show_legend(false)
        .margin(Margin::new().left(0).right(0).bottom(0).top(0));
    if !options.show_axis_chrome {
        layout = layout.scene(
            LayoutScene::new()
                .x_axis(hidden_axis())
                .y_axis(hidden_axis())
                .z_axis(hidden_axis()),
        );
    }
    plot.set_layout(layout);
    plot
}

fn hidden_axis() -> Axis {
    Axis::new()
        .show_tick_labels(false)
        .show_grid(false)
        .zero_line(false)
        .show_line(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::BuiltinField;
    use crate::trajectory::LineStyle;

    fn small_options() -> InteractiveSurfaceOptions {
        InteractiveSurfaceOptions {
            resolution: 12,
            ..Default::default()
        }
    }

    #[test]
    fn one_trace_per_trajectory_plus_surface() {
        let options = InteractiveSurfaceOptions {
            trajectories: vec![
                TrajectorySpec::new([-4.0, -4.0], [4.0, 4.0], 20),
                TrajectorySpec::new([-4.0, 4.0], [4.0, -4.0], 7).with_style(LineStyle {
                    color: "#00ff00".to_string(),
                    width: 5.0,
                    dash: DashStyle::Dot,
                    label: Some("descent".to_string()),
                }),
            ],
            ..small_options()
        };
        let rendered = render_interactive_surface(&BuiltinField::Saddle, &options)
            .unwrap()
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&rendered.plot.to_json()).unwrap();
        let traces = json["data"].as_array().unwrap();
        assert_eq!(traces.len(), 3);
        assert_eq!(traces[0]["type"], "surface");
        assert_eq!(traces[1]["x"].as_array().unwrap().len(), 20);
        assert_eq!(traces[2]["x"].as_array().unwrap().len(), 7);
        assert_eq!(traces[2]["name"], "descent");
        assert_eq!(rendered.surface.z.dim(), (12, 12));
    }

    #[test]
    fn axis_chrome_hidden_by_default() {
        let rendered = render_interactive_surface(&BuiltinField::Ripple, &small_options())
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered.plot.to_json()).unwrap();
        assert_eq!(json["layout"]["scene"]["xaxis"]["showticklabels"], false);
        assert_eq!(json["layout"]["showlegend"], false);

        let shown = InteractiveSurfaceOptions {
            show_axis_chrome: true,
            ..small_options()
        };
        let rendered = render_interactive_surface(&BuiltinField::Ripple, &shown)
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered.plot.to_json()).unwrap();
        assert!(json["layout"]["scene"].is_null());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn viewer_gets_the_written_path_verbatim() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"plot-\xff.html"));
        let options = InteractiveSurfaceOptions {
            target: RenderTarget::external_viewer(&path, false),
            ..small_options()
        };
        assert!(render_interactive_surface(&BuiltinField::Saddle, &options)
            .unwrap()
            .is_none());
        assert!(path.exists());

        let cmd = viewer_command(&path);
        assert_eq!(cmd.get_program(), "xdg-open");
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(args, vec![path.as_os_str()]);
    }

    #[test]
    fn bad_opacity_is_rejected() {
        let options = InteractiveSurfaceOptions {
            opacity: -0.1,
            ..small_options()
        };
        assert!(matches!(
            render_interactive_surface(&BuiltinField::Ripple, &options),
            Err(PlotError::Configuration(_))
        ));
    }
}

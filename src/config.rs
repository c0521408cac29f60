use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::colors::{ColorStop, Colormap};
use crate::distribution::DistributionOptions;
use crate::field::BuiltinField;
use crate::figure::RenderTarget;
use crate::grid::AxisRange;
use crate::interactive_surface::InteractiveSurfaceOptions;
use crate::static_surface::StaticSurfaceOptions;
use crate::trajectory::TrajectorySpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// PNG through plotters; at most one trajectory.
    Static,
    /// HTML through plotly.
    #[default]
    Interactive,
}

/// Surface plot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    #[serde(default)]
    pub field: BuiltinField,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub x_range: AxisRange,
    #[serde(default)]
    pub y_range: AxisRange,
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    #[serde(default)]
    pub colormap: Option<Colormap>, // static backend
    #[serde(default)]
    pub color_scale: Option<Vec<ColorStop>>, // interactive backend
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub solid_color: Option<String>,
    #[serde(default)]
    pub show_axis_chrome: bool,
    #[serde(default)]
    pub trajectories: Vec<TrajectorySpec>,
    #[serde(default)]
    pub output: RenderTarget,
}

fn default_resolution() -> usize {
    100
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            field: BuiltinField::default(),
            backend: Backend::default(),
            x_range: AxisRange::default(),
            y_range: AxisRange::default(),
            resolution: default_resolution(),
            colormap: None,
            color_scale: None,
            opacity: None,
            solid_color: None,
            show_axis_chrome: false,
            trajectories: Vec::new(),
            output: RenderTarget::Inline,
        }
    }
}

impl SurfaceConfig {
    fn validate(&self) -> Result<()> {
        self.x_range.validate("x")?;
        self.y_range.validate("y")?;
        if self.resolution < 2 {
            return Err(anyhow!(
                "resolution must be at least 2, got {}",
                self.resolution
            ));
        }

        match self.backend {
            Backend::Static => {
                self.static_options()?.validate()?;
            }
            Backend::Interactive => {
                if self.solid_color.is_some() {
                    return Err(anyhow!("solid_color is only supported by the static backend"));
                }
                self.interactive_options().validate()?;
            }
        }
        for traj in &self.trajectories {
            traj.validate()?;
        }
        Ok(())
    }

    pub fn static_options(&self) -> Result<StaticSurfaceOptions> {
        if self.trajectories.len() > 1 {
            return Err(anyhow!(
                "the static backend draws at most one trajectory, got {}",
                self.trajectories.len()
            ));
        }
        let defaults = StaticSurfaceOptions::default();
        Ok(StaticSurfaceOptions {
            x_range: self.x_range,
            y_range: self.y_range,
            resolution: self.resolution,
            colormap: self.colormap.unwrap_or(defaults.colormap),
            solid_color: self.solid_color.clone(),
            alpha: self.opacity.unwrap_or(defaults.alpha),
            trajectory: self.trajectories.first().cloned(),
            target: self.output.clone(),
            ..defaults
        })
    }

    pub fn interactive_options(&self) -> InteractiveSurfaceOptions {
        let defaults = InteractiveSurfaceOptions::default();
        InteractiveSurfaceOptions {
            x_range: self.x_range,
            y_range: self.y_range,
            resolution: self.resolution,
            color_scale: match (&self.color_scale, &self.colormap) {
                (Some(stops), _) => stops.clone(),
                (None, Some(colormap)) => colormap.stops(9),
                (None, None) => defaults.color_scale,
            },
            opacity: self.opacity.unwrap_or(defaults.opacity),
            show_axis_chrome: self.show_axis_chrome,
            trajectories: self.trajectories.clone(),
            target: self.output.clone(),
        }
    }
}

/// Demo network whose recorded activations get plotted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_layer_sizes")]
    pub layer_sizes: Vec<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub seed: u64,
}

fn default_layer_sizes() -> Vec<usize> {
    vec![10, 16, 16, 3]
}

fn default_batch_size() -> usize {
    100
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            layer_sizes: default_layer_sizes(),
            batch_size: default_batch_size(),
            seed: 0,
        }
    }
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.layer_sizes.len() < 2 || self.layer_sizes.contains(&0) {
            return Err(anyhow!(
                "layer_sizes needs an input size and at least one positive layer size, got {:?}",
                self.layer_sizes
            ));
        }
        if self.batch_size == 0 {
            return Err(anyhow!("batch_size must be positive"));
        }
        Ok(())
    }
}

/// Complete plotting configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub distribution: DistributionOptions,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;

        // Validate before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.surface.validate()?;
        self.distribution.validate()?;
        self.network.validate()?;
        Ok(())
    }

    pub fn log_summary(&self) {
        log::info!("=== Plot Configuration ===");
        log::info!(
            "Surface: {} on x={:?} y={:?} at {}x{} ({:?} backend, {} trajectories)",
            self.surface.field.name(),
            (self.surface.x_range.min, self.surface.x_range.max),
            (self.surface.y_range.min, self.surface.y_range.max),
            self.surface.resolution,
            self.surface.resolution,
            self.surface.backend,
            self.surface.trajectories.len()
        );
        log::info!(
            "Distribution: {:?} mode, max_columns={:?}, {}x{} px, output={:?}",
            self.distribution.mode,
            self.distribution.max_columns,
            self.distribution.size.width,
            self.distribution.size.height,
            self.distribution.output
        );
        log::info!(
            "Network: layers {:?}, batch {}, seed {}",
            self.network.layer_sizes,
            self.network.batch_size,
            self.network.seed
        );
        log::info!("==========================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionMode;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.surface.field, BuiltinField::Paraboloid);
        assert_eq!(config.surface.backend, Backend::Interactive);
        assert_eq!(config.surface.resolution, 100);
        assert_eq!(config.distribution.mode, DistributionMode::Aggregate);
        assert_eq!(config.network.layer_sizes, vec![10, 16, 16, 3]);
    }

    #[test]
    fn parses_a_full_surface_section() {
        let config = Config::from_toml(
            r##"
            [surface]
            field = "himmelblau"
            backend = "static"
            resolution = 40
            x_range = { min = -6.0, max = 6.0 }
            opacity = 0.5
            colormap = { scheme = "viridis" }
            output = { kind = "saved_file", path = "out/himmelblau.png" }

            [[surface.trajectories]]
            start = [-5.0, -5.0]
            end = [3.0, 2.0]
            samples = 15
            style = { color = "#ff0000", dash = "dash", label = "Trajectory" }
            "##,
        )
        .unwrap();

        let options = config.surface.static_options().unwrap();
        assert_eq!(options.resolution, 40);
        assert_eq!(options.alpha, 0.5);
        assert_eq!(options.x_range, AxisRange::new(-6.0, 6.0));
        assert_eq!(options.y_range, AxisRange::new(-5.0, 5.0));
        assert!(!options.colormap.reversed);
        assert_eq!(options.trajectory.unwrap().end, [3.0, 2.0]);
        assert_eq!(options.target, RenderTarget::saved_file("out/himmelblau.png"));
    }

    #[test]
    fn static_backend_rejects_multiple_trajectories() {
        let err = Config::from_toml(
            r#"
            [surface]
            backend = "static"
            [[surface.trajectories]]
            start = [0.0, 0.0]
            end = [1.0, 1.0]
            [[surface.trajectories]]
            start = [1.0, 0.0]
            end = [0.0, 1.0]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("at most one trajectory"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_toml("[surface]\nresolution = 1").is_err());
        assert!(Config::from_toml("[surface]\nx_range = { min = 2.0, max = 1.0 }").is_err());
        assert!(Config::from_toml("[distribution]\nmax_columns = 0").is_err());
        assert!(Config::from_toml("[network]\nbatch_size = 0").is_err());
        assert!(Config::from_toml("[surface]\nsolid_color = \"red\"").is_err());
        assert!(Config::from_toml("[surface]\nfield = \"banana\"").is_err());
    }

    #[test]
    fn colormap_becomes_interactive_colour_scale() {
        let config = Config::from_toml("[surface]\ncolormap = { scheme = \"magma\" }").unwrap();
        let options = config.surface.interactive_options();
        assert_eq!(options.color_scale.len(), 9);
        assert_eq!(options.opacity, 0.99);
    }
}

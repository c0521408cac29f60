use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};

/// Sequential and diverging colour schemes available to the surface plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    BuPu,
    Purples,
    Blues,
    Viridis,
    Plasma,
    Inferno,
    Magma,
    RdYlBu,
    Spectral,
}

/// A colour scheme plus orientation; `reversed` flips low and high ends
/// (matplotlib's `_r` suffix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colormap {
    pub scheme: ColorScheme,
    #[serde(default)]
    pub reversed: bool,
}

impl Default for Colormap {
    fn default() -> Self {
        Colormap {
            scheme: ColorScheme::BuPu,
            reversed: true,
        }
    }
}

impl Colormap {
    pub fn new(scheme: ColorScheme, reversed: bool) -> Self {
        Colormap { scheme, reversed }
    }

    fn gradient(&self) -> Box<dyn colorgrad::Gradient> {
        match self.scheme {
            ColorScheme::BuPu => Box::new(colorgrad::preset::bu_pu()),
            ColorScheme::Purples => Box::new(colorgrad::preset::purples()),
            ColorScheme::Blues => Box::new(colorgrad::preset::blues()),
            ColorScheme::Viridis => Box::new(colorgrad::preset::viridis()),
            ColorScheme::Plasma => Box::new(colorgrad::preset::plasma()),
            ColorScheme::Inferno => Box::new(colorgrad::preset::inferno()),
            ColorScheme::Magma => Box::new(colorgrad::preset::magma()),
            ColorScheme::RdYlBu => Box::new(colorgrad::preset::rd_yl_bu()),
            ColorScheme::Spectral => Box::new(colorgrad::preset::spectral()),
        }
    }

    /// Build a sampler once per plot; creating the gradient is not free.
    pub fn sampler(&self) -> ColorSampler {
        ColorSampler {
            gradient: self.gradient(),
            reversed: self.reversed,
        }
    }

    /// Evenly spaced stops suitable for a plotly colour scale.
    pub fn stops(&self, count: usize) -> Vec<ColorStop> {
        let sampler = self.sampler();
        let count = count.max(2);
        (0..count)
            .map(|i| {
                let position = i as f64 / (count - 1) as f64;
                let RGBColor(r, g, b) = sampler.at(position);
                ColorStop::new(position, format!("#{:02x}{:02x}{:02x}", r, g, b))
            })
            .collect()
    }
}

pub struct ColorSampler {
    gradient: Box<dyn colorgrad::Gradient>,
    reversed: bool,
}

impl ColorSampler {
    /// Colour at `t` in [0, 1]; out-of-range values are clamped.
    pub fn at(&self, t: f64) -> RGBColor {
        let t = t.clamp(0.0, 1.0);
        let t = if self.reversed { 1.0 - t } else { t };
        let rgba = self.gradient.at(t as f32).to_rgba8();
        RGBColor(rgba[0], rgba[1], rgba[2])
    }

    pub fn value_to_color(&self, value: f64, min_val: f64, max_val: f64) -> RGBColor {
        let normalized = if max_val > min_val {
            (value - min_val) / (max_val - min_val)
        } else {
            0.5
        };
        self.at(normalized)
    }
}

/// One entry of an interactive colour scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: String,
}

impl ColorStop {
    pub fn new(position: f64, color: impl Into<String>) -> Self {
        ColorStop {
            position,
            color: color.into(),
        }
    }
}

/// Parse a CSS colour name or hex string.
pub fn parse_color(spec: &str) -> Result<RGBColor> {
    let color = colorgrad::Color::from_html(spec)
        .map_err(|e| PlotError::config(format!("invalid colour '{}': {}", spec, e)))?;
    let rgba = color.to_rgba8();
    Ok(RGBColor(rgba[0], rgba[1], rgba[2]))
}

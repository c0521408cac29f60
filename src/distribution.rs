//! Activation distribution plots: density histograms with a KDE overlay,
//! either for the whole array or column by column.

use std::ffi::OsString;
use std::path::PathBuf;

use ndarray::{ArrayD, Axis};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};
use crate::figure::{Figure, FigureSize};
use crate::histogram::{BinRule, Histogram, KdeCurve};
use crate::sample::ToNumericArray;

const AGGREGATE_BINS: usize = 30;
const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    /// One histogram per column (axis 1) of an array with at least two axes.
    PerColumn,
    /// A single histogram over every value.
    #[default]
    Aggregate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionOutput {
    /// Return the rendered figures to the caller.
    #[default]
    Inline,
    /// Write `{prefix}_column_{n}.png` or `{prefix}_entire_tensor.png`.
    Save { prefix: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionOptions {
    #[serde(default)]
    pub mode: DistributionMode,
    /// Upper bound on the columns plotted in per-column mode; all columns
    /// when unset.
    #[serde(default)]
    pub max_columns: Option<usize>,
    #[serde(default = "default_size")]
    pub size: FigureSize,
    #[serde(default)]
    pub output: DistributionOutput,
}

fn default_size() -> FigureSize {
    FigureSize::new(1000, 600)
}

impl Default for DistributionOptions {
    fn default() -> Self {
        DistributionOptions {
            mode: DistributionMode::Aggregate,
            max_columns: None,
            size: default_size(),
            output: DistributionOutput::Inline,
        }
    }
}

impl DistributionOptions {
    pub fn per_column(max_columns: Option<usize>) -> Self {
        DistributionOptions {
            mode: DistributionMode::PerColumn,
            max_columns,
            ..Default::default()
        }
    }

    pub fn saving_to(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.output = DistributionOutput::Save {
            prefix: prefix.into(),
        };
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_columns == Some(0) {
            return Err(PlotError::config("max_columns must be at least 1"));
        }
        self.size.validate()
    }
}

#[derive(Debug, Clone)]
pub enum PlotOutput {
    Figure(Figure),
    File(PathBuf),
}

/// One rendered histogram and the numbers behind it.
#[derive(Debug, Clone)]
pub struct RenderedHistogram {
    /// Zero-based column index in per-column mode.
    pub column: Option<usize>,
    pub title: String,
    pub histogram: Histogram,
    pub kde: Option<KdeCurve>,
    pub output: PlotOutput,
}

/// Plot the distribution of `data`.
///
/// Conversion and binning happen for every requested plot before anything is
/// drawn, so a rejected input never leaves files behind.
pub fn plot_distribution<D: ToNumericArray + ?Sized>(
    data: &D,
    options: &DistributionOptions,
) -> Result<Vec<RenderedHistogram>> {
    options.validate()?;
    let array = data.to_numeric_array()?;
    if array.is_empty() {
        return Err(PlotError::input_type("empty array"));
    }

    let prepared = match options.mode {
        DistributionMode::PerColumn => prepare_columns(&array, options.max_columns)?,
        DistributionMode::Aggregate => {
            let values: Vec<f64> = array.iter().copied().collect();
            let histogram = Histogram::compute(&values, BinRule::Fixed(AGGREGATE_BINS))?;
            let kde = KdeCurve::over_data(&values);
            vec![Prepared {
                column: None,
                title: "Distribution of the Entire Tensor".to_string(),
                histogram,
                kde,
            }]
        }
    };
    log::debug!(
        "plotting {} histogram(s) for array of shape {:?}",
        prepared.len(),
        array.shape()
    );

    let plotter = HistogramPlotter::new(options.size);
    prepared
        .into_iter()
        .map(|p| {
            let figure = plotter.plot_histogram(&p.histogram, p.kde.as_ref(), &p.title)?;
            let output = match &options.output {
                DistributionOutput::Inline => PlotOutput::Figure(figure),
                DistributionOutput::Save { prefix } => {
                    let path = output_path(prefix, p.column);
                    figure.save_png(&path)?;
                    log::info!("Saved histogram: {}", path.display());
                    PlotOutput::File(path)
                }
            };
            Ok(RenderedHistogram {
                column: p.column,
                title: p.title,
                histogram: p.histogram,
                kde: p.kde,
                output,
            })
        })
        .collect()
}

struct Prepared {
    column: Option<usize>,
    title: String,
    histogram: Histogram,
    kde: Option<KdeCurve>,
}

fn prepare_columns(array: &ArrayD<f64>, max_columns: Option<usize>) -> Result<Vec<Prepared>> {
    if array.ndim() < 2 {
        return Err(PlotError::input_type(format!(
            "{}-dimensional array (per-column mode needs at least 2 dimensions)",
            array.ndim()
        )));
    }
    let total = array.shape()[1];
    let count = max_columns.unwrap_or(total).min(total);

    (0..count)
        .map(|i| {
            let values: Vec<f64> = array.index_axis(Axis(1), i).iter().copied().collect();
            Ok(Prepared {
                column: Some(i),
                title: format!("Distribution of Column {}", i + 1),
                histogram: Histogram::compute(&values, BinRule::Auto)?,
                kde: KdeCurve::over_data(&values),
            })
        })
        .collect()
}

/// Files are numbered from 1, matching the plot titles.
fn output_path(prefix: &std::path::Path, column: Option<usize>) -> PathBuf {
    let suffix = match column {
        Some(i) => format!("_column_{}.png", i + 1),
        None => "_entire_tensor.png".to_string(),
    };
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Draws a single density histogram with its KDE curve.
pub struct HistogramPlotter {
    size: FigureSize,
    bar_color: RGBColor,
}

impl HistogramPlotter {
    pub fn new(size: FigureSize) -> Self {
        HistogramPlotter {
            size,
            bar_color: BAR_COLOR,
        }
    }

    pub fn plot_histogram(
        &self,
        histogram: &Histogram,
        kde: Option<&KdeCurve>,
        title: &str,
    ) -> Result<Figure> {
        let mut buffer = self.size.buffer();
        {
            let root = BitMapBackend::with_buffer(&mut buffer, self.size.as_tuple())
                .into_drawing_area();
            root.fill(&WHITE)?;

            let (lo, hi) = histogram.range();
            let peak = histogram
                .max_density()
                .max(kde.map_or(0.0, KdeCurve::max_density));
            let y_max = if peak > 0.0 { peak * 1.05 } else { 1.0 };

            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 30))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(lo..hi, 0.0..y_max)?;

            chart
                .configure_mesh()
                .x_desc("Value")
                .y_desc("Density")
                .draw()?;

            let bars = histogram.edges.windows(2).zip(&histogram.density);
            chart.draw_series(bars.clone().map(|(edge, &height)| {
                Rectangle::new(
                    [(edge[0], 0.0), (edge[1], height)],
                    self.bar_color.mix(0.5).filled(),
                )
            }))?;
            chart.draw_series(bars.map(|(edge, &height)| {
                Rectangle::new([(edge[0], 0.0), (edge[1], height)], WHITE.stroke_width(1))
            }))?;

            if let Some(kde) = kde {
                chart.draw_series(LineSeries::new(
                    kde.points(),
                    self.bar_color.stroke_width(2),
                ))?;
            }

            root.present()?;
        }
        Ok(Figure::from_buffer(self.size, buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn output_paths_are_numbered_from_one() {
        let prefix = Path::new("out/layer_3_dist");
        assert_eq!(
            output_path(prefix, Some(0)),
            PathBuf::from("out/layer_3_dist_column_1.png")
        );
        assert_eq!(
            output_path(prefix, None),
            PathBuf::from("out/layer_3_dist_entire_tensor.png")
        );
    }

    #[test]
    fn zero_max_columns_is_rejected() {
        let options = DistributionOptions::per_column(Some(0));
        assert!(matches!(
            plot_distribution(&vec![1.0, 2.0], &options),
            Err(PlotError::Configuration(_))
        ));
    }

    #[test]
    fn per_column_mode_needs_two_dimensions() {
        let options = DistributionOptions::per_column(None);
        assert!(matches!(
            plot_distribution(&vec![1.0, 2.0, 3.0], &options),
            Err(PlotError::InputType { .. })
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        let empty: Vec<f64> = Vec::new();
        assert!(matches!(
            plot_distribution(&empty, &DistributionOptions::default()),
            Err(PlotError::InputType { .. })
        ));
    }

    #[test]
    fn options_read_from_toml() {
        let options: DistributionOptions = toml::from_str(
            "mode = \"per_column\"\nmax_columns = 5\n[output]\nkind = \"save\"\nprefix = \"layer_3_dist\"",
        )
        .unwrap();
        assert_eq!(options.mode, DistributionMode::PerColumn);
        assert_eq!(options.max_columns, Some(5));
        assert_eq!(options.size, FigureSize::new(1000, 600));
        assert_eq!(
            options.output,
            DistributionOutput::Save {
                prefix: PathBuf::from("layer_3_dist")
            }
        );
    }
}

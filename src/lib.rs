//! Plotting helpers for inspecting models: 3D surfaces of `z = f(x, y)` with
//! optional trajectories, and density histograms of layer activations.
//!
//! Surfaces are rendered either to a bitmap with plotters
//! ([`render_static_surface`]) or to an interactive plotly page
//! ([`render_interactive_surface`]). Activation distributions go through
//! [`plot_distribution`], which accepts anything implementing
//! [`ToNumericArray`].

pub mod activations;
pub mod colors;
pub mod config;
pub mod distribution;
pub mod error;
pub mod field;
pub mod figure;
pub mod grid;
pub mod histogram;
pub mod interactive_surface;
pub mod sample;
pub mod static_surface;
pub mod surface;
pub mod trajectory;

pub use distribution::{plot_distribution, DistributionMode, DistributionOptions};
pub use error::{EvaluationError, PlotError, Result};
pub use field::{BuiltinField, ScalarField, Vectorized};
pub use figure::{Figure, RenderTarget};
pub use interactive_surface::{render_interactive_surface, InteractiveSurfaceOptions};
pub use sample::{TensorLike, ToNumericArray};
pub use static_surface::{render_static_surface, StaticSurfaceOptions};
pub use trajectory::TrajectorySpec;

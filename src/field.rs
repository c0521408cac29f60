//! Scalar fields: functions from an (x, y) coordinate to a height.
//!
//! A field is evaluated on whole coordinate arrays at once. Pointwise closures
//! `Fn(f64, f64) -> f64` are fields automatically; array-level functions that
//! may fail are wrapped in [`Vectorized`].

use std::f64::consts::PI;

use ndarray::{Array1, Array2, ArrayD, ArrayViewD, Ix1, Ix2, Zip};
use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;

pub trait ScalarField {
    /// Evaluate over two coordinate arrays of identical shape.
    fn evaluate(
        &self,
        x: ArrayViewD<'_, f64>,
        y: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, EvaluationError>;
}

impl<F> ScalarField for F
where
    F: Fn(f64, f64) -> f64,
{
    fn evaluate(
        &self,
        x: ArrayViewD<'_, f64>,
        y: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, EvaluationError> {
        if x.shape() != y.shape() {
            return Err(EvaluationError::ShapeMismatch {
                expected: x.shape().to_vec(),
                returned: y.shape().to_vec(),
            });
        }
        Ok(Zip::from(&x).and(&y).map_collect(|&a, &b| self(a, b)))
    }
}

/// Adapter for array-level fields that can fail.
///
/// ```
/// use activation_plots::field::Vectorized;
/// use ndarray::{ArrayD, ArrayViewD};
///
/// let field = Vectorized::new(|x: ArrayViewD<f64>, y: ArrayViewD<f64>| {
///     Ok::<ArrayD<f64>, std::io::Error>(&x * &x + &y)
/// });
/// # let _ = field;
/// ```
pub struct Vectorized<F>(pub F);

impl<F> Vectorized<F> {
    pub fn new<E>(f: F) -> Self
    where
        F: Fn(ArrayViewD<'_, f64>, ArrayViewD<'_, f64>) -> Result<ArrayD<f64>, E>,
    {
        Vectorized(f)
    }
}

impl<F, E> ScalarField for Vectorized<F>
where
    F: Fn(ArrayViewD<'_, f64>, ArrayViewD<'_, f64>) -> Result<ArrayD<f64>, E>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn evaluate(
        &self,
        x: ArrayViewD<'_, f64>,
        y: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, EvaluationError> {
        (self.0)(x, y).map_err(|e| EvaluationError::Field(e.into()))
    }
}

fn evaluate_checked<F: ScalarField + ?Sized>(
    field: &F,
    x: ArrayViewD<'_, f64>,
    y: ArrayViewD<'_, f64>,
) -> Result<ArrayD<f64>, EvaluationError> {
    let z = field.evaluate(x.view(), y.view())?;
    if z.shape() != x.shape() {
        return Err(EvaluationError::ShapeMismatch {
            expected: x.shape().to_vec(),
            returned: z.shape().to_vec(),
        });
    }
    Ok(z)
}

/// Evaluate on meshed grid coordinates, checking the returned shape.
pub fn evaluate_2d<F: ScalarField + ?Sized>(
    field: &F,
    x: &Array2<f64>,
    y: &Array2<f64>,
) -> Result<Array2<f64>, EvaluationError> {
    let z = evaluate_checked(field, x.view().into_dyn(), y.view().into_dyn())?;
    let shape = z.shape().to_vec();
    z.into_dimensionality::<Ix2>()
        .map_err(|_| EvaluationError::ShapeMismatch {
            expected: x.shape().to_vec(),
            returned: shape,
        })
}

/// Evaluate along a sampled path, checking the returned shape.
pub fn evaluate_1d<F: ScalarField + ?Sized>(
    field: &F,
    x: &Array1<f64>,
    y: &Array1<f64>,
) -> Result<Array1<f64>, EvaluationError> {
    let z = evaluate_checked(field, x.view().into_dyn(), y.view().into_dyn())?;
    let shape = z.shape().to_vec();
    z.into_dimensionality::<Ix1>()
        .map_err(|_| EvaluationError::ShapeMismatch {
            expected: x.shape().to_vec(),
            returned: shape,
        })
}

/// Named benchmark surfaces, mostly optimizer test functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinField {
    #[default]
    Paraboloid,
    Saddle,
    Rosenbrock,
    Himmelblau,
    Rastrigin,
    Ripple,
}

impl BuiltinField {
    pub fn value(&self, x: f64, y: f64) -> f64 {
        match self {
            BuiltinField::Paraboloid => x * x + y * y,
            BuiltinField::Saddle => x * x - y * y,
            BuiltinField::Rosenbrock => (1.0 - x).powi(2) + 100.0 * (y - x * x).powi(2),
            BuiltinField::Himmelblau => (x * x + y - 11.0).powi(2) + (x + y * y - 7.0).powi(2),
            BuiltinField::Rastrigin => {
                20.0 + x * x - 10.0 * (2.0 * PI * x).cos() + y * y - 10.0 * (2.0 * PI * y).cos()
            }
            BuiltinField::Ripple => (x * x + y * y).sqrt().sin(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinField::Paraboloid => "paraboloid",
            BuiltinField::Saddle => "saddle",
            BuiltinField::Rosenbrock => "rosenbrock",
            BuiltinField::Himmelblau => "himmelblau",
            BuiltinField::Rastrigin => "rastrigin",
            BuiltinField::Ripple => "ripple",
        }
    }
}

impl ScalarField for BuiltinField {
    fn evaluate(
        &self,
        x: ArrayViewD<'_, f64>,
        y: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, EvaluationError> {
        let pointwise = |a: f64, b: f64| self.value(a, b);
        pointwise.evaluate(x, y)
    }
}

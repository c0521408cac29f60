//! A small multilayer perceptron that records every intermediate output of
//! its forward pass, for feeding layer activations to the distribution plots.

use ndarray::{Array1, Array2, ArrayD, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PlotError, Result};
use crate::sample::{detach, TensorLike, ToNumericArray};

/// Host tensor with a gradient-tracking flag, standing in for a framework
/// tensor. Plotting always goes through [`TensorLike`], i.e. detached.
#[derive(Debug, Clone)]
pub struct Tensor {
    data: ArrayD<f32>,
    requires_grad: bool,
}

impl Tensor {
    pub fn new(data: ArrayD<f32>, requires_grad: bool) -> Self {
        Tensor {
            data,
            requires_grad,
        }
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }
}

impl TensorLike for Tensor {
    fn shape(&self) -> Vec<usize> {
        self.data.shape().to_vec()
    }

    fn detach_values(&self) -> Vec<f64> {
        self.data.iter().map(|&v| f64::from(v)).collect()
    }
}

impl ToNumericArray for Tensor {
    fn to_numeric_array(&self) -> Result<ArrayD<f64>> {
        detach(self)
    }
}

/// Named outputs recorded during one forward pass, in execution order.
#[derive(Debug, Clone, Default)]
pub struct ForwardTrace {
    records: Vec<(String, Tensor)>,
}

impl ForwardTrace {
    fn record(&mut self, name: String, values: &Array2<f32>) {
        self.records
            .push((name, Tensor::new(values.clone().into_dyn(), true)));
    }

    pub fn get(&self, idx: usize) -> Option<&Tensor> {
        self.records.get(idx).map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.records.iter().map(|(name, t)| (name.as_str(), t))
    }
}

struct Linear {
    weight: Array2<f32>, // (inputs, outputs)
    bias: Array1<f32>,
}

impl Linear {
    /// Uniform init in +-1/sqrt(fan_in).
    fn new(inputs: usize, outputs: usize, rng: &mut StdRng) -> Self {
        let bound = 1.0 / (inputs as f32).sqrt();
        let weight = Array2::from_shape_fn((inputs, outputs), |_| rng.gen_range(-bound..bound));
        let bias = Array1::from_shape_fn(outputs, |_| rng.gen_range(-bound..bound));
        Linear { weight, bias }
    }

    fn forward(&self, x: &Array2<f32>) -> Array2<f32> {
        x.dot(&self.weight) + &self.bias
    }
}

/// `Linear -> tanh -> ... -> Linear -> softmax`.
pub struct Mlp {
    layers: Vec<Linear>,
}

impl Mlp {
    /// `sizes` lists the input width followed by each layer's output width.
    pub fn new(sizes: &[usize], seed: u64) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(PlotError::config(format!(
                "network needs an input size and at least one layer, got {:?}",
                sizes
            )));
        }
        if sizes.contains(&0) {
            return Err(PlotError::config(format!(
                "layer sizes must be positive, got {:?}",
                sizes
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let layers = sizes
            .windows(2)
            .map(|pair| Linear::new(pair[0], pair[1], &mut rng))
            .collect();
        Ok(Mlp { layers })
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].weight.nrows()
    }

    /// Output and the trace of every linear, tanh and softmax output.
    pub fn forward(&self, input: &Array2<f32>) -> Result<(Array2<f32>, ForwardTrace)> {
        if input.ncols() != self.input_size() {
            return Err(PlotError::input_type(format!(
                "batch with {} features for a network expecting {}",
                input.ncols(),
                self.input_size()
            )));
        }

        let mut trace = ForwardTrace::default();
        let mut x = input.clone();
        let last = self.layers.len() - 1;
        for (idx, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x);
            trace.record(format!("linear{}", idx), &x);
            if idx == last {
                x = softmax(&x);
                trace.record("softmax".to_string(), &x);
            } else {
                x.mapv_inplace(f32::tanh);
                trace.record(format!("tanh{}", idx), &x);
            }
        }
        Ok((x, trace))
    }
}

fn softmax(logits: &Array2<f32>) -> Array2<f32> {
    let mut out = logits.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Standard-normal batch via Box-Muller.
pub fn random_batch(rows: usize, cols: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| {
        let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
        let u2: f32 = rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
    })
}

//! Conversion of caller data into plain numeric arrays.
//!
//! Every supported input origin implements [`ToNumericArray`]. Inputs that
//! cannot carry numbers (strings, JSON objects, ragged lists) implement it
//! too, but always return [`PlotError::InputType`], so dynamically typed data
//! is rejected up front instead of failing halfway through a plot.

use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};
use serde_json::Value;

use crate::error::{PlotError, Result};

pub trait ToNumericArray {
    fn to_numeric_array(&self) -> Result<ArrayD<f64>>;
}

impl<S, D> ToNumericArray for ArrayBase<S, D>
where
    S: Data,
    S::Elem: Copy + Into<f64>,
    D: Dimension,
{
    fn to_numeric_array(&self) -> Result<ArrayD<f64>> {
        Ok(self.mapv(|v| Into::<f64>::into(v)).into_dyn())
    }
}

impl ToNumericArray for [f64] {
    fn to_numeric_array(&self) -> Result<ArrayD<f64>> {
        ArrayD::from_shape_vec(IxDyn(&[self.len()]), self.to_vec())
            .map_err(|e| PlotError::input_type(e.to_string()))
    }
}

impl ToNumericArray for Vec<f64> {
    fn to_numeric_array(&self) -> Result<ArrayD<f64>> {
        self.as_slice().to_numeric_array()
    }
}

impl ToNumericArray for Vec<Vec<f64>> {
    fn to_numeric_array(&self) -> Result<ArrayD<f64>> {
        let cols = self.first().map_or(0, Vec::len);
        if self.iter().any(|row| row.len() != cols) {
            return Err(PlotError::input_type("ragged nested list"));
        }
        let values: Vec<f64> = self.iter().flatten().copied().collect();
        ArrayD::from_shape_vec(IxDyn(&[self.len(), cols]), values)
            .map_err(|e| PlotError::input_type(e.to_string()))
    }
}

impl ToNumericArray for str {
    fn to_numeric_array(&self) -> Result<ArrayD<f64>> {
        Err(PlotError::input_type(
            "string (expected a numeric array or tensor)",
        ))
    }
}

impl ToNumericArray for String {
    fn to_numeric_array(&self) -> Result<ArrayD<f64>> {
        self.as_str().to_numeric_array()
    }
}

/// Nested JSON arrays of numbers, e.g. activations dumped by another tool.
impl ToNumericArray for Value {
    fn to_numeric_array(&self) -> Result<ArrayD<f64>> {
        if !self.is_array() {
            return Err(PlotError::input_type(format!(
                "JSON {} (expected an array)",
                json_kind(self)
            )));
        }
        let shape = json_shape(self);
        let mut values = Vec::with_capacity(shape.iter().product());
        flatten_json(self, &shape, &mut values)?;
        ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| PlotError::input_type(e.to_string()))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Shape implied by following the first element at every depth.
fn json_shape(value: &Value) -> Vec<usize> {
    let mut shape = Vec::new();
    let mut cursor = value;
    while let Value::Array(items) = cursor {
        shape.push(items.len());
        match items.first() {
            Some(first) => cursor = first,
            None => break,
        }
    }
    shape
}

fn flatten_json(value: &Value, shape: &[usize], out: &mut Vec<f64>) -> Result<()> {
    match (value, shape.split_first()) {
        (Value::Array(items), Some((&len, rest))) => {
            if items.len() != len {
                return Err(PlotError::input_type("ragged nested JSON array"));
            }
            for item in items {
                flatten_json(item, rest, out)?;
            }
            Ok(())
        }
        (Value::Number(n), None) => {
            let v = n
                .as_f64()
                .ok_or_else(|| PlotError::input_type(format!("non-finite JSON number {}", n)))?;
            out.push(v);
            Ok(())
        }
        (Value::Array(_), None) | (Value::Number(_), Some(_)) => {
            Err(PlotError::input_type("ragged nested JSON array"))
        }
        (other, _) => Err(PlotError::input_type(format!(
            "JSON {} inside numeric array",
            json_kind(other)
        ))),
    }
}

/// Tensor types from a training framework: values may live behind an
/// autograd graph or on another device and need detaching before plotting.
pub trait TensorLike {
    fn shape(&self) -> Vec<usize>;

    /// Copy the values to host memory in row-major order, outside any
    /// gradient tracking.
    fn detach_values(&self) -> Vec<f64>;
}

/// Detach a tensor into a numeric array, checking its reported shape.
pub fn detach<T: TensorLike + ?Sized>(tensor: &T) -> Result<ArrayD<f64>> {
    let shape = tensor.shape();
    let values = tensor.detach_values();
    ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| {
        PlotError::input_type(format!("tensor of shape {:?} could not be detached: {}", shape, e))
    })
}

/// Adapter making any [`TensorLike`] usable where a [`ToNumericArray`] is
/// expected.
pub struct Detach<'a, T: TensorLike + ?Sized>(pub &'a T);

impl<T: TensorLike + ?Sized> ToNumericArray for Detach<'_, T> {
    fn to_numeric_array(&self) -> Result<ArrayD<f64>> {
        detach(self.0)
    }
}

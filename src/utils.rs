use burn::tensor::{backend::Backend, Data, Int, Shape, Tensor};

use crate::error::{Result, SurvivalError};

/// Reads a float tensor back to the host as `f64`, detached from any graph.
pub fn float_values<B: Backend, const D: usize>(x: Tensor<B, D>) -> Vec<f64> {
    x.into_data().convert::<f64>().value
}

pub fn index_tensor<B: Backend>(indices: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let values: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    let data = Data::new(values, Shape::new([indices.len()]));
    let tensor: Tensor<B, 1, Int> = Tensor::from_data(data.convert());
    tensor.to_device(device)
}

pub fn vector_tensor<B: Backend>(values: Vec<f32>, device: &B::Device) -> Tensor<B, 1> {
    let len = values.len();
    let data = Data::new(values, Shape::new([len]));
    let tensor: Tensor<B, 1> = Tensor::from_data(data.convert());
    tensor.to_device(device)
}

/// Builds a dense `[rows, cols]` 0/1 matrix from a row-major membership predicate.
pub fn mask_matrix<B: Backend, F>(
    rows: usize,
    cols: usize,
    device: &B::Device,
    member: F,
) -> Tensor<B, 2>
where
    F: Fn(usize, usize) -> bool,
{
    let values: Vec<f32> = (0..rows)
        .flat_map(|r| (0..cols).map(move |c| (r, c)))
        .map(|(r, c)| if member(r, c) { 1.0 } else { 0.0 })
        .collect();
    let data = Data::new(values, Shape::new([rows, cols]));
    let tensor: Tensor<B, 2> = Tensor::from_data(data.convert());
    tensor.to_device(device)
}

/// Sorted distinct values of a slice of finite floats.
pub fn distinct_sorted(values: &[f64]) -> Vec<f64> {
    let mut distinct = values.to_vec();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();
    distinct
}

pub fn check_same_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(SurvivalError::Shape(format!(
            "{what}: expected length {expected}, got {actual}"
        )));
    }
    Ok(())
}

/// Validates (event, event_time) pairs: binary events and finite non-negative times.
pub fn check_outcomes(event: &[u8], event_time: &[f64]) -> Result<()> {
    check_same_len("event_time", event.len(), event_time.len())?;

    if let Some(e) = event.iter().find(|&&e| e > 1) {
        return Err(SurvivalError::InvalidInput(format!(
            "event indicator must be 0 or 1, got {e}"
        )));
    }

    if let Some(t) = event_time.iter().find(|t| !t.is_finite() || **t < 0.0) {
        return Err(SurvivalError::InvalidInput(format!(
            "event time must be finite and non-negative, got {t}"
        )));
    }

    Ok(())
}

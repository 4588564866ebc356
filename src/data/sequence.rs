use burn::tensor::{backend::Backend, Data, Shape, Tensor};

use crate::error::{Result, SurvivalError};
use crate::utils::mask_matrix;

/// Fill value for timesteps past a subject's valid length.
///
/// Features and encoder outputs must never take this value at a real step.
pub const PADDING_VALUE: f32 = -1.0;

/// Pads ragged per-subject visit sequences into a `[batch, max_len, features]`
/// tensor, returning it with the valid length of each subject.
pub fn pad_sequences<B: Backend>(
    sequences: &[Vec<Vec<f32>>],
    padding_value: f32,
    device: &B::Device,
) -> Result<(Tensor<B, 3>, Vec<usize>)> {
    if sequences.is_empty() {
        return Err(SurvivalError::Shape("cannot pad an empty batch".to_string()));
    }

    let n_features = sequences
        .iter()
        .flat_map(|seq| seq.first())
        .map(|step| step.len())
        .next()
        .unwrap_or(0);
    if n_features == 0 {
        return Err(SurvivalError::Shape("visits carry no features".to_string()));
    }

    let seq_len: Vec<usize> = sequences.iter().map(|seq| seq.len()).collect();
    if let Some(k) = seq_len.iter().position(|&len| len == 0) {
        return Err(SurvivalError::Shape(format!("subject {k} has no visits")));
    }
    let max_len = seq_len.iter().copied().max().unwrap_or(0);

    let mut values = Vec::with_capacity(sequences.len() * max_len * n_features);
    for (k, seq) in sequences.iter().enumerate() {
        for step in seq {
            if step.len() != n_features {
                return Err(SurvivalError::Shape(format!(
                    "subject {k}: expected {n_features} features per visit, got {}",
                    step.len()
                )));
            }
            values.extend_from_slice(step);
        }
        values.extend(std::iter::repeat(padding_value).take((max_len - seq.len()) * n_features));
    }

    let data = Data::new(values, Shape::new([sequences.len(), max_len, n_features]));
    let padded: Tensor<B, 3> = Tensor::from_data(data.convert());

    Ok((padded.to_device(device), seq_len))
}

/// `[batch, max_len]` mask, 1 at valid timesteps and 0 over padding.
pub fn valid_mask<B: Backend>(seq_len: &[usize], max_len: usize, device: &B::Device) -> Tensor<B, 2> {
    mask_matrix(seq_len.len(), max_len, device, |k, t| t < seq_len[k])
}

/// Checks that `seq_len` describes a padded tensor of `batch` subjects and
/// `max_len` steps.
pub fn check_seq_len(seq_len: &[usize], batch: usize, max_len: usize) -> Result<()> {
    if seq_len.len() != batch {
        return Err(SurvivalError::Shape(format!(
            "{} sequence lengths for a batch of {batch}",
            seq_len.len()
        )));
    }
    if let Some((k, len)) = seq_len
        .iter()
        .enumerate()
        .find(|(_, &len)| len == 0 || len > max_len)
    {
        return Err(SurvivalError::Shape(format!(
            "subject {k}: sequence length {len} outside 1..={max_len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::float_values;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn pads_ragged_sequences() {
        let sequences = vec![
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
            vec![vec![7.0, 8.0]],
        ];
        let (padded, seq_len) =
            pad_sequences::<TestBackend>(&sequences, PADDING_VALUE, &Default::default()).unwrap();

        assert_eq!(seq_len, vec![3, 1]);
        assert_eq!(padded.dims(), [2, 3, 2]);
        assert_eq!(
            float_values(padded),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, -1.0, -1.0, -1.0, -1.0]
        );
    }

    #[test]
    fn rejects_inconsistent_features() {
        let sequences = vec![vec![vec![1.0, 2.0]], vec![vec![3.0]]];
        let padded = pad_sequences::<TestBackend>(&sequences, PADDING_VALUE, &Default::default());
        assert!(matches!(padded, Err(SurvivalError::Shape(_))));

        let sequences = vec![vec![vec![1.0]], vec![]];
        let padded = pad_sequences::<TestBackend>(&sequences, PADDING_VALUE, &Default::default());
        assert!(matches!(padded, Err(SurvivalError::Shape(_))));
    }

    #[test]
    fn mask_marks_valid_steps() {
        let mask = valid_mask::<TestBackend>(&[2, 3, 1], 3, &Default::default());
        assert_eq!(
            float_values(mask),
            vec![1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn seq_len_must_fit_padded_width() {
        assert!(check_seq_len(&[1, 4], 2, 4).is_ok());
        assert!(check_seq_len(&[1, 5], 2, 4).is_err());
        assert!(check_seq_len(&[0, 2], 2, 4).is_err());
        assert!(check_seq_len(&[1], 2, 4).is_err());
    }
}

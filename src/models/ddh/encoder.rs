use burn::config::Config;
use burn::module::Module;
use burn::nn::{Lstm, LstmConfig};
use burn::tensor::{backend::Backend, Tensor};

use crate::data::sequence::{check_seq_len, valid_mask, PADDING_VALUE};
use crate::error::SurvivalError;
use crate::utils::index_tensor;

/// Stacked bidirectional LSTM over padded, variable-length visit sequences.
///
/// Each layer runs one LSTM forward in time and one over the reversed valid
/// prefix of every subject, then concatenates both hidden states. Steps past
/// `seq_len` are overwritten with [`PADDING_VALUE`] in the final output.
#[derive(Module, Debug)]
pub struct BiRnn<B: Backend> {
    forward_layers: Vec<Lstm<B>>,
    backward_layers: Vec<Lstm<B>>,
    input_size: usize,
    hidden_size: usize,
    batch_size: usize,
}

impl<B: Backend> BiRnn<B> {
    pub fn forward(&self, x: Tensor<B, 3>, seq_len: &[usize]) -> crate::error::Result<(Tensor<B, 3>, Vec<usize>)> {
        let [batch_size, max_len, n_features] = x.dims();
        if n_features != self.input_size {
            return Err(SurvivalError::Shape(format!(
                "encoder expects {} features per step, got {n_features}",
                self.input_size
            )));
        }
        if batch_size != self.batch_size {
            return Err(SurvivalError::Shape(format!(
                "encoder built for batches of {}, got {batch_size}",
                self.batch_size
            )));
        }
        check_seq_len(seq_len, batch_size, max_len)?;

        let mut hidden = x;
        for (forward_lstm, backward_lstm) in self.forward_layers.iter().zip(&self.backward_layers) {
            let (_, forward_hidden) = forward_lstm.forward(hidden.clone(), None);

            let reversed = reverse_valid(hidden, seq_len);
            let (_, backward_hidden) = backward_lstm.forward(reversed, None);
            let backward_hidden = reverse_valid(backward_hidden, seq_len);

            hidden = Tensor::cat(vec![forward_hidden, backward_hidden], 2);
        }

        let padding = {
            let mask: Tensor<B, 3> = valid_mask::<B>(seq_len, max_len, &hidden.device()).unsqueeze_dim(2);
            mask.repeat(2, self.hidden_size * 2).equal_elem(0.0)
        };
        let sentinel = hidden.zeros_like() + PADDING_VALUE;
        let out = hidden.mask_where(padding, sentinel);

        Ok((out, seq_len.to_vec()))
    }

    /// Width of the per-step output, forward and backward states concatenated.
    pub fn output_size(&self) -> usize {
        self.hidden_size * 2
    }
}

/// Reverses the first `seq_len[k]` steps of every subject, leaving padding in place.
fn reverse_valid<B: Backend>(x: Tensor<B, 3>, seq_len: &[usize]) -> Tensor<B, 3> {
    let [_, max_len, width] = x.dims();
    let device = x.device();

    let subjects = seq_len
        .iter()
        .enumerate()
        .map(|(k, &len)| {
            let order: Vec<usize> = (0..len).rev().chain(len..max_len).collect();
            x.clone()
                .slice([k..k + 1, 0..max_len, 0..width])
                .select(1, index_tensor::<B>(&order, &device))
        })
        .collect();

    Tensor::cat(subjects, 0)
}

#[derive(Config, Debug)]
pub struct BiRnnConfig {
    input_size: usize,
    hidden_size: usize,
    num_layers: usize,
    batch_size: usize,
}

impl BiRnnConfig {
    pub fn init<B: Backend>(&self) -> BiRnn<B> {
        let layer = |l: usize| {
            let d_input = if l == 0 {
                self.input_size
            } else {
                self.hidden_size * 2
            };
            LstmConfig::new(d_input, self.hidden_size, true).init::<B>()
        };

        BiRnn {
            forward_layers: (0..self.num_layers).map(layer).collect(),
            backward_layers: (0..self.num_layers).map(layer).collect(),
            input_size: self.input_size,
            hidden_size: self.hidden_size,
            batch_size: self.batch_size,
        }
    }
}

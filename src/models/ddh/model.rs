use burn::config::Config;
use burn::module::Module;
use burn::tensor::activation;
use burn::tensor::{backend::Backend, Tensor};
use tracing::debug;

use crate::data::batch::SurvivalBatch;
use crate::error::SurvivalError;
use crate::utils::mask_matrix;

use super::cause_specific::{CsNet, CsNetConfig};
use super::encoder::{BiRnn, BiRnnConfig};

#[derive(Clone, Debug)]
pub struct DynamicDeepHitOutput<B: Backend> {
    /// First encoder channel at every step but the last, concatenated over subjects.
    pub marker: Tensor<B, 1>,
    /// Joint distribution over `[batch, target_len, num_event]`.
    pub cause_specific: Tensor<B, 3>,
}

impl<B: Backend> DynamicDeepHitOutput<B> {
    /// Cumulative incidence per cause: probability that each cause has
    /// occurred by the end of each time slot.
    pub fn cumulative_incidence(&self) -> Tensor<B, 3> {
        let [batch_size, target_len, _] = self.cause_specific.dims();
        let device = self.cause_specific.device();

        let lower: Tensor<B, 3> =
            mask_matrix::<B, _>(target_len, target_len, &device, |s, r| r <= s).unsqueeze();

        lower
            .repeat(0, batch_size)
            .matmul(self.cause_specific.clone())
    }
}

#[derive(Module, Debug)]
pub struct DynamicDeepHit<B: Backend> {
    num_event: usize,
    target_len: usize,
    rnn_net: BiRnn<B>,
    cs_nets: Vec<CsNet<B>>,
}

impl<B: Backend> DynamicDeepHit<B> {
    pub fn forward(&self, x: Tensor<B, 3>, seq_len: &[usize]) -> crate::error::Result<DynamicDeepHitOutput<B>> {
        let (out, seq_len) = self.rnn_net.forward(x, seq_len)?;
        let [_, _, width] = out.dims();

        // last valid step of each subject feeds the cause-specific nets
        let cs_input = Tensor::cat(
            seq_len
                .iter()
                .enumerate()
                .map(|(k, &len)| {
                    out.clone()
                        .slice([k..k + 1, len - 1..len, 0..width])
                        .reshape([1, width])
                })
                .collect(),
            0,
        );

        let markers: Vec<Tensor<B, 1>> = seq_len
            .iter()
            .enumerate()
            .filter(|(_, &len)| len > 1)
            .map(|(k, &len)| {
                out.clone()
                    .slice([k..k + 1, 0..len - 1, 0..1])
                    .reshape([len - 1])
            })
            .collect();
        let marker = if markers.is_empty() {
            Tensor::<B, 1>::zeros([0]).to_device(&out.device())
        } else {
            Tensor::cat(markers, 0)
        };

        let cs_output: Vec<Tensor<B, 2>> = self
            .cs_nets
            .iter()
            .map(|net| net.forward(cs_input.clone()))
            .collect();
        let cs_output = joint_softmax(Tensor::stack(cs_output, 2));

        Ok(DynamicDeepHitOutput {
            marker,
            cause_specific: cs_output,
        })
    }

    pub fn forward_batch(&self, batch: &SurvivalBatch<B>) -> crate::error::Result<DynamicDeepHitOutput<B>> {
        self.forward(batch.inputs.clone(), &batch.seq_len)
    }

    pub fn num_event(&self) -> usize {
        self.num_event
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }
}

/// Softmax over the flattened (time slot, cause) grid of every subject.
pub fn joint_softmax<B: Backend>(scores: Tensor<B, 3>) -> Tensor<B, 3> {
    let [batch_size, target_len, num_event] = scores.dims();

    let flat = scores.reshape([batch_size, target_len * num_event]);
    activation::softmax(flat, 1).reshape([batch_size, target_len, num_event])
}

#[derive(Config, Debug)]
pub struct DynamicDeepHitConfig {
    num_event: usize,

    /// `[input_size, hidden_size, num_layers, batch_size]`
    rnn_param: Vec<usize>,

    /// `[layer1_size, layer2_size]` of every cause-specific net
    cs_param: Vec<usize>,

    /// Number of discrete future time slots.
    target_len: usize,

    /// Dropout rate of every cause-specific net. It changes outputs on
    /// autodiff backends only; inference backends see the identity.
    #[config(default = 0.6)]
    dropout: f64,
}

impl DynamicDeepHitConfig {
    pub fn init<B: Backend>(&self) -> crate::error::Result<DynamicDeepHit<B>> {
        if self.rnn_param.len() != 4 {
            return Err(SurvivalError::Configuration(format!(
                "rnn parameter number is wrong: expected 4, got {}",
                self.rnn_param.len()
            )));
        }
        if self.cs_param.len() != 2 {
            return Err(SurvivalError::Configuration(format!(
                "cs parameter number is wrong: expected 2, got {}",
                self.cs_param.len()
            )));
        }
        if self.rnn_param.contains(&0) || self.cs_param.contains(&0) {
            return Err(SurvivalError::Configuration(
                "layer sizes, layer count and batch size must be positive".to_string(),
            ));
        }
        if self.num_event == 0 || self.target_len == 0 {
            return Err(SurvivalError::Configuration(
                "need at least one cause and one time slot".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(SurvivalError::Configuration(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }

        let [input_size, hidden_size, num_layers, batch_size] =
            [self.rnn_param[0], self.rnn_param[1], self.rnn_param[2], self.rnn_param[3]];

        debug!(
            input_size,
            hidden_size,
            num_layers,
            batch_size,
            num_event = self.num_event,
            target_len = self.target_len,
            "building dynamic deep hit"
        );

        let rnn_net = BiRnnConfig::new(input_size, hidden_size, num_layers, batch_size).init::<B>();

        let cs_nets = (0..self.num_event)
            .map(|_| {
                CsNetConfig::new(
                    rnn_net.output_size(),
                    self.cs_param[0],
                    self.cs_param[1],
                    self.target_len,
                )
                .with_dropout(self.dropout)
                .init::<B>()
            })
            .collect();

        Ok(DynamicDeepHit {
            num_event: self.num_event,
            target_len: self.target_len,
            rnn_net,
            cs_nets,
        })
    }
}

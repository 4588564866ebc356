use burn::config::Config;
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::{backend::Backend, Tensor};

use crate::modules::elu::{Elu, EluConfig};

/// Cause-specific subnetwork: one per competing risk, scoring every future time slot.
#[derive(Module, Debug)]
pub struct CsNet<B: Backend> {
    layer1: Linear<B>,
    layer2: Linear<B>,
    layer3: Linear<B>,
    elu: Elu,
    dropout: Dropout,
}

impl<B: Backend> CsNet<B> {
    /// `[batch, input_size]` -> `[batch, output_size]` raw scores in `(-1, 1)`.
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.layer1.forward(x);
        let x = activation::relu(x);
        let x = self.dropout.forward(x);
        let x = self.layer2.forward(x);
        let x = self.elu.forward(x);
        let x = self.dropout.forward(x);
        let x = self.layer3.forward(x);

        x.tanh()
    }
}

#[derive(Config, Debug)]
pub struct CsNetConfig {
    input_size: usize,
    layer1_size: usize,
    layer2_size: usize,
    output_size: usize,

    /// Applied after both hidden activations. Active whenever the backend
    /// records gradients, so training-time scores are stochastic at the
    /// default rate; set it to 0 for deterministic training outputs.
    #[config(default = 0.6)]
    dropout: f64,
}

impl CsNetConfig {
    pub fn init<B: Backend>(&self) -> CsNet<B> {
        CsNet {
            layer1: LinearConfig::new(self.input_size, self.layer1_size).init(),
            layer2: LinearConfig::new(self.layer1_size, self.layer2_size).init(),
            layer3: LinearConfig::new(self.layer2_size, self.output_size).init(),
            elu: EluConfig::new().init(),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

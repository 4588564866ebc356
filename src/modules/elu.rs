use burn::config::Config;
use burn::module::Module;
use burn::tensor::{backend::Backend, Tensor};

/// Exponential linear unit: `x` for positive inputs, `alpha * (exp(x) - 1)` otherwise.
///
/// The exponential branch only ever sees `min(x, 0)`, so large positive
/// activations cannot overflow it and poison the masked-out gradient.
#[derive(Module, Debug, Clone)]
pub struct Elu {
    alpha: f32,
}

impl Elu {
    pub fn forward<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        let negative = x.clone().lower_equal_elem(0.0);
        let saturated = (x.clone().clamp_max(0.0).exp() - 1.0) * self.alpha;

        x.mask_where(negative, saturated)
    }
}

#[derive(Config, Debug)]
pub struct EluConfig {
    #[config(default = 1.0)]
    alpha: f32,
}

impl EluConfig {
    pub fn init(&self) -> Elu {
        Elu { alpha: self.alpha }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::float_values;
    use approx::assert_abs_diff_eq;
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn negative_inputs_saturate_towards_minus_alpha() {
        let elu = EluConfig::new().with_alpha(2.0).init();
        let x = Tensor::<NdArray, 1>::from_floats([-1.0, 0.0, 3.0, -50.0]);
        let y = float_values(elu.forward(x));

        assert_abs_diff_eq!(y[0], 2.0 * ((-1f64).exp() - 1.0), epsilon = 1e-6);
        assert_abs_diff_eq!(y[1], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y[2], 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y[3], -2.0, epsilon = 1e-6);
    }

    #[test]
    fn gradient_stays_finite_for_large_inputs() {
        let elu = EluConfig::new().init();
        let x = Tensor::<Autodiff<NdArray>, 1>::from_floats([-1.0, 200.0]).require_grad();
        let grads = elu.forward(x.clone()).sum().backward();
        let grad = float_values(x.grad(&grads).unwrap());

        assert_abs_diff_eq!(grad[0], (-1f64).exp(), epsilon = 1e-6);
        assert_abs_diff_eq!(grad[1], 1.0, epsilon = 1e-6);
    }
}

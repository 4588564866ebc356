use burn::tensor::{backend::Backend, Tensor};
use tracing::debug;

use crate::error::{Result, SurvivalError};
use crate::utils::{check_same_len, mask_matrix};

/// Lower bound on the probabilities passed to `log`.
pub const LOG_EPSILON: f32 = 1e-12;

/// Negative log likelihood of a discrete-time hazard model.
///
/// `output` is `[N, S]` with per-slot hazard probabilities. Survival up to
/// `time_label[i]` is the product of `1 - output` over the slots before it,
/// so labels range over `0..=S`. Observed events also score the hazard at
/// their label slot, clamped to the last slot.
pub fn dsn_loss<B: Backend>(
    output: Tensor<B, 2>,
    time_label: &[usize],
    event: &[u8],
) -> Result<Tensor<B, 1>> {
    let [n_sample, n_slots] = output.dims();
    check_same_len("time_label", n_sample, time_label.len())?;
    check_same_len("event", n_sample, event.len())?;

    if n_slots == 0 {
        return Err(SurvivalError::Shape("output has no time slots".to_string()));
    }
    if let Some(label) = time_label.iter().find(|&&label| label > n_slots) {
        return Err(SurvivalError::Shape(format!(
            "time label {label} beyond {n_slots} slots"
        )));
    }
    if let Some(e) = event.iter().find(|&&e| e > 1) {
        return Err(SurvivalError::InvalidInput(format!(
            "event indicator must be 0 or 1, got {e}"
        )));
    }

    debug!(n_sample, n_slots, "discrete survival loss");

    let device = output.device();
    let survived = mask_matrix::<B, _>(n_sample, n_slots, &device, |i, s| s < time_label[i]);
    let event_slot = mask_matrix::<B, _>(n_sample, n_slots, &device, |i, s| {
        event[i] == 1 && s == time_label[i].min(n_slots - 1)
    });

    let log_survival = (output.clone().neg() + 1.0)
        .clamp_min(LOG_EPSILON)
        .log()
        * survived;
    let log_hazard = output.clamp_min(LOG_EPSILON).log() * event_slot;

    Ok((log_survival.sum() + log_hazard.sum()).neg())
}

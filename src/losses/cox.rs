//! Negative log partial likelihood of the Cox model over a mini-batch.
//!
//! Time is treated as discrete: subjects sharing an `event_time` form one
//! risk-set step. Censored subjects stay in the risk set up to and including
//! their own time.

use burn::tensor::{backend::Backend, Tensor};
use tracing::{debug, warn};

use crate::error::{Result, SurvivalError};
use crate::utils::{
    check_outcomes, check_same_len, distinct_sorted, float_values, index_tensor, mask_matrix,
    vector_tensor,
};

const FLOOR_TOLERANCE: f64 = 1e-4;

/// How the partial-likelihood denominator treats several events at one time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoxTies {
    /// Removes a growing share of the tied hazard from each successive term.
    #[default]
    Efron,
    /// Uses the full risk set for every tied event.
    Breslow,
}

/// One denominator term per observed event: which distinct time it belongs to
/// and what fraction of the tie group's hazard is removed from the risk set.
struct TieTerms {
    time_index: Vec<usize>,
    fraction: Vec<f32>,
    inv_tie_size: Vec<f32>,
}

impl TieTerms {
    fn new(tie_sizes: &[usize], ties: CoxTies) -> Self {
        let mut time_index = Vec::new();
        let mut fraction = Vec::new();
        let mut inv_tie_size = Vec::new();

        for (t, &k) in tie_sizes.iter().enumerate() {
            for l in 0..k {
                time_index.push(t);
                inv_tie_size.push(1.0 / k as f32);
                fraction.push(match ties {
                    CoxTies::Efron => l as f32 / k as f32,
                    CoxTies::Breslow => 0.0,
                });
            }
        }

        Self {
            time_index,
            fraction,
            inv_tie_size,
        }
    }
}

/// Efron-corrected negative log partial likelihood.
///
/// `hazard_ratio` must be strictly positive; the result is a single element
/// tensor that carries gradients back to it.
pub fn coxph_logparlk<B: Backend>(
    event_time: &[f64],
    event: &[u8],
    hazard_ratio: Tensor<B, 1>,
) -> Result<Tensor<B, 1>> {
    coxph_logparlk_with_ties(event_time, event, hazard_ratio, CoxTies::Efron)
}

pub fn coxph_logparlk_with_ties<B: Backend>(
    event_time: &[f64],
    event: &[u8],
    hazard_ratio: Tensor<B, 1>,
    ties: CoxTies,
) -> Result<Tensor<B, 1>> {
    check_outcomes(event, event_time)?;
    let [n_sample] = hazard_ratio.dims();
    check_same_len("hazard_ratio", event.len(), n_sample)?;

    if let Some(hr) = float_values(hazard_ratio.clone())
        .into_iter()
        .find(|hr| !hr.is_finite() || *hr <= 0.0)
    {
        return Err(SurvivalError::InvalidInput(format!(
            "hazard ratio must be finite and positive, got {hr}"
        )));
    }

    let device = hazard_ratio.device();
    let times = distinct_sorted(event_time);
    let n_times = times.len();

    let at_risk = mask_matrix::<B, _>(n_times, n_sample, &device, |t, i| {
        event_time[i] >= times[t]
    });
    let tied = mask_matrix::<B, _>(n_times, n_sample, &device, |t, i| {
        event[i] == 1 && event_time[i] == times[t]
    });

    let tie_sizes: Vec<usize> = times
        .iter()
        .map(|&t| {
            (0..n_sample)
                .filter(|&i| event[i] == 1 && event_time[i] == t)
                .count()
        })
        .collect();
    let terms = TieTerms::new(&tie_sizes, ties);

    debug!(
        n_sample,
        distinct_times = n_times,
        events = terms.time_index.len(),
        ?ties,
        "cox partial likelihood"
    );

    if terms.time_index.is_empty() {
        // all censored: no event contributes, keep the graph attached
        return Ok((hazard_ratio * 0.0).sum());
    }

    let hazard: Tensor<B, 2> = hazard_ratio.clone().unsqueeze_dim(1);
    let log_hazard: Tensor<B, 2> = hazard_ratio.log().unsqueeze_dim(1);

    let numerator = tied.clone().matmul(log_hazard).sum();

    let risk_sum = at_risk.matmul(hazard.clone()).reshape([n_times]);
    let tied_sum = tied.matmul(hazard).reshape([n_times]);

    let rows = index_tensor::<B>(&terms.time_index, &device);
    let fraction = vector_tensor::<B>(terms.fraction, &device);
    let inv_tie_size = vector_tensor::<B>(terms.inv_tie_size, &device);

    let tied_rows = tied_sum.select(0, rows.clone());
    let argument = risk_sum.select(0, rows) - tied_rows.clone() * fraction;
    // S - (l/k) S_D never drops below S_D / k
    let floor = tied_rows * inv_tie_size;

    let (argument, clamped) = clamp_to_floor(argument, floor);
    if clamped > 0 {
        warn!(
            clamped,
            "risk-set sum below the tied share in partial likelihood, clamping"
        );
    }

    let denominator = argument.log().sum();

    Ok((numerator - denominator).neg())
}

/// Raises every element of `argument` to at least the matching `floor`.
///
/// The returned count only includes elements that sat below their floor by
/// more than float rounding.
fn clamp_to_floor<B: Backend>(argument: Tensor<B, 1>, floor: Tensor<B, 1>) -> (Tensor<B, 1>, usize) {
    let clamped = float_values(argument.clone())
        .into_iter()
        .zip(float_values(floor.clone()))
        .filter(|(value, min)| *value < min * (1.0 - FLOOR_TOLERANCE))
        .count();

    let below = argument.clone().lower(floor.clone());
    (argument.mask_where(below, floor), clamped)
}

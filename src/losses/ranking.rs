//! Comparable-pair construction and pairwise agreement statistics.
//!
//! Pairs are directional: `(i, j)` means subject `i` had the event and `j` is
//! still a valid comparator when it happened, so a well ranked model gives
//! `risk[i] > risk[j]`.

use burn::tensor::{backend::Backend, Tensor};
use tracing::trace;

use crate::error::{Result, SurvivalError};
use crate::utils::{check_outcomes, check_same_len, float_values};

pub type RankingPair = (usize, usize);

/// Comparable pairs for the concordance index.
///
/// For every observed event `i`, `j` is accepted when it is censored no earlier
/// than `event_time[i]`, or when it had its own event strictly later. Two events
/// at the same time are never paired, so tied events get no credit either way.
pub fn acc_pairs(event: &[u8], event_time: &[f64]) -> Result<Vec<RankingPair>> {
    check_outcomes(event, event_time)?;

    let events: Vec<usize> = (0..event.len()).filter(|&i| event[i] == 1).collect();
    let censored: Vec<usize> = (0..event.len()).filter(|&j| event[j] == 0).collect();

    let mut pairs = Vec::new();
    for &i in &events {
        let t = event_time[i];
        pairs.extend(
            censored
                .iter()
                .filter(|&&j| event_time[j] >= t)
                .map(|&j| (i, j)),
        );
        pairs.extend(
            events
                .iter()
                .filter(|&&j| event_time[j] > t)
                .map(|&j| (i, j)),
        );
    }

    if pairs.is_empty() {
        return Err(SurvivalError::EmptyInput("no comparable pairs for concordance"));
    }

    trace!(pairs = pairs.len(), subjects = event.len(), "built concordance pairs");
    Ok(pairs)
}

/// Pairs for the time-dependent AUC at `horizon`: every event at or before the
/// horizon against every subject still under observation after it.
pub fn auc_pairs(event: &[u8], event_time: &[f64], horizon: f64) -> Result<Vec<RankingPair>> {
    check_outcomes(event, event_time)?;

    let cases: Vec<usize> = (0..event.len())
        .filter(|&i| event[i] == 1 && event_time[i] <= horizon)
        .collect();
    let controls: Vec<usize> = (0..event.len())
        .filter(|&j| event_time[j] > horizon)
        .collect();

    let pairs: Vec<RankingPair> = cases
        .iter()
        .flat_map(|&i| controls.iter().map(move |&j| (i, j)))
        .collect();

    if pairs.is_empty() {
        return Err(SurvivalError::EmptyInput("no comparable pairs for time-dependent auc"));
    }

    trace!(pairs = pairs.len(), horizon, "built auc pairs");
    Ok(pairs)
}

/// Fraction of pairs where the first subject has the strictly higher risk.
/// Equal risks count as disagreement.
pub fn concordance(pairs: &[RankingPair], risk: &[f64]) -> Result<f64> {
    if pairs.is_empty() {
        return Err(SurvivalError::EmptyInput("concordance over zero pairs"));
    }

    if let Some(&(i, j)) = pairs.iter().find(|(i, j)| *i >= risk.len() || *j >= risk.len()) {
        return Err(SurvivalError::Shape(format!(
            "pair ({i}, {j}) out of range for {} risk scores",
            risk.len()
        )));
    }

    let agree = pairs.iter().filter(|&&(i, j)| risk[i] > risk[j]).count();
    Ok(agree as f64 / pairs.len() as f64)
}

/// Harrell-style c-index of `hazard_ratio` against the observed outcomes.
pub fn c_index<B: Backend>(
    event: &[u8],
    event_time: &[f64],
    hazard_ratio: Tensor<B, 1>,
) -> Result<f64> {
    let risk = float_values(hazard_ratio);
    check_same_len("hazard_ratio", event.len(), risk.len())?;

    let pairs = acc_pairs(event, event_time)?;
    concordance(&pairs, &risk)
}

/// AUC-type c-index at a single horizon, as reported by joint-model packages.
pub fn auc_jm<B: Backend>(
    event: &[u8],
    event_time: &[f64],
    hazard_ratio: Tensor<B, 1>,
    horizon: f64,
) -> Result<f64> {
    let risk = float_values(hazard_ratio);
    check_same_len("hazard_ratio", event.len(), risk.len())?;

    let pairs = auc_pairs(event, event_time, horizon)?;
    concordance(&pairs, &risk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use burn::backend::NdArray;
    use std::collections::BTreeSet;

    type TestBackend = NdArray;

    #[test]
    fn acc_pairs_follow_censoring_rules() {
        let pairs = acc_pairs(&[1, 0, 1, 1], &[1.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (2, 3)]);
    }

    #[test]
    fn acc_pairs_skip_tied_events() {
        let pairs = acc_pairs(&[1, 1, 0], &[2.0, 2.0, 1.0]);
        assert_eq!(
            pairs,
            Err(SurvivalError::EmptyInput("no comparable pairs for concordance"))
        );

        // a tie at time 2 contributes nothing, the censored subject at 2 still counts
        let pairs = acc_pairs(&[1, 1, 0], &[2.0, 2.0, 2.0]).unwrap();
        assert_eq!(pairs, vec![(0, 2), (1, 2)]);
    }

    #[test]
    fn acc_pairs_are_sorted_by_case() {
        let pairs = acc_pairs(&[0, 1, 1, 0, 1], &[5.0, 3.0, 1.0, 4.0, 2.0]).unwrap();
        assert!(pairs.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(pairs.iter().filter(|p| p.0 == 2).count(), 4);
    }

    #[test]
    fn acc_pairs_invariant_under_relabelling() {
        let event = [1u8, 0, 1, 1, 0, 1];
        let time = [2.0, 3.0, 1.0, 4.0, 1.0, 2.5];
        let perm = [3usize, 5, 0, 2, 4, 1];

        let permuted_event: Vec<u8> = perm.iter().map(|&p| event[p]).collect();
        let permuted_time: Vec<f64> = perm.iter().map(|&p| time[p]).collect();

        let original: BTreeSet<RankingPair> =
            acc_pairs(&event, &time).unwrap().into_iter().collect();
        let mapped_back: BTreeSet<RankingPair> = acc_pairs(&permuted_event, &permuted_time)
            .unwrap()
            .into_iter()
            .map(|(i, j)| (perm[i], perm[j]))
            .collect();

        assert_eq!(original, mapped_back);
    }

    #[test]
    fn auc_pairs_cross_cases_and_controls() {
        let pairs = auc_pairs(&[1, 0, 1, 0], &[1.0, 3.0, 2.0, 4.0], 2.0).unwrap();
        assert_eq!(pairs, vec![(0, 1), (0, 3), (2, 1), (2, 3)]);
    }

    #[test]
    fn auc_pairs_without_controls_is_an_error() {
        let pairs = auc_pairs(&[1, 1], &[1.0, 2.0], 5.0);
        assert!(matches!(pairs, Err(SurvivalError::EmptyInput(_))));
    }

    #[test]
    fn concordance_bounds() {
        let event = [1u8, 0, 1, 1];
        let time = [1.0, 1.0, 2.0, 3.0];
        let pairs = acc_pairs(&event, &time).unwrap();

        let perfect = concordance(&pairs, &[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_abs_diff_eq!(perfect, 1.0);

        let inverted = concordance(&pairs, &[1.0, 4.0, 2.0, 3.0]).unwrap();
        assert_abs_diff_eq!(inverted, 0.0);

        // equal scores earn nothing
        let flat = concordance(&pairs, &[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_abs_diff_eq!(flat, 0.0);
    }

    #[test]
    fn concordance_rejects_out_of_range_pairs() {
        assert!(matches!(
            concordance(&[(0, 3)], &[1.0, 2.0]),
            Err(SurvivalError::Shape(_))
        ));
        assert!(matches!(
            concordance(&[], &[1.0]),
            Err(SurvivalError::EmptyInput(_))
        ));
    }

    #[test]
    fn c_index_reads_tensor_scores() {
        let hazard = Tensor::<TestBackend, 1>::from_floats([4.0, 1.0, 2.0, 3.0]);
        // pairs (0,1) (0,2) (0,3) (2,3): only (2,3) disagrees
        let c = c_index(&[1, 0, 1, 1], &[1.0, 1.0, 2.0, 3.0], hazard).unwrap();
        assert_abs_diff_eq!(c, 0.75);
    }

    #[test]
    fn auc_jm_scores_horizon_pairs() {
        let hazard = Tensor::<TestBackend, 1>::from_floats([0.9, 0.2, 0.1, 0.3]);
        // pairs (0,1) (0,3) (2,1) (2,3): subject 2 is ranked below both controls
        let auc = auc_jm(&[1, 0, 1, 0], &[1.0, 3.0, 2.0, 4.0], hazard, 2.0).unwrap();
        assert_abs_diff_eq!(auc, 0.5);
    }

    #[test]
    fn c_index_checks_score_length() {
        let hazard = Tensor::<TestBackend, 1>::from_floats([1.0, 2.0]);
        let c = c_index(&[1, 0, 1], &[1.0, 2.0, 3.0], hazard);
        assert!(matches!(c, Err(SurvivalError::Shape(_))));
    }
}

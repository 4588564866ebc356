//! Dynamic Deep Hit: a bidirectional recurrent encoder over longitudinal
//! visits feeding one feed-forward net per competing risk, normalised jointly
//! over future time slots and causes.

pub mod cause_specific;
pub mod encoder;
pub mod model;

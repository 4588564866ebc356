pub mod batch;
pub mod sequence;

use burn::tensor::{backend::Backend, Tensor};
use serde::{Deserialize, Serialize};

use crate::data::sequence::{pad_sequences, PADDING_VALUE};
use crate::error::{Result, SurvivalError};
use crate::utils::check_outcomes;

/// One subject: longitudinal visits plus the observed outcome.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubjectRecord {
    pub features: Vec<Vec<f32>>, // [visits, features]
    pub event_time: f64,
    pub event: u8,
    #[serde(default)]
    pub time_label: usize,
}

#[derive(Clone, Debug)]
pub struct SurvivalBatch<B: Backend> {
    pub inputs: Tensor<B, 3>, // [N, T, F], padded with PADDING_VALUE
    pub seq_len: Vec<usize>,  // [N]
    pub event_time: Vec<f64>, // [N]
    pub event: Vec<u8>,       // [N]
    pub time_label: Vec<usize>, // [N]
}

impl<B: Backend> SurvivalBatch<B> {
    pub fn from_records(records: &[SubjectRecord], device: &B::Device) -> Result<Self> {
        if records.is_empty() {
            return Err(SurvivalError::Shape("empty batch".to_string()));
        }

        let sequences: Vec<Vec<Vec<f32>>> =
            records.iter().map(|r| r.features.clone()).collect();
        let (inputs, seq_len) = pad_sequences(&sequences, PADDING_VALUE, device)?;

        let event_time: Vec<f64> = records.iter().map(|r| r.event_time).collect();
        let event: Vec<u8> = records.iter().map(|r| r.event).collect();
        check_outcomes(&event, &event_time)?;

        Ok(Self {
            inputs,
            seq_len,
            event_time,
            event,
            time_label: records.iter().map(|r| r.time_label).collect(),
        })
    }

    pub fn batch_size(&self) -> usize {
        self.seq_len.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn builds_batch_from_json_rows() {
        let rows = r#"[
            {"features": [[0.1, 0.2], [0.3, 0.4]], "event_time": 3.0, "event": 1, "time_label": 2},
            {"features": [[0.5, 0.6]], "event_time": 5.0, "event": 0}
        ]"#;
        let records: Vec<SubjectRecord> = serde_json::from_str(rows).unwrap();
        let batch = SurvivalBatch::<NdArray>::from_records(&records, &Default::default()).unwrap();

        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.inputs.dims(), [2, 2, 2]);
        assert_eq!(batch.seq_len, vec![2, 1]);
        assert_eq!(batch.event, vec![1, 0]);
        assert_eq!(batch.time_label, vec![2, 0]);
    }

    #[test]
    fn rejects_non_binary_events() {
        let records = vec![SubjectRecord {
            features: vec![vec![1.0]],
            event_time: 1.0,
            event: 3,
            time_label: 0,
        }];
        let batch = SurvivalBatch::<NdArray>::from_records(&records, &Default::default());
        assert!(matches!(batch, Err(SurvivalError::InvalidInput(_))));
    }
}

//! Result Assembler - merges per-model outputs into one response
//!
//! Purely a merge: model outputs keyed by id, the run summary, and the static
//! metadata of every configured model. It has no failure modes.

use lobcast_core::{ModelSpec, PredictionResult, TickSummary};
use lobcast_gateway::messages::response::{
    ModelMetadata, ModelOutput, PredictionResponse, Summary, metadata_for,
};
use std::collections::BTreeMap;

/// Builds [`PredictionResponse`]s for a fixed set of models
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    metadata: BTreeMap<String, ModelMetadata>,
}

impl ResultAssembler {
    pub fn new(models: &[ModelSpec]) -> Self {
        Self {
            metadata: metadata_for(models),
        }
    }

    /// Static metadata reported with every response
    pub fn metadata(&self) -> &BTreeMap<String, ModelMetadata> {
        &self.metadata
    }

    pub fn assemble<I>(&self, outputs: I, summary: &TickSummary) -> PredictionResponse
    where
        I: IntoIterator<Item = (String, PredictionResult)>,
    {
        PredictionResponse {
            models: outputs
                .into_iter()
                .map(|(id, result)| (id, ModelOutput::from(result)))
                .collect(),
            summary: Summary::from(summary),
            model_metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TickSummary {
        TickSummary {
            total_rows: 20,
            symbol: Some("BTCUSDT".to_string()),
            first_timestamp: Some(1_700_000_000_000),
            last_timestamp: Some(1_700_000_005_000),
        }
    }

    #[test]
    fn test_assemble_keys_by_model() {
        let assembler = ResultAssembler::new(&ModelSpec::defaults());
        let outputs = vec![
            (
                "tlob".to_string(),
                PredictionResult::from_logits(&[vec![3.0, 0.0, 0.0]]),
            ),
            (
                "mlplob".to_string(),
                PredictionResult::from_logits(&[vec![0.0, 0.0, 3.0], vec![0.0, 3.0, 0.0]]),
            ),
        ];

        let response = assembler.assemble(outputs, &summary());

        assert_eq!(response.models.len(), 2);
        assert_eq!(response.model("tlob").unwrap().predictions, vec![0]);
        let mlp = response.model("mlplob").unwrap();
        assert_eq!(mlp.predictions, vec![2, 1]);
        assert_eq!(mlp.num_predictions, 2);
        assert_eq!(mlp.class_names, vec!["Up", "Stationary", "Down"]);
    }

    #[test]
    fn test_summary_and_metadata() {
        let assembler = ResultAssembler::new(&ModelSpec::defaults());
        let response = assembler.assemble(Vec::new(), &summary());

        assert_eq!(response.summary.total_rows, 20);
        assert_eq!(response.summary.symbol, "BTCUSDT");
        assert_eq!(response.summary.time_range.start, "1700000000000");
        assert_eq!(response.summary.time_range.end, "1700000005000");
        assert_eq!(response.model_metadata["tlob"].sequence_size, 128);
        assert_eq!(response.model_metadata["mlplob"].num_layers, 3);
        assert_eq!(assembler.metadata().len(), 2);
    }
}

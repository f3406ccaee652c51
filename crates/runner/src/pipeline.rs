//! Prediction pipelines
//!
//! - [`LocalPipeline`]: normalizer, window builder and one inference call per
//!   model, merged by the [`ResultAssembler`]
//! - [`RemotePipeline`]: forwards rows to a service running the local pipeline
//!
//! Both are stateless per call and safe to share between workers.

use crate::assembler::ResultAssembler;
use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use lobcast_core::{
    ModelSpec, NUM_CLASSES, PredictionResult, RawTick, RecordSet, SnapshotNormalizer, WindowBuilder,
};
use lobcast_gateway::{PredictJsonClient, PredictJsonRequest, PredictionResponse};
use lobcast_ports::{InferenceError, InferenceGateway, InferenceResult};
use std::sync::Arc;

/// Turns one batch of rows into a merged prediction response
#[async_trait]
pub trait PredictionPipeline: Send + Sync {
    async fn predict(&self, ticks: &[RawTick]) -> PipelineResult<PredictionResponse>;

    /// Short label for logs ("local", "remote")
    fn mode(&self) -> &'static str;
}

/// Runs the whole transform in-process against an injected inference engine
pub struct LocalPipeline {
    normalizer: SnapshotNormalizer,
    builder: WindowBuilder,
    assembler: ResultAssembler,
    models: Vec<ModelSpec>,
    gateway: Arc<dyn InferenceGateway>,
}

impl LocalPipeline {
    pub fn new(
        gateway: Arc<dyn InferenceGateway>,
        models: Vec<ModelSpec>,
        depth: usize,
    ) -> PipelineResult<Self> {
        let builder = WindowBuilder::new(depth)?;
        ModelSpec::validate_all(&models, depth)?;

        Ok(Self {
            normalizer: SnapshotNormalizer::new(),
            builder,
            assembler: ResultAssembler::new(&models),
            models,
            gateway,
        })
    }

    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    /// Windowing settings shared by every model
    pub fn window_builder(&self) -> &WindowBuilder {
        &self.builder
    }

    pub fn gateway(&self) -> &Arc<dyn InferenceGateway> {
        &self.gateway
    }

    pub fn assembler(&self) -> &ResultAssembler {
        &self.assembler
    }

    /// Run the pipeline over loosely typed records (JSON rows or CSV)
    ///
    /// Column statistics are computed once and shared by every model; each
    /// model then gets windows of its own sequence length. Models run one
    /// after another and the first failure aborts the run.
    pub async fn predict_records(&self, records: &RecordSet) -> PipelineResult<PredictionResponse> {
        let ticks = self.normalizer.normalize(records)?;
        if ticks.dropped > 0 {
            log::debug!("Dropped {} rows that failed coercion", ticks.dropped);
        }

        let batch = self.builder.normalize(&ticks.groups)?;
        log::debug!(
            "Normalized {} rows into {} frames of width {}",
            ticks.row_count(),
            batch.rows(),
            batch.width()
        );

        let mut outputs = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let windows = self.builder.windows(&batch, model.sequence_size)?;
            if windows.is_padded() {
                log::debug!(
                    "{}: only {} frames for sequence size {}, using one padded window",
                    model.id,
                    batch.rows(),
                    model.sequence_size
                );
            }
            let result = self.gateway.infer(&model.id, &windows).await?;
            check_result(&model.id, &result, windows.len())?;
            log::debug!("{}: {} predictions", model.id, result.len());
            outputs.push((model.id.clone(), result));
        }

        Ok(self.assembler.assemble(outputs, &ticks.summary))
    }
}

/// One prediction and one full probability row per window, whatever the engine
fn check_result(model_id: &str, result: &PredictionResult, windows: usize) -> InferenceResult<()> {
    if result.predictions.len() != windows || result.probabilities.len() != windows {
        return Err(InferenceError::ShapeMismatch(format!(
            "{}: {} windows but {} predictions and {} probability rows",
            model_id,
            windows,
            result.predictions.len(),
            result.probabilities.len()
        )));
    }
    if let Some(row) = result.probabilities.iter().find(|p| p.len() != NUM_CLASSES) {
        return Err(InferenceError::ShapeMismatch(format!(
            "{}: probability row of length {}, expected {}",
            model_id,
            row.len(),
            NUM_CLASSES
        )));
    }
    Ok(())
}

#[async_trait]
impl PredictionPipeline for LocalPipeline {
    async fn predict(&self, ticks: &[RawTick]) -> PipelineResult<PredictionResponse> {
        self.predict_records(&RecordSet::from_ticks(ticks)).await
    }

    fn mode(&self) -> &'static str {
        "local"
    }
}

/// Delegates to a remote `/predict-json` service
pub struct RemotePipeline {
    client: PredictJsonClient,
}

impl RemotePipeline {
    pub fn new(client: PredictJsonClient) -> Self {
        Self { client }
    }

    pub fn url(&self) -> &str {
        self.client.url()
    }
}

#[async_trait]
impl PredictionPipeline for RemotePipeline {
    async fn predict(&self, ticks: &[RawTick]) -> PipelineResult<PredictionResponse> {
        if ticks.is_empty() {
            return Err(PipelineError::EmptyInput("no rows to send".to_string()));
        }
        let request = PredictJsonRequest::from_ticks(ticks)?;
        Ok(self.client.predict(&request).await?)
    }

    fn mode(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobcast_core::WindowBatch;
    use lobcast_ports::EngineStatus;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every call and answers "Up" for each window
    #[derive(Default)]
    struct RecordingEngine {
        calls: Mutex<Vec<(String, (usize, usize, usize))>>,
    }

    #[async_trait]
    impl InferenceGateway for RecordingEngine {
        async fn infer(
            &self,
            model_id: &str,
            windows: &WindowBatch,
        ) -> InferenceResult<PredictionResult> {
            self.calls
                .lock()
                .unwrap()
                .push((model_id.to_string(), windows.shape()));
            let logits = vec![vec![2.0, 0.0, 0.0]; windows.len()];
            Ok(PredictionResult::from_logits(&logits))
        }

        async fn is_loaded(&self, _model_id: &str) -> bool {
            true
        }

        fn status(&self) -> EngineStatus {
            EngineStatus {
                device: "cpu".to_string(),
            }
        }
    }

    struct DownEngine;

    #[async_trait]
    impl InferenceGateway for DownEngine {
        async fn infer(&self, _: &str, _: &WindowBatch) -> InferenceResult<PredictionResult> {
            Err(InferenceError::Timeout(Duration::from_secs(30)))
        }

        async fn is_loaded(&self, _: &str) -> bool {
            false
        }

        fn status(&self) -> EngineStatus {
            EngineStatus {
                device: "cpu".to_string(),
            }
        }
    }

    /// Answers one row fewer than it was given windows
    struct ShortEngine;

    #[async_trait]
    impl InferenceGateway for ShortEngine {
        async fn infer(&self, _: &str, windows: &WindowBatch) -> InferenceResult<PredictionResult> {
            let logits = vec![vec![0.0, 1.0, 0.0]; windows.len().saturating_sub(1)];
            Ok(PredictionResult::from_logits(&logits))
        }

        async fn is_loaded(&self, _: &str) -> bool {
            true
        }

        fn status(&self) -> EngineStatus {
            EngineStatus {
                device: "cpu".to_string(),
            }
        }
    }

    fn ticks(frames: usize) -> Vec<RawTick> {
        (0..frames)
            .flat_map(|f| {
                (0..3).map(move |level| {
                    RawTick::new(
                        1_000 + f as i64,
                        "BTCUSDT",
                        50_000.0 - level as f64,
                        1.0 + f as f64,
                        50_001.0 + level as f64,
                        2.0,
                    )
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_local_pipeline_runs_every_model() {
        let engine = Arc::new(RecordingEngine::default());
        let pipeline = LocalPipeline::new(engine.clone(), ModelSpec::defaults(), 10).unwrap();

        let response = pipeline.predict(&ticks(130)).await.unwrap();

        let calls = engine.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("tlob".to_string(), (3, 128, 40)),
                ("mlplob".to_string(), (1, 384, 40)),
            ]
        );
        assert_eq!(response.model("tlob").unwrap().num_predictions, 3);
        assert_eq!(response.model("mlplob").unwrap().num_predictions, 1);
        assert_eq!(response.summary.total_rows, 390);
        assert_eq!(response.summary.time_range.start, "1000");
        assert_eq!(response.summary.time_range.end, "1129");
        for output in response.models.values() {
            assert!(output.probabilities.iter().all(|p| p.len() == NUM_CLASSES));
        }
    }

    #[tokio::test]
    async fn test_local_pipeline_empty_input() {
        let pipeline =
            LocalPipeline::new(Arc::new(RecordingEngine::default()), ModelSpec::defaults(), 10)
                .unwrap();
        let err = pipeline.predict(&[]).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput(_)));
    }

    #[tokio::test]
    async fn test_local_pipeline_schema_error() {
        let pipeline =
            LocalPipeline::new(Arc::new(RecordingEngine::default()), ModelSpec::defaults(), 10)
                .unwrap();
        let records = RecordSet::from_json_rows(vec![serde_json::json!({
            "timestamp": 1, "symbol": "BTCUSDT", "bid_price": 1.0
        })]);

        match pipeline.predict_records(&records).await {
            Err(PipelineError::Schema { missing }) => {
                assert_eq!(missing, vec!["bid_qty", "ask_price", "ask_qty"]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_local_pipeline_surfaces_inference_error() {
        let pipeline = LocalPipeline::new(Arc::new(DownEngine), ModelSpec::defaults(), 10).unwrap();
        let err = pipeline.predict(&ticks(2)).await.unwrap_err();
        assert_eq!(
            err,
            PipelineError::Inference(InferenceError::Timeout(Duration::from_secs(30)))
        );
        assert!(!err.is_input_error());
    }

    #[tokio::test]
    async fn test_local_pipeline_rejects_short_engine_output() {
        let pipeline = LocalPipeline::new(Arc::new(ShortEngine), ModelSpec::defaults(), 10).unwrap();
        match pipeline.predict(&ticks(130)).await {
            Err(PipelineError::Inference(InferenceError::ShapeMismatch(msg))) => {
                assert!(msg.starts_with("tlob: 3 windows but 2 predictions"));
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_check_result_probability_width() {
        let result = PredictionResult {
            predictions: vec![1],
            probabilities: vec![vec![0.5, 0.5]],
        };
        assert!(matches!(
            check_result("tlob", &result, 1),
            Err(InferenceError::ShapeMismatch(_))
        ));
        assert!(check_result("tlob", &PredictionResult::from_logits(&[vec![0.0; 3]]), 1).is_ok());
    }

    #[test]
    fn test_local_pipeline_rejects_bad_models() {
        let engine: Arc<dyn InferenceGateway> = Arc::new(DownEngine);
        assert!(matches!(
            LocalPipeline::new(engine.clone(), ModelSpec::defaults(), 5),
            Err(PipelineError::InvalidConfig(_))
        ));
        assert!(LocalPipeline::new(engine, Vec::new(), 10).is_err());
    }

    #[tokio::test]
    async fn test_remote_pipeline_rejects_empty() {
        let client =
            PredictJsonClient::new("http://127.0.0.1:1/api/predict-json", Duration::from_secs(1))
                .unwrap();
        let pipeline = RemotePipeline::new(client);
        assert!(matches!(
            pipeline.predict(&[]).await,
            Err(PipelineError::EmptyInput(_))
        ));
        assert_eq!(pipeline.mode(), "remote");
    }
}

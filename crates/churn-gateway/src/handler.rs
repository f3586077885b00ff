//! Serverless handler: event in, envelope out.
//!
//! Every failure in the serving path becomes an envelope here. Nothing
//! propagates to the caller.

use std::future::Future;
use std::sync::Arc;

use churn_core::error::Error;
use churn_core::types::RawRecord;
use churn_model::cache::PredictorCache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;

use crate::metrics::MetricsRegistry;
use crate::normalizer::{normalize_shape, EventShape, NormalizeError};
use crate::response::{self, ErrorCode, LambdaResponse};

/// Invocation metadata supplied by the runtime
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationContext {
    /// Runtime request id
    pub request_id: String,
    /// Deployed function name
    pub function_name: String,
}

impl InvocationContext {
    /// Context with only a request id
    #[must_use]
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }
}

/// Runs the normalize, encode, predict pipeline for every entry point
#[derive(Debug, Clone)]
pub struct ChurnHandler {
    cache: Arc<PredictorCache>,
    metrics: Arc<MetricsRegistry>,
}

impl ChurnHandler {
    /// Create a handler over a shared cache
    #[must_use]
    pub fn new(cache: Arc<PredictorCache>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { cache, metrics }
    }

    /// The predictor cache
    #[must_use]
    pub fn cache(&self) -> &Arc<PredictorCache> {
        &self.cache
    }

    /// The metrics registry
    #[must_use]
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Handle a serverless event of any supported shape
    pub async fn handle(&self, event: Value, ctx: &InvocationContext) -> LambdaResponse {
        self.invocation(ctx, async {
            match EventShape::classify(event) {
                Ok(shape) => self.run(shape).await,
                Err(e) => self.reject(e),
            }
        })
        .await
    }

    /// Handle a raw HTTP request body; the JSON object is the record itself
    pub async fn handle_json_body(
        &self,
        body: &[u8],
        ctx: &InvocationContext,
    ) -> LambdaResponse {
        self.invocation(ctx, async {
            match serde_json::from_slice::<Value>(body) {
                Ok(Value::Object(map)) => self.run(EventShape::Direct(map)).await,
                Ok(_) => self.reject(NormalizeError::Parse(
                    "request body is not a JSON object".to_string(),
                )),
                Err(e) => self.reject(NormalizeError::Parse(e.to_string())),
            }
        })
        .await
    }

    async fn invocation<F>(&self, ctx: &InvocationContext, work: F) -> LambdaResponse
    where
        F: Future<Output = LambdaResponse>,
    {
        self.metrics.record_request();
        let span = tracing::info_span!(
            "invocation",
            request_id = %ctx.request_id,
            function_name = %ctx.function_name
        );
        work.instrument(span).await
    }

    async fn run(&self, shape: EventShape) -> LambdaResponse {
        tracing::debug!(shape = shape.name(), "Received event");
        match normalize_shape(shape) {
            Ok(record) => self.predict(record).await,
            Err(e) => self.reject(e),
        }
    }

    fn reject(&self, err: NormalizeError) -> LambdaResponse {
        match err {
            NormalizeError::Validation { missing } => {
                tracing::warn!(missing = ?missing, "Rejected incomplete record");
                self.metrics.record_validation_failure();
                response::validation_failure(&missing)
            }
            NormalizeError::Parse(detail) => {
                self.metrics.record_internal_failure();
                response::internal_failure(ErrorCode::MalformedBody, &detail)
            }
        }
    }

    async fn predict(&self, record: RawRecord) -> LambdaResponse {
        let loaded = self.cache.ensure_ready().await;
        self.metrics.set_load_attempts(self.cache.load_attempts());
        if let Err(e) = loaded {
            return self.fail(&e, ErrorCode::ArtifactUnavailable);
        }

        match self.cache.predict_record(&record).await {
            Ok(prediction) => {
                self.metrics
                    .record_prediction(prediction.is_churn(), prediction.latency_ns);
                tracing::info!(
                    label = prediction.label,
                    churn_probability = prediction.churn_probability,
                    "Prediction made"
                );
                response::success(&prediction, record)
            }
            Err(e) => self.fail(&e, ErrorCode::PredictionFailed),
        }
    }

    fn fail(&self, err: &Error, code: ErrorCode) -> LambdaResponse {
        self.metrics.record_internal_failure();
        response::internal_failure(code, &err.to_string())
    }
}
